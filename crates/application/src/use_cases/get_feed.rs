use crate::ports::FeedPublisherPort;
use ferrous_feed_domain::FeedGeneration;
use std::sync::Arc;

pub struct GetFeedUseCase {
    publisher: Arc<dyn FeedPublisherPort>,
}

impl GetFeedUseCase {
    pub fn new(publisher: Arc<dyn FeedPublisherPort>) -> Self {
        Self { publisher }
    }

    pub fn execute(&self) -> Option<Arc<FeedGeneration>> {
        self.publisher.current()
    }
}
