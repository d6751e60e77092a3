use ferrous_feed_application::use_cases::{GetFeedStatusUseCase, GetFeedUseCase};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub get_feed: Arc<GetFeedUseCase>,
    pub get_status: Arc<GetFeedStatusUseCase>,
}
