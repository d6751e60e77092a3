pub mod feed_publisher;
pub mod source_fetcher;

pub use feed_publisher::{FeedPublisherPort, FeedSnapshotStore};
pub use source_fetcher::{FetchOutcome, SourceFetcher};
