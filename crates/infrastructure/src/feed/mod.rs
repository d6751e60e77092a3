pub mod publisher;
pub mod renderer;
pub mod snapshot;

pub use publisher::FeedPublisher;
pub use renderer::{FeedRenderer, RenderedFeed};
pub use snapshot::FsFeedSnapshotStore;
