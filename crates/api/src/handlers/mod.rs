pub mod feed;
pub mod health;
pub mod status;

pub use feed::{get_feed, get_feed_part, get_level_feed, get_level_feed_part};
pub use health::health_check;
pub use status::get_status;
