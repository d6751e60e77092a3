pub mod blocklist;
pub mod feed;
