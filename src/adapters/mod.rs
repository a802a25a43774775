// Adapters layer: concrete implementations of the domain ports (HTTP APIs, feeds, disk).

pub mod oauth;
pub mod rss;
pub mod storage;
pub mod twitter;
pub mod xai;

pub use oauth::OAuth1Signer;
pub use rss::RssFeedManager;
pub use storage::LocalStorage;
pub use twitter::{LogPublisher, TwitterClient};
pub use xai::XaiChat;
