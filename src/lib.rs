pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;
pub use config::{credentials::Credentials, BotConfig};

pub use adapters::{LocalStorage, LogPublisher, OAuth1Signer, RssFeedManager, TwitterClient, XaiChat};
pub use core::{engine::BotEngine, history::PostHistory, thread::ThreadGenerator};
pub use utils::error::{BotError, Result};
