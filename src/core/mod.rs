pub mod engine;
pub mod history;
pub mod prompt;
pub mod thread;

pub use crate::domain::model::{Article, ChatMessage, PostMode, RunOutcome, ThreadPart};
pub use crate::domain::ports::{ChatClient, ConfigProvider, FeedSource, Publisher, Storage};
pub use crate::utils::error::Result;
