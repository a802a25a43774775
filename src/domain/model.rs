use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub url: String,
    pub published: DateTime<Utc>,
    pub feed_id: String,
}

impl Article {
    pub fn is_recent(&self, hours: i64) -> bool {
        self.is_recent_at(hours, Utc::now())
    }

    /// A window too large for `Duration` counts every article as recent.
    pub fn is_recent_at(&self, hours: i64, now: DateTime<Utc>) -> bool {
        Duration::try_hours(hours).map_or(true, |window| now - self.published < window)
    }

    /// Stable identity used as the key in the post history.
    pub fn hash(&self) -> String {
        format!("{:x}", md5::compute(format!("{}{}", self.url, self.title)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadPart {
    pub text: String,
    pub reply_to_id: Option<String>,
}

impl ThreadPart {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_to_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostMode {
    #[default]
    Single,
    Thread,
}

impl std::str::FromStr for PostMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(PostMode::Single),
            "thread" => Ok(PostMode::Thread),
            other => Err(format!("unknown post mode '{}' (expected single or thread)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedArticle {
    pub title: String,
    pub feed: String,
    pub tweets: usize,
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Posted(PostedArticle),
    NothingPosted { feeds_tried: usize },
}
