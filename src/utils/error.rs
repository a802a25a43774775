use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required credentials: {}", missing.join(", "))]
    MissingCredentialsError { missing: Vec<String> },

    #[error("Feed list error: {message}")]
    FeedListError { message: String },

    #[error("Failed to parse feed {url}: {message}")]
    FeedParseError { url: String, message: String },

    #[error("{service} returned HTTP {status}: {body}")]
    ApiStatusError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected {service} response: {message}")]
    ApiResponseError { service: String, message: String },

    #[error("Post history error: {message}")]
    HistoryError { message: String },

    #[error("Signing error: {message}")]
    SigningError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Credentials,
    Data,
    Storage,
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::HttpError(_) => ErrorCategory::Network,
            BotError::IoError(_) | BotError::HistoryError { .. } => ErrorCategory::Storage,
            BotError::SerializationError(_)
            | BotError::FeedParseError { .. }
            | BotError::FeedListError { .. } => ErrorCategory::Data,
            BotError::ConfigError { .. } | BotError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            BotError::MissingCredentialsError { .. } | BotError::SigningError { .. } => {
                ErrorCategory::Credentials
            }
            BotError::ApiStatusError { .. } | BotError::ApiResponseError { .. } => {
                ErrorCategory::Api
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BotError::FeedParseError { .. } => ErrorSeverity::Low,
            BotError::HttpError(_)
            | BotError::ApiStatusError { .. }
            | BotError::ApiResponseError { .. } => ErrorSeverity::Medium,
            BotError::SerializationError(_)
            | BotError::HistoryError { .. }
            | BotError::FeedListError { .. } => ErrorSeverity::High,
            BotError::IoError(_)
            | BotError::ConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::MissingCredentialsError { .. }
            | BotError::SigningError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and retry the run",
            ErrorCategory::Configuration => "Fix the value in config.toml or the command line",
            ErrorCategory::Credentials => {
                "Export all OAUTH_* variables and XAI_API_KEY before starting the bot"
            }
            ErrorCategory::Data => "Check the feed list and the feed contents",
            ErrorCategory::Storage => {
                "Check that posted_articles.json is valid JSON and the directory is writable"
            }
            ErrorCategory::Api => "Check API quotas and credentials, then retry",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BotError::MissingCredentialsError { missing } => {
                format!("Credentials not set: {}", missing.join(", "))
            }
            BotError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration problem in '{}': {}", field, reason)
            }
            BotError::FeedListError { message } => format!("Cannot use feed list: {}", message),
            BotError::HistoryError { message } => {
                format!("Cannot use post history: {}", message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
