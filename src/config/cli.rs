use crate::config::{BotConfig, DEFAULT_CONFIG_FILE};
use crate::domain::model::PostMode;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "rss-tweet-bot")]
#[command(about = "Posts one fresh article from a list of RSS feeds to Twitter")]
pub struct CliArgs {
    /// Path to the TOML configuration file (defaults apply when it is absent)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Feed list file, one URL per line
    #[arg(long)]
    pub feeds: Option<String>,

    /// Post history JSON file
    #[arg(long)]
    pub history: Option<String>,

    /// Post a single tweet or a thread
    #[arg(long)]
    pub mode: Option<PostMode>,

    /// Compose tweets but neither post them nor write the history
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Command-line values win over the config file.
    pub fn apply_to(&self, config: &mut BotConfig) {
        if let Some(feeds) = &self.feeds {
            config.feeds_file = feeds.clone();
        }
        if let Some(history) = &self.history {
            config.history_file = history.clone();
        }
        if let Some(mode) = self.mode {
            config.post_mode = mode;
        }
        if self.verbose {
            config.log_level = "DEBUG".to_string();
        }
    }
}
