use clap::Parser;
use rss_tweet_bot::domain::model::RunOutcome;
use rss_tweet_bot::domain::ports::Publisher;
use rss_tweet_bot::utils::error::ErrorSeverity;
use rss_tweet_bot::utils::{logger, validation::Validate};
use rss_tweet_bot::{
    BotConfig, BotEngine, BotError, CliArgs, Credentials, LocalStorage, LogPublisher,
    OAuth1Signer, PostHistory, RssFeedManager, TwitterClient, XaiChat,
};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let mut config = match BotConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file is valid TOML or remove it to use defaults");
            std::process::exit(1);
        }
    };
    args.apply_to(&mut config);

    logger::init_cli_logger(
        &config.log_level,
        args.verbose,
        config.json_logs,
        config.log_file.as_deref(),
    );
    tracing::info!("Starting rss-tweet-bot");
    tracing::debug!("Effective config: {:?}", config);

    match run(&args, config).await {
        Ok(RunOutcome::Posted(posted)) => {
            tracing::info!(
                "✅ Posted '{}' from {} ({} tweet(s))",
                posted.title,
                posted.feed,
                posted.tweets
            );
        }
        Ok(RunOutcome::NothingPosted { feeds_tried }) => {
            tracing::warn!("Run finished without posting ({} feeds tried)", feeds_tried);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

async fn run(args: &CliArgs, config: BotConfig) -> Result<RunOutcome, BotError> {
    config.validate()?;

    tracing::info!("Loading credentials");
    let credentials = Credentials::from_env();
    if args.dry_run {
        tracing::info!("🔍 DRY RUN: tweets are logged, not posted");
    } else {
        credentials.validate()?;
    }
    tracing::info!("Credentials loaded");

    let feeds = RssFeedManager::from_file(
        &config.feeds_file,
        Duration::from_secs(config.feed_timeout_seconds),
    )?;
    let chat = XaiChat::new(
        credentials.xai_api_key.clone(),
        &config.xai,
        config.retry_policy(),
    )?;
    let history = PostHistory::load(LocalStorage::new("."), config.history_file.clone()).await?;
    tracing::info!("All components initialized");

    if args.dry_run {
        run_with(feeds, chat, LogPublisher::default(), history, config, true).await
    } else {
        let signer = OAuth1Signer::from_credentials(&credentials);
        let twitter = TwitterClient::new(
            signer,
            &config.twitter.base_url,
            Duration::from_secs(config.twitter.timeout_seconds),
        )?;
        run_with(feeds, chat, twitter, history, config, false).await
    }
}

async fn run_with<P: Publisher>(
    feeds: RssFeedManager,
    chat: XaiChat,
    publisher: P,
    history: PostHistory<LocalStorage>,
    config: BotConfig,
    dry_run: bool,
) -> Result<RunOutcome, BotError> {
    BotEngine::new(feeds, chat, publisher, history, config)
        .with_dry_run(dry_run)
        .run()
        .await
}
