use crate::core::history::PostHistory;
use crate::core::prompt::{single_tweet_prompt, thread_prompt};
use crate::core::thread::ThreadGenerator;
use crate::domain::model::{Article, PostMode, PostedArticle, RunOutcome};
use crate::domain::ports::{ChatClient, ConfigProvider, FeedSource, Publisher, Storage};
use crate::utils::error::{BotError, Result};
use tracing::{debug, error, info, warn};

/// One bot run: walk feeds until a single article has been posted.
pub struct BotEngine<F, C, P, S, K>
where
    F: FeedSource,
    C: ChatClient,
    P: Publisher,
    S: Storage,
    K: ConfigProvider,
{
    feeds: F,
    chat: C,
    publisher: P,
    history: PostHistory<S>,
    config: K,
    thread_generator: ThreadGenerator,
    dry_run: bool,
}

impl<F, C, P, S, K> BotEngine<F, C, P, S, K>
where
    F: FeedSource,
    C: ChatClient,
    P: Publisher,
    S: Storage,
    K: ConfigProvider,
{
    pub fn new(feeds: F, chat: C, publisher: P, history: PostHistory<S>, config: K) -> Self {
        let thread_generator = ThreadGenerator::new(config.max_tweet_length());
        Self {
            feeds,
            chat,
            publisher,
            history,
            config,
            thread_generator,
            dry_run: false,
        }
    }

    /// In dry-run mode the history is neither cleaned up nor written.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn history(&self) -> &PostHistory<S> {
        &self.history
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        info!("Starting RSS feed processing");

        if self.dry_run {
            info!("Dry run: history cleanup and updates are skipped");
        } else {
            info!("Cleaning up old history entries");
            self.history
                .cleanup_old_entries(self.config.history_retention_days())
                .await?;
        }

        let feeds = self.feeds.pick_feeds(self.config.max_feeds_per_run())?;
        info!("Loaded {} feeds for processing", feeds.len());

        for feed_url in &feeds {
            info!("Processing feed: {}", feed_url);
            match self.process_feed(feed_url).await {
                Ok(Some(posted)) => {
                    info!("Successfully posted one article, finishing run");
                    return Ok(RunOutcome::Posted(posted));
                }
                Ok(None) => debug!("Nothing posted from {}", feed_url),
                Err(e @ BotError::HistoryError { .. }) => return Err(e),
                Err(e) => error!("Error processing feed {}: {}", feed_url, e),
            }
        }

        warn!("No suitable articles found across all feeds");
        Ok(RunOutcome::NothingPosted {
            feeds_tried: feeds.len(),
        })
    }

    /// Posts the first fresh, unposted article of the feed, if any. A post that
    /// went out but could not be recorded is a `HistoryError`, which ends the run.
    pub async fn process_feed(&self, feed_url: &str) -> Result<Option<PostedArticle>> {
        let articles = self.feeds.fetch_feed(feed_url).await?;
        let freshness = self.config.article_freshness_hours();

        for article in articles.iter().take(self.config.max_articles_per_feed()) {
            if !article.is_recent(freshness) {
                debug!("Skipping stale article: {}", article.title);
                continue;
            }
            if self.history.is_posted(article).await {
                debug!("Skipping already posted article: {}", article.title);
                continue;
            }

            let Some(tweets) = self.publish(article).await? else {
                continue;
            };

            if self.dry_run {
                info!("[dry run] Would record article: {}", article.title);
            } else {
                self.history
                    .add_posted(article)
                    .await
                    .map_err(|e| BotError::HistoryError {
                        message: format!(
                            "posted '{}' but could not record it: {}",
                            article.title, e
                        ),
                    })?;
            }
            info!("Successfully posted tweet for article: {}", article.title);

            return Ok(Some(PostedArticle {
                title: article.title.clone(),
                feed: feed_url.to_string(),
                tweets,
            }));
        }

        Ok(None)
    }

    /// Composes and publishes; returns how many tweets went out, `None` if nothing did.
    async fn publish(&self, article: &Article) -> Result<Option<usize>> {
        match self.config.post_mode() {
            PostMode::Single => {
                let Some(text) = self.chat.chat(&single_tweet_prompt(article)).await? else {
                    warn!("No tweet text generated for: {}", article.title);
                    return Ok(None);
                };
                Ok(self
                    .publisher
                    .post_tweet(&text, None)
                    .await?
                    .map(|_| 1))
            }
            PostMode::Thread => {
                let mut parts = match self.chat.chat(&thread_prompt(article)).await? {
                    Some(reply) => self.thread_generator.parse_ai_response(&reply),
                    None => Vec::new(),
                };
                if parts.is_empty() {
                    info!("Model returned no thread, building one from the article");
                    parts = self.thread_generator.create_thread(
                        &article.title,
                        &article.content,
                        &article.url,
                    );
                }

                let receipt = self.publisher.post_thread(&parts).await?;
                if !receipt.is_complete() {
                    warn!(
                        "Thread for '{}' incomplete: {}/{} tweets posted",
                        article.title,
                        receipt.posted_ids.len(),
                        receipt.total
                    );
                }
                Ok(receipt
                    .is_started()
                    .then_some(receipt.posted_ids.len()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ChatMessage, Role};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::Mutex;

    /// In-memory files; writes numbered from `fail_from_write` on (1-based) fail.
    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        writes: Arc<AtomicUsize>,
        fail_from_write: Option<usize>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                BotError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_from_write.is_some_and(|from| n >= from) {
                return Err(BotError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only filesystem",
                )));
            }
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        post_mode: PostMode,
        max_articles_per_feed: usize,
    }

    impl ConfigProvider for MockConfig {
        fn article_freshness_hours(&self) -> i64 {
            24
        }
        fn history_retention_days(&self) -> i64 {
            30
        }
        fn max_feeds_per_run(&self) -> usize {
            25
        }
        fn max_articles_per_feed(&self) -> usize {
            self.max_articles_per_feed
        }
        fn max_tweet_length(&self) -> usize {
            280
        }
        fn post_mode(&self) -> PostMode {
            self.post_mode
        }
    }

    fn single() -> MockConfig {
        MockConfig {
            post_mode: PostMode::Single,
            max_articles_per_feed: 5,
        }
    }

    /// Feed name -> articles; a feed named "broken" fails to fetch.
    struct MockFeeds {
        order: Vec<String>,
        articles: HashMap<String, Vec<Article>>,
    }

    #[async_trait]
    impl FeedSource for MockFeeds {
        fn pick_feeds(&self, count: usize) -> Result<Vec<String>> {
            Ok(self.order.iter().take(count).cloned().collect())
        }

        async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<Article>> {
            if feed_url == "broken" {
                return Err(BotError::FeedParseError {
                    url: feed_url.to_string(),
                    message: "bad xml".to_string(),
                });
            }
            Ok(self.articles.get(feed_url).cloned().unwrap_or_default())
        }
    }

    /// Replies are consumed in order; an exhausted queue answers `None`.
    #[derive(Default)]
    struct MockChat {
        replies: StdMutex<VecDeque<Option<String>>>,
        seen: StdMutex<Vec<Vec<ChatMessage>>>,
    }

    impl MockChat {
        fn replying(replies: &[Option<&str>]) -> Self {
            Self {
                replies: StdMutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
                seen: StdMutex::default(),
            }
        }
    }

    #[async_trait]
    impl ChatClient for MockChat {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(self.replies.lock().unwrap().pop_front().flatten())
        }
    }

    /// Accepts every post unless its text contains "REJECT". With
    /// `fail_replies`, every reply errors as if the connection dropped.
    #[derive(Default)]
    struct MockPublisher {
        posts: StdMutex<Vec<(String, Option<String>)>>,
        fail_replies: bool,
    }

    #[async_trait]
    impl Publisher for MockPublisher {
        async fn post_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<Option<String>> {
            if text.contains("REJECT") {
                return Ok(None);
            }
            if self.fail_replies && reply_to.is_some() {
                return Err(BotError::ApiResponseError {
                    service: "twitter".to_string(),
                    message: "connection reset".to_string(),
                });
            }
            let mut posts = self.posts.lock().unwrap();
            posts.push((text.to_string(), reply_to.map(str::to_string)));
            Ok(Some(format!("id-{}", posts.len())))
        }
    }

    fn article(feed: &str, title: &str, age_hours: i64) -> Article {
        Article {
            title: title.to_string(),
            content: format!("About {}", title),
            url: format!("https://example.com/{}", title.replace(' ', "-")),
            published: Utc::now() - Duration::hours(age_hours),
            feed_id: feed.to_string(),
        }
    }

    fn feeds(entries: Vec<(&str, Vec<Article>)>) -> MockFeeds {
        MockFeeds {
            order: entries.iter().map(|(name, _)| name.to_string()).collect(),
            articles: entries
                .into_iter()
                .map(|(name, list)| (name.to_string(), list))
                .collect(),
        }
    }

    async fn history(storage: MockStorage) -> PostHistory<MockStorage> {
        PostHistory::load(storage, "posted_articles.json").await.unwrap()
    }

    #[tokio::test]
    async fn test_posts_first_fresh_unposted_article_and_stops() {
        let storage = MockStorage::default();
        let already = article("a", "already posted", 1);
        let hist = history(storage.clone()).await;
        hist.add_posted(&already).await.unwrap();

        let engine = BotEngine::new(
            feeds(vec![
                ("a", vec![article("a", "stale", 48), already.clone(), article("a", "fresh one", 2)]),
                ("b", vec![article("b", "never reached", 1)]),
            ]),
            MockChat::replying(&[Some("Tweet about fresh one https://example.com/fresh-one")]),
            MockPublisher::default(),
            hist,
            single(),
        );

        let outcome = engine.run().await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Posted(PostedArticle {
                title: "fresh one".to_string(),
                feed: "a".to_string(),
                tweets: 1,
            })
        );
        let posts = engine.publisher.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].1, None);
        assert!(engine.history().is_posted(&article("a", "fresh one", 2)).await);

        let seen = engine.chat.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0][0].role, Role::System);
        assert!(seen[0][1].content.contains("Article Title: fresh one"));
    }

    #[tokio::test]
    async fn test_failing_feed_is_skipped() {
        let engine = BotEngine::new(
            feeds(vec![
                ("broken", vec![]),
                ("good", vec![article("good", "works", 1)]),
            ]),
            MockChat::replying(&[Some("ok tweet")]),
            MockPublisher::default(),
            history(MockStorage::default()).await,
            single(),
        );

        match engine.run().await.unwrap() {
            RunOutcome::Posted(posted) => assert_eq!(posted.feed, "good"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_post_moves_to_next_article() {
        let engine = BotEngine::new(
            feeds(vec![(
                "a",
                vec![article("a", "first", 1), article("a", "second", 1)],
            )]),
            MockChat::replying(&[Some("REJECT me"), Some("accepted tweet")]),
            MockPublisher::default(),
            history(MockStorage::default()).await,
            single(),
        );

        match engine.run().await.unwrap() {
            RunOutcome::Posted(posted) => assert_eq!(posted.title, "second"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!engine.history().is_posted(&article("a", "first", 1)).await);
    }

    #[tokio::test]
    async fn test_nothing_posted_when_model_stays_silent() {
        let engine = BotEngine::new(
            feeds(vec![("a", vec![article("a", "x", 1)]), ("b", vec![])]),
            MockChat::default(),
            MockPublisher::default(),
            history(MockStorage::default()).await,
            single(),
        );

        assert_eq!(
            engine.run().await.unwrap(),
            RunOutcome::NothingPosted { feeds_tried: 2 }
        );
        assert!(engine.history().is_empty().await);
    }

    #[tokio::test]
    async fn test_articles_beyond_per_feed_cap_are_ignored() {
        let engine = BotEngine::new(
            feeds(vec![(
                "a",
                vec![article("a", "old", 100), article("a", "fresh", 1)],
            )]),
            MockChat::replying(&[Some("tweet")]),
            MockPublisher::default(),
            history(MockStorage::default()).await,
            MockConfig {
                post_mode: PostMode::Single,
                max_articles_per_feed: 1,
            },
        );

        assert_eq!(
            engine.run().await.unwrap(),
            RunOutcome::NothingPosted { feeds_tried: 1 }
        );
    }

    #[tokio::test]
    async fn test_thread_mode_chains_model_parts() {
        let engine = BotEngine::new(
            feeds(vec![("a", vec![article("a", "deep dive", 1)])]),
            MockChat::replying(&[Some("Hook https://example.com/deep-dive\n---\nMiddle\n---\nRT if useful")]),
            MockPublisher::default(),
            history(MockStorage::default()).await,
            MockConfig {
                post_mode: PostMode::Thread,
                max_articles_per_feed: 5,
            },
        );

        match engine.run().await.unwrap() {
            RunOutcome::Posted(posted) => assert_eq!(posted.tweets, 3),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let posts = engine.publisher.posts.lock().unwrap().clone();
        assert_eq!(posts[0], ("Hook https://example.com/deep-dive".to_string(), None));
        assert_eq!(posts[1], ("Middle".to_string(), Some("id-1".to_string())));
        assert_eq!(posts[2], ("RT if useful".to_string(), Some("id-2".to_string())));
    }

    #[tokio::test]
    async fn test_thread_mode_falls_back_to_template() {
        let engine = BotEngine::new(
            feeds(vec![("a", vec![article("a", "template", 1)])]),
            MockChat::default(),
            MockPublisher::default(),
            history(MockStorage::default()).await,
            MockConfig {
                post_mode: PostMode::Thread,
                max_articles_per_feed: 5,
            },
        );

        engine.run().await.unwrap();
        let posts = engine.publisher.posts.lock().unwrap().clone();
        assert!(posts[0].0.starts_with("🧵 template"));
        assert!(posts.last().unwrap().0.contains("Read the full article here"));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_history_untouched() {
        let storage = MockStorage::default();
        let engine = BotEngine::new(
            feeds(vec![("a", vec![article("a", "dry", 1)])]),
            MockChat::replying(&[Some("tweet")]),
            MockPublisher::default(),
            history(storage.clone()).await,
            single(),
        )
        .with_dry_run(true);

        assert!(matches!(engine.run().await.unwrap(), RunOutcome::Posted(_)));
        assert!(engine.history().is_empty().await);
        assert!(storage.files.lock().await.is_empty());
    }

    fn thread_mode() -> MockConfig {
        MockConfig {
            post_mode: PostMode::Thread,
            max_articles_per_feed: 5,
        }
    }

    #[tokio::test]
    async fn test_partially_posted_thread_is_recorded_and_ends_run() {
        let engine = BotEngine::new(
            feeds(vec![
                ("a", vec![article("a", "first thread", 1)]),
                ("b", vec![article("b", "second thread", 1)]),
            ]),
            MockChat::replying(&[Some("Hook\n---\nBody\n---\nEnd"), Some("Other\n---\nParts")]),
            MockPublisher {
                fail_replies: true,
                ..MockPublisher::default()
            },
            history(MockStorage::default()).await,
            thread_mode(),
        );

        let outcome = engine.run().await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Posted(PostedArticle {
                title: "first thread".to_string(),
                feed: "a".to_string(),
                tweets: 1,
            })
        );
        let posts = engine.publisher.posts.lock().unwrap().clone();
        assert_eq!(posts, vec![("Hook".to_string(), None)]);
        assert!(engine.history().is_posted(&article("a", "first thread", 1)).await);
        assert!(!engine.history().is_posted(&article("b", "second thread", 1)).await);
    }

    #[tokio::test]
    async fn test_unrecordable_post_aborts_run() {
        // Write 1 is the cleanup save, write 2 records the posted article.
        let storage = MockStorage {
            fail_from_write: Some(2),
            ..MockStorage::default()
        };
        let engine = BotEngine::new(
            feeds(vec![
                ("a", vec![article("a", "posted", 1)]),
                ("b", vec![article("b", "must not post", 1)]),
            ]),
            MockChat::replying(&[Some("first tweet"), Some("second tweet")]),
            MockPublisher::default(),
            history(storage).await,
            single(),
        );

        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, BotError::HistoryError { .. }), "{:?}", err);
        let posts = engine.publisher.posts.lock().unwrap().clone();
        assert_eq!(posts, vec![("first tweet".to_string(), None)]);
    }
}
