use crate::domain::model::{Article, ChatMessage, PostMode, ThreadPart};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn article_freshness_hours(&self) -> i64;
    fn history_retention_days(&self) -> i64;
    fn max_feeds_per_run(&self) -> usize;
    fn max_articles_per_feed(&self) -> usize;
    fn max_tweet_length(&self) -> usize;
    fn post_mode(&self) -> PostMode;
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Feeds to visit this run, at most `count`, in visiting order.
    fn pick_feeds(&self, count: usize) -> Result<Vec<String>>;

    async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Returns `None` when the model produced no usable text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Option<String>>;
}

/// Outcome of publishing a thread: ids of the parts that went out, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadReceipt {
    pub posted_ids: Vec<String>,
    pub total: usize,
}

impl ThreadReceipt {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.posted_ids.len() == self.total
    }

    pub fn is_started(&self) -> bool {
        !self.posted_ids.is_empty()
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the new post id, or `None` when the API refused the post.
    async fn post_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<Option<String>>;

    /// Chains each part as a reply to the previous one and stops at the first
    /// refusal or error. An error is returned only when no part went out.
    async fn post_thread(&self, parts: &[ThreadPart]) -> Result<ThreadReceipt> {
        let mut receipt = ThreadReceipt {
            posted_ids: Vec::with_capacity(parts.len()),
            total: parts.len(),
        };

        for part in parts {
            let reply_to = receipt
                .posted_ids
                .last()
                .map(String::as_str)
                .or(part.reply_to_id.as_deref());
            match self.post_tweet(&part.text, reply_to).await {
                Ok(Some(id)) => receipt.posted_ids.push(id),
                Err(e) if !receipt.is_started() => return Err(e),
                Err(e) => {
                    tracing::error!(
                        "Thread stopped after {}/{} tweets: {}",
                        receipt.posted_ids.len(),
                        receipt.total,
                        e
                    );
                    break;
                }
                Ok(None) => {
                    tracing::warn!(
                        "Thread stopped after {}/{} tweets",
                        receipt.posted_ids.len(),
                        receipt.total
                    );
                    break;
                }
            }
        }

        Ok(receipt)
    }
}
