use crate::domain::model::Article;
use crate::domain::ports::Storage;
use crate::utils::error::{BotError, Result};
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

pub const DEFAULT_HISTORY_FILE: &str = "posted_articles.json";

/// Record of posted articles, keyed by `Article::hash`, persisted as a JSON object.
pub struct PostHistory<S: Storage> {
    storage: S,
    path: String,
    entries: Mutex<BTreeMap<String, DateTime<Utc>>>,
}

impl<S: Storage> PostHistory<S> {
    /// Loads the history file; a missing file is an empty history.
    pub async fn load(storage: S, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let entries = match storage.read_file(&path).await {
            Ok(bytes) => parse_history(&bytes)?,
            Err(BotError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No history at {}, starting fresh", path);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        tracing::debug!("Loaded {} history entries", entries.len());

        Ok(Self {
            storage,
            path,
            entries: Mutex::new(entries),
        })
    }

    pub async fn is_posted(&self, article: &Article) -> bool {
        self.entries.lock().await.contains_key(&article.hash())
    }

    pub async fn add_posted(&self, article: &Article) -> Result<()> {
        self.add_posted_at(article, Utc::now()).await
    }

    pub async fn add_posted_at(&self, article: &Article, at: DateTime<Utc>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(article.hash(), at);
        self.save(&entries).await
    }

    /// Drops entries at or before `now - days` and persists the result.
    /// Returns how many were removed.
    pub async fn cleanup_old_entries(&self, days: i64) -> Result<usize> {
        self.cleanup_old_entries_at(days, Utc::now()).await
    }

    pub async fn cleanup_old_entries_at(&self, days: i64, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = Duration::try_days(days).and_then(|window| now.checked_sub_signed(window));
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        if let Some(cutoff) = cutoff {
            entries.retain(|_, posted_at| *posted_at > cutoff);
        }
        let removed = before - entries.len();
        self.save(&entries).await?;
        if removed > 0 {
            tracing::info!("Removed {} history entries older than {} days", removed, days);
        }
        Ok(removed)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    // Caller holds the lock, so writes are serialized.
    async fn save(&self, entries: &BTreeMap<String, DateTime<Utc>>) -> Result<()> {
        let serializable: BTreeMap<&str, String> = entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.to_rfc3339_opts(SecondsFormat::Micros, true)))
            .collect();
        let mut json = serde_json::to_string_pretty(&serializable)?;
        json.push('\n');
        self.storage.write_file(&self.path, json.as_bytes()).await
    }
}

fn parse_history(bytes: &[u8]) -> Result<BTreeMap<String, DateTime<Utc>>> {
    let raw: BTreeMap<String, String> =
        serde_json::from_slice(bytes).map_err(|e| BotError::HistoryError {
            message: format!("invalid history JSON: {}", e),
        })?;

    raw.into_iter()
        .map(|(hash, stamp)| {
            parse_timestamp(&stamp)
                .map(|ts| (hash.clone(), ts))
                .ok_or_else(|| BotError::HistoryError {
                    message: format!("invalid timestamp '{}' for entry {}", stamp, hash),
                })
        })
        .collect()
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(stamp)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
