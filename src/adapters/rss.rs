//! Feed list handling and RSS/Atom retrieval.
//!
//! Accepts RSS 2.0, RSS 1.0 (RDF) and Atom documents. Elements are matched by
//! local name so namespaced variants (`dc:date`, Atom's default namespace) are
//! picked up without per-format code paths.

use crate::domain::model::Article;
use crate::domain::ports::FeedSource;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::is_http_url;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rand::seq::SliceRandom;
use reqwest::Client;
use roxmltree::{Document, Node, ParsingOptions};
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("rss-tweet-bot/", env!("CARGO_PKG_VERSION"));

/// Reads the feed list: the first token of every line, kept when it is an http(s) URL.
pub fn load_feeds<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("RSS file not readable: {} ({})", path.display(), e);
        BotError::FeedListError {
            message: format!("cannot read {}: {}", path.display(), e),
        }
    })?;

    let feeds = parse_feed_list(&content);
    if feeds.is_empty() {
        return Err(BotError::FeedListError {
            message: format!("no valid feeds found in {}", path.display()),
        });
    }

    tracing::info!("Loaded {} feeds from {}", feeds.len(), path.display());
    Ok(feeds)
}

pub fn parse_feed_list(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|token| is_http_url(token))
        .map(str::to_string)
        .collect()
}

pub struct RssFeedManager {
    client: Client,
    feeds: Vec<String>,
}

impl RssFeedManager {
    pub fn new(feeds: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, feeds })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
        Self::new(load_feeds(path)?, timeout)
    }

    /// Up to `count` distinct feeds in random order.
    pub fn random_feeds(&self, count: usize) -> Result<Vec<String>> {
        if self.feeds.is_empty() {
            return Err(BotError::FeedListError {
                message: "no feeds available to select".to_string(),
            });
        }
        let mut picked = self.feeds.clone();
        picked.shuffle(&mut rand::thread_rng());
        picked.truncate(count.min(self.feeds.len()));
        Ok(picked)
    }
}

#[async_trait]
impl FeedSource for RssFeedManager {
    fn pick_feeds(&self, count: usize) -> Result<Vec<String>> {
        self.random_feeds(count)
    }

    async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<Article>> {
        tracing::debug!("Fetching feed: {}", feed_url);
        let response = self.client.get(feed_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::ApiStatusError {
                service: format!("feed {}", feed_url),
                status: status.as_u16(),
                body: truncate_for_log(&body),
            });
        }

        let body = response.text().await?;
        let articles = parse_feed(feed_url, &body, Utc::now())?;
        if articles.is_empty() {
            tracing::warn!("No entries found in feed: {}", feed_url);
        } else {
            tracing::info!("Fetched {} articles from {}", articles.len(), feed_url);
        }
        Ok(articles)
    }
}

/// Parses a feed document. Entries without a usable date get `fetched_at`.
pub fn parse_feed(feed_url: &str, xml: &str, fetched_at: DateTime<Utc>) -> Result<Vec<Article>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options).map_err(|e| BotError::FeedParseError {
        url: feed_url.to_string(),
        message: e.to_string(),
    })?;

    let articles = doc
        .descendants()
        .filter(|n| n.is_element() && matches!(n.tag_name().name(), "item" | "entry"))
        .map(|entry| Article {
            title: child_text(entry, &["title"]).unwrap_or_default(),
            url: entry_link(entry).unwrap_or_default(),
            content: child_text(entry, &["summary", "description", "content"]).unwrap_or_default(),
            published: child_text(entry, &["pubDate", "published", "updated", "date"])
                .and_then(|d| parse_date(&d))
                .unwrap_or(fetched_at),
            feed_id: feed_url.to_string(),
        })
        .collect();

    Ok(articles)
}

/// First non-empty text among direct children, trying `names` in priority order.
fn child_text(node: Node<'_, '_>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        node.children()
            .filter(|c| c.is_element() && c.tag_name().name() == *name)
            .map(element_text)
            .find(|t| !t.is_empty())
    })
}

fn element_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn entry_link(entry: Node<'_, '_>) -> Option<String> {
    let links: Vec<Node<'_, '_>> = entry
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "link")
        .collect();

    // RSS: <link>url</link>
    if let Some(text) = links.iter().map(|l| element_text(*l)).find(|t| !t.is_empty()) {
        return Some(text);
    }

    // Atom: <link rel="alternate" href="url"/>, rel defaults to alternate
    links
        .iter()
        .find(|l| matches!(l.attribute("rel"), None | Some("alternate")) && l.has_attribute("href"))
        .or_else(|| links.iter().find(|l| l.has_attribute("href")))
        .and_then(|l| l.attribute("href"))
        .map(|href| href.trim().to_string())
}

pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn truncate_for_log(body: &str) -> String {
    body.chars().take(200).collect()
}
