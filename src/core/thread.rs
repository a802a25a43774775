use crate::domain::model::ThreadPart;
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_MAX_TWEET_LENGTH: usize = 280;
/// Smallest length that leaves room for text between the continuation markers.
pub const MIN_TWEET_LENGTH: usize = 10;
const CONTINUATION: &str = "...";

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

fn paragraph_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid regex"))
}

/// Turns article text or a model reply into tweet-sized thread parts.
/// Lengths count `char`s, not bytes.
#[derive(Debug, Clone)]
pub struct ThreadGenerator {
    max_tweet_length: usize,
}

impl Default for ThreadGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TWEET_LENGTH)
    }
}

impl ThreadGenerator {
    /// Lengths below `MIN_TWEET_LENGTH` are raised to it.
    pub fn new(max_tweet_length: usize) -> Self {
        Self {
            max_tweet_length: max_tweet_length.max(MIN_TWEET_LENGTH),
        }
    }

    /// Hook tweet, then the content paragraph by paragraph, then a call to action.
    pub fn create_thread(&self, title: &str, content: &str, url: &str) -> Vec<ThreadPart> {
        let mut thread = vec![ThreadPart::new(format!("{}\n\n{}", create_hook(title), url))];

        for paragraph in split_into_paragraphs(content) {
            thread.extend(
                self.split_into_tweets(&paragraph)
                    .into_iter()
                    .filter(|part| !part.trim().is_empty())
                    .map(ThreadPart::new),
            );
        }

        thread.push(ThreadPart::new(create_cta(url)));
        thread
    }

    pub fn split_into_tweets(&self, text: &str) -> Vec<String> {
        let max = self.max_tweet_length;
        let cut_limit = max.saturating_sub(5).max(1);
        let mut tweets = Vec::new();
        let mut rest = text.to_string();

        while !rest.is_empty() {
            let chars: Vec<char> = rest.chars().collect();
            if chars.len() <= max {
                tweets.push(rest);
                break;
            }

            let split = match chars[..cut_limit].iter().rposition(|c| *c == ' ') {
                Some(i) if i > 0 => i,
                _ => cut_limit,
            };

            let head: String = chars[..split].iter().collect();
            tweets.push(format!("{}{}", head, CONTINUATION));

            let tail: String = chars[split..].iter().collect();
            let tail = tail.trim();
            rest = if tail.is_empty() {
                String::new()
            } else {
                format!("{}{}", CONTINUATION, tail)
            };
        }

        tweets
    }

    /// Splits a model reply on `---` separators; over-long parts are split further.
    pub fn parse_ai_response(&self, ai_response: &str) -> Vec<ThreadPart> {
        ai_response
            .split("---")
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .flat_map(|text| {
                if text.chars().count() > self.max_tweet_length {
                    self.split_into_tweets(text)
                } else {
                    vec![text.to_string()]
                }
            })
            .map(ThreadPart::new)
            .collect()
    }
}

fn create_hook(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| !('\u{1F300}'..='\u{1F9FF}').contains(c))
        .collect();
    format!("🧵 {}", stripped)
}

fn create_cta(url: &str) -> String {
    format!(
        "💡 Want to learn more?\n\n\
Read the full article here: {}\n\n\
🔄 RT & ❤️ if you found this thread helpful!\n\
#Tech #Innovation",
        url
    )
}

fn split_into_paragraphs(content: &str) -> Vec<String> {
    let clean = html_tag_re().replace_all(content, "");
    paragraph_break_re()
        .split(&clean)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
