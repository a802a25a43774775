use crate::domain::model::{Article, ChatMessage};

const SINGLE_TWEET_SYSTEM: &str = "You are an AI assistant specialized in creating viral tweets. \
Create engaging tweets that encourage discussion and sharing. \
Use these strategies:\n\
1. Ask thought-provoking questions\n\
2. Include relevant hashtags (max 2-3)\n\
3. Use emojis strategically\n\
4. Create controversy or debate when appropriate\n\
5. Tag relevant accounts when applicable";

const THREAD_SYSTEM: &str = "You are an AI assistant that creates engaging Twitter threads. \
Transform articles into informative, compelling threads that keep readers engaged. \
Follow these guidelines:\n\
1. Start with a strong hook\n\
2. Break down complex ideas into digestible parts\n\
3. Use clear transitions between tweets\n\
4. Include relevant data points and insights\n\
5. End with a thought-provoking conclusion\n\n\
Format the thread with '---' between tweets. Keep each tweet under 280 characters.";

fn article_block(article: &Article) -> String {
    format!(
        "Article Title: {}\n\nArticle Content: {}\n\nURL: {}\n\n",
        article.title, article.content, article.url
    )
}

pub fn single_tweet_prompt(article: &Article) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SINGLE_TWEET_SYSTEM),
        ChatMessage::user(format!(
            "{}Create a viral tweet that will maximize engagement. Include the URL.",
            article_block(article)
        )),
    ]
}

pub fn thread_prompt(article: &Article) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(THREAD_SYSTEM),
        ChatMessage::user(format!(
            "{}Create an engaging thread that breaks down this article. \
Start with a hook tweet that includes the URL. \
End with a call-to-action.",
            article_block(article)
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Role;
    use chrono::Utc;

    fn article() -> Article {
        Article {
            title: "Ferris learns to fly".to_string(),
            content: "A crab, a kite and a lot of wind.".to_string(),
            url: "https://example.com/ferris".to_string(),
            published: Utc::now(),
            feed_id: "https://example.com/rss".to_string(),
        }
    }

    #[test]
    fn single_prompt_carries_article_and_url_instruction() {
        let messages = single_tweet_prompt(&article());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.starts_with("You are an AI assistant specialized in creating viral tweets."));
        assert!(messages[0].content.contains("\n5. Tag relevant accounts when applicable"));

        assert_eq!(messages[1].role, Role::User);
        assert_eq!(
            messages[1].content,
            "Article Title: Ferris learns to fly\n\n\
Article Content: A crab, a kite and a lot of wind.\n\n\
URL: https://example.com/ferris\n\n\
Create a viral tweet that will maximize engagement. Include the URL."
        );
    }

    #[test]
    fn thread_prompt_asks_for_separators() {
        let messages = thread_prompt(&article());
        assert!(messages[0].content.contains("Format the thread with '---' between tweets."));
        assert!(messages[1].content.contains("URL: https://example.com/ferris"));
        assert!(messages[1].content.ends_with("End with a call-to-action."));
    }
}
