use crate::utils::error::{BotError, Result};
use std::fmt;

pub const OAUTH_CONSUMER_KEY: &str = "OAUTH_CONSUMER_KEY";
pub const OAUTH_CONSUMER_SECRET: &str = "OAUTH_CONSUMER_SECRET";
pub const OAUTH_ACCESS_TOKEN: &str = "OAUTH_ACCESS_TOKEN";
pub const OAUTH_ACCESS_TOKEN_SECRET: &str = "OAUTH_ACCESS_TOKEN_SECRET";
pub const XAI_API_KEY: &str = "XAI_API_KEY";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub oauth_consumer_key: String,
    pub oauth_consumer_secret: String,
    pub oauth_access_token: String,
    pub oauth_access_token_secret: String,
    pub xai_api_key: String,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from any name -> value lookup. Absent names become empty.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            oauth_consumer_key: get(OAUTH_CONSUMER_KEY),
            oauth_consumer_secret: get(OAUTH_CONSUMER_SECRET),
            oauth_access_token: get(OAUTH_ACCESS_TOKEN),
            oauth_access_token_secret: get(OAUTH_ACCESS_TOKEN_SECRET),
            xai_api_key: get(XAI_API_KEY),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let missing: Vec<String> = [
            (OAUTH_CONSUMER_KEY, &self.oauth_consumer_key),
            (OAUTH_CONSUMER_SECRET, &self.oauth_consumer_secret),
            (OAUTH_ACCESS_TOKEN, &self.oauth_access_token),
            (OAUTH_ACCESS_TOKEN_SECRET, &self.oauth_access_token_secret),
            (XAI_API_KEY, &self.xai_api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name.to_string())
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BotError::MissingCredentialsError { missing })
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &str| if v.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("Credentials")
            .field("oauth_consumer_key", &mask(&self.oauth_consumer_key))
            .field("oauth_consumer_secret", &mask(&self.oauth_consumer_secret))
            .field("oauth_access_token", &mask(&self.oauth_access_token))
            .field("oauth_access_token_secret", &mask(&self.oauth_access_token_secret))
            .field("xai_api_key", &mask(&self.xai_api_key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn complete_credentials_validate() {
        let creds = Credentials::from_lookup(lookup(&[
            (OAUTH_CONSUMER_KEY, "ck"),
            (OAUTH_CONSUMER_SECRET, "cs"),
            (OAUTH_ACCESS_TOKEN, "at"),
            (OAUTH_ACCESS_TOKEN_SECRET, "ats"),
            (XAI_API_KEY, "xai"),
        ]));
        assert!(creds.validate().is_ok());
        assert_eq!(creds.oauth_access_token, "at");
    }

    #[test]
    fn missing_and_blank_values_are_reported_in_order() {
        let creds = Credentials::from_lookup(lookup(&[
            (OAUTH_CONSUMER_KEY, "ck"),
            (OAUTH_CONSUMER_SECRET, "   "),
            (OAUTH_ACCESS_TOKEN, "at"),
        ]));
        match creds.validate() {
            Err(BotError::MissingCredentialsError { missing }) => assert_eq!(
                missing,
                vec![OAUTH_CONSUMER_SECRET, OAUTH_ACCESS_TOKEN_SECRET, XAI_API_KEY]
            ),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = Credentials {
            xai_api_key: "super-secret".to_string(),
            ..Default::default()
        };
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("<unset>"));
    }
}
