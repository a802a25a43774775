use crate::config::credentials::Credentials;
use crate::utils::error::{BotError, Result};
use base64::Engine as _;
use rand::distributions::Alphanumeric;
use rand::Rng;
use ring::hmac;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

/// OAuth 1.0a request signer (HMAC-SHA1, RFC 5849).
#[derive(Clone)]
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: String,
    token: String,
    token_secret: String,
}

impl OAuth1Signer {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(
            credentials.oauth_consumer_key.clone(),
            credentials.oauth_consumer_secret.clone(),
            credentials.oauth_access_token.clone(),
            credentials.oauth_access_token_secret.clone(),
        )
    }

    /// `Authorization` header value with a fresh nonce and the current time.
    /// `body_params` are form-encoded body parameters; JSON bodies pass none.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        body_params: &[(&str, &str)],
    ) -> Result<String> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| BotError::SigningError {
                message: e.to_string(),
            })?
            .as_secs()
            .to_string();
        self.authorization_header_with(method, url, body_params, &generate_nonce(), &timestamp)
    }

    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        body_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let oauth_params = self.oauth_params(nonce, timestamp);
        let signature = self.signature(method, url, &oauth_params, body_params)?;

        let mut header_params = oauth_params;
        header_params.push(("oauth_signature".to_string(), signature));

        let fields: Vec<String> = header_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }

    fn oauth_params(&self, nonce: &str, timestamp: &str) -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.token.clone()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ]
    }

    fn signature(
        &self,
        method: &str,
        url: &str,
        oauth_params: &[(String, String)],
        body_params: &[(&str, &str)],
    ) -> Result<String> {
        let base = signature_base_string(method, url, oauth_params, body_params)?;
        let key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(&self.token_secret)
        );
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
        let tag = hmac::sign(&key, base.as_bytes());
        Ok(base64::engine::general_purpose::STANDARD.encode(tag.as_ref()))
    }
}

impl std::fmt::Debug for OAuth1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Signer")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

/// `METHOD&enc(base_url)&enc(sorted params)`; query parameters of `url` are included.
pub fn signature_base_string(
    method: &str,
    url: &str,
    oauth_params: &[(String, String)],
    body_params: &[(&str, &str)],
) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| BotError::SigningError {
        message: format!("invalid URL {}: {}", url, e),
    })?;

    let mut params: Vec<(String, String)> = oauth_params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .chain(
            parsed
                .query_pairs()
                .map(|(k, v)| (percent_encode(&k), percent_encode(&v))),
        )
        .chain(
            body_params
                .iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(v))),
        )
        .collect();
    params.sort();

    let param_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut base_url = parsed;
    base_url.set_query(None);
    base_url.set_fragment(None);

    Ok(format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(base_url.as_str()),
        percent_encode(&param_string)
    ))
}

/// RFC 3986 encoding: everything but `A-Z a-z 0-9 - . _ ~` becomes `%XX`.
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
