use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use crate::page::PAGE_SIZE;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`BooksConfig`].
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BooksConfigBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl BooksConfigBuilder {
    /// Creates a builder with default settings. The public API works
    /// without a key, with a lower quota.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom base URL, the part in front of `/volumes`.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the API key sent as the `key` parameter.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the per-request timeout. Defaults to 30 seconds.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> BooksConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        BooksConfig {
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: self.api_key.filter(|key| !key.is_empty()),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

impl Debug for BooksConfigBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooksConfigBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration for [`BooksClient`](crate::BooksClient).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BooksConfig {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl BooksConfig {
    /// Returns the per-request timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `query` must already be percent-encoded.
    pub(crate) fn search_url(&self, query: &str, offset: u32) -> String {
        let mut url = format!(
            "{}/volumes?q={query}&startIndex={offset}&maxResults={PAGE_SIZE}",
            self.base_url
        );
        self.push_key(&mut url, '&');
        url
    }

    pub(crate) fn detail_url(&self, book_id: &str) -> String {
        let mut url = format!(
            "{}/volumes/{}",
            self.base_url,
            urlencoding::encode(book_id)
        );
        self.push_key(&mut url, '?');
        url
    }

    fn push_key(&self, url: &mut String, separator: char) {
        if let Some(key) = &self.api_key {
            url.push(separator);
            url.push_str("key=");
            url.push_str(&urlencoding::encode(key));
        }
    }
}

impl Debug for BooksConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooksConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
