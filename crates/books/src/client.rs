use std::sync::Arc;

use reqwest::{Client, Response};

use crate::config::BooksConfig;
use crate::error::{Error, describe};
use crate::page::align_offset;
use crate::query::SearchParameters;
use crate::volume::{BookDetail, SearchPage, VolumeResponse, VolumesResponse};

/// A client for the `volumes` endpoints.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct BooksClient {
    client: Client,
    config: Arc<BooksConfig>,
}

impl BooksClient {
    /// Creates a client whose requests time out after the configured
    /// duration.
    pub fn new(config: BooksConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| Error::Setup(err.to_string()))?;
        Ok(Self::with_http_client(config, client))
    }

    /// Creates a client on top of an existing HTTP client. The timeout in
    /// `config` is applied to every request.
    pub fn with_http_client(config: BooksConfig, client: Client) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Fetches the page starting at `offset`, rounded down to a page
    /// boundary.
    ///
    /// Parameters with no usable field produce an empty page without
    /// contacting the API.
    pub async fn search(
        &self,
        params: &SearchParameters,
        offset: u32,
    ) -> Result<SearchPage, Error> {
        let offset = align_offset(offset);
        if params.is_empty() {
            debug!("empty search parameters, skipping the request");
            return Ok(SearchPage::empty(offset));
        }

        let url = self.config.search_url(&params.query_string(), offset);
        debug!("searching books: {url}");
        let response = self
            .get(&url)
            .await
            .map_err(|err| Error::SearchUnavailable(describe(&err)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| Error::SearchUnavailable(describe(&err)))?;
        let resp: VolumesResponse = serde_json::from_str(&text)
            .map_err(|err| {
                warn!("malformed search response: {err}");
                Error::SearchUnavailable(format!("malformed response: {err}"))
            })?;
        if let Some(err) = &resp.error {
            return Err(Error::SearchUnavailable(err.describe()));
        }
        if !status.is_success() {
            return Err(Error::SearchUnavailable(format!("HTTP {status}")));
        }

        let page = resp.into_page(offset);
        debug!(
            "got {} of {} results at offset {offset}",
            page.items.len(),
            page.total_count
        );
        Ok(page)
    }

    /// Fetches the full record of one volume.
    pub async fn detail(&self, book_id: &str) -> Result<BookDetail, Error> {
        let book_id = book_id.trim();
        if book_id.is_empty() {
            return Err(Error::EmptyBookId);
        }

        let url = self.config.detail_url(book_id);
        debug!("looking up book: {url}");
        let response = self
            .get(&url)
            .await
            .map_err(|err| Error::DetailUnavailable(describe(&err)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| Error::DetailUnavailable(describe(&err)))?;
        let resp: VolumeResponse = serde_json::from_str(&text)
            .map_err(|err| {
                warn!("malformed detail response: {err}");
                Error::DetailUnavailable(format!("malformed response: {err}"))
            })?;
        if let Some(err) = resp.error {
            return Err(Error::DetailNotFound(err.describe()));
        }
        if !status.is_success() {
            return Err(Error::DetailUnavailable(format!("HTTP {status}")));
        }
        let Some(info) = resp.volume_info else {
            return Err(Error::DetailUnavailable(
                "response has no volume information".to_owned(),
            ));
        };

        let id = resp.id.unwrap_or_else(|| book_id.to_owned());
        Ok(info.into_detail(id))
    }

    async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(url)
            .timeout(self.config.timeout())
            .send()
            .await
    }
}
