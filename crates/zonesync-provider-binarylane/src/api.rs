// # BinaryLane API client
//
// The provider talks to BinaryLane through the [`RecordApi`] trait so the
// planner and the provider can be tested against an in-memory fake.
//
// ## Behaviour
//
// - One HTTP request per call, plus one per extra page on list endpoints
// - List endpoints follow `links.pages.next` until the collection is complete
// - Non-2xx statuses become `Error::Transport`, never retried here
// - HTTP timeout of 30 seconds
//
// ## Security
//
// - The API token never appears in logs, errors or `Debug` output
//
// ## API Reference
//
// - BinaryLane API v2: https://api.binarylane.com.au/reference/
// - List records: GET `/domains/:zone/records`
// - Create record: POST `/domains/:zone/records`
// - Update record: PUT `/domains/:zone/records/:id`
// - Delete record: DELETE `/domains/:zone/records/:id`
// - List zones: GET `/domains`
// - Nameservers: GET `/domain/:zone`

use crate::native::{
    DomainsPage, ErrorBody, NameserversResponse, NativeRecord, RecordParams, RecordsPage,
    next_page,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use zonesync_core::error::{Error, Result};
use zonesync_core::existing::RecordId;

/// BinaryLane API base URL
pub const BINARYLANE_API_BASE: &str = "https://api.binarylane.com.au/v2";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote record store the provider reads from and mutates
///
/// Implementations return complete collections: paging is their concern.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Every record of a zone
    async fn fetch_records(&self, zone: &str) -> Result<Vec<NativeRecord>>;

    /// Create a record
    async fn create_record(&self, zone: &str, params: &RecordParams) -> Result<()>;

    /// Replace the record with the given id
    async fn update_record(&self, zone: &str, id: RecordId, params: &RecordParams) -> Result<()>;

    /// Delete the record with the given id
    async fn delete_record(&self, zone: &str, id: RecordId) -> Result<()>;

    /// Every zone on the account, sorted
    async fn list_zones(&self) -> Result<Vec<String>>;

    /// Nameservers of a zone, sorted, without trailing dots
    async fn fetch_nameservers(&self, zone: &str) -> Result<Vec<String>>;
}

/// Failures talking to the BinaryLane API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("binarylane API error: {message} ({status}) URL: {url}")]
    Status {
        status: StatusCode,
        message: String,
        url: String,
    },

    #[error("Refusing to follow next page {url} outside {base_url}")]
    ForeignPage { url: String, base_url: String },

    #[error("Failed to parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::transport(err.to_string())
    }
}

/// Describe a non-2xx status, using the API's error body when it has one
fn status_message(status: StatusCode, body: &str) -> String {
    let detail = match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) if !err.detail.is_empty() => format!("{}: {}", err.title, err.detail),
        Ok(err) if !err.title.is_empty() => err.title,
        _ => body.trim().to_string(),
    };

    match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: Invalid API token or insufficient permissions. {}",
            detail
        ),
        404 => format!("Not found. {}", detail),
        429 => format!("Rate limit exceeded. {}", detail),
        500..=599 => format!("BinaryLane server error (transient). {}", detail),
        _ => detail,
    }
}

/// reqwest-backed [`RecordApi`]
pub struct HttpClient {
    /// BinaryLane API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL, without trailing slash
    base_url: String,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpClient {
    /// Create a client
    ///
    /// # Parameters
    ///
    /// - `api_token`: BinaryLane API token
    /// - `base_url`: API base URL override, [`BINARYLANE_API_BASE`] if `None`
    pub fn new(api_token: impl Into<String>, base_url: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("BinaryLane API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::provider("binarylane", format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .as_deref()
            .unwrap_or(BINARYLANE_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_token,
            base_url,
            client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send a request and return the body of a 2xx response
    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> std::result::Result<String, ApiError> {
        let response = request.bearer_auth(&self.api_token).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: status_message(status, &body),
                url: url.to_string(),
            });
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, ApiError> {
        debug!("GET {}", url);
        let body = self.send(self.client.get(url), url).await?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch every page of a list endpoint starting at `first`
    async fn get_all_pages<P, T>(
        &self,
        first: String,
        split: impl Fn(P) -> (Vec<T>, Option<String>),
    ) -> std::result::Result<Vec<T>, ApiError>
    where
        P: DeserializeOwned,
    {
        collect_pages(
            &self.base_url,
            first,
            move |url: String| async move { self.get_json::<P>(&url).await },
            split,
        )
        .await
    }
}

/// Follow `links.pages.next` from `first` until the last page
///
/// `fetch` loads one page and `split` takes it apart into its items and the
/// next page URL. The walk ends on a page without `next` or on a `next` that
/// was already fetched. A `next` outside `base_url` is an error: the request
/// would carry the API token.
async fn collect_pages<P, T, F, Fut>(
    base_url: &str,
    first: String,
    mut fetch: F,
    split: impl Fn(P) -> (Vec<T>, Option<String>),
) -> std::result::Result<Vec<T>, ApiError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = std::result::Result<P, ApiError>>,
{
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut url = first;

    loop {
        visited.insert(url.clone());
        let page = fetch(url.clone()).await?;
        let (mut batch, next) = split(page);
        items.append(&mut batch);

        match next {
            Some(next) if visited.contains(&next) => {
                debug!("Next page {} already fetched, stopping", next);
                break;
            }
            Some(next) if !within_base(base_url, &next) => {
                return Err(ApiError::ForeignPage {
                    url: next,
                    base_url: base_url.to_string(),
                });
            }
            Some(next) => url = next,
            None => break,
        }
    }

    Ok(items)
}

/// True if `url` is `base_url` or a path or query below it
fn within_base(base_url: &str, url: &str) -> bool {
    match url.strip_prefix(base_url) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

#[async_trait]
impl RecordApi for HttpClient {
    async fn fetch_records(&self, zone: &str) -> Result<Vec<NativeRecord>> {
        let records = self
            .get_all_pages(self.url(&format!("/domains/{}/records", zone)), |page: RecordsPage| {
                let next = next_page(&page.links).map(str::to_string);
                (page.domain_records, next)
            })
            .await?;

        debug!("Fetched {} record(s) for {}", records.len(), zone);
        Ok(records)
    }

    async fn create_record(&self, zone: &str, params: &RecordParams) -> Result<()> {
        let url = self.url(&format!("/domains/{}/records", zone));
        debug!("POST {}", url);
        self.send(self.client.post(&url).json(params), &url)
            .await
            .map_err(|e| Error::transport(format!("failed create record (binarylane): {}", e)))?;
        Ok(())
    }

    async fn update_record(&self, zone: &str, id: RecordId, params: &RecordParams) -> Result<()> {
        let url = self.url(&format!("/domains/{}/records/{}", zone, id));
        debug!("PUT {}", url);
        self.send(self.client.put(&url).json(params), &url)
            .await
            .map_err(|e| Error::transport(format!("failed update record (binarylane): {}", e)))?;
        Ok(())
    }

    async fn delete_record(&self, zone: &str, id: RecordId) -> Result<()> {
        let url = self.url(&format!("/domains/{}/records/{}", zone, id));
        debug!("DELETE {}", url);
        self.send(self.client.delete(&url), &url)
            .await
            .map_err(|e| Error::transport(format!("failed delete record (binarylane): {}", e)))?;
        Ok(())
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        let mut zones = self
            .get_all_pages(self.url("/domains"), |page: DomainsPage| {
                let next = next_page(&page.links).map(str::to_string);
                let names = page.domains.into_iter().map(|d| d.name).collect();
                (names, next)
            })
            .await?;

        zones.sort();
        Ok(zones)
    }

    async fn fetch_nameservers(&self, zone: &str) -> Result<Vec<String>> {
        let response: NameserversResponse = self.get_json(&self.url(&format!("/domain/{}", zone))).await?;
        Ok(normalize_nameservers(response.current_nameservers))
    }
}

/// Strip one trailing dot from each nameserver and sort the result
///
/// BinaryLane reports some nameservers with a trailing dot and some without.
pub fn normalize_nameservers(nameservers: Vec<String>) -> Vec<String> {
    let mut nameservers: Vec<String> = nameservers
        .into_iter()
        .map(|ns| match ns.strip_suffix('.') {
            Some(stripped) => stripped.to_string(),
            None => ns,
        })
        .collect();
    nameservers.sort();
    nameservers
}
