//! HTTP client for the Discogs collection API.

use super::models::{CollectionPage, CollectionRecord};
use futures::future::try_join_all;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Releases requested per page; the maximum Discogs allows.
pub const PER_PAGE: u32 = 100;

/// Default Discogs API location.
pub const DEFAULT_DISCOGS_URL: &str = "https://api.discogs.com";

const USER_AGENT: &str = concat!("vinyl-color-enricher/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while fetching the collection.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Connection error fetching {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

/// Result of a collection fetch.
#[derive(Debug, Clone)]
pub struct FetchedCollection {
    /// Total number of pages the API reported.
    pub total_pages: u32,
    /// Number of pages actually fetched.
    pub fetched_pages: u32,
    pub releases: Vec<CollectionRecord>,
}

/// HTTP client for a single user's Discogs collection.
pub struct DiscogsClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    token: String,
}

impl DiscogsClient {
    /// Create a new Discogs client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the API (e.g., "https://api.discogs.com")
    /// * `username` - Owner of the collection
    /// * `token` - Personal access token
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
        timeout_sec: u64,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            token: token.into(),
        })
    }

    fn page_url(&self, page: u32) -> String {
        format!(
            "{}/users/{}/collection/folders/0/releases?per_page={}&page={}",
            self.base_url,
            urlencoding::encode(&self.username),
            PER_PAGE,
            page
        )
    }

    /// Fetch one page of the collection.
    pub async fn fetch_page(&self, page: u32) -> Result<CollectionPage, FetchError> {
        let url = self.page_url(page);
        debug!(url = %url, "Fetching collection page");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Discogs token={}", self.token))
            .send()
            .await
            .map_err(|e| FetchError::Connection {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse {
                url,
                message: e.to_string(),
            })
    }

    /// Fetch the collection.
    ///
    /// The first page is always fetched. When `all_pages` is set the remaining
    /// pages are requested concurrently and any failure aborts the fetch.
    /// Releases are returned in page order.
    pub async fn fetch_collection(&self, all_pages: bool) -> Result<FetchedCollection, FetchError> {
        let first_page = self.fetch_page(1).await?;
        let total_pages = first_page.pagination.pages.max(1);
        info!("Fetched the 1st page of {} pages", total_pages);

        let mut releases = first_page.releases;
        if !all_pages || total_pages == 1 {
            return Ok(FetchedCollection {
                total_pages,
                fetched_pages: 1,
                releases,
            });
        }

        let next_pages = try_join_all((2..=total_pages).map(|page| self.fetch_page(page))).await?;
        for page in next_pages {
            releases.extend(page.releases);
        }

        info!(
            pages = total_pages,
            releases = releases.len(),
            "Fetched full collection"
        );

        Ok(FetchedCollection {
            total_pages,
            fetched_pages: total_pages,
            releases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn page_body(page: u32, pages: u32, ids: &[i64]) -> String {
        json!({
            "pagination": {"page": page, "pages": pages, "per_page": 100, "items": ids.len()},
            "releases": ids.iter().map(|id| json!({
                "id": id,
                "basic_information": {"formats": [{"name": "Vinyl", "text": format!("Color {}", id)}]}
            })).collect::<Vec<_>>()
        })
        .to_string()
    }

    fn page_query(page: u32) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "100".into()),
            Matcher::UrlEncoded("page".into(), page.to_string()),
        ])
    }

    #[test]
    fn test_page_url_encodes_username() {
        let client = DiscogsClient::new("https://api.discogs.com/", "dj shadow", "t", 5).unwrap();
        assert_eq!(
            client.page_url(3),
            "https://api.discogs.com/users/dj%20shadow/collection/folders/0/releases?per_page=100&page=3"
        );
    }

    #[tokio::test]
    async fn test_fetch_all_pages_in_order() {
        let mut server = mockito::Server::new_async().await;
        let path = "/users/digger/collection/folders/0/releases";
        let first = server
            .mock("GET", path)
            .match_query(page_query(1))
            .match_header("authorization", "Discogs token=secret")
            .with_status(200)
            .with_body(page_body(1, 3, &[1, 2]))
            .create_async()
            .await;
        let second = server
            .mock("GET", path)
            .match_query(page_query(2))
            .with_status(200)
            .with_body(page_body(2, 3, &[3]))
            .create_async()
            .await;
        let third = server
            .mock("GET", path)
            .match_query(page_query(3))
            .with_status(200)
            .with_body(page_body(3, 3, &[4, 5]))
            .create_async()
            .await;

        let client = DiscogsClient::new(server.url(), "digger", "secret", 5).unwrap();
        let fetched = client.fetch_collection(true).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
        assert_eq!(fetched.total_pages, 3);
        assert_eq!(fetched.fetched_pages, 3);
        let ids: Vec<String> = fetched
            .releases
            .iter()
            .map(|r| r.id.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn test_first_page_only() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/users/digger/collection/folders/0/releases")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(page_body(1, 4, &[1]))
            .create_async()
            .await;

        let client = DiscogsClient::new(server.url(), "digger", "secret", 5).unwrap();
        let fetched = client.fetch_collection(false).await.unwrap();
        assert_eq!(fetched.total_pages, 4);
        assert_eq!(fetched.fetched_pages, 1);
        assert_eq!(fetched.releases.len(), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/users/digger/collection/folders/0/releases")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let client = DiscogsClient::new(server.url(), "digger", "bad", 5).unwrap();
        let err = client.fetch_collection(true).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 401, .. }));
    }
}
