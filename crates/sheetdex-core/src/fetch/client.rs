//! `reqwest`-backed fetcher for published sheet exports.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, Client};
use tracing::debug;

use super::SheetFetcher;
use crate::error::DexError;

// ============================================================================
// Constants
// ============================================================================

/// Generic browser identification; some share links only redirect for browsers.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Maximum number of redirects followed when resolving a share link.
const MAX_REDIRECTS: usize = 10;

/// HTTP fetcher with bounded timeouts.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    redirect_client: Client,
}

impl HttpFetcher {
    /// Create a fetcher. `timeout` bounds sheet downloads, `redirect_timeout`
    /// bounds share-link resolution.
    pub fn new(timeout: Duration, redirect_timeout: Duration) -> Result<Self, DexError> {
        let client = Client::builder().timeout(timeout).build()?;

        let redirect_client = Client::builder()
            .timeout(redirect_timeout)
            .user_agent(BROWSER_USER_AGENT)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            redirect_client,
        })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, DexError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DexError::from_status(status.as_u16(), &body))
        }
    }
}

#[async_trait]
impl SheetFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, DexError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/csv, text/plain;q=0.9, */*;q=0.1")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        debug!(url = url, bytes = text.len(), "Fetched sheet export");
        Ok(text)
    }

    async fn follow_redirects(&self, url: &str) -> Result<String, DexError> {
        let response = self.redirect_client.get(url).send().await?;
        let final_url = response.url().to_string();
        debug!(from = url, to = %final_url, status = %response.status(), "Followed share link");
        Ok(final_url)
    }
}
