//! HTTP transport for sheet exports.
//!
//! The rest of the crate only sees the [`SheetFetcher`] capability, so caches
//! and the link resolver can be driven by an in-memory fetcher in tests.
//! [`HttpFetcher`] is the production implementation over `reqwest`.

pub mod client;

use async_trait::async_trait;

use crate::error::DexError;

pub use client::HttpFetcher;

/// Capability to GET sheet text and to follow a link's redirect chain.
#[async_trait]
pub trait SheetFetcher: Send + Sync {
    /// GET `url` and return the body as text. Non-2xx responses are errors.
    async fn fetch_text(&self, url: &str) -> Result<String, DexError>;

    /// Follow `url` through its redirects and return the final URL.
    async fn follow_redirects(&self, url: &str) -> Result<String, DexError>;
}
