//! Sheet link resolution.
//!
//! Mon rows carry whatever link the sheet editor pasted: a direct export link,
//! an edit/share link, a "publish to web" link, or a shortened redirect. This
//! module turns those into one canonical CSV export URL.
//!
//! Each hosting convention is a [`SheetLink`] variant. Resolution walks
//! [`LINK_PATTERNS`] in order and the first variant that recognizes the link
//! builds the export URL. Links nothing recognizes are followed through their
//! redirect chain once, and the final URL is matched against
//! [`REDIRECT_PATTERNS`].

use tracing::{debug, warn};

use crate::fetch::SheetFetcher;

// ============================================================================
// Constants
// ============================================================================

const SHEETS_DOC_PREFIX: &str = "docs.google.com/spreadsheets/d/";
const SHEETS_PUB_PREFIX: &str = "docs.google.com/spreadsheets/d/e/";
const RENDER_PROXY_HOST: &str = "googleusercontent.com/";
const RENDER_PROXY_EXPORT: &str = "/export/";

/// Shortest path segment accepted as a document token in render-proxy links.
const MIN_PROXY_TOKEN_LEN: usize = 40;

/// Sheet tab used when the link does not name one.
pub const DEFAULT_GID: &str = "0";

/// A known spreadsheet hosting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetLink {
    /// `*.googleusercontent.com/export/...` link with the document token late in the path.
    RenderProxy,
    /// `docs.google.com/spreadsheets/d/<document id>/...`
    Document,
    /// `docs.google.com/spreadsheets/d/e/<publication id>/...`
    Published,
}

/// Conventions tried against a pasted link, highest priority first.
pub const LINK_PATTERNS: [SheetLink; 3] =
    [SheetLink::RenderProxy, SheetLink::Document, SheetLink::Published];

/// Conventions tried against the final URL of a followed redirect chain.
pub const REDIRECT_PATTERNS: [SheetLink; 2] = [SheetLink::Document, SheetLink::Published];

impl SheetLink {
    /// Extract the dataset identifier this convention recognizes in `link`.
    pub fn capture(self, link: &str) -> Option<String> {
        match self {
            SheetLink::RenderProxy => capture_proxy_token(link),
            SheetLink::Document => {
                let id = capture_after(link, SHEETS_DOC_PREFIX)?;
                // `/d/e/...` belongs to the published convention
                (id != "e").then_some(id)
            }
            SheetLink::Published => capture_after(link, SHEETS_PUB_PREFIX),
        }
    }

    /// Build the CSV export URL for a captured identifier and sheet tab.
    pub fn export_url(self, id: &str, gid: &str) -> String {
        match self {
            SheetLink::RenderProxy => format!(
                "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
                id, gid
            ),
            SheetLink::Document => format!(
                "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:csv&gid={}",
                id, gid
            ),
            SheetLink::Published => format!(
                "https://docs.google.com/spreadsheets/d/e/{}/pub?gid={}&single=true&output=csv",
                id, gid
            ),
        }
    }

    /// Capture and build in one step.
    pub fn canonicalize(self, link: &str) -> Option<String> {
        self.capture(link)
            .map(|id| self.export_url(&id, &sheet_gid(link)))
    }
}

/// Apply `patterns` in order; first match wins.
pub fn match_patterns(link: &str, patterns: &[SheetLink]) -> Option<String> {
    patterns.iter().find_map(|pattern| pattern.canonicalize(link))
}

/// Resolve a pasted link to a canonical CSV export URL.
///
/// Returns `None` for blank links and for links that stay unrecognized after
/// following redirects. Network failures during the redirect fallback are
/// logged and also yield `None`.
pub async fn resolve_link(raw: &str, fetcher: &dyn SheetFetcher) -> Option<String> {
    let link = raw.trim().trim_matches('"').trim();
    if link.is_empty() {
        return None;
    }

    if let Some(url) = match_patterns(link, &LINK_PATTERNS) {
        debug!(link = link, url = %url, "Resolved sheet link");
        return Some(url);
    }

    if !is_http_url(link) {
        debug!(link = link, "Sheet link is not a URL");
        return None;
    }

    match fetcher.follow_redirects(link).await {
        Ok(final_url) => {
            let resolved = match_patterns(&final_url, &REDIRECT_PATTERNS);
            if resolved.is_none() {
                warn!(
                    link = link,
                    final_url = %final_url,
                    "Redirect target is not a known sheet link"
                );
            }
            resolved
        }
        Err(e) => {
            warn!(link = link, error = %e, "Failed to follow sheet link");
            None
        }
    }
}

/// Sheet tab id from a `gid=` query or fragment parameter.
pub fn sheet_gid(link: &str) -> String {
    for (idx, _) in link.match_indices("gid=") {
        let preceded_ok = link[..idx]
            .chars()
            .last()
            .is_some_and(|c| matches!(c, '?' | '&' | '#'));
        if !preceded_ok {
            continue;
        }
        let digits: String = link[idx + 4..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            return digits;
        }
    }
    DEFAULT_GID.to_string()
}

fn is_http_url(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Identifier characters immediately following `prefix`.
fn capture_after(link: &str, prefix: &str) -> Option<String> {
    let start = link.find(prefix)? + prefix.len();
    let id: String = link[start..].chars().take_while(|&c| is_id_char(c)).collect();
    (!id.is_empty()).then_some(id)
}

/// The last long identifier-like path segment after `/export/`.
fn capture_proxy_token(link: &str) -> Option<String> {
    let host_at = link.find(RENDER_PROXY_HOST)?;
    let after_host = &link[host_at..];
    let export_at = after_host.find(RENDER_PROXY_EXPORT)?;
    let path = &after_host[export_at + RENDER_PROXY_EXPORT.len()..];
    let path = path.split(['?', '#']).next().unwrap_or_default();

    path.split('/')
        .rev()
        .find(|segment| segment.len() >= MIN_PROXY_TOKEN_LEN && segment.chars().all(is_id_char))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DexError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DOC_ID: &str = "1qa13OkWHd2Am1QPsy6UC41OMDwjp6E_bMQ5usTaylFs";

    struct RedirectStub {
        target: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SheetFetcher for RedirectStub {
        async fn fetch_text(&self, _url: &str) -> Result<String, DexError> {
            Ok(String::new())
        }

        async fn follow_redirects(&self, _url: &str) -> Result<String, DexError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.target
                .clone()
                .ok_or_else(|| DexError::from_status(502, "bad gateway"))
        }
    }

    fn stub(target: Option<&str>) -> RedirectStub {
        RedirectStub {
            target: target.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_document_link() {
        let link = format!("https://docs.google.com/spreadsheets/d/{}/edit#gid=123", DOC_ID);
        assert_eq!(
            match_patterns(&link, &LINK_PATTERNS),
            Some(format!(
                "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:csv&gid=123",
                DOC_ID
            ))
        );
    }

    #[test]
    fn test_document_link_default_gid() {
        let link = format!("https://docs.google.com/spreadsheets/d/{}/edit?usp=sharing", DOC_ID);
        let url = match_patterns(&link, &LINK_PATTERNS).unwrap();
        assert!(url.ends_with("&gid=0"));
    }

    #[test]
    fn test_published_link_not_taken_as_document() {
        let link = "https://docs.google.com/spreadsheets/d/e/2PACX-1vAbC_dEf/pubhtml?gid=7";
        assert_eq!(SheetLink::Document.capture(link), None);
        assert_eq!(
            match_patterns(link, &LINK_PATTERNS).as_deref(),
            Some("https://docs.google.com/spreadsheets/d/e/2PACX-1vAbC_dEf/pub?gid=7&single=true&output=csv")
        );
    }

    #[test]
    fn test_render_proxy_link() {
        let link = format!(
            "https://doc-0s-2c-sheets.googleusercontent.com/export/l5l039s6ni/tmp3ms3r0a9/1678900000000/{}?format=csv&gid=5",
            DOC_ID
        );
        assert_eq!(SheetLink::RenderProxy.capture(&link).as_deref(), Some(DOC_ID));
        assert_eq!(
            match_patterns(&link, &LINK_PATTERNS),
            Some(format!(
                "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid=5",
                DOC_ID
            ))
        );
    }

    #[test]
    fn test_render_proxy_without_long_token() {
        let link = "https://doc-0s-2c-sheets.googleusercontent.com/export/short/tokens/only";
        assert_eq!(SheetLink::RenderProxy.capture(link), None);
    }

    #[test]
    fn test_sheet_gid() {
        assert_eq!(sheet_gid("https://x/edit#gid=42"), "42");
        assert_eq!(sheet_gid("https://x/export?format=csv&gid=9"), "9");
        assert_eq!(sheet_gid("https://x/edit?gridgid=3"), "0");
        assert_eq!(sheet_gid("https://x/edit"), "0");
    }

    #[tokio::test]
    async fn test_resolve_blank_link() {
        let fetcher = stub(None);
        assert_eq!(resolve_link("   ", &fetcher).await, None);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_direct_match_skips_network() {
        let fetcher = stub(None);
        let link = format!("https://docs.google.com/spreadsheets/d/{}/edit", DOC_ID);
        assert!(resolve_link(&link, &fetcher).await.is_some());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_follows_redirect() {
        let target = format!("https://docs.google.com/spreadsheets/d/{}/edit#gid=11", DOC_ID);
        let fetcher = stub(Some(&target));
        let url = resolve_link("https://bit.ly/mon-moves", &fetcher).await;
        assert_eq!(
            url,
            Some(format!(
                "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:csv&gid=11",
                DOC_ID
            ))
        );
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_redirect_to_unknown_host() {
        let fetcher = stub(Some("https://example.com/landing"));
        assert_eq!(resolve_link("https://bit.ly/nope", &fetcher).await, None);
    }

    #[tokio::test]
    async fn test_resolve_redirect_failure_is_unresolved() {
        let fetcher = stub(None);
        assert_eq!(resolve_link("https://bit.ly/down", &fetcher).await, None);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_plain_text_is_unresolved() {
        let fetcher = stub(None);
        assert_eq!(resolve_link("see moves tab", &fetcher).await, None);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
