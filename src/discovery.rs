//! Favicon discovery - best-effort icon lookup for a service URL.
//!
//! Ordered attempt chain, stop at first success:
//! 1. `GET <scheme>://<host>/favicon.ico` - accept any 200 with an image
//!    content-type.
//! 2. Fetch the page HTML and scan for `<link>` elements whose `rel`
//!    contains "icon" (matches `icon`, `shortcut icon`, `apple-touch-icon`).
//!    The last declared link wins; sites tend to declare the
//!    highest-resolution icon last.
//! 3. Give up.
//!
//! Every failure mode (network error, timeout, no links, bad href) yields
//! `None` - many sites simply have no discoverable icon, so discovery never
//! surfaces an error to the caller.
//!
//! Outbound requests skip TLS certificate verification by default: the
//! targets are typically self-signed internal services. This is a named,
//! deliberate trust trade-off (`DiscoveryOptions::accept_invalid_certs`),
//! not a hardcoded disablement.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::blob::TemporaryBlob;
use crate::{Error, Result};

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";
const FAVICON_TIMEOUT: Duration = Duration::from_secs(5);
const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").unwrap());
static REL_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\brel\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap()
});
static HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap()
});

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Accept self-signed certificates on outbound fetches.
    pub accept_invalid_certs: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self { accept_invalid_certs: true }
    }
}

/// Icon discovery service. Holds one long-lived HTTP client shared by all
/// requests; per-request timeouts are the only blocking bound.
pub struct IconDiscovery {
    client: reqwest::Client,
    scratch_dir: PathBuf,
}

impl IconDiscovery {
    pub fn new(scratch_dir: PathBuf, options: DiscoveryOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_UA)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Upstream(e.to_string()))?;
        Ok(Self { client, scratch_dir })
    }

    /// Attempt to locate and download a usable icon for `page_url`.
    pub async fn discover(&self, page_url: &str) -> Option<TemporaryBlob> {
        let page = match Url::parse(page_url) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!("not a fetchable URL ({page_url}): {e}");
                return None;
            }
        };

        if let Some(blob) = self.probe_favicon_ico(&page).await {
            return Some(blob);
        }
        self.fetch_declared_icon(&page).await
    }

    /// Step 1: direct `/favicon.ico` probe at the site root.
    async fn probe_favicon_ico(&self, page: &Url) -> Option<TemporaryBlob> {
        let mut favicon = page.clone();
        favicon.set_path("/favicon.ico");
        favicon.set_query(None);
        favicon.set_fragment(None);

        let response = self
            .client
            .get(favicon.clone())
            .timeout(FAVICON_TIMEOUT)
            .send()
            .await
            .ok()?;
        if response.status() != reqwest::StatusCode::OK || !is_image(&response) {
            return None;
        }
        let bytes = response.bytes().await.ok()?;
        let blob = TemporaryBlob::from_bytes(&self.scratch_dir, ".ico", &bytes).ok()?;
        tracing::debug!("found favicon.ico for {page}");
        Some(blob)
    }

    /// Steps 2-6: fetch the page, pick the last `<link rel*=icon>`, fetch it.
    async fn fetch_declared_icon(&self, page: &Url) -> Option<TemporaryBlob> {
        let response = self
            .client
            .get(page.clone())
            .timeout(PAGE_TIMEOUT)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        let html = response.text().await.ok()?;

        let href = extract_icon_href(&html)?;
        // Handles relative, protocol-relative, and absolute hrefs.
        let icon_url = page.join(&href).ok()?;

        let response = self
            .client
            .get(icon_url.clone())
            .timeout(PAGE_TIMEOUT)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        let bytes = response.bytes().await.ok()?;

        let ext = extension_from_url(&icon_url);
        let blob = TemporaryBlob::from_bytes(&self.scratch_dir, &ext, &bytes).ok()?;
        tracing::debug!("found declared icon {icon_url} for {page}");
        Some(blob)
    }
}

fn is_image(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("image"))
        .unwrap_or(false)
}

/// Scan HTML for `<link>` tags whose `rel` contains "icon" and return the
/// `href` of the last match in document order. The last match is the only
/// candidate: when it carries no usable href, discovery fails rather than
/// falling back to an earlier link.
pub fn extract_icon_href(html: &str) -> Option<String> {
    let mut last_icon_tag = None;
    for tag in LINK_TAG.find_iter(html) {
        let tag = tag.as_str();
        let rel = match attr_value(&REL_ATTR, tag) {
            Some(rel) => rel,
            None => continue,
        };
        if rel.to_ascii_lowercase().contains("icon") {
            last_icon_tag = Some(tag);
        }
    }
    attr_value(&HREF_ATTR, last_icon_tag?).filter(|href| !href.is_empty())
}

fn attr_value(pattern: &Regex, tag: &str) -> Option<String> {
    let caps = pattern.captures(tag)?;
    let value = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?;
    Some(value.as_str().to_string())
}

/// Derive a dotted extension from the URL's path component, `.png` if none.
pub fn extension_from_url(url: &Url) -> String {
    std::path::Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| ".png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_icon_link_wins() {
        let html = r#"
            <head>
              <link rel="icon" href="/favicon-16.png">
              <link rel="stylesheet" href="/style.css">
              <link rel="apple-touch-icon" href="/touch-180.png">
            </head>"#;
        assert_eq!(extract_icon_href(html).as_deref(), Some("/touch-180.png"));
    }

    #[test]
    fn test_rel_match_is_case_insensitive_substring() {
        let html = r#"<LINK REL="Shortcut Icon" HREF="fav.ico">"#;
        assert_eq!(extract_icon_href(html).as_deref(), Some("fav.ico"));
    }

    #[test]
    fn test_unquoted_attributes() {
        let html = "<link rel=icon href=/fav.svg>";
        assert_eq!(extract_icon_href(html).as_deref(), Some("/fav.svg"));
    }

    #[test]
    fn test_no_icon_links() {
        let html = r#"<link rel="stylesheet" href="/style.css"><p>hello</p>"#;
        assert_eq!(extract_icon_href(html), None);
    }

    #[test]
    fn test_last_icon_link_without_href_fails() {
        // An earlier link with an href is not a fallback: only the last
        // rel-matching link counts.
        let html = r#"<link rel="icon" href="/early.png"><link rel="apple-touch-icon">"#;
        assert_eq!(extract_icon_href(html), None);

        let html = r#"<link rel="icon"><link rel="icon" href="/a.png">"#;
        assert_eq!(extract_icon_href(html).as_deref(), Some("/a.png"));

        let html = r#"<link rel="icon" href="/a.png"><link rel="icon" href="">"#;
        assert_eq!(extract_icon_href(html), None);
    }

    #[test]
    fn test_extension_from_url() {
        let url = Url::parse("https://example.com/static/icon.svg?v=2").unwrap();
        assert_eq!(extension_from_url(&url), ".svg");

        let url = Url::parse("https://example.com/icon").unwrap();
        assert_eq!(extension_from_url(&url), ".png");
    }

    #[test]
    fn test_href_resolution_forms() {
        let base = Url::parse("https://example.com/app/index.html").unwrap();
        assert_eq!(
            base.join("fav.ico").unwrap().as_str(),
            "https://example.com/app/fav.ico"
        );
        assert_eq!(
            base.join("/fav.ico").unwrap().as_str(),
            "https://example.com/fav.ico"
        );
        assert_eq!(
            base.join("//cdn.example.net/fav.ico").unwrap().as_str(),
            "https://cdn.example.net/fav.ico"
        );
    }
}
