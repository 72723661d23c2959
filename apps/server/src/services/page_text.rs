//! Visible text of a company website
//!
//! Used as extra context for summary generation. Only the text content of the
//! landing page is taken; `script`/`style` bodies and similar non-rendered
//! elements are skipped.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{node::Node, ElementRef, Html};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::EnrichmentConfig;

/// Elements whose text is never rendered.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Error, Debug)]
pub enum PageFetchError {
    #[error("Invalid website URL '{0}'")]
    InvalidUrl(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Website returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait PageTextSource: Send + Sync {
    /// Visible text of `website`, at most the configured number of characters.
    async fn fetch_text(&self, website: &str) -> Result<String, PageFetchError>;
}

/// Add a scheme when missing, drop the fragment and any trailing slash.
pub fn normalize_url(raw: &str) -> Result<Url, PageFetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PageFetchError::InvalidUrl(raw.to_string()));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url =
        Url::parse(&with_scheme).map_err(|_| PageFetchError::InvalidUrl(raw.to_string()))?;
    if url.host_str().is_none() {
        return Err(PageFetchError::InvalidUrl(raw.to_string()));
    }
    url.set_fragment(None);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Ok(url)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_elem) = ElementRef::wrap(child) {
                    collect_text(child_elem, out);
                }
            }
            _ => {}
        }
    }
}

/// Whitespace-collapsed visible text of `html`, truncated to `max_chars`.
pub fn visible_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}

#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
    max_chars: usize,
}

impl HttpPageFetcher {
    pub fn new(config: &EnrichmentConfig) -> Result<Self, PageFetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            max_chars: config.max_page_text_chars,
        })
    }
}

#[async_trait]
impl PageTextSource for HttpPageFetcher {
    async fn fetch_text(&self, website: &str) -> Result<String, PageFetchError> {
        let url = normalize_url(website)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PageFetchError::Status(response.status().as_u16()));
        }

        let html = response.text().await?;
        Ok(visible_text(&html, self.max_chars))
    }
}
