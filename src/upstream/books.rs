//! Google Books lookup client

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    error::{AppError, AppResult},
    routes::metrics::record_upstream_call,
};

static NON_ISBN_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9Xx]").expect("valid ISBN regex"));

/// Search terms for a book lookup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
}

impl BookQuery {
    /// Volumes `q` parameter, `None` when nothing usable was given
    pub fn to_search(&self) -> Option<String> {
        if let Some(isbn) = self.isbn.as_deref().and_then(normalize_isbn) {
            return Some(format!("isbn:{}", isbn));
        }

        let mut terms = Vec::new();
        if let Some(title) = non_empty(&self.title) {
            terms.push(format!("intitle:{}", title));
        }
        if let Some(author) = non_empty(&self.author) {
            terms.push(format!("inauthor:{}", author));
        }
        (!terms.is_empty()).then(|| terms.join(" "))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Strip separators from an ISBN; `None` unless 10 or 13 characters remain
pub fn normalize_isbn(raw: &str) -> Option<String> {
    let cleaned = NON_ISBN_CHARS.replace_all(raw, "").to_uppercase();
    matches!(cleaned.len(), 10 | 13).then_some(cleaned)
}

const AMAZON_SEARCH_URL: &str = "https://www.amazon.com/s";

/// Amazon search link carrying the associate tag
pub fn affiliate_url(book: &BookInfo, tag: &str) -> AppResult<String> {
    let keywords = match &book.isbn {
        Some(isbn) => isbn.clone(),
        None => {
            let mut words = vec![book.title.clone()];
            words.extend(book.authors.iter().cloned());
            words.join(" ")
        }
    };
    let url = Url::parse_with_params(AMAZON_SEARCH_URL, &[("k", keywords.as_str()), ("tag", tag)])
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid affiliate URL: {}", e)))?;
    Ok(url.to_string())
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    page_count: Option<u32>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    image_links: Option<ImageLinks>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

/// Book metadata returned to the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookInfo {
    pub title: String,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub page_count: Option<u32>,
    pub categories: Vec<String>,
    pub thumbnail: Option<String>,
    pub isbn: Option<String>,
}

impl From<VolumeInfo> for BookInfo {
    fn from(info: VolumeInfo) -> Self {
        let isbn = info
            .industry_identifiers
            .iter()
            .find(|id| id.kind == "ISBN_13")
            .or_else(|| info.industry_identifiers.iter().find(|id| id.kind == "ISBN_10"))
            .map(|id| id.identifier.clone());

        Self {
            title: info.title,
            authors: info.authors,
            description: info.description,
            published_date: info.published_date,
            page_count: info.page_count,
            categories: info.categories,
            // Google serves http thumbnails; the app is https-only.
            thumbnail: info
                .image_links
                .and_then(|links| links.thumbnail)
                .map(|url| url.replacen("http://", "https://", 1)),
            isbn,
        }
    }
}

/// Google Books volumes client
pub struct BooksClient {
    client: reqwest::Client,
    base_url: String,
}

impl BooksClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// First volume matching the query
    #[instrument(skip(self))]
    pub async fn lookup(&self, search: &str) -> AppResult<Option<BookInfo>> {
        let url = format!("{}/volumes", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", search), ("maxResults", "1"), ("printType", "books")])
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Books API response status");

        if !status.is_success() {
            record_upstream_call("google_books", "error");
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Books lookup failed");
            return Err(AppError::UpstreamError(format!("Books API error {}", status)));
        }

        let body: VolumesResponse = response.json().await?;
        record_upstream_call("google_books", "success");

        Ok(body
            .items
            .into_iter()
            .next()
            .map(|volume| BookInfo::from(volume.volume_info)))
    }
}
