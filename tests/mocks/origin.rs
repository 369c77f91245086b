//! Mock web app origin
//!
//! Serves the app shell and static assets the offline worker caches. The
//! server is not pooled, so dropping it takes the origin offline.

use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Shell paths precached on install
pub const SHELL: &[(&str, &str, &str)] = &[
    ("/", "text/html", "<!doctype html><title>Love Beyond Borders</title>"),
    ("/index.html", "text/html", "<!doctype html><title>Love Beyond Borders</title>"),
    ("/offline.html", "text/html", "<!doctype html><h1>Offline page</h1>"),
    ("/manifest.json", "application/manifest+json", r#"{"name":"Love Beyond Borders"}"#),
    ("/favicon.ico", "image/x-icon", "ico"),
];

/// Mock origin wrapper
pub struct MockOrigin {
    server: MockServer,
}

impl MockOrigin {
    pub async fn start() -> Self {
        Self {
            server: MockServer::builder().start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Serve every shell resource
    pub async fn mock_shell(&self) {
        for (resource, content_type, body) in SHELL {
            self.mock_asset(resource, content_type, body, 200).await;
        }
    }

    /// Serve one resource
    pub async fn mock_asset(&self, resource: &str, content_type: &str, body: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(resource))
            .respond_with(
                ResponseTemplate::new(status)
                    .insert_header("content-type", content_type)
                    .set_body_raw(body.as_bytes().to_vec(), content_type),
            )
            .mount(&self.server)
            .await;
    }

    /// Accept writes to an API path
    pub async fn mock_api_write(&self, resource: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(resource))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for a path
    pub async fn hits(&self, resource: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == resource)
            .count()
    }
}
