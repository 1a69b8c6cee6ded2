//! Page rendering
//!
//! This module defines the seam between the crawler and whatever produces
//! rendered markup:
//! - `RenderEngine`: a long-lived engine started once per crawl
//! - `PageHandle`: one page session, opened per attempt and always closed
//! - `HttpRenderer`: the bundled engine, a plain HTTP client
//!
//! A headless browser can be plugged in by implementing the two traits.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Transient failures of a single page attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Root element '{selector}' not found on {url}")]
    MissingRoot { url: String, selector: String },

    #[error("No page has been loaded in this session")]
    NotNavigated,

    #[error("Rendering engine error: {0}")]
    Engine(String),
}

/// A rendering engine shared by all fetch tasks of a crawl
#[async_trait]
pub trait RenderEngine: Send + Sync {
    type Page: PageHandle;

    /// Starts the engine; called once before the first round
    async fn launch(&self) -> Result<(), FetchError>;

    /// Opens a fresh page session
    async fn new_page(&self) -> Result<Self::Page, FetchError>;

    /// Stops the engine; called once when the crawl ends, even on error
    async fn shutdown(&self) -> Result<(), FetchError>;
}

/// One page session of a rendering engine
#[async_trait]
pub trait PageHandle: Send {
    /// Navigates to `url`, failing if the load does not finish within `timeout`
    async fn goto(&mut self, url: &Url, timeout: Duration) -> Result<(), FetchError>;

    /// Waits up to `timeout` for an element matching `selector`
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> Result<(), FetchError>;

    /// Returns the rendered markup
    async fn content(&mut self) -> Result<String, FetchError>;

    /// URL of the loaded document after redirects
    fn final_url(&self) -> Option<&Url>;

    /// Releases the session
    async fn close(&mut self) -> Result<(), FetchError>;
}

/// Builds an HTTP client with the crawler's identification
///
/// # Example
///
/// ```
/// use page_harvest::config::UserAgentConfig;
/// use page_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "PageHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: Some("https://example.com/about".to_string()),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rendering engine that fetches server-rendered markup over HTTP
///
/// Scripts are not executed; `wait_for_selector` checks the fetched markup
/// once instead of polling.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(config: &UserAgentConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config)
            .map_err(|e| FetchError::Engine(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RenderEngine for HttpRenderer {
    type Page = HttpPage;

    async fn launch(&self) -> Result<(), FetchError> {
        tracing::debug!("HTTP renderer ready");
        Ok(())
    }

    async fn new_page(&self) -> Result<HttpPage, FetchError> {
        Ok(HttpPage {
            client: self.client.clone(),
            url: None,
            body: None,
        })
    }

    async fn shutdown(&self) -> Result<(), FetchError> {
        tracing::debug!("HTTP renderer stopped");
        Ok(())
    }
}

/// A page session of [`HttpRenderer`]
#[derive(Debug)]
pub struct HttpPage {
    client: Client,
    url: Option<Url>,
    body: Option<String>,
}

fn classify(url: &Url, timeout: Duration, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

#[async_trait]
impl PageHandle for HttpPage {
    async fn goto(&mut self, url: &Url, timeout: Duration) -> Result<(), FetchError> {
        let load = async {
            let response = self
                .client
                .get(url.clone())
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| classify(url, timeout, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let final_url = response.url().clone();
            let body = response
                .text()
                .await
                .map_err(|e| classify(url, timeout, e))?;
            Ok((final_url, body))
        };

        let (final_url, body) = tokio::time::timeout(timeout, load)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout,
            })??;

        self.url = Some(final_url);
        self.body = Some(body);
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), FetchError> {
        let body = self.body.as_deref().ok_or(FetchError::NotNavigated)?;
        let parsed = Selector::parse(selector)
            .map_err(|e| FetchError::Engine(format!("invalid selector '{}': {:?}", selector, e)))?;

        if Html::parse_document(body).select(&parsed).next().is_some() {
            Ok(())
        } else {
            Err(FetchError::MissingRoot {
                url: self
                    .url
                    .as_ref()
                    .map(Url::to_string)
                    .unwrap_or_default(),
                selector: selector.to_string(),
            })
        }
    }

    async fn content(&mut self) -> Result<String, FetchError> {
        self.body.clone().ok_or(FetchError::NotNavigated)
    }

    fn final_url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        self.url = None;
        self.body = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.com/about".to_string()),
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&create_test_config()).is_ok());
    }

    #[tokio::test]
    async fn test_goto_and_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.asp"))
            .and(header("user-agent", "TestCrawler/1.0 (+https://example.com/about)"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body><p>hola</p></body></html>"),
            )
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&create_test_config()).unwrap();
        let mut page = renderer.new_page().await.unwrap();
        let url = Url::parse(&format!("{}/index.asp", server.uri())).unwrap();

        page.goto(&url, Duration::from_secs(5)).await.unwrap();
        page.wait_for_selector("body", Duration::from_secs(1))
            .await
            .unwrap();

        assert!(page.content().await.unwrap().contains("hola"));
        assert_eq!(page.final_url(), Some(&url));

        page.close().await.unwrap();
        assert!(matches!(
            page.content().await.unwrap_err(),
            FetchError::NotNavigated
        ));
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&create_test_config()).unwrap();
        let mut page = renderer.new_page().await.unwrap();
        let url = Url::parse(&server.uri()).unwrap();

        let err = page.goto(&url, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_navigation_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&create_test_config()).unwrap();
        let mut page = renderer.new_page().await.unwrap();
        let url = Url::parse(&server.uri()).unwrap();

        let err = page
            .goto(&url, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<div>no main</div>"))
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&create_test_config()).unwrap();
        let mut page = renderer.new_page().await.unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        page.goto(&url, Duration::from_secs(5)).await.unwrap();

        let err = page
            .wait_for_selector("main", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingRoot { .. }));
    }

    #[tokio::test]
    async fn test_wait_before_goto() {
        let renderer = HttpRenderer::new(&create_test_config()).unwrap();
        let mut page = renderer.new_page().await.unwrap();
        assert!(matches!(
            page.wait_for_selector("body", Duration::from_millis(10))
                .await
                .unwrap_err(),
            FetchError::NotNavigated
        ));
    }
}
