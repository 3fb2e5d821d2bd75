//! Page fetcher: one HTTP GET with a configurable agent identity.

use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Anything that can turn a URL into raw markup.
///
/// The crawler and the robots policy only see this trait, so tests can
/// script responses without a network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the decoded body. Non-2xx responses are errors.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// The agent identity sent with each request.
    fn user_agent(&self) -> &str;
}

/// reqwest-backed fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    headers: HashMap<String, String>,
}

impl HttpFetcher {
    /// Create a fetcher identifying itself as `user_agent`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            headers: HashMap::new(),
        })
    }

    /// Add an extra header sent with every request.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        debug!("GET {url} -> {}", status.as_u16());
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_sends_user_agent_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/survey/"))
            .and(header("user-agent", "harvest-test/1.0"))
            .and(header("x-probe", "yes"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new("harvest-test/1.0", Duration::from_secs(5))
            .unwrap()
            .with_header("x-probe", "yes");
        let body = fetcher
            .fetch(&format!("{}/survey/", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html></html>");
        assert_eq!(fetcher.user_agent(), "harvest-test/1.0");
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new("harvest-test/1.0", Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert_eq!(err, FetchError::Status(503));
    }
}
