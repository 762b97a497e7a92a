//! HTTP transport used by the resolver and the cloud API clients.
//!
//! Components talk to the network through [`HttpTransport`] so that the
//! retry and fallback logic built on top of it can be exercised with
//! scripted responses.

mod response;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::debug;

pub use response::{parse_content_disposition_filename, HttpResponse};

/// Default user agent for outgoing requests.
pub const USER_AGENT: &str = concat!("custcheck/", env!("CARGO_PKG_VERSION"));

/// Errors raised before a response status is available.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Minimal HTTP surface needed by the pipeline.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET a URL and buffer the response.
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// POST a JSON body and buffer the response.
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport with a fixed per-request timeout.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

fn extract_response_headers(response: &Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

impl HttpClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, timeout })
    }

    fn send_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Request(error)
        }
    }

    async fn buffer(response: Response) -> Result<HttpResponse, TransportError> {
        let status = response.status();
        let headers = extract_response_headers(&response);
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        debug!("GET {} -> {} in {:?}", url, response.status(), start.elapsed());
        Self::buffer(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        // URLs carry API keys in the query string; log the path only
        let path = url.split('?').next().unwrap_or(url);
        debug!("POST {} -> {} in {:?}", path, response.status(), start.elapsed());
        Self::buffer(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slow_server_reports_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept and hold the connection without answering
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let client = HttpClient::new(Duration::from_millis(100)).unwrap();
        let err = client
            .get(&format!("http://{}/slow", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(t) if t == Duration::from_millis(100)));
        assert_eq!(err.to_string(), "request timed out after 100ms");
        server.abort();
    }
}
