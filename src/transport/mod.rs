//! HTTP transport seam
//!
//! The dispatcher talks to the network through the [`Transport`] trait so
//! tests can substitute a scripted transport; [`ReqwestTransport`] is the
//! production implementation.

use crate::error::ApiError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Method, Url};
use std::time::Duration;

/// One fully-resolved HTTP request, ready to go on the wire
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    /// Ordered header list; later entries have already overridden earlier
    /// ones during descriptor resolution, duplicates never reach here
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl TransportRequest {
    /// Header lookup, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A buffered response: status plus complete body text
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Incremental body chunks for the streaming transport mode
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ApiError>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request and buffer the whole response
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError>;

    /// Issue a request expecting an incrementally-produced body
    ///
    /// Returns the chunk stream on a successful status; a rejected status
    /// is mapped to an error here, so callers only ever see body chunks.
    async fn execute_stream(&self, request: TransportRequest) -> Result<ByteStream, ApiError>;
}

/// Production transport over a pooled reqwest client
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    fn builder(&self, request: TransportRequest) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        let response = self
            .builder(request)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(ApiError::from_reqwest)?;
        Ok(TransportResponse { status, body })
    }

    async fn execute_stream(&self, request: TransportRequest) -> Result<ByteStream, ApiError> {
        let response = self
            .builder(request)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(crate::client::envelope::failure(
                status,
                serde_json::from_str(&body).ok(),
            ));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(ApiError::from_reqwest))
            .boxed())
    }
}
