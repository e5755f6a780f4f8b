//! Remote resource provider
//!
//! A `ResourceSource` turns a transfer location into a stream of byte
//! chunks plus the expected length, when the provider knows it.

use crate::error::LibraryError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failure reported by a source before or while streaming
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SourceError {
    /// HTTP status for non-2xx responses
    pub status: Option<u16>,
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, SourceError>>;

/// An opened remote body
pub struct RemoteBody {
    /// Total bytes the provider announced (Content-Length for HTTP)
    pub expected_len: Option<u64>,
    pub chunks: ChunkStream,
}

#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn open(&self, url: &str) -> Result<RemoteBody, SourceError>;
}

/// HTTP(S) source backed by reqwest
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, LibraryError> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSource for HttpSource {
    async fn open(&self, url: &str) -> Result<RemoteBody, SourceError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError {
                status: Some(status.as_u16()),
                message: format!("server responded with {}", status),
            });
        }

        let expected_len = response.content_length();
        debug!("GET {} -> {} ({:?} bytes)", url, status, expected_len);

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(SourceError::from))
            .boxed();

        Ok(RemoteBody {
            expected_len,
            chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the base URL
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(&response).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn http_response(status_line: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_line,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    #[tokio::test]
    async fn streams_body_with_expected_length() {
        let body = vec![7u8; 1000];
        let base = serve_once(http_response("200 OK", &body)).await;

        let source = HttpSource::new("elimu-test", Some(Duration::from_secs(5))).unwrap();
        let mut remote = source.open(&format!("{}/a.pdf", base)).await.unwrap();
        assert_eq!(remote.expected_len, Some(1000));

        let mut received = Vec::new();
        while let Some(chunk) = remote.chunks.next().await {
            received.extend(chunk.unwrap());
        }
        assert_eq!(received, body);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = serve_once(http_response("404 Not Found", b"missing")).await;

        let source = HttpSource::new("elimu-test", None).unwrap();
        let err = source.open(&format!("{}/a.pdf", base)).await.err().unwrap();
        assert_eq!(err.status, Some(404));
    }
}
