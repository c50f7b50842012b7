//! Fetching object bytes over presigned URLs.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use serde::Deserialize;
use thiserror::Error;

/// Byte fetch errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Transport(String),

    /// Server answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body is larger than the allowed maximum.
    #[error("response body of {size} bytes exceeds limit of {max} bytes")]
    TooLarge {
        /// Reported or received size.
        size: u64,
        /// Allowed maximum.
        max: u64,
    },
}

/// The request URL carries storage signatures, so it is stripped from the
/// error text.
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Transport(err.without_url().to_string()),
        }
    }
}

/// Retrieves the full content behind a URL.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    /// Download the body at `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// [`ByteFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpByteFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpByteFetcher {
    /// Build a fetcher that refuses bodies over `max_bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: &FetchConfig, max_bytes: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, max_bytes })
    }

    fn check_size(&self, size: u64) -> Result<(), FetchError> {
        if size > self.max_bytes {
            return Err(FetchError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ByteFetcher for HttpByteFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        if let Some(len) = response.content_length() {
            self.check_size(len)?;
        }

        // Content-Length may be absent or wrong; enforce the cap per chunk.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            self.check_size((body.len() + chunk.len()) as u64)?;
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_fetch_config_defaults() {
        assert_eq!(FetchConfig::default().timeout_secs, 30);
    }

    #[test]
    fn test_size_limit() {
        let fetcher = HttpByteFetcher::new(&FetchConfig::default(), 1024).expect("client");
        assert!(fetcher.check_size(1024).is_ok());
        assert!(matches!(
            fetcher.check_size(1025),
            Err(FetchError::TooLarge {
                size: 1025,
                max: 1024
            })
        ));
    }

    /// Serve one request with a chunked body of `chunks` pieces of `chunk_len` bytes.
    async fn serve_chunked(chunks: usize, chunk_len: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n\
                        Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            let piece = vec![b'x'; chunk_len];
            for _ in 0..chunks {
                let size_line = format!("{chunk_len:x}\r\n");
                let frame = [size_line.as_bytes(), piece.as_slice(), b"\r\n".as_slice()].concat();
                // The client hangs up once it has seen enough.
                if socket.write_all(&frame).await.is_err() {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });

        format!("http://{addr}/object")
    }

    #[tokio::test]
    async fn test_fetch_chunked_body_within_limit() {
        let url = serve_chunked(3, 100).await;
        let fetcher = HttpByteFetcher::new(&FetchConfig::default(), 1024).expect("client");

        let body = fetcher.fetch(&url).await.unwrap();
        assert_eq!(body.len(), 300);
    }

    #[tokio::test]
    async fn test_fetch_chunked_body_over_limit_is_rejected() {
        let url = serve_chunked(64, 512).await;
        let fetcher = HttpByteFetcher::new(&FetchConfig::default(), 1024).expect("client");

        let result = fetcher.fetch(&url).await;
        assert!(matches!(
            result,
            Err(FetchError::TooLarge { size, max: 1024 }) if size > 1024 && size <= 1536
        ));
    }

    #[tokio::test]
    async fn test_transport_error_hides_url() {
        let fetcher = HttpByteFetcher::new(&FetchConfig::default(), 1024).expect("client");
        let result = fetcher
            .fetch("http://127.0.0.1:1/object?X-Amz-Signature=deadbeef")
            .await;

        match result {
            Err(FetchError::Transport(message)) => {
                assert!(!message.contains("X-Amz-Signature"));
                assert!(!message.contains("deadbeef"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_transport_error() {
        let fetcher = HttpByteFetcher::new(&FetchConfig::default(), 1024).expect("client");
        let result = fetcher.fetch("not a url").await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
