//! Link operations: fetch content and resolve canonical URLs.
//!
//! [`LinkClient`] is the seam callers program against. [`HttpLinkClient`]
//! implements it over a shared [`NetworkSession`]:
//! - local links are read straight from disk, never through the network
//! - `open` retries the whole GET when the server stalls past the read timeout
//! - `resolve` follows redirects with a HEAD request and never retries timeouts

use crate::config::NetworkConfig;
use crate::link::Link;
use crate::network::retry::{retry_async, RetryStats};
use crate::network::session::{is_read_timeout, NetworkSession};
use crate::{FetchError, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, Response};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

/// Fetch and resolve operations on links.
#[async_trait]
pub trait LinkClient: Send + Sync {
    /// Open the content behind `link` as a byte stream.
    async fn open(&self, link: &Link) -> Result<LinkReader>;

    /// Follow redirects from `link` and return a link to the final URL.
    async fn resolve(&self, link: &Link) -> Result<Link>;
}

/// [`LinkClient`] backed by an HTTP session.
#[derive(Debug, Clone)]
pub struct HttpLinkClient {
    session: Arc<NetworkSession>,
}

impl HttpLinkClient {
    pub fn new(session: Arc<NetworkSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<NetworkSession> {
        &self.session
    }

    /// Like [`LinkClient::open`], also reporting read-timeout retry statistics.
    ///
    /// `stats.retries` counts the retry warnings logged. Local links report
    /// zero attempts since no request is made.
    pub async fn open_with_stats(&self, link: &Link) -> (Result<LinkReader>, RetryStats) {
        if let Some(path) = link.local_path() {
            let result = LinkReader::open_local(link.url(), path).await;
            let stats = RetryStats {
                success: result.is_ok(),
                ..RetryStats::default()
            };
            return (result, stats);
        }

        let url = link.url();
        let session = &self.session;
        let policy = session.policy();
        let label = format!("Read timeout fetching {}", url);

        let (result, stats) = retry_async(
            &policy.read_retry_config(),
            &label,
            move || async move {
                let (response, _) = session
                    .execute(url, move |client: &Client| client.get(url))
                    .await;
                response
            },
            is_read_timeout,
        )
        .await;

        let result = match result {
            Ok(response) => check_status(url, response).map(|r| LinkReader::remote(url, r)),
            Err(_) if stats.exhausted => Err(FetchError::MaxRetriesExceeded {
                url: url.to_string(),
                max_retries: policy.max_retries(),
            }),
            Err(e) => Err(FetchError::request(url, e)),
        };

        (result, stats)
    }
}

#[async_trait]
impl LinkClient for HttpLinkClient {
    async fn open(&self, link: &Link) -> Result<LinkReader> {
        self.open_with_stats(link).await.0
    }

    async fn resolve(&self, link: &Link) -> Result<Link> {
        // A local path is already canonical.
        if link.is_local() {
            return Ok(link.clone());
        }

        let url = link.url();
        let (response, _) = self
            .session
            .execute(url, move |client: &Client| client.head(url))
            .await;
        let response = response.map_err(|e| FetchError::request(url, e))?;

        let final_url = response.url().clone();
        if final_url.as_str() != url {
            debug!("Resolved {} to {}", url, final_url);
        }
        Link::wrap(final_url)
    }
}

fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    debug!("HTTP {} from {}", status, url);
    Err(FetchError::HttpStatus {
        url: url.to_string(),
        status,
    })
}

#[derive(Debug)]
enum Body {
    Local {
        file: tokio::fs::File,
        len: Option<u64>,
    },
    Remote(Response),
}

/// Streaming handle to fetched content.
#[derive(Debug)]
pub struct LinkReader {
    url: String,
    body: Body,
}

impl LinkReader {
    async fn open_local(url: &str, path: &Path) -> Result<Self> {
        let local_error = |source: std::io::Error| FetchError::LocalAccess {
            path: path.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(local_error)?;
        let len = file.metadata().await.map_err(local_error)?.len();
        debug!("Opened local file {}", path.display());

        Ok(Self {
            url: url.to_string(),
            body: Body::Local {
                file,
                len: Some(len),
            },
        })
    }

    fn remote(url: &str, response: Response) -> Self {
        Self {
            url: url.to_string(),
            body: Body::Remote(response),
        }
    }

    /// URL of the link this content was opened from.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_local(&self) -> bool {
        matches!(self.body, Body::Local { .. })
    }

    /// Total size in bytes, when known up front.
    pub fn content_length(&self) -> Option<u64> {
        match &self.body {
            Body::Local { len, .. } => *len,
            Body::Remote(response) => response.content_length(),
        }
    }

    /// Read the next chunk, or `None` once the content is exhausted.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        match &mut self.body {
            Body::Local { file, .. } => {
                let mut buf = BytesMut::with_capacity(NetworkConfig::READ_CHUNK_SIZE);
                let n = file.read_buf(&mut buf).await.map_err(|e| FetchError::Read {
                    url: self.url.clone(),
                    source: e,
                })?;
                Ok((n > 0).then(|| buf.freeze()))
            }
            Body::Remote(response) => response.chunk().await.map_err(|e| FetchError::Read {
                url: self.url.clone(),
                source: std::io::Error::other(e),
            }),
        }
    }

    /// Read the remaining content into memory.
    ///
    /// A remote `Content-Length` is only a capacity hint and is capped.
    pub async fn read_to_end(mut self) -> Result<Vec<u8>> {
        let hint = self
            .content_length()
            .unwrap_or(0)
            .min(NetworkConfig::MAX_PREALLOCATION as u64);
        let mut out = Vec::with_capacity(hint as usize);
        while let Some(chunk) = self.chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Stream the remaining content into a new file at `dest`.
    ///
    /// Returns the number of bytes written.
    pub async fn write_to(mut self, dest: &Path) -> Result<u64> {
        let write_error = |url: &str, source: std::io::Error| FetchError::Read {
            url: url.to_string(),
            source,
        };

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| write_error(&self.url, e))?;
        let mut written = 0u64;
        while let Some(chunk) = self.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| write_error(&self.url, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| write_error(&self.url, e))?;

        debug!("Wrote {} bytes from {} to {}", written, self.url, dest.display());
        Ok(written)
    }

    /// Convert into a stream of chunks. The stream ends after the first error.
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes>> {
        stream::unfold(Some(self), |state| async move {
            let mut reader = state?;
            match reader.chunk().await {
                Ok(Some(bytes)) => Some((Ok(bytes), Some(reader))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
        .boxed()
    }
}
