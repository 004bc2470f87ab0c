use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::assets::decode::decode_image;
use crate::foundation::core::ImageBuffer;
use crate::foundation::error::{PanoError, PanoResult};

/// Status line and the headers the fetcher cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A response whose body has not necessarily been read yet.
#[derive(Debug)]
pub struct HttpResponse<B> {
    pub head: ResponseHead,
    pub body: B,
}

/// Lazily readable response payload.
pub trait ResponseBody: Send {
    /// Consume the body and return all of its bytes.
    fn into_bytes(self) -> impl Future<Output = PanoResult<Vec<u8>>> + Send;
}

impl ResponseBody for Vec<u8> {
    async fn into_bytes(self) -> PanoResult<Vec<u8>> {
        Ok(self)
    }
}

/// Issues one GET per call. No retries, no redirects beyond what the implementation does itself.
pub trait HttpTransport: Send + Sync {
    type Body: ResponseBody;

    fn get(&self, url: &str)
    -> impl Future<Output = PanoResult<HttpResponse<Self::Body>>> + Send;
}

/// Production transport backed by an async `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> PanoResult<Self> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> PanoResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("panothumb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PanoError::transport(format!("http client init failed: {e}")))?;
        Ok(Self { client })
    }

    /// Reuse an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ResponseBody for reqwest::Response {
    async fn into_bytes(self) -> PanoResult<Vec<u8>> {
        let bytes = self
            .bytes()
            .await
            .map_err(|e| PanoError::transport(format!("read response body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

impl HttpTransport for ReqwestTransport {
    type Body = reqwest::Response;

    async fn get(&self, url: &str) -> PanoResult<HttpResponse<reqwest::Response>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PanoError::transport(format!("GET {url}: {e}")))?;

        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let head = ResponseHead {
            status: response.status().as_u16(),
            etag: header(reqwest::header::ETAG),
            content_type: header(reqwest::header::CONTENT_TYPE),
        };
        Ok(HttpResponse {
            head,
            body: response,
        })
    }
}

/// Outcome of a conditional fetch.
///
/// `image` is `None` whenever `ok` is false or the server's tag equals the one the caller
/// already had.
#[derive(Clone, Debug)]
pub struct FetchResult {
    pub image: Option<ImageBuffer>,
    pub http_status: u16,
    pub ok: bool,
    pub is_newer_image: bool,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}

impl FetchResult {
    /// Take the decoded image, or report why there is none.
    ///
    /// An unchanged asset is not an error for the fetcher, but a caller that needs pixels gets a
    /// validation error for it.
    pub fn into_image(self) -> PanoResult<ImageBuffer> {
        if !self.ok {
            return Err(PanoError::FetchFailed(self.http_status));
        }
        self.image.ok_or_else(|| {
            PanoError::validation("source image unchanged since the supplied etag; nothing decoded")
        })
    }
}

/// GET `url` and decode it unless the caller already holds the current version.
///
/// The tag comparison is exact and case-sensitive. A missing `etag_from_request` always counts
/// as newer. Decoding runs on tokio's blocking pool.
#[tracing::instrument(skip(transport))]
pub async fn fetch_image<T: HttpTransport>(
    transport: &T,
    url: &str,
    etag_from_request: Option<&str>,
) -> PanoResult<FetchResult> {
    let HttpResponse { head, body } = transport.get(url).await?;
    let ok = head.is_success();
    let is_newer_image = match etag_from_request {
        None => true,
        Some(tag) => head.etag.as_deref() != Some(tag),
    };
    tracing::debug!(status = head.status, ok, is_newer_image, "source response");

    let image = if ok && is_newer_image {
        let bytes = body.into_bytes().await?;
        let decoded = tokio::task::spawn_blocking(move || decode_image(&bytes))
            .await
            .map_err(|e| PanoError::render(format!("decode task failed: {e}")))??;
        Some(decoded)
    } else {
        None
    };

    Ok(FetchResult {
        image,
        http_status: head.status,
        ok,
        is_newer_image,
        content_type: head.content_type,
        etag: head.etag,
    })
}

/// In-memory transport that serves canned responses by URL.
///
/// Unknown URLs answer 404. Useful for tests and offline tooling.
#[derive(Debug, Default)]
pub struct StaticTransport {
    routes: Mutex<HashMap<String, (ResponseHead, Vec<u8>)>>,
    requests: AtomicUsize,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the response for `url`.
    pub fn insert(&self, url: impl Into<String>, head: ResponseHead, body: Vec<u8>) {
        let mut routes = self
            .routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        routes.insert(url.into(), (head, body));
    }

    /// Number of `get` calls served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl HttpTransport for StaticTransport {
    type Body = Vec<u8>;

    async fn get(&self, url: &str) -> PanoResult<HttpResponse<Vec<u8>>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let routes = self
            .routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (head, body) = routes.get(url).cloned().unwrap_or_else(|| {
            (
                ResponseHead {
                    status: 404,
                    etag: None,
                    content_type: Some("text/plain".to_owned()),
                },
                b"not found".to_vec(),
            )
        });
        Ok(HttpResponse { head, body })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
