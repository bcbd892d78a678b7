//! Network side of a submission: the [`ConversionService`] seam, the reqwest
//! implementation, and a retry decorator.
//!
//! ## Retry Strategy
//!
//! The bare [`HttpConversionService`] never retries. Resilience is layered on
//! by wrapping it in [`RetryingService`], which retries transport failures
//! and 5xx responses with exponential backoff
//! (`retry_backoff_ms * 2^(attempt - 1)`). 4xx responses are permanent and
//! returned immediately.

use crate::config::UploaderConfig;
use crate::error::{SubmitError, UploaderError};
use crate::output::ConversionResponse;
use crate::selection::FileHandle;
use futures::future::BoxFuture;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Sends one file to the conversion endpoint and returns the decoded body.
///
/// A 2xx response whose JSON lacks one of the result fields is still `Ok`;
/// deciding whether the pair is complete is the controller's job.
pub trait ConversionService: Send + Sync {
    fn convert<'a>(
        &'a self,
        file: &'a FileHandle,
    ) -> BoxFuture<'a, Result<ConversionResponse, SubmitError>>;
}

/// Shared handle to a service.
pub type SharedService = Arc<dyn ConversionService>;

// ── HTTP ─────────────────────────────────────────────────────────────────

/// Posts the file as single-part multipart form data.
#[derive(Debug, Clone)]
pub struct HttpConversionService {
    client: reqwest::Client,
    url: Url,
    field_name: String,
}

impl HttpConversionService {
    pub fn new(config: &UploaderConfig) -> Result<Self, UploaderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| UploaderError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            url: config.upload_url()?,
            field_name: config.field_name.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn form(&self, file: &FileHandle) -> Result<Form, SubmitError> {
        let part = Part::bytes(file.content().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime())
            .map_err(|e| SubmitError::TransportFailure {
                reason: format!("invalid MIME type '{}': {e}", file.mime()),
            })?;
        Ok(Form::new().part(self.field_name.clone(), part))
    }

    async fn post(&self, file: &FileHandle) -> Result<ConversionResponse, SubmitError> {
        let start = Instant::now();
        let form = self.form(file)?;
        debug!(url = %self.url, file = %file.name(), size = file.size(), "POST multipart upload");

        let response = self
            .client
            .post(self.url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmitError::TransportFailure {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Endpoint rejected upload");
            return Err(SubmitError::ServerRejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .json::<ConversionResponse>()
            .await
            .map_err(|e| SubmitError::TransportFailure {
                reason: format!("malformed response body: {e}"),
            })?;

        debug!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Endpoint responded"
        );
        Ok(body)
    }
}

impl ConversionService for HttpConversionService {
    fn convert<'a>(
        &'a self,
        file: &'a FileHandle,
    ) -> BoxFuture<'a, Result<ConversionResponse, SubmitError>> {
        Box::pin(self.post(file))
    }
}

// ── Retry decorator ──────────────────────────────────────────────────────

/// Retries transient failures of an inner service.
pub struct RetryingService<S> {
    inner: S,
    max_retries: u32,
    backoff_ms: u64,
}

impl<S: ConversionService> RetryingService<S> {
    pub fn new(inner: S, max_retries: u32, backoff_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            backoff_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based), saturating at `u64::MAX`.
    fn backoff_for(&self, attempt: u32) -> u64 {
        self.backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
    }

    async fn convert_with_retry(
        &self,
        file: &FileHandle,
    ) -> Result<ConversionResponse, SubmitError> {
        let mut attempt = 0;
        loop {
            match self.inner.convert(file).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = self.backoff_for(attempt);
                    warn!(
                        "{}: retry {}/{} after {}ms: {}",
                        file.name(),
                        attempt,
                        self.max_retries,
                        backoff,
                        e
                    );
                    sleep(Duration::from_millis(backoff)).await;
                }
                other => return other,
            }
        }
    }
}

impl<S: ConversionService> ConversionService for RetryingService<S> {
    fn convert<'a>(
        &'a self,
        file: &'a FileHandle,
    ) -> BoxFuture<'a, Result<ConversionResponse, SubmitError>> {
        Box::pin(self.convert_with_retry(file))
    }
}

/// Build the service described by `config`: HTTP, wrapped in a retry
/// decorator when `max_retries > 0`.
pub fn service_from_config(config: &UploaderConfig) -> Result<SharedService, UploaderError> {
    let http = HttpConversionService::new(config)?;
    if config.max_retries == 0 {
        return Ok(Arc::new(http));
    }
    Ok(Arc::new(RetryingService::new(
        http,
        config.max_retries,
        config.retry_backoff_ms,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a scripted list of results, one per call.
    struct Scripted {
        replies: Mutex<Vec<Result<ConversionResponse, SubmitError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<ConversionResponse, SubmitError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl ConversionService for Scripted {
        fn convert<'a>(
            &'a self,
            _file: &'a FileHandle,
        ) -> BoxFuture<'a, Result<ConversionResponse, SubmitError>> {
            *self.calls.lock().unwrap() += 1;
            let reply = self.replies.lock().unwrap().pop().expect("script exhausted");
            Box::pin(async move { reply })
        }
    }

    fn ok() -> Result<ConversionResponse, SubmitError> {
        Ok(ConversionResponse {
            markdown_content: Some("# T".into()),
            ai_summary: Some("S".into()),
            message: None,
        })
    }

    fn server(status: u16) -> Result<ConversionResponse, SubmitError> {
        Err(SubmitError::ServerRejected {
            status,
            body: String::new(),
        })
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let svc = RetryingService::new(
            Scripted::new(vec![
                Err(SubmitError::TransportFailure {
                    reason: "reset".into(),
                }),
                server(503),
                ok(),
            ]),
            3,
            1,
        );
        let file = FileHandle::new("a.pdf", b"%PDF".to_vec());
        assert!(svc.convert(&file).await.is_ok());
        assert_eq!(svc.inner.calls(), 3);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let svc = RetryingService::new(Scripted::new(vec![server(400)]), 3, 1);
        let file = FileHandle::new("a.pdf", b"%PDF".to_vec());
        assert_eq!(tokio_test::block_on(svc.convert(&file)), server(400));
        assert_eq!(svc.inner.calls(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let svc = RetryingService::new(
            Scripted::new(vec![server(500), server(502), server(504)]),
            2,
            1,
        );
        let file = FileHandle::new("a.pdf", b"%PDF".to_vec());
        assert_eq!(svc.convert(&file).await, server(504));
        assert_eq!(svc.inner.calls(), 3);
    }

    /// Every call fails with a transport error.
    struct Down(Mutex<u32>);

    impl ConversionService for Down {
        fn convert<'a>(
            &'a self,
            _file: &'a FileHandle,
        ) -> BoxFuture<'a, Result<ConversionResponse, SubmitError>> {
            *self.0.lock().unwrap() += 1;
            Box::pin(async {
                Err(SubmitError::TransportFailure {
                    reason: "connection refused".into(),
                })
            })
        }
    }

    #[tokio::test]
    async fn many_retries_with_zero_backoff_do_not_overflow() {
        let svc = RetryingService::new(Down(Mutex::new(0)), 100, 0);
        let file = FileHandle::new("a.pdf", b"%PDF".to_vec());
        assert!(matches!(
            svc.convert(&file).await,
            Err(SubmitError::TransportFailure { .. })
        ));
        assert_eq!(*svc.inner.0.lock().unwrap(), 101);
    }

    #[test]
    fn backoff_doubles_then_saturates() {
        let svc = RetryingService::new(Down(Mutex::new(0)), 100, 500);
        assert_eq!(svc.backoff_for(1), 500);
        assert_eq!(svc.backoff_for(3), 2000);
        assert_eq!(svc.backoff_for(64), u64::MAX);
        assert_eq!(svc.backoff_for(100), u64::MAX);
    }

    #[test]
    fn http_service_targets_upload_url() {
        let config = UploaderConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let svc = HttpConversionService::new(&config).unwrap();
        assert_eq!(svc.url().as_str(), "http://127.0.0.1:9/api/py/upload");
    }

    #[test]
    fn form_rejects_unparseable_mime() {
        let svc = HttpConversionService::new(&UploaderConfig::default()).unwrap();
        let file = FileHandle::new("a.pdf", vec![]).with_mime("not a mime");
        assert!(matches!(
            svc.form(&file),
            Err(SubmitError::TransportFailure { .. })
        ));
    }
}
