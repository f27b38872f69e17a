//! Request layer.
//!
//! Every outbound call goes through [`RequestLayer::execute`], which owns
//! timeouts, retries, cancellation and the mapping of responses onto
//! [`ClientError`].

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
    transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport},
};

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    cancel: Option<CancellationToken>,
    retry_writes: bool,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon the call when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Allow the retry policy to repeat non-idempotent calls.
    ///
    /// Only set this when the server deduplicates the write, otherwise a
    /// retried submission can be recorded twice.
    pub fn retry_writes(mut self) -> Self {
        self.retry_writes = true;
        self
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Whether a call with `method` may be retried under these options.
    pub fn is_retry_eligible(&self, method: Method) -> bool {
        method.is_idempotent() || self.retry_writes
    }
}

/// Shared, read-only request machinery.
///
/// Cloning is cheap and every clone observes the same configuration.
#[derive(Debug, Clone)]
pub struct RequestLayer {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl RequestLayer {
    /// Build a layer over the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build a layer over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue one logical call and decode the JSON response as `T`.
    pub async fn execute<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &CallOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ClientError::InvalidArgument(format!("unencodable request body: {}", e)))?;

        let request = HttpRequest {
            method,
            url: self.config.url_for(path),
            body,
        };
        let max_attempts = self
            .config
            .retry
            .max_attempts(options.is_retry_eligible(method));

        let response = match options.cancellation() {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("{} {} cancelled", method, request.url);
                        Err(ClientError::Cancelled)
                    }
                    result = self.run_attempts(&request, max_attempts) => result,
                }
            }
            None => self.run_attempts(&request, max_attempts).await,
        }?;

        serde_json::from_slice(&response.body).map_err(|e| {
            ClientError::Decode(format!("{} {}: {}", method, request.url, e))
        })
    }

    async fn run_attempts(&self, request: &HttpRequest, max_attempts: u32) -> Result<HttpResponse> {
        let mut delays = self.config.retry.delays();
        let mut attempt = 1;
        loop {
            debug!(
                "{} {} (attempt {}/{})",
                request.method, request.url, attempt, max_attempts
            );

            let err = match self.attempt(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if attempt >= max_attempts || !self.config.retry.is_retryable(&err) {
                return Err(err);
            }
            let Some(delay) = delays.next() else {
                return Err(err);
            };

            warn!(
                "{} {} failed: {}; retrying in {:?}",
                request.method, request.url, err, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = tokio::time::timeout(self.config.timeout(), self.transport.send(request))
            .await
            .map_err(|_| ClientError::Timeout(self.config.timeout_ms))??;

        if response.is_success() {
            return Ok(response);
        }

        let body = serde_json::from_slice::<Value>(&response.body).ok();
        Err(ClientError::HttpStatus {
            status: response.status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use async_trait::async_trait;
    use serde_json::json;
    use std::{
        sync::{
            atomic::{AtomicU32, Ordering},
            Mutex,
        },
        time::Duration,
    };

    /// Replays canned responses and records every request.
    #[derive(Debug, Default)]
    struct Scripted {
        responses: Mutex<Vec<Result<HttpResponse>>>,
        seen: Mutex<Vec<HttpRequest>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<HttpResponse>>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ClientError::Network("script exhausted".into())))
        }
    }

    /// Never answers.
    #[derive(Debug, Default)]
    struct Stalled {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for Stalled {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    fn ok(body: Value) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: serde_json::to_vec(&body).unwrap(),
        })
    }

    fn status(code: u16) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: code,
            body: br#"{"detail":"unavailable"}"#.to_vec(),
        })
    }

    fn layer(transport: Arc<dyn Transport>, retries: u32) -> RequestLayer {
        let config = ClientConfig::new("http://hub.test")
            .with_retry(RetryPolicy::fixed(retries, Duration::from_millis(1)));
        RequestLayer::with_transport(config, transport).unwrap()
    }

    #[tokio::test]
    async fn test_execute_decodes_success() {
        let transport = Scripted::new(vec![ok(json!({ "status": "ok" }))]);
        let layer = layer(transport.clone(), 0);

        let value: Value = layer
            .execute(Method::Get, "/health", None::<&()>, &CallOptions::new())
            .await
            .unwrap();
        assert_eq!(value["status"], "ok");

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].url, "http://hub.test/health");
        assert!(seen[0].body.is_none());
    }

    #[tokio::test]
    async fn test_execute_serializes_body() {
        let transport = Scripted::new(vec![ok(json!({}))]);
        let layer = layer(transport.clone(), 0);

        let _: Value = layer
            .execute(
                Method::Post,
                "/claims",
                Some(&json!({ "statement": "s" })),
                &CallOptions::new(),
            )
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap();
        let body: Value = serde_json::from_slice(seen[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({ "statement": "s" }));
    }

    #[tokio::test]
    async fn test_http_status_carries_body() {
        let transport = Scripted::new(vec![Ok(HttpResponse {
            status: 404,
            body: br#"{"detail":"Claim not found"}"#.to_vec(),
        })]);
        let layer = layer(transport, 0);

        let err = layer
            .execute::<Value, ()>(Method::Get, "/claims/x", None, &CallOptions::new())
            .await
            .unwrap_err();
        match err {
            ClientError::HttpStatus { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body.unwrap()["detail"], "Claim not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_is_decode_error() {
        let transport = Scripted::new(vec![Ok(HttpResponse {
            status: 200,
            body: b"<html>".to_vec(),
        })]);
        let layer = layer(transport, 0);

        let err = layer
            .execute::<Value, ()>(Method::Get, "/health", None, &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_get_retries_until_success() {
        let transport = Scripted::new(vec![status(503), status(502), ok(json!({ "ok": 1 }))]);
        let layer = layer(transport.clone(), 2);

        let value: Value = layer
            .execute(Method::Get, "/ledger/root", None::<&()>, &CallOptions::new())
            .await
            .unwrap();
        assert_eq!(value["ok"], 1);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted_surfaces_last_error() {
        let transport = Scripted::new(vec![
            Err(ClientError::Network("refused".into())),
            status(503),
            status(504),
        ]);
        let layer = layer(transport.clone(), 2);

        let err = layer
            .execute::<Value, ()>(Method::Get, "/health", None, &CallOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(504));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_post_not_retried_without_opt_in() {
        let transport = Scripted::new(vec![status(503), ok(json!({}))]);
        let layer = layer(transport.clone(), 2);

        let err = layer
            .execute::<Value, _>(Method::Post, "/votes", Some(&json!({})), &CallOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_post_retried_with_opt_in() {
        let transport = Scripted::new(vec![status(503), ok(json!({ "id": "v1" }))]);
        let layer = layer(transport.clone(), 2);

        let value: Value = layer
            .execute(
                Method::Post,
                "/votes",
                Some(&json!({})),
                &CallOptions::new().retry_writes(),
            )
            .await
            .unwrap();
        assert_eq!(value["id"], "v1");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_status_stops_immediately() {
        let transport = Scripted::new(vec![status(400), ok(json!({}))]);
        let layer = layer(transport.clone(), 3);

        let err = layer
            .execute::<Value, ()>(Method::Get, "/health", None, &CallOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let config = ClientConfig::new("http://hub.test").with_timeout(Duration::from_millis(20));
        let layer = RequestLayer::with_transport(config, Arc::new(Stalled::default())).unwrap();

        let err = layer
            .execute::<Value, ()>(Method::Get, "/health", None, &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout(20)));
    }

    #[tokio::test]
    async fn test_each_retry_gets_a_fresh_timeout() {
        let transport = Arc::new(Stalled::default());
        let config = ClientConfig::new("http://hub.test")
            .with_timeout(Duration::from_millis(30))
            .with_retry(RetryPolicy::fixed(2, Duration::from_millis(1)));
        let layer = RequestLayer::with_transport(config, transport.clone()).unwrap();

        let started = std::time::Instant::now();
        let err = layer
            .execute::<Value, ()>(Method::Get, "/health", None, &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout(30)), "{:?}", err);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_cancellation_abandons_backoff_sleep() {
        // An empty script fails every attempt with a network error.
        let transport = Scripted::new(vec![]);
        let config = ClientConfig::new("http://hub.test")
            .with_retry(RetryPolicy::fixed(5, Duration::from_secs(5)));
        let layer = RequestLayer::with_transport(config, transport.clone()).unwrap();
        let token = CancellationToken::new();
        let options = CallOptions::new().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let started = std::time::Instant::now();
        let err = layer
            .execute::<Value, ()>(Method::Get, "/health", None, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled), "{:?}", err);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_abandons_call() {
        let layer =
            RequestLayer::with_transport(ClientConfig::default(), Arc::new(Stalled::default()))
                .unwrap();
        let token = CancellationToken::new();
        let options = CallOptions::new().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let err = layer
            .execute::<Value, ()>(Method::Get, "/health", None, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_before_start_sends_nothing() {
        let transport = Scripted::new(vec![ok(json!({}))]);
        let layer = layer(transport.clone(), 0);
        let token = CancellationToken::new();
        token.cancel();

        let err = layer
            .execute::<Value, ()>(
                Method::Get,
                "/health",
                None,
                &CallOptions::new().with_cancellation(token),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = RequestLayer::with_transport(ClientConfig::new("nope"), Scripted::new(vec![]))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
