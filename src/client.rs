use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Response};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{ENGINE_REQUEST_DURATION, ENGINE_REQUEST_ERRORS, ENGINE_REQUESTS};
use crate::types::{ChatRequest, ChatResponse, KnowledgeResponse, RecordSummary, UploadResponse};

const DEFAULT_ENGINE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of asking the engine to open a path on the local machine.
///
/// The engine reports open failures in the response body with a success
/// status line, so this is data rather than an [`Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOutcome {
    /// Whether the engine opened the path.
    pub opened: bool,

    /// The engine's human-readable status message.
    pub message: String,
}

/// The engine operations the session controller depends on.
///
/// This is the seam between session logic and HTTP: tests drive the
/// session with a scripted gateway, and the binary wires in
/// [`HttpEngine`].
#[async_trait]
pub trait EngineGateway: Send + Sync {
    /// Send one chat exchange and wait for the reply.
    ///
    /// The future resolves with [`Error::Cancelled`] as soon as `cancel`
    /// fires, without waiting for the engine. A reply that arrives after
    /// cancellation is the caller's to discard.
    async fn chat(&self, request: ChatRequest, cancel: &CancellationToken) -> Result<ChatResponse>;

    /// Upload a document for analysis.
    async fn upload(&self, path: &Path) -> Result<UploadResponse>;

    /// Ask the engine to open a file or folder on its machine.
    async fn open(&self, path: &str) -> Result<OpenOutcome>;

    /// Fetch the engine's learned facts.
    async fn knowledge(&self) -> Result<KnowledgeResponse>;

    /// Fetch extracted document records, newest first.
    async fn records(&self) -> Result<Vec<RecordSummary>>;

    /// Probe whether the engine is reachable.
    ///
    /// Uses a short timeout independent of the chat timeout so a dead
    /// engine is reported quickly at startup.
    async fn health(&self) -> Result<()>;
}

/// HTTP client for the OmniMind engine.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl HttpEngine {
    /// Create a new client for the engine at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::url(format!("invalid engine URL {base_url:?}: {e}"), Some(e)))?;
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(format!("Failed to build HTTP client: {e}"), Some(Box::new(e)))
            })?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The engine base URL this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::url(format!("invalid engine endpoint {path:?}: {e}"), Some(e)))
    }

    /// Map a reqwest send error onto our error family.
    fn send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process engine response errors and convert to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        // FastAPI-style engines report errors as {"detail": "..."}.
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            detail: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or(error_body);
        Error::api(status_code, message, request_id)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        ENGINE_REQUESTS.click();
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.send_error(e))
            .inspect_err(|_| ENGINE_REQUEST_ERRORS.click())?;
        ENGINE_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            ENGINE_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        response.json::<T>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        ENGINE_REQUESTS.click();
        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(e))
            .inspect_err(|_| ENGINE_REQUEST_ERRORS.click())?;
        ENGINE_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            ENGINE_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        response.json::<T>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }
}

#[derive(Serialize)]
struct OpenRequest<'a> {
    path: &'a str,
}

#[derive(serde::Deserialize)]
struct OpenResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl EngineGateway for HttpEngine {
    async fn chat(&self, request: ChatRequest, cancel: &CancellationToken) -> Result<ChatResponse> {
        tokio::select! {
            _ = cancel.cancelled() => {
                Err(Error::cancelled("exchange aborted before the engine replied"))
            }
            result = self.post_json::<_, ChatResponse>("/chat", &request) => result,
        }
    }

    async fn upload(&self, path: &Path) -> Result<UploadResponse> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::validation(
                    format!("upload path {path:?} has no usable file name"),
                    Some("path".to_string()),
                )
            })?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.clone()));

        let url = self.endpoint("/upload")?;
        ENGINE_REQUESTS.click();
        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.send_error(e))
            .inspect_err(|_| ENGINE_REQUEST_ERRORS.click())?;
        ENGINE_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            ENGINE_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            return Err(Error::upload(file_name, err.to_string()));
        }
        response.json::<UploadResponse>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }

    async fn open(&self, path: &str) -> Result<OpenOutcome> {
        let response: OpenResponse = self.post_json("/open", &OpenRequest { path }).await?;
        Ok(OpenOutcome {
            opened: response.status == "success",
            message: response.message,
        })
    }

    async fn knowledge(&self) -> Result<KnowledgeResponse> {
        self.get_json("/knowledge").await
    }

    async fn records(&self) -> Result<Vec<RecordSummary>> {
        self.get_json("/quotes").await
    }

    async fn health(&self) -> Result<()> {
        let url = self.endpoint("/knowledge")?;
        let response = self
            .client
            .get(url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }
        Ok(())
    }
}

/// The engine URL used when none is configured.
pub fn default_engine_url() -> &'static str {
    DEFAULT_ENGINE_URL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_base_url() {
        let err = HttpEngine::new("not a url").unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn endpoint_joins_against_base() {
        let engine = HttpEngine::new("http://localhost:8000").unwrap();
        let url = engine.endpoint("/chat").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/chat");
    }

    #[tokio::test]
    async fn chat_cancels_without_a_server() {
        // Point at a reserved address nothing answers on; cancellation
        // must win the race regardless.
        let engine = HttpEngine::new("http://192.0.2.1:8000").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = engine
            .chat(ChatRequest::new("hello", Vec::new()), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[test]
    fn open_outcome_maps_status() {
        let response: OpenResponse =
            serde_json::from_str(r#"{"status": "error", "message": "Path not found"}"#).unwrap();
        assert_eq!(response.status, "error");
        assert_eq!(response.message, "Path not found");
    }
}
