//! widget::transport
//!
//! How the widget runtime reaches the proposal endpoint.
//!
//! # Design
//!
//! The transport is async because proposals involve network I/O. The
//! runtime only needs "send this request, give me the response"; anything
//! else (retries, authentication cookies) is up to the implementation.
//!
//! [`HttpTransport`] posts the form-encoded request to a URL.
//! [`MockTransport`] answers from a queue for deterministic tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use url::Url;

use crate::protocol::{ProposalRequest, ProposalResponse};

const USER_AGENT_VALUE: &str = concat!("slugsync/", env!("CARGO_PKG_VERSION"));
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Errors from sending a proposal request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint refused the request signature.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The endpoint does not exist.
    #[error("endpoint not found: {0}")]
    NotFound(String),

    /// Non-success status.
    #[error("proposal endpoint error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The body was not a proposal response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),
}

/// Sends proposal requests.
///
/// Implementations must be `Send + Sync`; the runtime calls them from
/// spawned tasks.
#[async_trait]
pub trait ProposalTransport: Send + Sync {
    async fn propose(&self, request: &ProposalRequest) -> Result<ProposalResponse, TransportError>;
}

/// Posts requests to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Use a preconfigured client (timeouts, cookies).
    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn handle_response(&self, response: Response) -> Result<ProposalResponse, TransportError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| TransportError::InvalidResponse(e.to_string()))
        } else {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| "Unknown error".to_string());

            Err(match status {
                StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                    TransportError::Rejected(message)
                }
                StatusCode::NOT_FOUND => TransportError::NotFound(self.endpoint.to_string()),
                _ if status.is_server_error() => TransportError::Status {
                    status: status.as_u16(),
                    message: format!("server error: {message}"),
                },
                _ => TransportError::Status {
                    status: status.as_u16(),
                    message,
                },
            })
        }
    }
}

#[async_trait]
impl ProposalTransport for HttpTransport {
    async fn propose(&self, request: &ProposalRequest) -> Result<ProposalResponse, TransportError> {
        tracing::debug!(endpoint = %self.endpoint, mode = %request.mode, "sending proposal request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
            .body(request.to_form())
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        self.handle_response(response).await
    }
}

/// Queued answer of the mock.
#[derive(Debug, Clone)]
struct Scripted {
    result: Result<ProposalResponse, TransportError>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    responses: VecDeque<Scripted>,
    fail_with: Option<TransportError>,
    requests: Vec<ProposalRequest>,
}

/// Mock transport for tests.
///
/// Answers requests in order from a queue. Thread-safe via internal
/// `Arc<Mutex<...>>`; clones share state.
///
/// ```
/// use slugsync::protocol::ProposalResponse;
/// use slugsync::widget::MockTransport;
///
/// let transport = MockTransport::new().respond(ProposalResponse {
///     proposal: "/shoes".into(),
///     has_conflicts: false,
///     slug: "/shoes".into(),
/// });
/// assert!(transport.requests().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a response.
    pub fn respond(self, response: ProposalResponse) -> Self {
        self.respond_after(response, Duration::ZERO)
    }

    /// Queue a response that arrives after `delay`.
    pub fn respond_after(self, response: ProposalResponse, delay: Duration) -> Self {
        self.inner().responses.push_back(Scripted {
            result: Ok(response),
            delay,
        });
        self
    }

    /// Queue a failure.
    pub fn fail_next(self, error: TransportError) -> Self {
        self.inner().responses.push_back(Scripted {
            result: Err(error),
            delay: Duration::ZERO,
        });
        self
    }

    /// Fail every request until cleared.
    pub fn fail_with(self, error: TransportError) -> Self {
        self.inner().fail_with = Some(error);
        self
    }

    pub fn clear_fail_with(&self) {
        self.inner().fail_with = None;
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<ProposalRequest> {
        self.inner().requests.clone()
    }
}

#[async_trait]
impl ProposalTransport for MockTransport {
    async fn propose(&self, request: &ProposalRequest) -> Result<ProposalResponse, TransportError> {
        let scripted = {
            let mut inner = self.inner();
            inner.requests.push(request.clone());
            if let Some(err) = inner.fail_with.clone() {
                return Err(err);
            }
            inner.responses.pop_front()
        };

        let Some(scripted) = scripted else {
            return Err(TransportError::Network("no scripted response".to_string()));
        };
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ProposalContext, ProposalMode};
    use std::collections::BTreeMap;

    fn request() -> ProposalRequest {
        ProposalRequest {
            mode: ProposalMode::Recreate,
            context: ProposalContext::default(),
            values: BTreeMap::from([("title".to_string(), "Shoes".to_string())]),
        }
    }

    fn response(proposal: &str) -> ProposalResponse {
        ProposalResponse {
            proposal: proposal.into(),
            has_conflicts: false,
            slug: proposal.into(),
        }
    }

    #[test]
    fn mock_is_usable_from_blocking_code() {
        let transport = MockTransport::new().respond(response("/one"));
        let answer = tokio_test::assert_ok!(tokio_test::block_on(transport.propose(&request())));
        assert_eq!(answer.proposal, "/one");
        assert_eq!(transport.requests(), vec![request()]);
    }

    #[tokio::test]
    async fn mock_answers_in_order_and_records() {
        let transport = MockTransport::new()
            .respond(response("/one"))
            .respond(response("/two"));

        assert_eq!(transport.propose(&request()).await.unwrap().proposal, "/one");
        assert_eq!(transport.propose(&request()).await.unwrap().proposal, "/two");
        assert!(matches!(
            transport.propose(&request()).await,
            Err(TransportError::Network(_))
        ));
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn mock_fail_with_overrides_queue() {
        let transport = MockTransport::new()
            .respond(response("/one"))
            .fail_with(TransportError::Rejected("bad signature".into()));

        assert_eq!(
            transport.propose(&request()).await,
            Err(TransportError::Rejected("bad signature".into()))
        );
        transport.clear_fail_with();
        assert_eq!(transport.propose(&request()).await.unwrap().proposal, "/one");
    }
}
