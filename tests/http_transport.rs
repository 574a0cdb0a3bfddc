//! HTTP transport against a local mock server.
//!
//! The server side runs the real `ProposalHandler` on the posted form body,
//! so these tests cover the full widget <-> server exchange.

use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use slugsync::core::config::Config;
use slugsync::core::node::Node;
use slugsync::core::types::{NodeId, SlugPath};
use slugsync::protocol::{
    AcceptAll, ProposalContext, ProposalHandler, ProposalMode, ProposalRequest, MANUAL_VALUE,
};
use slugsync::store::MemoryStore;
use slugsync::widget::{HttpTransport, ProposalTransport, TransportError};

fn id(n: u64) -> NodeId {
    NodeId::new(n)
}

/// Answers with the proposal handler over a fixed tree.
struct HandlerResponder {
    store: MemoryStore,
    config: Config,
}

impl HandlerResponder {
    fn new() -> Self {
        Self {
            store: MemoryStore::from_nodes([
                Node::site_root(id(1)),
                Node::new(id(2), Some(id(1)), SlugPath::new("/demo").unwrap()),
                Node::new(id(3), Some(id(1)), SlugPath::new("/contact").unwrap()),
            ]),
            config: Config::default(),
        }
    }
}

impl Respond for HandlerResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match ProposalHandler::new(&self.store, &self.config, AcceptAll).handle_form(&request.body) {
            Ok(response) => ResponseTemplate::new(200).set_body_json(response),
            Err(e) => ResponseTemplate::new(400).set_body_string(e.to_string()),
        }
    }
}

fn manual(record: u64, value: &str) -> ProposalRequest {
    ProposalRequest {
        mode: ProposalMode::Manual,
        context: ProposalContext {
            table_name: "pages".into(),
            record_id: Some(id(record)),
            parent_page_id: Some(id(1)),
            ..ProposalContext::default()
        },
        values: [(MANUAL_VALUE.to_string(), value.to_string())].into(),
    }
}

async fn transport(server: &MockServer) -> HttpTransport {
    let endpoint = Url::parse(&format!("{}/slug/propose", server.uri())).unwrap();
    HttpTransport::new(endpoint)
}

#[tokio::test]
async fn posts_form_and_reads_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slug/propose"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("mode=manual"))
        .respond_with(HandlerResponder::new())
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server)
        .await
        .propose(&manual(3, "/Demo"))
        .await
        .unwrap();

    assert_eq!(response.proposal, "/demo-1");
    assert!(response.has_conflicts);
    assert_eq!(response.slug, "/demo");
}

#[tokio::test]
async fn own_slug_is_not_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(HandlerResponder::new())
        .mount(&server)
        .await;

    let response = transport(&server)
        .await
        .propose(&manual(2, "/demo"))
        .await
        .unwrap();

    assert_eq!(response.proposal, "/demo");
    assert!(!response.has_conflicts);
}

#[tokio::test]
async fn forbidden_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad signature"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .await
        .propose(&manual(2, "/x"))
        .await
        .unwrap_err();

    assert_eq!(err, TransportError::Rejected("bad signature".into()));
}

#[tokio::test]
async fn server_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = transport(&server)
        .await
        .propose(&manual(2, "/x"))
        .await
        .unwrap_err();

    match err {
        TransportError::Status { status, message } => {
            assert_eq!(status, 500);
            assert!(message.starts_with("server error"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .await
        .propose(&manual(2, "/x"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::InvalidResponse(_)), "{err:?}");
}
