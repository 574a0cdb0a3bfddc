//! protocol::handler
//!
//! Server side of the proposal protocol: computes one slug proposal for the
//! editing widget without persisting anything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::naming;
use crate::core::node::Node;
use crate::core::types::SlugPath;
use crate::engine::policy::SyncPolicyEngine;
use crate::protocol::request::{ProposalContext, ProposalMode, ProposalRequest, MANUAL_VALUE};
use crate::protocol::ProtocolError;
use crate::store::NodeStore;

/// Checks the opaque request signature.
///
/// The signing algorithm belongs to the host; the handler only asks.
pub trait SignatureVerifier {
    fn verify(&self, context: &ProposalContext) -> bool;
}

/// Accepts every request (local tooling and tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SignatureVerifier for AcceptAll {
    fn verify(&self, _context: &ProposalContext) -> bool {
        true
    }
}

/// Accepts exactly one pre-shared token.
#[derive(Debug, Clone)]
pub struct FixedSignature(pub String);

impl SignatureVerifier for FixedSignature {
    fn verify(&self, context: &ProposalContext) -> bool {
        !self.0.is_empty() && context.signature == self.0
    }
}

/// A computed proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// The unique value to use; empty when no slug could be built.
    pub value: String,
    /// Whether `value` differs from the candidate.
    pub has_conflict: bool,
    /// The candidate that collided.
    pub conflicting_value: String,
}

impl Proposal {
    fn resolved(candidate: &SlugPath, unique: SlugPath) -> Self {
        Self {
            has_conflict: &unique != candidate,
            value: unique.into(),
            conflicting_value: candidate.to_string(),
        }
    }

    fn empty() -> Self {
        Self {
            value: String::new(),
            has_conflict: false,
            conflicting_value: String::new(),
        }
    }
}

/// The JSON response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub proposal: String,
    #[serde(rename = "hasConflicts")]
    pub has_conflicts: bool,
    pub slug: String,
}

impl From<Proposal> for ProposalResponse {
    fn from(p: Proposal) -> Self {
        Self {
            proposal: p.value,
            has_conflicts: p.has_conflict,
            slug: p.conflicting_value,
        }
    }
}

/// Computes proposals against a store.
pub struct ProposalHandler<'a, S: ?Sized, V> {
    store: &'a S,
    config: &'a Config,
    verifier: V,
}

impl<'a, S: NodeStore + ?Sized, V: SignatureVerifier> ProposalHandler<'a, S, V> {
    pub fn new(store: &'a S, config: &'a Config, verifier: V) -> Self {
        Self {
            store,
            config,
            verifier,
        }
    }

    /// Verify, compute and wrap a proposal.
    pub fn handle(&self, request: &ProposalRequest) -> Result<ProposalResponse, ProtocolError> {
        if !self.verifier.verify(&request.context) {
            tracing::warn!(
                record = ?request.context.record_id,
                table = %request.context.table_name,
                "proposal request with invalid signature"
            );
            return Err(ProtocolError::InvalidSignature);
        }
        let proposal = self.propose(request.mode, &request.context, &request.values)?;
        tracing::debug!(
            mode = %request.mode,
            proposal = %proposal.value,
            conflict = proposal.has_conflict,
            "proposal computed"
        );
        Ok(proposal.into())
    }

    /// Parse a form body and handle it.
    pub fn handle_form(&self, body: &[u8]) -> Result<ProposalResponse, ProtocolError> {
        self.handle(&ProposalRequest::from_form(body)?)
    }

    /// Compute a proposal.
    ///
    /// `manual` sanitizes the typed candidate and resolves uniqueness.
    /// `recreate` and `auto` regenerate from `values` overlaid on the stored
    /// record.
    pub fn propose(
        &self,
        mode: ProposalMode,
        context: &ProposalContext,
        values: &BTreeMap<String, String>,
    ) -> Result<Proposal, ProtocolError> {
        let mut node = self.subject(context)?;
        let sync = SyncPolicyEngine::new(self.config);

        match mode {
            ProposalMode::Manual => {
                let raw = values
                    .get(MANUAL_VALUE)
                    .ok_or(ProtocolError::MissingField("values[manual]"))?;
                let candidate = SlugPath::from_sanitized(naming::sanitize_path(
                    raw,
                    self.config.fallback_character(),
                ));
                let unique = sync.unique(self.store, &node, &candidate)?;
                Ok(Proposal::resolved(&candidate, unique))
            }
            ProposalMode::Recreate | ProposalMode::Auto => {
                node.fields.extend(
                    values
                        .iter()
                        .filter(|(field, _)| field.as_str() != MANUAL_VALUE)
                        .map(|(field, value)| (field.clone(), value.clone())),
                );
                let Some(parent) = sync.parent_slug(self.store, &node)? else {
                    return Ok(Proposal::empty());
                };
                let Some(local) = sync.generator().local_part(&node.fields) else {
                    return Ok(Proposal::empty());
                };
                let candidate =
                    SlugPath::from_sanitized(naming::join_path(parent.as_str(), &local));
                let unique = sync.unique(self.store, &node, &candidate)?;
                Ok(Proposal::resolved(&candidate, unique))
            }
        }
    }

    /// The stored record, or a fresh node under `parentPageId`.
    fn subject(&self, context: &ProposalContext) -> Result<Node, ProtocolError> {
        if let Some(id) = context.record_id {
            if let Some(node) = self.store.get(id)? {
                return Ok(node);
            }
        }
        let parent = context
            .parent_page_id
            .or(context.page_id)
            .ok_or(ProtocolError::MissingField("parentPageId"))?;
        let mut node = Node::new(self.store.next_id()?, Some(parent), SlugPath::root());
        node.language = context.language;
        Ok(node)
    }
}
