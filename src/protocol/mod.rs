//! protocol
//!
//! The proposal protocol between the editing widget and the server.
//!
//! # Modules
//!
//! - [`request`] - Form-encoded request parsing and encoding
//! - [`handler`] - Proposal computation and the JSON response
//!
//! # Flow
//!
//! ```text
//! widget --POST form--> ProposalHandler::handle_form
//!        <--JSON------- { proposal, hasConflicts, slug }
//! ```
//!
//! Proposals are previews: nothing is persisted while handling a request.

pub mod handler;
pub mod request;

pub use handler::{
    AcceptAll, FixedSignature, Proposal, ProposalHandler, ProposalResponse, SignatureVerifier,
};
pub use request::{ProposalContext, ProposalMode, ProposalRequest, MANUAL_VALUE};

use thiserror::Error;

use crate::store::StoreError;

/// Errors from handling a proposal request.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("missing request field '{0}'")]
    MissingField(&'static str),

    #[error("invalid value '{value}' for request field '{field}'")]
    InvalidField { field: &'static str, value: String },

    #[error("unknown proposal mode '{0}'")]
    UnknownMode(String),

    #[error("request signature rejected")]
    InvalidSignature,

    #[error(transparent)]
    Store(#[from] StoreError),
}
