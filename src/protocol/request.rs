//! protocol::request
//!
//! The form-encoded proposal request.
//!
//! # Wire format
//!
//! ```text
//! mode=recreate&tableName=pages&pageId=2&parentPageId=1&recordId=2
//!     &language=0&fieldName=slug&command=edit&signature=...
//!     &values[title]=Shoes&values[nav_title]=
//! ```
//!
//! In `manual` mode the typed candidate travels as `values[manual]`. A
//! `recordId` that is empty or not numeric (e.g. `NEW64f0`) denotes a
//! record that does not exist yet.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::core::types::{LanguageId, NodeId};
use crate::protocol::ProtocolError;

/// Key of the typed candidate in `manual` mode.
pub const MANUAL_VALUE: &str = "manual";

/// How a proposal is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalMode {
    /// Background regeneration after a source field changed.
    Auto,
    /// Explicit regeneration from the current field values.
    Recreate,
    /// A literal user-typed candidate.
    Manual,
}

impl ProposalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalMode::Auto => "auto",
            ProposalMode::Recreate => "recreate",
            ProposalMode::Manual => "manual",
        }
    }
}

impl FromStr for ProposalMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ProposalMode::Auto),
            "recreate" => Ok(ProposalMode::Recreate),
            "manual" => Ok(ProposalMode::Manual),
            other => Err(ProtocolError::UnknownMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProposalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the edited slug lives. Passed through unchanged by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProposalContext {
    pub table_name: String,
    pub page_id: Option<NodeId>,
    pub parent_page_id: Option<NodeId>,
    /// `None` for a record that is not persisted yet.
    pub record_id: Option<NodeId>,
    pub language: LanguageId,
    pub field_name: String,
    pub command: String,
    /// Opaque anti-tamper token.
    pub signature: String,
}

/// A parsed proposal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRequest {
    pub mode: ProposalMode,
    pub context: ProposalContext,
    /// `values[...]` entries, keyed by field name.
    pub values: BTreeMap<String, String>,
}

impl ProposalRequest {
    /// Parse a form-encoded request body.
    ///
    /// # Errors
    ///
    /// `MissingField` if `mode` is absent or a manual request carries no
    /// candidate; `UnknownMode` and `InvalidField` for malformed values.
    pub fn from_form(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut mode = None;
        let mut context = ProposalContext::default();
        let mut values = BTreeMap::new();

        for (key, value) in form_urlencoded::parse(body) {
            let value = value.into_owned();
            match key.as_ref() {
                "mode" => mode = Some(value.parse::<ProposalMode>()?),
                "tableName" => context.table_name = value,
                "pageId" => context.page_id = parse_id("pageId", &value)?,
                "parentPageId" => context.parent_page_id = parse_id("parentPageId", &value)?,
                "recordId" => context.record_id = parse_record_id(&value),
                "language" => context.language = parse_language(&value)?,
                "fieldName" => context.field_name = value,
                "command" => context.command = value,
                "signature" => context.signature = value,
                key => match key
                    .strip_prefix("values[")
                    .and_then(|rest| rest.strip_suffix(']'))
                {
                    Some(field) if !field.is_empty() => {
                        values.insert(field.to_string(), value);
                    }
                    _ => tracing::debug!(key, "ignoring unknown request field"),
                },
            }
        }

        let mode = mode.ok_or(ProtocolError::MissingField("mode"))?;
        if mode == ProposalMode::Manual && !values.contains_key(MANUAL_VALUE) {
            return Err(ProtocolError::MissingField("values[manual]"));
        }

        Ok(Self {
            mode,
            context,
            values,
        })
    }

    /// Encode as a form body.
    pub fn to_form(&self) -> String {
        let ctx = &self.context;
        let id = |id: Option<NodeId>| id.map(|id| id.to_string()).unwrap_or_default();

        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("mode", self.mode.as_str())
            .append_pair("tableName", &ctx.table_name)
            .append_pair("pageId", &id(ctx.page_id))
            .append_pair("parentPageId", &id(ctx.parent_page_id))
            .append_pair("recordId", &id(ctx.record_id))
            .append_pair("language", &ctx.language.to_string())
            .append_pair("fieldName", &ctx.field_name)
            .append_pair("command", &ctx.command)
            .append_pair("signature", &ctx.signature);
        for (field, value) in &self.values {
            form.append_pair(&format!("values[{field}]"), value);
        }
        form.finish()
    }

    /// The typed candidate of a manual request.
    pub fn manual_value(&self) -> Option<&str> {
        self.values.get(MANUAL_VALUE).map(String::as_str)
    }
}

fn parse_id(field: &'static str, value: &str) -> Result<Option<NodeId>, ProtocolError> {
    if value.is_empty() || value == "0" {
        return Ok(None);
    }
    value
        .parse::<NodeId>()
        .map(Some)
        .map_err(|_| ProtocolError::InvalidField {
            field,
            value: value.to_string(),
        })
}

fn parse_record_id(value: &str) -> Option<NodeId> {
    value.parse::<NodeId>().ok().filter(|id| id.get() > 0)
}

fn parse_language(value: &str) -> Result<LanguageId, ProtocolError> {
    if value.is_empty() {
        return Ok(LanguageId::DEFAULT);
    }
    value
        .parse::<u32>()
        .map(LanguageId::new)
        .map_err(|_| ProtocolError::InvalidField {
            field: "language",
            value: value.to_string(),
        })
}
