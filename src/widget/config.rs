//! widget::config
//!
//! Widget configuration from host attributes.
//!
//! The host page configures each widget instance through kebab-case
//! attribute/value pairs. Boolean attributes are true when present with an
//! empty value, `true` or `1`.

use std::time::Duration;

use thiserror::Error;

use crate::core::config::Config;
use crate::core::naming::DEFAULT_FALLBACK;
use crate::core::types::{LanguageId, NodeId};
use crate::protocol::ProposalContext;

/// Default coalescing window for background proposals.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(400);

/// Errors from reading widget attributes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WidgetConfigError {
    #[error("invalid value '{value}' for widget attribute '{attribute}'")]
    InvalidAttribute { attribute: String, value: String },
}

/// Static configuration of one widget instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Initial slug.
    pub value: String,
    /// Display-only prefix (e.g. the site base URL).
    pub prefix: String,
    pub locked_prefix: String,
    pub last_segment_only: bool,
    pub is_locked: bool,
    pub is_synced: bool,
    pub sync_feature: bool,
    pub lock_feature: bool,
    /// The server rewrites slugs after generation, so unchanged commits are still sent.
    pub has_post_modifiers: bool,
    pub required_source_fields: Vec<String>,
    pub fallback_character: char,
    pub full_path_feature: bool,
    /// Protocol context, passed through to every request.
    pub context: ProposalContext,
    pub settle: Duration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            value: "/".to_string(),
            prefix: String::new(),
            locked_prefix: String::new(),
            last_segment_only: false,
            is_locked: false,
            is_synced: false,
            sync_feature: false,
            lock_feature: false,
            has_post_modifiers: false,
            required_source_fields: Vec::new(),
            fallback_character: DEFAULT_FALLBACK,
            full_path_feature: false,
            context: ProposalContext::default(),
            settle: DEFAULT_SETTLE,
        }
    }
}

impl WidgetConfig {
    /// Read attribute pairs. Unknown attributes are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use slugsync::widget::WidgetConfig;
    ///
    /// let config = WidgetConfig::from_attributes([
    ///     ("value", "/shop/shoes"),
    ///     ("last-segment-only", ""),
    ///     ("sync-feature-enabled", "true"),
    ///     ("required-source-fields", "title, nav_title"),
    ///     ("record-id", "3"),
    /// ])
    /// .unwrap();
    ///
    /// assert!(config.last_segment_only);
    /// assert!(config.sync_feature);
    /// assert!(!config.lock_feature);
    /// assert_eq!(config.required_source_fields, vec!["title", "nav_title"]);
    /// ```
    pub fn from_attributes<K, V>(
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, WidgetConfigError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (name, value) in attributes {
            let (name, value) = (name.as_ref(), value.as_ref());
            let invalid = || WidgetConfigError::InvalidAttribute {
                attribute: name.to_string(),
                value: value.to_string(),
            };

            match name {
                "value" => config.value = value.to_string(),
                "prefix" => config.prefix = value.to_string(),
                "locked-prefix" => config.locked_prefix = value.trim_end_matches('/').to_string(),
                "last-segment-only" => config.last_segment_only = flag(value).ok_or_else(invalid)?,
                "is-locked" => config.is_locked = flag(value).ok_or_else(invalid)?,
                "is-synced" => config.is_synced = flag(value).ok_or_else(invalid)?,
                "sync-feature-enabled" => config.sync_feature = flag(value).ok_or_else(invalid)?,
                "lock-feature-enabled" => config.lock_feature = flag(value).ok_or_else(invalid)?,
                "has-post-modifiers" => {
                    config.has_post_modifiers = flag(value).ok_or_else(invalid)?
                }
                "full-path-feature-enabled" => {
                    config.full_path_feature = flag(value).ok_or_else(invalid)?
                }
                "required-source-fields" => {
                    config.required_source_fields = value
                        .split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string)
                        .collect()
                }
                "fallback-character" => {
                    let mut chars = value.chars();
                    config.fallback_character = match (chars.next(), chars.next()) {
                        (Some(c), None) if c != '/' && !c.is_alphanumeric() => c,
                        _ => return Err(invalid()),
                    };
                }
                "page-id" => config.context.page_id = id(value).ok_or_else(invalid)?,
                "parent-page-id" => config.context.parent_page_id = id(value).ok_or_else(invalid)?,
                "record-id" => {
                    config.context.record_id = value.parse::<NodeId>().ok().filter(|id| id.get() > 0)
                }
                "table-name" => config.context.table_name = value.to_string(),
                "field-name" => config.context.field_name = value.to_string(),
                "language" => {
                    config.context.language =
                        LanguageId::new(value.parse::<u32>().map_err(|_| invalid())?)
                }
                "signature" => config.context.signature = value.to_string(),
                "command" => config.context.command = value.to_string(),
                other => tracing::debug!(attribute = other, "ignoring unknown widget attribute"),
            }
        }
        Ok(config)
    }

    /// Take feature switches and the settle window from the engine config.
    pub fn with_engine_config(mut self, config: &Config) -> Self {
        self.sync_feature = config.sync_enabled();
        self.lock_feature = config.lock_enabled();
        self.last_segment_only = config.last_segment_only();
        self.full_path_feature = config.full_path_editing();
        self.fallback_character = config.fallback_character();
        self.has_post_modifiers = !config.post_modifiers().is_empty();
        self.required_source_fields = config
            .required_fields()
            .into_iter()
            .map(str::to_string)
            .collect();
        self.settle = config.settle_window();
        self
    }
}

fn flag(value: &str) -> Option<bool> {
    match value.trim() {
        "" | "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn id(value: &str) -> Option<Option<NodeId>> {
    match value.trim() {
        "" | "0" => Some(None),
        v => v.parse::<NodeId>().ok().map(Some),
    }
}
