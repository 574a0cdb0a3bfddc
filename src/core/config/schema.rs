//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g. the fallback character
//! must not be `/` or alphanumeric, generator chains must not be empty).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// [sync]
/// enabled = true
/// default_on = true
///
/// [lock]
/// enabled = true
///
/// [generator]
/// fields = [["nav_title", "title"]]
/// fallback_character = "-"
///
/// [[generator.post_modifiers]]
/// kind = "replace"
/// from = "&"
/// to = "and"
///
/// [permissions]
/// last_segment_only = false
/// full_path_editing = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Auto-sync settings
    pub sync: Option<SyncConfig>,

    /// Explicit lock settings
    pub lock: Option<LockConfig>,

    /// Slug generator settings
    pub generator: Option<GeneratorConfig>,

    /// Edit-scope settings for non-admin editors
    pub permissions: Option<PermissionsConfig>,

    /// Sibling collision settings
    pub uniqueness: Option<UniquenessConfig>,

    /// Editing widget defaults
    pub widget: Option<WidgetDefaults>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(generator) = &self.generator {
            generator.validate()?;
        }
        if let Some(uniqueness) = &self.uniqueness {
            if uniqueness.max_attempts == Some(0) {
                return Err(ConfigError::InvalidValue(
                    "uniqueness.max_attempts must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Auto-sync settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Global sync feature switch
    pub enabled: Option<bool>,

    /// Initial sync flag of new nodes
    pub default_on: Option<bool>,
}

/// Explicit lock settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// Global lock feature switch
    pub enabled: Option<bool>,
}

/// Slug generator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Fallback chains of source fields. The first non-empty field of each
    /// chain contributes one path part; the last field of a chain is required.
    pub fields: Option<Vec<Vec<String>>>,

    /// Character substituted for whitespace and separators
    pub fallback_character: Option<char>,

    /// Transformations applied to the generated value before sanitizing
    pub post_modifiers: Option<Vec<PostModifier>>,
}

impl GeneratorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(fallback) = self.fallback_character {
            if fallback == '/' || fallback.is_alphanumeric() || fallback.is_whitespace() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid fallback character '{fallback}'"
                )));
            }
        }

        if let Some(chains) = &self.fields {
            if chains.iter().any(|chain| chain.is_empty()) {
                return Err(ConfigError::InvalidValue(
                    "generator.fields cannot contain an empty fallback chain".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// A transformation applied to generated slugs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum PostModifier {
    /// Replace every occurrence of `from` with `to`
    Replace { from: String, to: String },

    /// Truncate each generated segment to at most `max` characters
    MaxSegmentLength { max: usize },
}

/// Edit-scope settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionsConfig {
    /// Non-admins may only change the last segment
    pub last_segment_only: Option<bool>,

    /// Editors may request a one-time full-path edit
    pub full_path_editing: Option<bool>,
}

/// Sibling collision settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UniquenessConfig {
    /// Upper bound on numeric suffix attempts
    pub max_attempts: Option<u32>,
}

/// Editing widget defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WidgetDefaults {
    /// Settle window for background proposals, in milliseconds
    pub settle_ms: Option<u64>,
}
