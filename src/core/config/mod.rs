//! core::config
//!
//! Configuration schema and loading.
//!
//! # Lookup
//!
//! The configuration file is searched in order:
//! 1. An explicit path (the CLI `--config` flag)
//! 2. `$SLUGSYNC_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/slugsync/config.toml`
//! 4. `~/.slugsync/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Defaults
//!
//! | Setting | Default |
//! |---|---|
//! | `sync.enabled` | `true` |
//! | `sync.default_on` | `true` |
//! | `lock.enabled` | `true` |
//! | `generator.fields` | `[["title"]]` |
//! | `generator.fallback_character` | `-` |
//! | `permissions.last_segment_only` | `false` |
//! | `permissions.full_path_editing` | `true` |
//! | `uniqueness.max_attempts` | `1000` |
//! | `widget.settle_ms` | `400` |
//!
//! # Example
//!
//! ```
//! use slugsync::core::config::Config;
//!
//! let config = Config::from_toml_str("[permissions]\nlast_segment_only = true\n").unwrap();
//! assert!(config.last_segment_only());
//! assert!(config.sync_enabled());
//! assert_eq!(config.fallback_character(), '-');
//! ```

pub mod schema;

pub use schema::{
    ConfigFile, GeneratorConfig, LockConfig, PermissionsConfig, PostModifier, SyncConfig,
    UniquenessConfig, WidgetDefaults,
};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::naming::DEFAULT_FALLBACK;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SLUGSYNC_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: ConfigFile,
    /// Path the file was loaded from (if any)
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Wrap an already parsed file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if validation fails.
    pub fn new(file: ConfigFile) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self {
            file,
            loaded_from: None,
        })
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        Self::new(file)
    }

    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. An explicit path that does not exist is a read error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                return Self::load_from(&candidate);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from one file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("slugsync/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".slugsync/config.toml"));
        }
        paths
    }

    /// Render the effective configuration (defaults filled in) as TOML.
    pub fn to_effective_toml(&self) -> Result<String, ConfigError> {
        let effective = ConfigFile {
            sync: Some(SyncConfig {
                enabled: Some(self.sync_enabled()),
                default_on: Some(self.sync_default_on()),
            }),
            lock: Some(LockConfig {
                enabled: Some(self.lock_enabled()),
            }),
            generator: Some(GeneratorConfig {
                fields: Some(self.generator_fields().to_vec()),
                fallback_character: Some(self.fallback_character()),
                post_modifiers: Some(self.post_modifiers().to_vec()),
            }),
            permissions: Some(PermissionsConfig {
                last_segment_only: Some(self.last_segment_only()),
                full_path_editing: Some(self.full_path_editing()),
            }),
            uniqueness: Some(UniquenessConfig {
                max_attempts: Some(self.max_unique_attempts()),
            }),
            widget: Some(WidgetDefaults {
                settle_ms: Some(self.settle_window().as_millis() as u64),
            }),
        };
        toml::to_string_pretty(&effective).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Whether the sync feature is enabled. Defaults to `true`.
    pub fn sync_enabled(&self) -> bool {
        self.file
            .sync
            .as_ref()
            .and_then(|s| s.enabled)
            .unwrap_or(true)
    }

    /// Whether new nodes start with sync on. Defaults to `true`.
    pub fn sync_default_on(&self) -> bool {
        self.file
            .sync
            .as_ref()
            .and_then(|s| s.default_on)
            .unwrap_or(true)
    }

    /// Whether the lock feature is enabled. Defaults to `true`.
    pub fn lock_enabled(&self) -> bool {
        self.file
            .lock
            .as_ref()
            .and_then(|l| l.enabled)
            .unwrap_or(true)
    }

    /// Generator fallback chains. Defaults to `[["title"]]`.
    pub fn generator_fields(&self) -> &[Vec<String>] {
        static DEFAULT: std::sync::OnceLock<Vec<Vec<String>>> = std::sync::OnceLock::new();
        self.file
            .generator
            .as_ref()
            .and_then(|g| g.fields.as_deref())
            .unwrap_or_else(|| DEFAULT.get_or_init(|| vec![vec!["title".to_string()]]))
    }

    /// Whether a generator is configured at all.
    pub fn has_generator(&self) -> bool {
        !self.generator_fields().is_empty()
    }

    /// The required fields: the last field of every fallback chain.
    pub fn required_fields(&self) -> Vec<&str> {
        self.generator_fields()
            .iter()
            .filter_map(|chain| chain.last().map(String::as_str))
            .collect()
    }

    /// Every field any chain reads from.
    pub fn source_fields(&self) -> Vec<&str> {
        self.generator_fields()
            .iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Fallback character. Defaults to `-`.
    pub fn fallback_character(&self) -> char {
        self.file
            .generator
            .as_ref()
            .and_then(|g| g.fallback_character)
            .unwrap_or(DEFAULT_FALLBACK)
    }

    /// Configured post modifiers, in order.
    pub fn post_modifiers(&self) -> &[PostModifier] {
        self.file
            .generator
            .as_ref()
            .and_then(|g| g.post_modifiers.as_deref())
            .unwrap_or(&[])
    }

    /// Whether non-admins may only edit the last segment. Defaults to `false`.
    pub fn last_segment_only(&self) -> bool {
        self.file
            .permissions
            .as_ref()
            .and_then(|p| p.last_segment_only)
            .unwrap_or(false)
    }

    /// Whether one-time full-path edits are allowed. Defaults to `true`.
    pub fn full_path_editing(&self) -> bool {
        self.file
            .permissions
            .as_ref()
            .and_then(|p| p.full_path_editing)
            .unwrap_or(true)
    }

    /// Maximum numeric suffix tried for collisions. Defaults to `1000`.
    pub fn max_unique_attempts(&self) -> u32 {
        self.file
            .uniqueness
            .as_ref()
            .and_then(|u| u.max_attempts)
            .unwrap_or(1000)
    }

    /// Settle window for background proposals. Defaults to 400ms.
    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(
            self.file
                .widget
                .as_ref()
                .and_then(|w| w.settle_ms)
                .unwrap_or(400),
        )
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
