//! Parser limits, optionally loaded from a TOML file.
//!
//! A missing or empty file yields `Config::default()`. Unknown keys are
//! accepted and logged, so a typo shows up in the logs rather than as an
//! error. Limits of zero are rejected.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read parser limits from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in parser limits: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Limits file is {size} bytes, larger than the {max} bytes allowed")]
    FileTooLarge { size: u64, max: u64 },

    /// A limit that would reject every document.
    #[error("Limit '{key}' must be greater than zero")]
    ZeroLimit { key: &'static str },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Limits and switches applied while reading Atom documents.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SEC-003: Maximum element nesting depth accepted by the parser.
    pub max_depth: usize,

    /// Maximum size of a single document in bytes.
    pub max_document_bytes: u64,

    /// Whether XML comments are kept in the tree and written back out.
    pub keep_comments: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_document_bytes: 16 * 1024 * 1024,
            keep_comments: true,
        }
    }
}

impl Config {
    /// SEC-014: Maximum limits file size (64 KiB); the file holds three keys.
    const MAX_FILE_SIZE: u64 = 64 * 1024;

    const KNOWN_KEYS: [&'static str; 3] = ["max_depth", "max_document_bytes", "keep_comments"];

    /// Load parser limits from a TOML file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::FileTooLarge`] when the file exceeds 64 KiB
    /// - [`ConfigError::Read`] when it exists but cannot be read
    /// - [`ConfigError::Parse`] for invalid TOML or mistyped values
    /// - [`ConfigError::ZeroLimit`] when `max_depth` or `max_document_bytes` is 0
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let read_error = |source: std::io::Error| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };

        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No limits file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(read_error(e)),
        };
        // SEC-014: Check size before reading
        if size > Self::MAX_FILE_SIZE {
            return Err(ConfigError::FileTooLarge {
                size,
                max: Self::MAX_FILE_SIZE,
            });
        }

        let content = std::fs::read_to_string(path).map_err(read_error)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            max_depth = config.max_depth,
            max_document_bytes = config.max_document_bytes,
            keep_comments = config.keep_comments,
            "Loaded parser limits"
        );
        Ok(config)
    }

    /// Parse limits from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: toml::Table = content.parse()?;
        for key in raw.keys() {
            if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "Unknown parser limit, ignoring");
            }
        }

        let config: Config = toml::Value::Table(raw).try_into()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroLimit { key: "max_depth" });
        }
        if self.max_document_bytes == 0 {
            return Err(ConfigError::ZeroLimit {
                key: "max_document_bytes",
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.max_document_bytes, 16 * 1024 * 1024);
        assert!(config.keep_comments);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/atomutil_test_nonexistent_limits.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_whitespace_only_returns_default() {
        let config = Config::from_toml_str("   \n  \n  ").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::from_toml_str("max_depth = 32\n").unwrap();
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.max_document_bytes, 16 * 1024 * 1024);
        assert!(config.keep_comments);
    }

    #[test]
    fn test_full_config_from_file() {
        let dir = std::env::temp_dir().join("atomutil_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("limits.toml");
        std::fs::write(
            &path,
            "max_depth = 10\nmax_document_bytes = 2048\nkeep_comments = false\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.max_document_bytes, 2048);
        assert!(!config.keep_comments);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::from_toml_str("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::from_toml_str("max_depth = 64\ntotally_fake_key = 1\n").unwrap();
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let err = Config::from_toml_str("max_depth = \"deep\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let err = Config::from_toml_str("max_depth = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroLimit { key: "max_depth" }));

        let err = Config::from_toml_str("max_document_bytes = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ZeroLimit {
                key: "max_document_bytes"
            }
        ));
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_unreadable_path_reports_path() {
        // A directory passes the metadata check but cannot be read as text
        let dir = std::env::temp_dir().join("atomutil_config_test_dir");
        std::fs::create_dir_all(&dir).unwrap();

        let err = Config::load(&dir).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("atomutil_config_test_dir"));

        std::fs::remove_dir_all(&dir).ok();
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("atomutil_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("limits.toml");
        std::fs::write(&path, "#".repeat(64 * 1024 + 1)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FileTooLarge {
                size: 65_537,
                max: 65_536
            }
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
