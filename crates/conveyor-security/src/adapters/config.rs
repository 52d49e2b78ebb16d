//! TOML configuration adapter.
//!
//! Loads a [`SecurityConfig`] from a TOML file.
//!
//! # Config File Format
//!
//! ```toml
//! task_serializer = "auth"
//! payload_serializer = "json"
//! digest = "sha1"
//! key_file = "/etc/conveyor/worker.key"
//! certificate_file = "/etc/conveyor/worker.cert"
//! trust_store_dir = "/etc/conveyor/trust"
//! trusted_serializers = ["json"]
//! ```

use crate::domain::errors::ConfigError;
use crate::setup::SecurityConfig;
use std::fs;
use std::path::Path;

/// Load a [`SecurityConfig`] from a TOML file at `path`.
pub fn load_security_config(path: &Path) -> Result<SecurityConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::UnreadableSource {
        what: "security configuration",
        source_desc: path.display().to_string(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Invalid {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Test: a full config file parses into the expected fields
    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security.toml");
        fs::write(
            &path,
            r#"
task_serializer = "auth"
digest = "sha256"
key_file = "/etc/conveyor/worker.key"
certificate_file = "/etc/conveyor/worker.cert"
trust_store_dir = "/etc/conveyor/trust"
trusted_serializers = ["json"]
"#,
        )
        .unwrap();

        let config = load_security_config(&path).unwrap();
        assert_eq!(config.task_serializer, "auth");
        assert_eq!(config.payload_serializer, "json");
        assert_eq!(config.digest, "sha256");
        assert_eq!(
            config.key_file,
            Some(PathBuf::from("/etc/conveyor/worker.key"))
        );
        assert_eq!(
            config.trusted_serializers,
            Some(vec!["json".to_owned()])
        );
    }

    /// Test: an empty file yields the defaults
    #[test]
    fn test_load_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security.toml");
        fs::write(&path, "").unwrap();

        let config = load_security_config(&path).unwrap();
        assert_eq!(config.task_serializer, "json");
        assert_eq!(config.digest, "sha1");
        assert_eq!(config.key_file, None);
        assert_eq!(config.trusted_serializers, None);
    }

    /// Test: malformed TOML is a typed configuration error
    #[test]
    fn test_load_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security.toml");
        fs::write(&path, "task_serializer = [not toml").unwrap();

        let err = load_security_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    /// Test: a missing file is unreadable
    #[test]
    fn test_load_missing_config() {
        let err = load_security_config(Path::new("/nonexistent/security.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnreadableSource { .. }));
    }
}
