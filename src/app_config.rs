//! Module for application configuration settings.
//!
//! User configurations may be specified in a configuration file. Without one, every file type is
//! unregistered, extensions are shown and `desktop.ini` is the override descriptor.

use std::path::{Path, PathBuf};

use fs_namespace::names::is_separator;
use fs_namespace::overrides::DEFAULT_OVERRIDE_FILE;
use fs_namespace::registry::StaticTypeRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

fn default_override_file() -> String {
    DEFAULT_OVERRIDE_FILE.to_owned()
}

/// Application configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// File-type associations and extension display preferences.
    #[serde(flatten)]
    pub registry: StaticTypeRegistry,

    /// Name of the per-directory descriptor file.
    #[serde(default = "default_override_file")]
    pub override_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: StaticTypeRegistry::default(),
            override_file: default_override_file(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation errors: {0:?}")]
    ValidationErrors(Vec<String>),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Config {
    /// Validate the correctness of the configuration.
    ///
    /// Returns:
    /// - `Ok(())` if the configuration is valid.
    /// - `Err(Vec<String>)` containing a list of validation error messages otherwise.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.override_file.is_empty() {
            errors.push("override-file must not be empty.".to_owned());
        } else if self.override_file.contains(is_separator) {
            errors.push(format!(
                "override-file '{}' must be a bare file name.",
                self.override_file
            ));
        }

        for (extension, entry) in &self.registry.file_types {
            if !extension.starts_with('.') || extension.len() < 2 {
                errors.push(format!(
                    "file-types key '{extension}' must be an extension such as '.txt'."
                ));
            }
            if let Some(prog_id) = &entry.prog_id {
                if !self.registry.prog_ids.contains_key(prog_id) && entry.handlers.is_empty() {
                    errors.push(format!(
                        "file type '{extension}' refers to unknown prog-id '{prog_id}'."
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Returns config file paths in descending priority order.
    /// On macOS, skips `dirs::config_dir()` (resolves to ~/Library/Application Support/).
    fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(not(target_os = "macos"))]
        if let Some(xdg) = dirs::config_dir() {
            paths.push(xdg.join("fs-namespace").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(
                home.join(".config")
                    .join("fs-namespace")
                    .join("config.toml"),
            );
        }

        paths.push(PathBuf::from("/etc/fs-namespace/config.toml"));

        paths
    }

    /// Finds the first existing config file from search paths.
    fn find_config_file() -> Option<PathBuf> {
        Self::config_search_paths().into_iter().find(|p| p.exists())
    }

    /// Loads config from a single TOML file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = ?path, "Loading configuration file.");
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads configuration from the first found config file, or the external path if given.
    pub fn load(external_config_path: Option<&Path>) -> Option<Result<Self, ConfigError>> {
        if let Some(path) = external_config_path {
            return Some(Self::load_from_file(path));
        }

        Self::find_config_file().map(|path| Self::load_from_file(&path))
    }

    /// Loads config, falling back to defaults if none exists.
    /// Errors if a config file exists but is malformed or invalid.
    pub fn load_or_default(external_config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(res) = Self::load(external_config_path) else {
            debug!("No configuration file found, using defaults.");
            return Ok(Self::default());
        };

        let config = res?;
        config.validate().map_err(ConfigError::ValidationErrors)?;
        debug!("Loaded configuration successfully.");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use fs_namespace::registry::{ClassId, KEY_CLSID, TypeRegistry as _};

    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.override_file, "desktop.ini");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_registry_tables_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
hide-file-extensions = true
override-file = "folder.ini"

[file-types.".zip"]
prog-id = "CompressedFolder"

[prog-ids.CompressedFolder.handlers]
CLSID = "{E88DCCE0-B7B3-11D1-A9F0-00AA0060FA31}"
"#,
        )
        .unwrap();

        let config = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.override_file, "folder.ini");
        assert!(config.registry.hide_known_extensions());
        assert_eq!(
            config.registry.resolve(".zip", KEY_CLSID).unwrap(),
            Some(
                "{E88DCCE0-B7B3-11D1-A9F0-00AA0060FA31}"
                    .parse::<ClassId>()
                    .unwrap()
            )
        );
    }

    #[test]
    fn validation_collects_every_problem() {
        let config: Config = toml::from_str(
            r#"
override-file = "sub/desktop.ini"

[file-types.txt]
prog-id = "nowhere"
"#,
        )
        .unwrap();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "hide-file-extensions = \"sometimes\"").unwrap();
        assert!(matches!(
            Config::load_or_default(Some(&path)),
            Err(ConfigError::DeserializationError(_))
        ));
    }
}
