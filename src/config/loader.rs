//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the
//! application configuration from a YAML file.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{PayrollError, PayrollResult};

use super::types::{AppConfig, CategoryTable};

/// Loads and provides access to the application configuration.
///
/// # File Layout
///
/// ```text
/// server:
///   host: 127.0.0.1
///   port: 8000
/// auth:
///   jwt_secret: change-me
///   token_ttl_minutes: 1440
/// storage:
///   data_file: data/salarium.json
/// categories:
///   income:
///     - { key: bonus, label: Bonus }
///   deduction:
///     - { key: insurance, label: Insurance }
/// ```
///
/// Only `auth.jwt_secret` is required.
///
/// # Example
///
/// ```no_run
/// use salarium::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/salarium.yaml")?;
/// println!("Listening on {}", loader.config().server.bind_address());
/// # Ok::<(), salarium::error::PayrollError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Loads configuration from the YAML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`PayrollError::ConfigNotFound`] if the file cannot be read
    /// - [`PayrollError::ConfigParseError`] if the YAML is invalid or the
    ///   values are inconsistent
    pub fn load<P: AsRef<Path>>(path: P) -> PayrollResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| PayrollError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let loader = Self::from_yaml(&content, &path_str)?;
        info!(
            path = %path_str,
            income_categories = loader.config.categories.income.len(),
            deduction_categories = loader.config.categories.deduction.len(),
            "Loaded configuration"
        );
        Ok(loader)
    }

    /// Parses configuration from YAML text. `source` names the origin in
    /// error messages.
    pub fn from_yaml(content: &str, source: &str) -> PayrollResult<Self> {
        let config: AppConfig =
            serde_yaml::from_str(content).map_err(|e| PayrollError::ConfigParseError {
                path: source.to_string(),
                message: e.to_string(),
            })?;

        Self::from_config(config).map_err(|message| PayrollError::ConfigParseError {
            path: source.to_string(),
            message,
        })
    }

    fn from_config(config: AppConfig) -> Result<Self, String> {
        if config.auth.jwt_secret.trim().is_empty() {
            return Err("auth.jwt_secret must not be empty".to_string());
        }
        if config.auth.token_ttl_minutes <= 0 {
            return Err("auth.token_ttl_minutes must be positive".to_string());
        }
        if config.categories.income.is_empty() || config.categories.deduction.is_empty() {
            return Err("categories.income and categories.deduction must not be empty".to_string());
        }
        Ok(Self { config })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the custom field category table.
    pub fn categories(&self) -> &CategoryTable {
        &self.config.categories
    }
}

impl TryFrom<AppConfig> for ConfigLoader {
    type Error = PayrollError;

    /// Applies the same checks as [`ConfigLoader::from_yaml`].
    fn try_from(config: AppConfig) -> PayrollResult<Self> {
        Self::from_config(config).map_err(|message| PayrollError::ConfigParseError {
            path: "<in-memory>".to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;

    fn config_path() -> &'static str {
        "./config/salarium.yaml"
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.config().server.port, 8000);
        assert_eq!(loader.config().auth.token_ttl_minutes, 1440);
        assert!(loader.categories().contains(FieldType::Income, "bonus"));
        assert!(loader.categories().contains(FieldType::Deduction, "tax"));
    }

    #[test]
    fn test_load_missing_file_returns_error() {
        match ConfigLoader::load("/nonexistent/salarium.yaml") {
            Err(PayrollError::ConfigNotFound { path }) => {
                assert!(path.contains("salarium.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml_returns_parse_error() {
        match ConfigLoader::from_yaml("auth: [unclosed", "inline") {
            Err(PayrollError::ConfigParseError { path, .. }) => assert_eq!(path, "inline"),
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_secret_returns_parse_error() {
        let result = ConfigLoader::from_yaml("server:\n  port: 9000\n", "inline");
        assert!(matches!(result, Err(PayrollError::ConfigParseError { .. })));
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        match ConfigLoader::from_yaml("auth:\n  jwt_secret: \"  \"\n", "inline") {
            Err(PayrollError::ConfigParseError { message, .. }) => {
                assert!(message.contains("jwt_secret"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_categories_replace_defaults() {
        let yaml = r#"
auth:
  jwt_secret: s3cret
categories:
  income:
    - { key: stipend, label: Stipend }
  deduction:
    - { key: rent, label: Rent }
"#;
        let loader = ConfigLoader::from_yaml(yaml, "inline").unwrap();

        assert!(loader.categories().contains(FieldType::Income, "stipend"));
        assert!(!loader.categories().contains(FieldType::Income, "bonus"));
        assert_eq!(loader.categories().keys_for(FieldType::Deduction), vec!["rent"]);
    }

    #[test]
    fn test_in_memory_config_is_validated() {
        assert!(ConfigLoader::try_from(AppConfig::new("s3cret")).is_ok());

        let blank = AppConfig::new(" ");
        assert!(matches!(
            ConfigLoader::try_from(blank),
            Err(PayrollError::ConfigParseError { .. })
        ));

        let mut no_ttl = AppConfig::new("s3cret");
        no_ttl.auth.token_ttl_minutes = 0;
        match ConfigLoader::try_from(no_ttl) {
            Err(PayrollError::ConfigParseError { message, .. }) => {
                assert!(message.contains("token_ttl_minutes"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }

        let mut no_categories = AppConfig::new("s3cret");
        no_categories.categories.deduction.clear();
        assert!(ConfigLoader::try_from(no_categories).is_err());
    }

    #[test]
    fn test_empty_category_list_is_rejected() {
        let yaml = "auth:\n  jwt_secret: s3cret\ncategories:\n  income: []\n  deduction: []\n";
        assert!(matches!(
            ConfigLoader::from_yaml(yaml, "inline"),
            Err(PayrollError::ConfigParseError { .. })
        ));
    }
}
