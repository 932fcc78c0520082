//! Configuration types for the payroll tracker.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::FieldType;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_token_ttl_minutes() -> i64 {
    60 * 24
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens.
    pub jwt_secret: String,
    /// Lifetime of an access token in minutes.
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
}

/// Persistence settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// JSON snapshot file. Without one the store lives only in memory.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

/// One selectable category for custom fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable key stored on field definitions.
    pub key: String,
    /// Human-readable label.
    pub label: String,
}

impl Category {
    fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// The category lists for income and deduction fields.
///
/// Loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    /// Categories allowed for income fields.
    pub income: Vec<Category>,
    /// Categories allowed for deduction fields.
    pub deduction: Vec<Category>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            income: vec![
                Category::new("base_salary", "Base salary"),
                Category::new("performance", "Performance"),
                Category::new("allowance", "Allowance"),
                Category::new("bonus", "Bonus"),
                Category::new("welfare", "Welfare"),
                Category::new("other_income", "Other income"),
            ],
            deduction: vec![
                Category::new("insurance", "Insurance"),
                Category::new("housing_fund", "Housing fund"),
                Category::new("tax", "Tax"),
                Category::new("other_deduction", "Other deduction"),
            ],
        }
    }
}

impl CategoryTable {
    /// Returns the categories configured for `field_type`.
    pub fn categories_for(&self, field_type: FieldType) -> &[Category] {
        match field_type {
            FieldType::Income => &self.income,
            FieldType::Deduction => &self.deduction,
        }
    }

    /// Returns true if `key` is a category of `field_type`.
    pub fn contains(&self, field_type: FieldType, key: &str) -> bool {
        self.categories_for(field_type).iter().any(|c| c.key == key)
    }

    /// Returns the category keys of `field_type` in configured order.
    pub fn keys_for(&self, field_type: FieldType) -> Vec<String> {
        self.categories_for(field_type)
            .iter()
            .map(|c| c.key.clone())
            .collect()
    }
}

/// The complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Bearer token settings.
    pub auth: AuthConfig,
    /// Persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Custom field categories.
    #[serde(default)]
    pub categories: CategoryTable,
}

impl AppConfig {
    /// Creates an in-memory configuration with default categories.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig {
                jwt_secret: jwt_secret.into(),
                token_ttl_minutes: default_token_ttl_minutes(),
            },
            storage: StorageConfig::default(),
            categories: CategoryTable::default(),
        }
    }
}
