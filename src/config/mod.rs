//! Configuration loading and management for the payroll tracker.
//!
//! This module loads the server, authentication, storage and custom field
//! category settings from a YAML file.
//!
//! # Example
//!
//! ```no_run
//! use salarium::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/salarium.yaml").unwrap();
//! println!("Income categories: {}", config.categories().income.len());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, AuthConfig, Category, CategoryTable, ServerConfig, StorageConfig};
