//! Configuration loading, parsing, and validation for svnmig.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use svnmig::config::{load_merged_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".svnmig");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "authors:\n  domain: example.com\n").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.authors.domain, "example.com");
//! ```
//!
//! # Configuration File Locations
//!
//! Configuration is merged in this order, later files winning:
//! 1. User global config (`~/.svnmig/config.yml`)
//! 2. Project config (`.svnmig/config.yml`)
//! 3. Local overrides (`.svnmig/config.local.yml`)

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use schema::{AuthorsConfig, ConnectivityConfig, DependencyConfig, SvnmigConfig, VerifyConfig};

pub use loader::{
    find_project_root, load_config, load_config_file, load_config_value, load_merged_config,
    parse_config, ConfigPaths, CONFIG_DIR,
};

pub use merger::{deep_merge, merge_configs};

pub use validator::{validate, validate_config, ValidationError};
