//! Configuration loading and validation.
//!
//! - Schema definitions in [`schema`]
//! - File discovery, loading and environment overrides in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use testchain::config::load_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join(".testchain.yml"), "ordering:\n  groups: front\n").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! assert_eq!(config.ordering.groups.to_string(), "front");
//! ```
//!
//! # Priority
//!
//! 1. Defaults
//! 2. `.testchain.yml` in the project root, or the file given with `--config`
//! 3. `TESTCHAIN_*` environment variables

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{
    apply_env_overrides, find_config, load_config, load_config_file, load_config_with_env,
    parse_config, CONFIG_FILE_NAME, ENV_POLL_INTERVAL_MS, ENV_STEP_DEADLINE_MS,
    ENV_WAIT_TIMEOUT_SECS,
};
pub use schema::{BarrierConfig, ChainConfig, OrderingConfig, StepsConfig};
pub use validator::{validate, validation_errors};
