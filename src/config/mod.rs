//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file (or no file at all) yields a
//! working configuration.
//!
//! # Example
//!
//! ```no_run
//! use llmstxt::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("llmstxt.toml")).unwrap();
//! println!("Retry attempts: {}", config.retry.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ExportConfig, ExtractionConfig, FetcherConfig, GeneratorConfig, RateLimitConfig,
    RetryConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
