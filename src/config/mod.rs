//! Configuration module for Page-Spider
//!
//! A crawl is configured either in code through [`Config::new`] and its
//! builder methods, or from a TOML file.
//!
//! # Example
//!
//! ```no_run
//! use page_spider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spider.toml")).unwrap();
//! println!("Crawl starts at: {}", config.starting_point);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_starting_point};
