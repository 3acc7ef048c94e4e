//! # Speakr Common Library
//!
//! Shared code for the speakr crates:
//! - Error type shared by configuration loading
//! - Bootstrap configuration (TOML file, environment, command line)
//! - API key and output directory resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
