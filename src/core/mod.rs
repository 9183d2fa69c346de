//! # Core Module
//!
//! Configuration, error types, persistence helpers and Discord message sizing
//! shared by the birthday and reminder features.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod config;
pub mod error;
pub mod response;
pub mod storage;

// Re-export commonly used items
pub use config::Config;
pub use error::{ConfigError, StoreError, ValidationError};
pub use response::{chunk_for_message, split_message, MESSAGE_LIMIT};
