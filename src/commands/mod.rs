//! # Command System
//!
//! Owner-only text commands read from the gateway message stream.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//! - **Toggleable**: true (unset `ALLOWED_USER_ID` refuses every command)

pub mod handler;

pub use handler::{render_help, ChatCommand, CommandAccess, CommandHandler, UNAUTHORIZED_REPLY};
