//! Chat application module for interactive conversations with the engine.
//!
//! This module provides a REPL chat interface built on top of the
//! omnimind client library. It supports:
//!
//! - Single-outstanding-exchange submission with live elapsed time
//! - Ctrl-C cancellation that restores the query for correction
//! - Document upload with analysis turns
//! - Slash commands for session control
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing, configuration, and persisted settings
//! - [`session`]: Core session management and engine interaction
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, Settings};
pub use session::{
    CancelHandle, ChatSession, ExchangeOutcome, INTERRUPTED_NOTICE, SessionStats,
};
