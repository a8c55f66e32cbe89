//! Chat application module for the finance assistant.
//!
//! This module provides the pieces the `finchat` terminal client is built
//! from:
//!
//! - Conversation state with a typing indicator
//! - Send and CSV-upload flows that record their outcome as messages
//! - Slash commands for session, settings and upload control
//! - Command-line and YAML configuration
//!
//! # Architecture
//!
//! - [`state`]: messages and the typing flag
//! - [`controller`]: send/upload flows against the client
//! - [`commands`]: slash command parsing
//! - [`config`]: CLI argument parsing and configuration

mod commands;
mod config;
mod controller;
mod state;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ConfigFile};
pub use controller::ChatController;
pub use state::{ChatState, GREETING, Message};
