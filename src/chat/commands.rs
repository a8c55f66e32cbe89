//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to log in, manage settings and upload files without
//! sending a chat message to the assistant.

use crate::types::SettingChange;

/// A parsed chat command.
///
/// These commands drive the session and settings and are not sent to `/chat`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Log in with email and password.
    Login { email: String, password: String },

    /// Create an account.
    Signup {
        name: String,
        email: String,
        password: String,
    },

    /// Forget the current session.
    Logout,

    /// Refresh and show the current identity.
    Me,

    /// Fetch and show notification settings.
    Settings,

    /// Change one setting and save it.
    Set(SettingChange),

    /// Ask the backend for a test notification email.
    TestEmail,

    /// Upload a CSV file for categorization.
    Upload(String),

    /// Probe backend liveness.
    Health,

    /// Print the conversation so far.
    History,

    /// Start over with an empty conversation.
    Clear,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use finchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/upload march.csv").is_some());
/// assert!(parse_command("How much did I spend on food?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "login" => parse_login(argument),
        "signup" | "register" => parse_signup(argument),
        "logout" => ChatCommand::Logout,
        "me" | "whoami" => ChatCommand::Me,
        "settings" => ChatCommand::Settings,
        "set" => parse_set(argument),
        "test-email" | "test_email" => ChatCommand::TestEmail,
        "upload" => match argument {
            Some(path) => ChatCommand::Upload(path.to_string()),
            None => ChatCommand::Invalid("/upload requires a file path".to_string()),
        },
        "health" | "status" => ChatCommand::Health,
        "history" => ChatCommand::History,
        "clear" => ChatCommand::Clear,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_login(argument: Option<&str>) -> ChatCommand {
    let words: Vec<&str> = argument.map(|s| s.split_whitespace().collect()).unwrap_or_default();
    match words.as_slice() {
        [email, password] => ChatCommand::Login {
            email: email.to_string(),
            password: password.to_string(),
        },
        _ => ChatCommand::Invalid("/login requires <email> <password>".to_string()),
    }
}

/// `/signup <name...> <email> <password>`; the name may contain spaces.
fn parse_signup(argument: Option<&str>) -> ChatCommand {
    let words: Vec<&str> = argument.map(|s| s.split_whitespace().collect()).unwrap_or_default();
    match words.as_slice() {
        [name @ .., email, password] if !name.is_empty() && email.contains('@') => {
            ChatCommand::Signup {
                name: name.join(" "),
                email: email.to_string(),
                password: password.to_string(),
            }
        }
        _ => ChatCommand::Invalid("/signup requires <name> <email> <password>".to_string()),
    }
}

fn parse_set(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid("/set requires <field> <value>".to_string());
    };
    let mut parts = arg.splitn(2, ' ');
    let field = parts.next().unwrap_or_default();
    let Some(value) = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty()) else {
        return ChatCommand::Invalid(format!("/set {field} requires a value"));
    };
    match SettingChange::parse(field, value) {
        Ok(change) => ChatCommand::Set(change),
        Err(err) => ChatCommand::Invalid(format!("/set {err}")),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /login <email> <password>          Log in
  /signup <name> <email> <password>  Create an account and log in
  /logout                            Log out and forget saved credentials
  /me                                Refresh and show the current user
  /settings                          Show notification settings
  /set <field> <value>               Change a setting (name, email,
                                     notifications, weekly, monthly)
  /test-email                        Send a test notification email
  /upload <file.csv>                 Categorize a transaction CSV
  /health                            Check the connection to the server
  /history                           Show the conversation
  /clear                             Start a new conversation
  /help                              Show this help message
  /quit                              Exit the chat
Anything else is sent to the assistant. Ctrl+C cancels a pending request."#
}
