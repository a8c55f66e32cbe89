//! Interactive terminal client for the finance assistant.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local backend
//! finchat
//!
//! # Point at another backend and keep the session elsewhere
//! finchat --api-url https://finchat.example.com --session-file /tmp/finchat.json
//!
//! # Disable colors (useful for piping output)
//! finchat --no-color
//! ```
//!
//! Set `FINCHAT_LOG=debug` to see request logs on stderr.

use std::path::Path;
use std::sync::{Arc, Mutex};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use finchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use finchat::{FileStore, FinChat, SessionStore, Settings};

type Session = SessionStore<FileStore>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FINCHAT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("finchat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;

    let client = FinChat::with_options(Some(config.api_url.clone()), Some(config.timeout))?
        .with_max_attempts(config.max_attempts);
    let storage = FileStore::new(&config.session_file);
    let mut session = SessionStore::new(client, storage);
    let mut controller = ChatController::new();
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut settings: Option<Settings> = None;
    let mut rl = DefaultEditor::new()?;

    // Ctrl+C outside the prompt cancels whatever request is in flight.
    let current = Arc::new(Mutex::new(CancellationToken::new()));
    let handler_token = Arc::clone(&current);
    ctrlc::set_handler(move || {
        if let Ok(token) = handler_token.lock() {
            token.cancel();
        }
    })?;

    arm_cancellation(&current, &mut session);
    let health = session.client().check_health().await;
    if health.is_healthy {
        renderer.print_info(&format!("Connected to {}", session.client().base_url()));
    } else {
        renderer.print_error(&format!(
            "Disconnected from {}: {}",
            session.client().base_url(),
            health.error.as_deref().unwrap_or("unknown error")
        ));
    }

    if let Some(refreshed) = session.init().await
        && !refreshed.success
        && !session.is_authenticated()
    {
        renderer.print_info("Saved session expired; please /login again.");
    }
    match session.user() {
        Some(user) => renderer.print_info(&format!("Logged in as {} <{}>", user.name, user.email)),
        None => renderer.print_info("Not logged in. Use /login or /signup."),
    }
    renderer.print_info("Type /help for commands, /quit to exit\n");
    for message in &controller.state().messages {
        renderer.print_message(message);
    }

    loop {
        let readline = rl.readline("You: ");

        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);
        arm_cancellation(&current, &mut session);

        let Some(cmd) = parse_command(line) else {
            renderer.print_typing();
            let token = session.token().map(String::from);
            controller
                .send_message(session.client(), token.as_deref(), line)
                .await;
            if let Some(reply) = controller.state().last() {
                renderer.print_message(reply);
            }
            continue;
        };

        match cmd {
            ChatCommand::Quit => {
                println!("Goodbye!");
                break;
            }
            ChatCommand::Help => {
                for line in help_text().lines() {
                    println!("    {}", line);
                }
            }
            ChatCommand::Login { email, password } => {
                let outcome = session.login(&email, &password).await;
                settings = None;
                report_auth(&session, &mut renderer, outcome.success, &outcome.message);
            }
            ChatCommand::Signup {
                name,
                email,
                password,
            } => {
                let outcome = session.signup(&name, &email, &password).await;
                settings = None;
                report_auth(&session, &mut renderer, outcome.success, &outcome.message);
            }
            ChatCommand::Logout => {
                settings = None;
                match session.logout().await {
                    Ok(()) => renderer.print_info("Logged out."),
                    Err(err) => renderer.print_error(&format!("Logged out, but {}", err)),
                }
            }
            ChatCommand::Me => {
                if !session.is_authenticated() {
                    renderer.print_error("Not logged in.");
                    continue;
                }
                let result = session.refresh_identity().await;
                match &result.data {
                    Some(user) => renderer.print_info(&format!(
                        "{} <{}> (id {})",
                        user.name, user.email, user.id
                    )),
                    None if session.is_authenticated() => renderer.print_error(&format!(
                        "Could not refresh identity: {}",
                        result.error_or("unknown error")
                    )),
                    None => renderer.print_error("Session expired; please /login again."),
                }
            }
            ChatCommand::Settings => {
                let Some(token) = session.token().map(String::from) else {
                    renderer.print_error("Not logged in.");
                    continue;
                };
                let current_settings = load_settings(&session, &token, &mut renderer).await;
                print_settings(&mut renderer, &current_settings);
                settings = Some(current_settings);
            }
            ChatCommand::Set(change) => {
                let Some(token) = session.token().map(String::from) else {
                    renderer.print_error("Not logged in.");
                    continue;
                };
                let result = session
                    .client()
                    .change_setting(&token, settings.take(), change)
                    .await;
                if let Some(updated) = &result.data {
                    renderer.print_info("Settings saved.");
                    // Name and email live on the user record too.
                    session.refresh_identity().await;
                    settings = Some(updated.clone());
                } else {
                    renderer.print_error(&format!(
                        "Failed to save settings: {}",
                        result.error_or("unknown error")
                    ));
                }
            }
            ChatCommand::TestEmail => {
                let Some(token) = session.token().map(String::from) else {
                    renderer.print_error("Not logged in.");
                    continue;
                };
                let result = session.client().send_test_email(&token).await;
                if result.success {
                    renderer.print_info("Test email sent.");
                } else {
                    renderer.print_error(&format!(
                        "Failed to send test email: {}",
                        result.error_or("unknown error")
                    ));
                }
            }
            ChatCommand::Upload(path) => {
                let before = controller.state().len();
                let token = session.token().map(String::from);
                let result = controller
                    .upload_file(session.client(), token.as_deref(), Path::new(&path))
                    .await;
                if controller.state().len() == before {
                    renderer.print_error(result.error_or("upload failed"));
                }
                for message in &controller.state().messages[before..] {
                    renderer.print_message(message);
                }
            }
            ChatCommand::Health => {
                let health = session.client().check_health().await;
                if health.is_healthy {
                    renderer.print_info("Server is healthy.");
                } else {
                    renderer.print_error(health.error.as_deref().unwrap_or("Server is unhealthy."));
                }
            }
            ChatCommand::History => {
                for message in &controller.state().messages {
                    renderer.print_message(message);
                }
            }
            ChatCommand::Clear => {
                controller.state_mut().reset();
                renderer.print_info("Conversation cleared.");
                if let Some(greeting) = controller.state().last() {
                    renderer.print_message(greeting);
                }
            }
            ChatCommand::Invalid(message) => {
                renderer.print_error(&message);
            }
        }
    }

    Ok(())
}

/// Install a fresh cancellation token for the next operation.
fn arm_cancellation(current: &Mutex<CancellationToken>, session: &mut Session) {
    let token = CancellationToken::new();
    if let Ok(mut slot) = current.lock() {
        *slot = token.clone();
    }
    session.client_mut().set_cancellation(token);
}

fn report_auth(session: &Session, renderer: &mut impl Renderer, success: bool, message: &str) {
    if !success {
        renderer.print_error(message);
        return;
    }
    if !message.is_empty() {
        renderer.print_info(message);
    }
    if let Some(user) = session.user() {
        renderer.print_info(&format!("Logged in as {} <{}>", user.name, user.email));
    }
}

/// Fetch settings for display, falling back to defaults for the current user.
async fn load_settings(session: &Session, token: &str, renderer: &mut impl Renderer) -> Settings {
    let result = session.client().get_settings(token).await;
    match &result.data {
        Some(settings) => settings.clone(),
        None => {
            renderer.print_error(&format!(
                "Could not load settings: {}; showing defaults",
                result.error_or("unknown error")
            ));
            session.user().map(Settings::for_user).unwrap_or_default()
        }
    }
}

fn print_settings(renderer: &mut impl Renderer, settings: &Settings) {
    let on_off = |on: bool| if on { "on" } else { "off" };
    renderer.print_info("    Settings:");
    renderer.print_info(&format!("      Name: {}", settings.name));
    renderer.print_info(&format!("      Email: {}", settings.email));
    renderer.print_info(&format!(
        "      Email notifications: {}",
        on_off(settings.email_notifications)
    ));
    renderer.print_info(&format!("      Weekly reports: {}", on_off(settings.weekly_reports)));
    renderer.print_info(&format!(
        "      Monthly reports: {}",
        on_off(settings.monthly_reports)
    ));
}
