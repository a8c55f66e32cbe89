//! Output rendering for the conversation.
//!
//! This module provides the [`Renderer`] trait and a plain-text
//! implementation that writes to stdout (or any writer) with optional ANSI
//! styling.

use std::io::{self, Stdout, Write};

use crate::chat::Message;

/// ANSI escape code for dim text (used for timestamps and the typing line).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user's messages).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the assistant's messages).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering the conversation.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Render one conversation message.
    fn print_message(&mut self, message: &Message);

    /// Show that a reply is pending.
    fn print_typing(&mut self) {}

    /// Render an error that did not become part of the conversation.
    fn print_error(&mut self, error: &str);

    /// Render status output such as settings or health.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            out: io::stdout(),
            use_color,
        }
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Consumes the renderer and returns its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{color}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    // Terminal write failures are not actionable for a chat front end.
    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_message(&mut self, message: &Message) {
        let (who, color) = if message.is_user {
            ("you", ANSI_CYAN)
        } else {
            ("finchat", ANSI_GREEN)
        };
        let stamp = self.paint(ANSI_DIM, &format!("[{}]", message.timestamp));
        let who = self.paint(color, &format!("{who}:"));
        self.write_line(&format!("{stamp} {who} {}", message.text));
    }

    fn print_typing(&mut self) {
        let line = self.paint(ANSI_DIM, "finchat is typing...");
        self.write_line(&line);
    }

    fn print_error(&mut self, error: &str) {
        let line = self.paint(ANSI_RED, &format!("Error: {error}"));
        self.write_line(&line);
    }

    fn print_info(&mut self, info: &str) {
        self.write_line(info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str, is_user: bool) -> Message {
        Message {
            id: "1".to_string(),
            text: text.to_string(),
            is_user,
            timestamp: "09:05".to_string(),
        }
    }

    fn rendered(renderer: PlainTextRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn plain_messages() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.print_message(&message("How much on groceries?", true));
        renderer.print_message(&message("$412.30 this month.", false));
        assert_eq!(
            rendered(renderer),
            "[09:05] you: How much on groceries?\n[09:05] finchat: $412.30 this month.\n"
        );
    }

    #[test]
    fn colored_error() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), true);
        renderer.print_error("boom");
        assert_eq!(rendered(renderer), "\x1b[31mError: boom\x1b[0m\n");
    }
}
