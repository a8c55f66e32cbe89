use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::utils::time::{clock_stamp, now};

/// First assistant message of every conversation.
pub const GREETING: &str = "Hello! I'm your finance assistant. Ask me about your spending, \
     or upload a transaction CSV and I'll categorize it for you.";

/// One line of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub is_user: bool,
    /// `HH:MM` at which the message was added.
    pub timestamp: String,
}

/// Ordered conversation plus the "assistant is typing" flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub is_typing: bool,
    #[serde(skip)]
    last_id: i64,
}

impl ChatState {
    /// A conversation opened by the assistant greeting.
    pub fn new() -> Self {
        let mut state = Self::empty();
        state.push_at(GREETING, false, now());
        state
    }

    /// A conversation with no messages at all.
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            is_typing: false,
            last_id: 0,
        }
    }

    /// Append a message stamped with the current time and return it.
    pub fn push(&mut self, text: impl Into<String>, is_user: bool) -> &Message {
        self.push_at(text, is_user, now())
    }

    /// Append a message stamped with `at` and return it.
    ///
    /// Ids are epoch milliseconds, bumped when two messages land in the same
    /// millisecond so they stay unique and increasing.
    pub fn push_at(&mut self, text: impl Into<String>, is_user: bool, at: OffsetDateTime) -> &Message {
        let millis = (at.unix_timestamp_nanos() / 1_000_000) as i64;
        let id = millis.max(self.last_id + 1);
        self.last_id = id;
        self.messages.push(Message {
            id: id.to_string(),
            text: text.into(),
            is_user,
            timestamp: clock_stamp(at),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything and start over with the greeting.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn starts_with_greeting() {
        let state = ChatState::new();
        assert_eq!(state.len(), 1);
        assert!(!state.messages[0].is_user);
        assert_eq!(state.messages[0].text, GREETING);
        assert!(!state.is_typing);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut state = ChatState::empty();
        let at = datetime!(2025-06-01 09:30 UTC);
        state.push_at("one", true, at);
        state.push_at("two", false, at);
        state.push_at("three", true, at);
        let ids: Vec<i64> = state.messages.iter().map(|m| m.id.parse().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids[0], at.unix_timestamp() * 1000);
    }

    #[test]
    fn timestamps_are_clock_stamps() {
        let mut state = ChatState::empty();
        let message = state.push_at("hi", true, datetime!(2025-06-01 09:05:33 UTC));
        assert_eq!(message.timestamp, "09:05");
    }

    #[test]
    fn reset_keeps_only_greeting() {
        let mut state = ChatState::new();
        state.push("question", true);
        state.is_typing = true;
        state.reset();
        assert_eq!(state.len(), 1);
        assert!(!state.is_typing);
    }

    #[test]
    fn serializes_like_the_web_client() {
        let mut state = ChatState::empty();
        state.push_at("hi", true, datetime!(2025-06-01 09:05 UTC));
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["isTyping"], false);
        assert_eq!(value["messages"][0]["isUser"], true);
    }
}
