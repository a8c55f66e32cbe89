//! Send and upload flows.
//!
//! Each flow records what happened in the [`ChatState`] so a front end only
//! has to render the messages.  Errors never escape: the `ApiResult` of the
//! underlying call is handed back for callers that want details.

use std::path::Path;

use crate::client::{FinChat, is_csv};
use crate::error::Error;
use crate::observability::{CHAT_MESSAGES, CHAT_UPLOADS, CHAT_UPLOADS_REJECTED};
use crate::types::{ApiResult, CategorizeStatus, ChatReply};

use super::state::ChatState;

/// Drives the conversation against a [`FinChat`] client.
#[derive(Debug, Default)]
pub struct ChatController {
    state: ChatState,
}

impl ChatController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ChatState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChatState {
        &mut self.state
    }

    /// Post `text` to the assistant and append its reply.
    ///
    /// Blank input is rejected without touching the conversation.  On failure
    /// the error is appended as an assistant message.
    pub async fn send_message(
        &mut self,
        client: &FinChat,
        token: Option<&str>,
        text: &str,
    ) -> ApiResult<ChatReply> {
        let text = text.trim();
        if text.is_empty() {
            return ApiResult::err(Error::validation(
                "message must not be empty",
                Some("message".to_string()),
            ));
        }

        CHAT_MESSAGES.click();
        self.state.push(text, true);
        self.state.is_typing = true;

        let result = client.chat(text, token).await;
        match &result.data {
            Some(reply) => {
                self.state.push(reply.reply.clone(), false);
            }
            None => {
                let message = format!(
                    "Sorry, something went wrong: {}",
                    result.error_or("unknown error")
                );
                self.state.push(message, false);
            }
        }
        self.state.is_typing = false;
        result
    }

    /// Upload a transaction CSV for categorization.
    ///
    /// Non-CSV paths are refused before any request is made and leave the
    /// conversation unchanged.
    pub async fn upload_file(
        &mut self,
        client: &FinChat,
        token: Option<&str>,
        path: &Path,
    ) -> ApiResult<CategorizeStatus> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if !is_csv(path) {
            CHAT_UPLOADS_REJECTED.click();
            return ApiResult::err(Error::validation(
                format!("only .csv files can be uploaded, got {name}"),
                Some("file".to_string()),
            ));
        }

        CHAT_UPLOADS.click();
        self.state.push(format!("Uploaded {name}"), true);
        self.state.is_typing = true;

        let result = client.categorize(path, token).await;
        let summary = match &result.data {
            Some(status) if status.is_success() => {
                format!("{name} was categorized successfully.")
            }
            Some(status) => format!(
                "Categorizing {name} failed: {}",
                status.error.as_deref().unwrap_or(&status.status)
            ),
            None => format!(
                "Categorizing {name} failed: {}",
                result.error_or("unknown error")
            ),
        };
        self.state.push(summary, false);
        self.state.is_typing = false;
        result
    }
}
