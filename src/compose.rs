//! Draft composition
//!
//! Creates a new outgoing message or a reply. Lifecycle:
//! `Requested → (Reply: Located → Opened → ContentMerged) | (New: Opened)
//! → AttachmentAdded? → Saved`, failing at whichever step first errors.
//!
//! The mail application populates a reply's quoted content asynchronously,
//! so the composer re-reads it under a bounded retry before merging the
//! caller's body in front of it.

use tracing::{debug, warn};

use crate::bridge::{DraftRef, MailBridge};
use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};
use crate::locator::MessageLocator;
use crate::models::{CreateDraftInput, DraftReport};
use crate::retry::{RetryPolicy, sample_until};

/// Builds drafts and replies through the bridge
pub struct DraftComposer<'a> {
    bridge: &'a dyn MailBridge,
    config: &'a ServerConfig,
}

impl<'a> DraftComposer<'a> {
    pub fn new(bridge: &'a dyn MailBridge, config: &'a ServerConfig) -> Self {
        Self { bridge, config }
    }

    /// Create a draft per the input, returning its read-back identifier
    ///
    /// A reply without `original_message_id` is rejected before any bridge
    /// call. An attachment failure fails the whole operation even though the
    /// draft was already created; the caller must not believe a draft
    /// succeeded when a requested attachment was dropped.
    pub async fn create_draft(&self, input: &CreateDraftInput) -> AppResult<DraftReport> {
        let draft = if input.is_reply {
            let Some(original_id) = input
                .original_message_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
            else {
                return Err(AppError::ValidationFailed(
                    "reply drafts require original_message_id".to_owned(),
                ));
            };
            self.open_reply_draft(original_id, &input.body).await?
        } else {
            self.bridge
                .new_outgoing_message(input.to_address.as_deref(), &input.subject, &input.body)
                .await
                .map_err(|error| step_failure("opening new message", error))?
        };

        if let Some(path) = input
            .attachment_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
        {
            self.bridge
                .attach_file(&draft, path)
                .await
                .map_err(|error| {
                    AppError::OperationFailed(format!(
                        "draft was created but attaching '{path}' failed: {error}"
                    ))
                })?;
        }

        let draft_id = self
            .bridge
            .save_draft(&draft)
            .await
            .map_err(|error| step_failure("saving draft", error))?;
        if draft_id.is_none() {
            // Absence of a read-back id is not itself a failure signal.
            debug!("mail application exposed no draft identifier");
        }

        Ok(DraftReport {
            success: true,
            message: if input.is_reply {
                "reply draft created".to_owned()
            } else {
                "draft created".to_owned()
            },
            draft_id,
        })
    }

    /// Open a reply and merge the caller's body in front of the quoted text
    async fn open_reply_draft(&self, original_id: &str, body: &str) -> AppResult<DraftRef> {
        let located = MessageLocator::new(self.bridge)
            .locate(original_id, None, None)
            .await?;
        let draft = self
            .bridge
            .open_reply(&located.mailbox, original_id)
            .await
            .map_err(|error| step_failure("opening reply", error))?;

        let policy = RetryPolicy::new(
            self.config.draft_content_attempts,
            self.config.draft_content_delay_ms,
        );
        let quoted = sample_until(
            policy,
            || self.bridge.read_draft_content(&draft),
            |content: &String| !content.trim().is_empty(),
        )
        .await
        .map_err(|error| step_failure("reading reply content", error))?;
        if !quoted.satisfied {
            warn!(
                original_id,
                attempts = quoted.attempts_used,
                "reply content never populated, composing without quoted text"
            );
        }

        let merged = if quoted.value.trim().is_empty() {
            body.to_owned()
        } else {
            format!("{body}\n\n{}", quoted.value)
        };
        self.bridge
            .set_draft_content(&draft, &merged)
            .await
            .map_err(|error| step_failure("merging reply content", error))?;
        Ok(draft)
    }
}

fn step_failure(step: &str, error: AppError) -> AppError {
    match error {
        AppError::BridgeUnavailable(_) => error,
        other => AppError::OperationFailed(format!("{step}: {other}")),
    }
}
