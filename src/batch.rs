//! Batch operations over independent messages
//!
//! Move, copy, archive, trash, and batch-read share one shape: resolve the
//! mailbox directory once per batch, pre-validate targets, locate and mutate
//! every item in parallel, and aggregate per-item outcomes positionally.
//! Batches never fail closed: only a directory-level bridge outage fails
//! the whole call; everything else becomes an itemized failure.
//!
//! Location and mutation are separate bridge round trips, so a message moved
//! by a concurrent actor between the two steps is reported as a per-item
//! failure. The bridge offers no locking primitive; this race is accepted.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::debug;

use crate::bridge::{MailBridge, MailboxRef};
use crate::directory::{
    MailboxDirectory, MailboxEntry, account_mailbox_names, find_account_mailbox,
};
use crate::errors::AppResult;
use crate::links::extract_links;
use crate::locator::{LocatedMessage, MessageLocator};
use crate::models::{
    EmailActionOutcome, EmailContent, FileRequestItem, ReadEmailOutcome, ReadRequestItem,
    TransferRequestItem, format_date,
};

/// Whether a transfer removes the source message or duplicates it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferMode {
    Move,
    Copy,
}

impl TransferMode {
    fn verb(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy => "copy",
        }
    }
}

/// Coordinates validated, parallel batch operations
pub struct BatchOperationCoordinator<'a> {
    bridge: &'a dyn MailBridge,
}

impl<'a> BatchOperationCoordinator<'a> {
    pub fn new(bridge: &'a dyn MailBridge) -> Self {
        Self { bridge }
    }

    /// Move each message to its requested target mailbox
    pub async fn move_messages(
        &self,
        requests: &[TransferRequestItem],
    ) -> AppResult<Vec<EmailActionOutcome>> {
        self.transfer(requests, TransferMode::Move).await
    }

    /// Copy each message into its requested target mailbox
    pub async fn copy_messages(
        &self,
        requests: &[TransferRequestItem],
    ) -> AppResult<Vec<EmailActionOutcome>> {
        self.transfer(requests, TransferMode::Copy).await
    }

    async fn transfer(
        &self,
        requests: &[TransferRequestItem],
        mode: TransferMode,
    ) -> AppResult<Vec<EmailActionOutcome>> {
        let snapshot = MailboxDirectory::new(self.bridge).list_mailboxes().await?;
        let locator = MessageLocator::new(self.bridge);
        Ok(join_all(requests.iter().map(|request| {
            self.transfer_one(&snapshot, &locator, request, mode)
        }))
        .await)
    }

    async fn transfer_one(
        &self,
        snapshot: &[MailboxEntry],
        locator: &MessageLocator<'_>,
        request: &TransferRequestItem,
        mode: TransferMode,
    ) -> EmailActionOutcome {
        // Target validation runs before any location or mutation; a bad
        // target never costs a bridge round trip.
        let target = match find_account_mailbox(
            snapshot,
            &request.target_account_name,
            &request.target_mailbox_name,
        ) {
            Some(target) => target,
            None => {
                return EmailActionOutcome::failure(
                    &request.message_id,
                    describe_missing_target(
                        snapshot,
                        &request.target_account_name,
                        &request.target_mailbox_name,
                    ),
                );
            }
        };

        let located = match locator
            .locate_within(
                snapshot,
                &request.message_id,
                request.account_name.as_deref(),
                request.mailbox_name.as_deref(),
            )
            .await
        {
            Ok(located) => located,
            Err(error) => return EmailActionOutcome::failure(&request.message_id, error.to_string()),
        };

        let result = match mode {
            TransferMode::Move => {
                self.bridge
                    .move_message(&located.mailbox, &request.message_id, &target)
                    .await
            }
            TransferMode::Copy => {
                self.bridge
                    .copy_message(&located.mailbox, &request.message_id, &target)
                    .await
            }
        };

        match result {
            Ok(()) => success_outcome(&request.message_id, &located, target),
            Err(error) => EmailActionOutcome::failure(
                &request.message_id,
                format!("{} failed: {error}", mode.verb()),
            ),
        }
    }

    /// Archive each message into its own account's Archive mailbox
    ///
    /// Tries the application's native archive verb first. Accounts whose
    /// scripting layer lacks it get the two-step fallback: move to Trash,
    /// re-find there, move to Archive. A failed intermediate lookup fails
    /// the item rather than leaving it silently half-archived.
    pub async fn archive_messages(
        &self,
        requests: &[FileRequestItem],
    ) -> AppResult<Vec<EmailActionOutcome>> {
        let snapshot = MailboxDirectory::new(self.bridge).list_mailboxes().await?;
        let locator = MessageLocator::new(self.bridge);
        Ok(join_all(
            requests
                .iter()
                .map(|request| self.archive_one(&snapshot, &locator, request)),
        )
        .await)
    }

    async fn archive_one(
        &self,
        snapshot: &[MailboxEntry],
        locator: &MessageLocator<'_>,
        request: &FileRequestItem,
    ) -> EmailActionOutcome {
        let located = match locator
            .locate_within(
                snapshot,
                &request.message_id,
                request.account_name.as_deref(),
                request.mailbox_name.as_deref(),
            )
            .await
        {
            Ok(located) => located,
            Err(error) => return EmailActionOutcome::failure(&request.message_id, error.to_string()),
        };
        let account = located.mailbox.account.clone();

        match self
            .bridge
            .archive_message(&located.mailbox, &request.message_id)
            .await
        {
            Ok(()) => {
                let target = find_account_mailbox(snapshot, &account, "Archive")
                    .unwrap_or_else(|| MailboxRef::new(account.clone(), "Archive"));
                return success_outcome(&request.message_id, &located, target);
            }
            Err(error) => {
                debug!(
                    message_id = %request.message_id,
                    %error,
                    "native archive failed, using trash fallback"
                );
            }
        }

        let Some(trash) = find_account_mailbox(snapshot, &account, "Trash") else {
            return EmailActionOutcome::failure(
                &request.message_id,
                format!("account '{account}' has no Trash mailbox for archive fallback"),
            );
        };
        let Some(archive) = find_account_mailbox(snapshot, &account, "Archive") else {
            return EmailActionOutcome::failure(
                &request.message_id,
                format!("account '{account}' has no Archive mailbox for archive fallback"),
            );
        };

        if let Err(error) = self
            .bridge
            .move_message(&located.mailbox, &request.message_id, &trash)
            .await
        {
            return EmailActionOutcome::failure(
                &request.message_id,
                format!("archive fallback could not move to Trash: {error}"),
            );
        }

        match self.bridge.find_message(&trash, &request.message_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return EmailActionOutcome::failure(
                    &request.message_id,
                    "archive fallback lost the message in Trash".to_owned(),
                );
            }
            Err(error) => {
                return EmailActionOutcome::failure(
                    &request.message_id,
                    format!("archive fallback could not confirm message in Trash: {error}"),
                );
            }
        }

        match self
            .bridge
            .move_message(&trash, &request.message_id, &archive)
            .await
        {
            Ok(()) => success_outcome(&request.message_id, &located, archive),
            Err(error) => EmailActionOutcome::failure(
                &request.message_id,
                format!("archive fallback could not move to Archive: {error}"),
            ),
        }
    }

    /// Move each message to its own account's Trash
    pub async fn trash_messages(
        &self,
        requests: &[FileRequestItem],
    ) -> AppResult<Vec<EmailActionOutcome>> {
        let snapshot = MailboxDirectory::new(self.bridge).list_mailboxes().await?;
        let locator = MessageLocator::new(self.bridge);
        Ok(join_all(
            requests
                .iter()
                .map(|request| self.trash_one(&snapshot, &locator, request)),
        )
        .await)
    }

    async fn trash_one(
        &self,
        snapshot: &[MailboxEntry],
        locator: &MessageLocator<'_>,
        request: &FileRequestItem,
    ) -> EmailActionOutcome {
        let located = match locator
            .locate_within(
                snapshot,
                &request.message_id,
                request.account_name.as_deref(),
                request.mailbox_name.as_deref(),
            )
            .await
        {
            Ok(located) => located,
            Err(error) => return EmailActionOutcome::failure(&request.message_id, error.to_string()),
        };

        match self
            .bridge
            .trash_message(&located.mailbox, &request.message_id)
            .await
        {
            Ok(()) => {
                let account = located.mailbox.account.clone();
                success_outcome(
                    &request.message_id,
                    &located,
                    MailboxRef::new(account, "Trash"),
                )
            }
            Err(error) => EmailActionOutcome::failure(
                &request.message_id,
                format!("trash failed: {error}"),
            ),
        }
    }

    /// Read full content for each message, extracting hyperlinks
    ///
    /// Duplicate ids are coalesced before any bridge call, but the returned
    /// list is positionally aligned to the original request list, so
    /// duplicates receive copies of the same outcome.
    pub async fn read_messages(
        &self,
        requests: &[ReadRequestItem],
    ) -> AppResult<Vec<ReadEmailOutcome>> {
        let snapshot = MailboxDirectory::new(self.bridge).list_mailboxes().await?;
        let locator = MessageLocator::new(self.bridge);

        let mut unique: Vec<&ReadRequestItem> = Vec::new();
        for request in requests {
            if !unique
                .iter()
                .any(|seen| seen.message_id == request.message_id)
            {
                unique.push(request);
            }
        }

        let outcomes = join_all(
            unique
                .iter()
                .copied()
                .map(|request| self.read_one(&snapshot, &locator, request)),
        )
        .await;

        let by_id: HashMap<&str, &ReadEmailOutcome> = unique
            .iter()
            .zip(outcomes.iter())
            .map(|(request, outcome)| (request.message_id.as_str(), outcome))
            .collect();

        Ok(requests
            .iter()
            .map(|request| by_id[request.message_id.as_str()].clone())
            .collect())
    }

    async fn read_one(
        &self,
        snapshot: &[MailboxEntry],
        locator: &MessageLocator<'_>,
        request: &ReadRequestItem,
    ) -> ReadEmailOutcome {
        let located = match locator
            .locate_within(
                snapshot,
                &request.message_id,
                request.account_name.as_deref(),
                request.mailbox_name.as_deref(),
            )
            .await
        {
            Ok(located) => located,
            Err(error) => {
                return ReadEmailOutcome {
                    message_id: request.message_id.clone(),
                    success: false,
                    email: None,
                    error: Some(error.to_string()),
                };
            }
        };

        match self
            .bridge
            .read_message_body(&located.mailbox, &request.message_id)
            .await
        {
            Ok(content) => {
                let links = extract_links(&content);
                ReadEmailOutcome {
                    message_id: request.message_id.clone(),
                    success: true,
                    email: Some(EmailContent {
                        message_id: located.record.message_id.clone(),
                        sender: located.record.sender.clone(),
                        subject: located.record.subject.clone(),
                        date_received: format_date(located.record.date_received),
                        is_read: located.record.is_read,
                        is_flagged: located.record.is_flagged,
                        location: (&located.mailbox).into(),
                        content,
                        links,
                    }),
                    error: None,
                }
            }
            Err(error) => ReadEmailOutcome {
                message_id: request.message_id.clone(),
                success: false,
                email: None,
                error: Some(format!("read failed: {error}")),
            },
        }
    }
}

/// Success outcome with the metadata captured before mutation
fn success_outcome(
    message_id: &str,
    located: &LocatedMessage,
    target: MailboxRef,
) -> EmailActionOutcome {
    EmailActionOutcome {
        message_id: message_id.to_owned(),
        success: true,
        sender: Some(located.record.sender.clone()),
        subject: Some(located.record.subject.clone()),
        date_received: format_date(located.record.date_received),
        source: Some((&located.mailbox).into()),
        target: Some((&target).into()),
        error: None,
    }
}

/// Validation error text listing the target account's available mailboxes
fn describe_missing_target(snapshot: &[MailboxEntry], account: &str, mailbox: &str) -> String {
    let available = account_mailbox_names(snapshot, account);
    if available.is_empty() {
        format!("account '{account}' not found in mailbox directory")
    } else {
        format!(
            "mailbox '{mailbox}' not found in account '{account}'; available mailboxes: {}",
            available.join(", ")
        )
    }
}
