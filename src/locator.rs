//! Message location
//!
//! Finds a message's current mailbox by probing the bridge. A message id is
//! unique within the mail store; a collision across mailboxes would make
//! location non-deterministic, which the data model treats as impossible
//! (documented assumption, not enforced).

use futures::future::join_all;
use tracing::debug;

use crate::bridge::{MailBridge, MailboxRef, MessageRecord};
use crate::directory::{MailboxDirectory, MailboxEntry};
use crate::errors::{AppError, AppResult};

/// A message together with the mailbox it was found in
#[derive(Debug, Clone)]
pub struct LocatedMessage {
    pub record: MessageRecord,
    pub mailbox: MailboxRef,
}

/// Locates messages by id, with optional account/mailbox hints
pub struct MessageLocator<'a> {
    bridge: &'a dyn MailBridge,
}

impl<'a> MessageLocator<'a> {
    pub fn new(bridge: &'a dyn MailBridge) -> Self {
        Self { bridge }
    }

    /// Locate a message, resolving the mailbox directory fresh
    ///
    /// Batch callers that already hold a snapshot should use
    /// [`Self::locate_within`] instead of paying a directory resolution per
    /// item.
    pub async fn locate(
        &self,
        message_id: &str,
        account_hint: Option<&str>,
        mailbox_hint: Option<&str>,
    ) -> AppResult<LocatedMessage> {
        let snapshot = MailboxDirectory::new(self.bridge).list_mailboxes().await?;
        self.locate_within(&snapshot, message_id, account_hint, mailbox_hint)
            .await
    }

    /// Locate a message within a previously resolved directory snapshot
    ///
    /// With both hints, that single mailbox is probed first. The fallback
    /// scan probes every mailbox concurrently but selects the first match in
    /// listing order (accounts in listing order, mailboxes within an account
    /// in listing order), so the outcome does not depend on completion
    /// order. Per-mailbox probe errors are swallowed and scanning continues;
    /// only exhausting all mailboxes yields `NotFound`.
    pub async fn locate_within(
        &self,
        snapshot: &[MailboxEntry],
        message_id: &str,
        account_hint: Option<&str>,
        mailbox_hint: Option<&str>,
    ) -> AppResult<LocatedMessage> {
        if let (Some(account), Some(mailbox)) = (account_hint, mailbox_hint) {
            let hinted = MailboxRef::new(account, mailbox);
            match self.probe(&hinted, message_id).await {
                Some(record) => {
                    return Ok(LocatedMessage {
                        record,
                        mailbox: hinted,
                    });
                }
                None => {
                    debug!(%hinted, message_id, "hinted mailbox probe missed, scanning");
                }
            }
        }

        let probes = join_all(snapshot.iter().map(|entry| async move {
            self.probe(&entry.location, message_id)
                .await
                .map(|record| LocatedMessage {
                    record,
                    mailbox: entry.location.clone(),
                })
        }))
        .await;

        probes.into_iter().flatten().next().ok_or_else(|| {
            AppError::NotFound(format!("message {message_id} not found in any mailbox"))
        })
    }

    /// Single-mailbox lookup with errors downgraded to a miss
    async fn probe(&self, mailbox: &MailboxRef, message_id: &str) -> Option<MessageRecord> {
        match self.bridge.find_message(mailbox, message_id).await {
            Ok(found) => found,
            Err(error) => {
                debug!(%mailbox, message_id, %error, "mailbox probe failed, continuing scan");
                None
            }
        }
    }
}
