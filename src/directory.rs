//! Mailbox directory resolution
//!
//! Enumerates the `(account, mailbox)` pairs currently visible to the user:
//! every enabled account's mailboxes plus account-less local folders tagged
//! with a synthetic account name. The directory is re-queried on every call;
//! it is the foundation every mutating operation re-resolves from, and is
//! never cached across calls.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::bridge::{LOCAL_ACCOUNT, MailBridge, MailboxCounts, MailboxRef};
use crate::errors::AppResult;

/// One visible mailbox with optional count snapshot
///
/// Counts are populated for inbox-like mailboxes only, best-effort, with the
/// `-1` sentinel when the probe fails.
#[derive(Debug, Clone)]
pub struct MailboxEntry {
    pub location: MailboxRef,
    pub counts: Option<MailboxCounts>,
}

/// Resolves the set of visible mailboxes through the bridge
pub struct MailboxDirectory<'a> {
    bridge: &'a dyn MailBridge,
}

impl<'a> MailboxDirectory<'a> {
    pub fn new(bridge: &'a dyn MailBridge) -> Self {
        Self { bridge }
    }

    /// Enumerate every visible mailbox
    ///
    /// Idempotent, no side effects. Either the full set or an error: a
    /// failed account enumeration fails the whole call rather than
    /// returning partial data. Local folders and account folders can be
    /// reported twice by different enumeration paths, so the result is
    /// deduplicated by `(account, mailbox)` pair.
    pub async fn list_mailboxes(&self) -> AppResult<Vec<MailboxEntry>> {
        let accounts = self.bridge.list_accounts().await?;
        let enabled: Vec<String> = accounts
            .into_iter()
            .filter(|account| account.enabled)
            .map(|account| account.name)
            .collect();

        let account_listings = join_all(
            enabled
                .iter()
                .map(|account| self.bridge.list_account_mailboxes(account)),
        )
        .await;

        let mut locations: Vec<MailboxRef> = Vec::new();
        for (account, listing) in enabled.iter().zip(account_listings) {
            for mailbox in listing? {
                locations.push(MailboxRef::new(account.clone(), mailbox));
            }
        }
        for mailbox in self.bridge.list_local_mailboxes().await? {
            locations.push(MailboxRef::new(LOCAL_ACCOUNT, mailbox));
        }

        let mut seen: HashSet<MailboxRef> = HashSet::with_capacity(locations.len());
        locations.retain(|location| seen.insert(location.clone()));

        let counts = join_all(locations.iter().map(|location| async move {
            if !is_inbox_like(&location.mailbox) {
                return None;
            }
            match self.bridge.mailbox_counts(location).await {
                Ok(counts) => Some(counts),
                Err(error) => {
                    debug!(%location, %error, "inbox count probe failed");
                    Some(MailboxCounts::UNAVAILABLE)
                }
            }
        }))
        .await;

        let entries: Vec<MailboxEntry> = locations
            .into_iter()
            .zip(counts)
            .map(|(location, counts)| MailboxEntry { location, counts })
            .collect();

        if entries.is_empty() {
            warn!("mailbox directory resolved to an empty set");
        }
        Ok(entries)
    }
}

/// Mailboxes whose name marks them as an inbox
pub fn is_inbox_like(mailbox: &str) -> bool {
    mailbox.eq_ignore_ascii_case("inbox")
}

/// Mailbox names of one account within a directory snapshot
pub fn account_mailbox_names(snapshot: &[MailboxEntry], account: &str) -> Vec<String> {
    snapshot
        .iter()
        .filter(|entry| entry.location.account == account)
        .map(|entry| entry.location.mailbox.clone())
        .collect()
}

/// Find a mailbox of one account by case-insensitive name
pub fn find_account_mailbox(
    snapshot: &[MailboxEntry],
    account: &str,
    mailbox: &str,
) -> Option<MailboxRef> {
    snapshot
        .iter()
        .map(|entry| &entry.location)
        .find(|location| {
            location.account == account && location.mailbox.eq_ignore_ascii_case(mailbox)
        })
        .cloned()
}
