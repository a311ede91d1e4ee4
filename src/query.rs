//! Email listing across one or many mailboxes
//!
//! Resolves a mailbox set from the caller's account/mailbox selectors,
//! fetches every resolved mailbox concurrently, then merges client-side:
//! dedup, date sort, optional fuzzy ranking, read/flagged filters, and a
//! limit. The final ordering is deterministic regardless of the order in
//! which concurrent fetches complete.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::warn;

use crate::bridge::{MailBridge, MailboxRef};
use crate::config::ServerConfig;
use crate::directory::{MailboxDirectory, MailboxEntry, account_mailbox_names, is_inbox_like};
use crate::errors::{AppError, AppResult};
use crate::fuzzy;
use crate::locator::LocatedMessage;

/// Selectors and filters for one list call
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Fuzzy-ranks results against subject and sender; non-matches dropped
    pub search_term: Option<String>,
    /// `None` means no cap (internal callers only; the tool surface always
    /// supplies a default)
    pub limit: Option<usize>,
    pub account: Option<String>,
    pub mailbox: Option<String>,
    pub is_read: Option<bool>,
    pub is_flagged: Option<bool>,
}

/// Lists messages from resolved mailboxes in parallel
pub struct EmailQueryEngine<'a> {
    bridge: &'a dyn MailBridge,
    config: &'a ServerConfig,
}

impl<'a> EmailQueryEngine<'a> {
    pub fn new(bridge: &'a dyn MailBridge, config: &'a ServerConfig) -> Self {
        Self { bridge, config }
    }

    /// List messages matching the query
    ///
    /// An unmatched mailbox selector yields an empty list (logged), never an
    /// error; the one exception is an account selector without an inbox,
    /// which is a `NotFound` naming the account. A failed per-mailbox fetch
    /// degrades to an empty result for that mailbox only.
    pub async fn list(&self, query: &ListQuery) -> AppResult<Vec<LocatedMessage>> {
        let snapshot = MailboxDirectory::new(self.bridge).list_mailboxes().await?;
        let mailboxes = resolve_mailboxes(
            &snapshot,
            query.account.as_deref(),
            query.mailbox.as_deref(),
        )?;
        if mailboxes.is_empty() {
            warn!(
                account = query.account.as_deref().unwrap_or("-"),
                mailbox = query.mailbox.as_deref().unwrap_or("-"),
                "no mailboxes matched the list selectors"
            );
            return Ok(Vec::new());
        }

        let cap = self.config.mailbox_fetch_cap;
        let fetched = join_all(mailboxes.iter().map(|mailbox| async move {
            match self.bridge.list_messages(mailbox, cap).await {
                Ok(records) => records
                    .into_iter()
                    .map(|record| LocatedMessage {
                        record,
                        mailbox: mailbox.clone(),
                    })
                    .collect(),
                Err(error) => {
                    warn!(%mailbox, %error, "mailbox fetch failed, degrading to empty");
                    Vec::new()
                }
            }
        }))
        .await;

        let mut messages: Vec<LocatedMessage> = fetched.into_iter().flatten().collect();

        // The same message can be returned from two different listing paths.
        let mut seen: HashSet<String> = HashSet::with_capacity(messages.len());
        messages.retain(|message| seen.insert(message.record.message_id.clone()));

        // Newest first; undated messages sort as the oldest. Stable, so later
        // ranking ties keep this order.
        messages.sort_by(|a, b| b.record.date_received.cmp(&a.record.date_received));

        if let Some(term) = query.search_term.as_deref().map(str::trim)
            && !term.is_empty()
        {
            let threshold = self.config.fuzzy_threshold;
            let mut ranked: Vec<(LocatedMessage, f64)> = messages
                .into_iter()
                .filter_map(|message| {
                    let score =
                        fuzzy::best_score(term, &message.record.subject, &message.record.sender);
                    (score >= threshold).then_some((message, score))
                })
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            messages = ranked.into_iter().map(|(message, _)| message).collect();
        }

        if let Some(wanted) = query.is_read {
            messages.retain(|message| message.record.is_read == wanted);
        }
        if let Some(wanted) = query.is_flagged {
            messages.retain(|message| message.record.is_flagged == wanted);
        }

        if let Some(limit) = query.limit {
            messages.truncate(limit);
        }
        Ok(messages)
    }
}

/// Resolve the mailbox set for a list call
///
/// First match wins, mutually exclusive:
/// 1. account + mailbox → exactly that mailbox (case-insensitive name).
/// 2. account only → that account's "Inbox"; `NotFound` naming the account
///    if absent.
/// 3. mailbox only → every mailbox across all accounts whose name matches
///    case-insensitively.
/// 4. neither → every account's "Inbox".
pub fn resolve_mailboxes(
    snapshot: &[MailboxEntry],
    account: Option<&str>,
    mailbox: Option<&str>,
) -> AppResult<Vec<MailboxRef>> {
    let resolved: Vec<MailboxRef> = match (account, mailbox) {
        (Some(account), Some(mailbox)) => snapshot
            .iter()
            .map(|entry| &entry.location)
            .filter(|location| {
                location.account == account && location.mailbox.eq_ignore_ascii_case(mailbox)
            })
            .cloned()
            .collect(),
        (Some(account), None) => {
            let inbox = snapshot
                .iter()
                .map(|entry| &entry.location)
                .find(|location| {
                    location.account == account && is_inbox_like(&location.mailbox)
                })
                .cloned();
            match inbox {
                Some(inbox) => vec![inbox],
                None => {
                    return Err(AppError::no_inbox(
                        account,
                        &account_mailbox_names(snapshot, account),
                    ));
                }
            }
        }
        (None, Some(mailbox)) => snapshot
            .iter()
            .map(|entry| &entry.location)
            .filter(|location| location.mailbox.eq_ignore_ascii_case(mailbox))
            .cloned()
            .collect(),
        (None, None) => snapshot
            .iter()
            .map(|entry| &entry.location)
            .filter(|location| is_inbox_like(&location.mailbox))
            .cloned()
            .collect(),
    };

    let mut seen: HashSet<MailboxRef> = HashSet::with_capacity(resolved.len());
    Ok(resolved
        .into_iter()
        .filter(|location| seen.insert(location.clone()))
        .collect())
}
