//! Mail bridge capability interface
//!
//! The scripting bridge of the desktop mail application is an external
//! collaborator: slow, occasionally flaky, and outside this process. All
//! orchestration code depends on the narrow [`MailBridge`] trait defined
//! here rather than on the automation object model, so call sites stay
//! testable and the script plumbing stays swappable. The production
//! implementation lives in [`crate::script`].

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::errors::AppResult;

/// Synthetic account name for mailboxes that live outside any account
/// container (on-device-only folders).
pub const LOCAL_ACCOUNT: &str = "local";

/// Mail account as reported by the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Human-assigned account name, unique within the mail application
    pub name: String,
    /// Disabled accounts are skipped by every enumeration path
    pub enabled: bool,
}

/// Identifies one mailbox by its `(account, mailbox)` pair
///
/// Mailbox names alone are not unique across accounts; the pair is unique
/// within the visible set. Local folders carry [`LOCAL_ACCOUNT`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MailboxRef {
    /// Owning account name, or [`LOCAL_ACCOUNT`]
    pub account: String,
    /// Mailbox name within the account
    pub mailbox: String,
}

impl MailboxRef {
    pub fn new(account: impl Into<String>, mailbox: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            mailbox: mailbox.into(),
        }
    }

    /// Whether this mailbox lives outside any account container
    pub fn is_local(&self) -> bool {
        self.account == LOCAL_ACCOUNT
    }
}

impl fmt::Display for MailboxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.mailbox)
    }
}

/// Message fields as returned by a mailbox listing or lookup
///
/// The owning mailbox is not part of the record; whichever component located
/// the message attaches it (see [`crate::locator::LocatedMessage`]).
#[derive(Debug, Clone)]
pub struct MessageRecord {
    /// Identifier unique within the mail store
    pub message_id: String,
    /// Sender display string as the mail application reports it
    pub sender: String,
    pub subject: String,
    /// Parsed from the bridge's native date text; `None` when unparseable
    pub date_received: Option<DateTime<Utc>>,
    pub is_read: bool,
    pub is_flagged: bool,
}

/// Best-effort message count snapshot for an inbox-like mailbox
///
/// `-1` marks a count the bridge failed to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxCounts {
    pub total: i64,
    pub unread: i64,
}

impl MailboxCounts {
    /// Sentinel value for both counts when the probe failed
    pub const UNAVAILABLE: Self = Self {
        total: -1,
        unread: -1,
    };
}

/// Handle to an outgoing message window opened by the bridge
#[derive(Debug, Clone)]
pub struct DraftRef {
    /// Bridge-assigned identifier of the outgoing message
    pub id: String,
}

/// Narrow capability interface over the mail application's scripting bridge
///
/// Every method is a single fallible bridge round trip. Implementations must
/// surface connectivity failures only as `AppError::BridgeUnavailable`.
#[async_trait]
pub trait MailBridge: Send + Sync {
    /// Probe the mail application, attempting one launch if permitted
    async fn check_connectivity(&self) -> AppResult<()>;

    /// All accounts known to the mail application, including disabled ones
    async fn list_accounts(&self) -> AppResult<Vec<AccountRecord>>;

    /// Mailbox names of one account, in the application's listing order
    async fn list_account_mailboxes(&self, account: &str) -> AppResult<Vec<String>>;

    /// Mailbox names that exist outside any account container
    async fn list_local_mailboxes(&self) -> AppResult<Vec<String>>;

    /// Total/unread counts for one mailbox
    async fn mailbox_counts(&self, mailbox: &MailboxRef) -> AppResult<MailboxCounts>;

    /// Up to `cap` most-recently-indexed messages of one mailbox
    async fn list_messages(
        &self,
        mailbox: &MailboxRef,
        cap: usize,
    ) -> AppResult<Vec<MessageRecord>>;

    /// Look up a single message by id within one mailbox
    async fn find_message(
        &self,
        mailbox: &MailboxRef,
        message_id: &str,
    ) -> AppResult<Option<MessageRecord>>;

    /// Full body text of a message
    async fn read_message_body(&self, mailbox: &MailboxRef, message_id: &str)
    -> AppResult<String>;

    /// Move a message between mailboxes
    async fn move_message(
        &self,
        from: &MailboxRef,
        message_id: &str,
        to: &MailboxRef,
    ) -> AppResult<()>;

    /// Duplicate a message into another mailbox
    async fn copy_message(
        &self,
        from: &MailboxRef,
        message_id: &str,
        to: &MailboxRef,
    ) -> AppResult<()>;

    /// The application's native archive verb; fails on accounts whose
    /// scripting layer does not support it
    async fn archive_message(&self, from: &MailboxRef, message_id: &str) -> AppResult<()>;

    /// Move a message to its account's Trash
    async fn trash_message(&self, from: &MailboxRef, message_id: &str) -> AppResult<()>;

    /// Open a new outgoing message with subject, body, and optional recipient
    async fn new_outgoing_message(
        &self,
        to: Option<&str>,
        subject: &str,
        body: &str,
    ) -> AppResult<DraftRef>;

    /// Open a reply window for an existing message
    async fn open_reply(&self, mailbox: &MailboxRef, message_id: &str) -> AppResult<DraftRef>;

    /// Current content of an outgoing message window
    ///
    /// The application populates reply content asynchronously, so this may
    /// legitimately return whitespace shortly after [`Self::open_reply`].
    async fn read_draft_content(&self, draft: &DraftRef) -> AppResult<String>;

    /// Replace the content of an outgoing message window
    async fn set_draft_content(&self, draft: &DraftRef, content: &str) -> AppResult<()>;

    /// Attach a file by path, passed through to the application uninterpreted
    async fn attach_file(&self, draft: &DraftRef, path: &str) -> AppResult<()>;

    /// Save the draft and read back its identifier if the application
    /// exposes one
    async fn save_draft(&self, draft: &DraftRef) -> AppResult<Option<String>>;
}

/// Parse the bridge's native date text
///
/// The adapter serializes dates as ISO 8601, but older scripting layers emit
/// RFC 2822 or a bare local timestamp. Unparseable text yields `None`; such
/// messages sort as the oldest.
pub fn parse_received_date(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{MailboxRef, parse_received_date};

    #[test]
    fn parses_iso_and_rfc2822_dates() {
        let iso = parse_received_date("2026-03-01T12:30:00Z").expect("iso parses");
        let rfc = parse_received_date("Sun, 1 Mar 2026 12:30:00 +0000").expect("rfc2822 parses");
        assert_eq!(iso, rfc);
    }

    #[test]
    fn parses_bare_local_timestamp_as_utc() {
        let parsed = parse_received_date("2026-03-01 12:30:00").expect("naive parses");
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T12:30:00+00:00");
    }

    #[test]
    fn rejects_unparseable_date_text() {
        assert!(parse_received_date("").is_none());
        assert!(parse_received_date("yesterday-ish").is_none());
    }

    #[test]
    fn mailbox_ref_displays_as_account_slash_name() {
        assert_eq!(MailboxRef::new("Work", "Inbox").to_string(), "Work/Inbox");
    }
}

#[cfg(test)]
pub mod fake {
    //! Scriptable in-memory bridge used by orchestration tests
    //!
    //! Records every call so scenario tests can assert which bridge
    //! primitives ran (and, as importantly, which did not).

    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{
        AccountRecord, DraftRef, MailBridge, MailboxCounts, MailboxRef, MessageRecord,
    };
    use crate::errors::{AppError, AppResult};

    type MailboxKey = (String, String);

    #[derive(Default)]
    struct State {
        accounts: Vec<AccountRecord>,
        account_mailboxes: Vec<(String, Vec<String>)>,
        local_mailboxes: Vec<String>,
        messages: HashMap<MailboxKey, Vec<MessageRecord>>,
        bodies: HashMap<String, String>,
        failing_mailboxes: HashSet<MailboxKey>,
        failing_counts: HashSet<MailboxKey>,
        offline: bool,
        native_archive: bool,
        attach_fails: bool,
        draft_seq: u32,
        draft_contents: HashMap<String, String>,
        reply_quoted: String,
        reply_ready_after: u32,
        draft_content_reads: u32,
    }

    /// In-memory [`MailBridge`] double with a recorded call log
    pub struct FakeBridge {
        state: Mutex<State>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBridge {
        pub fn new() -> Self {
            Self {
                state: Mutex::new(State {
                    native_archive: true,
                    ..State::default()
                }),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_account(self, name: &str, enabled: bool) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state.accounts.push(AccountRecord {
                    name: name.to_owned(),
                    enabled,
                });
                state.account_mailboxes.push((name.to_owned(), Vec::new()));
            }
            self
        }

        pub fn with_mailbox(self, account: &str, mailbox: &str) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                let slot = state
                    .account_mailboxes
                    .iter_mut()
                    .find(|(name, _)| name == account)
                    .unwrap_or_else(|| panic!("unknown fake account '{account}'"));
                slot.1.push(mailbox.to_owned());
                state
                    .messages
                    .entry((account.to_owned(), mailbox.to_owned()))
                    .or_default();
            }
            self
        }

        pub fn with_local_mailbox(self, mailbox: &str) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state.local_mailboxes.push(mailbox.to_owned());
                state
                    .messages
                    .entry((super::LOCAL_ACCOUNT.to_owned(), mailbox.to_owned()))
                    .or_default();
            }
            self
        }

        pub fn with_message(self, account: &str, mailbox: &str, record: MessageRecord) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state
                    .messages
                    .entry((account.to_owned(), mailbox.to_owned()))
                    .or_default()
                    .push(record);
            }
            self
        }

        pub fn with_body(self, message_id: &str, body: &str) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state.bodies.insert(message_id.to_owned(), body.to_owned());
            }
            self
        }

        /// Make listing/lookup in one mailbox fail with `OperationFailed`
        pub fn failing_mailbox(self, account: &str, mailbox: &str) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state
                    .failing_mailboxes
                    .insert((account.to_owned(), mailbox.to_owned()));
            }
            self
        }

        /// Make count probes for one mailbox fail
        pub fn failing_counts(self, account: &str, mailbox: &str) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state
                    .failing_counts
                    .insert((account.to_owned(), mailbox.to_owned()));
            }
            self
        }

        /// Simulate the mail application being unreachable
        pub fn offline(self) -> Self {
            self.state.lock().unwrap().offline = true;
            self
        }

        /// Simulate an account whose scripting layer lacks the archive verb
        pub fn without_native_archive(self) -> Self {
            self.state.lock().unwrap().native_archive = false;
            self
        }

        pub fn failing_attachments(self) -> Self {
            self.state.lock().unwrap().attach_fails = true;
            self
        }

        /// Reply content becomes non-empty after `reads` read-back calls
        pub fn with_reply_quoted(self, quoted: &str, ready_after_reads: u32) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state.reply_quoted = quoted.to_owned();
                state.reply_ready_after = ready_after_reads;
            }
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self, prefix: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|call| call.starts_with(prefix))
                .count()
        }

        /// Current messages of one mailbox, for post-mutation assertions
        pub fn mailbox_message_ids(&self, account: &str, mailbox: &str) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .messages
                .get(&(account.to_owned(), mailbox.to_owned()))
                .map(|records| records.iter().map(|r| r.message_id.clone()).collect())
                .unwrap_or_default()
        }

        pub fn draft_content(&self, draft_id: &str) -> Option<String> {
            self.state.lock().unwrap().draft_contents.get(draft_id).cloned()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn ensure_online(&self) -> AppResult<()> {
            if self.state.lock().unwrap().offline {
                Err(AppError::BridgeUnavailable(
                    "mail application is not running".to_owned(),
                ))
            } else {
                Ok(())
            }
        }

        fn take_message(
            &self,
            from: &MailboxRef,
            message_id: &str,
        ) -> AppResult<MessageRecord> {
            let mut state = self.state.lock().unwrap();
            let key = (from.account.clone(), from.mailbox.clone());
            let records = state
                .messages
                .get_mut(&key)
                .ok_or_else(|| AppError::NotFound(format!("no mailbox {from}")))?;
            let index = records
                .iter()
                .position(|r| r.message_id == message_id)
                .ok_or_else(|| {
                    AppError::NotFound(format!("message {message_id} not in {from}"))
                })?;
            Ok(records.remove(index))
        }

        fn put_message(&self, to: &MailboxRef, record: MessageRecord) {
            self.state
                .lock()
                .unwrap()
                .messages
                .entry((to.account.clone(), to.mailbox.clone()))
                .or_default()
                .push(record);
        }
    }

    #[async_trait]
    impl MailBridge for FakeBridge {
        async fn check_connectivity(&self) -> AppResult<()> {
            self.record("check_connectivity");
            self.ensure_online()
        }

        async fn list_accounts(&self) -> AppResult<Vec<AccountRecord>> {
            self.record("list_accounts");
            self.ensure_online()?;
            Ok(self.state.lock().unwrap().accounts.clone())
        }

        async fn list_account_mailboxes(&self, account: &str) -> AppResult<Vec<String>> {
            self.record(format!("list_account_mailboxes:{account}"));
            self.ensure_online()?;
            self.state
                .lock()
                .unwrap()
                .account_mailboxes
                .iter()
                .find(|(name, _)| name == account)
                .map(|(_, mailboxes)| mailboxes.clone())
                .ok_or_else(|| AppError::NotFound(format!("account '{account}' not found")))
        }

        async fn list_local_mailboxes(&self) -> AppResult<Vec<String>> {
            self.record("list_local_mailboxes");
            self.ensure_online()?;
            Ok(self.state.lock().unwrap().local_mailboxes.clone())
        }

        async fn mailbox_counts(&self, mailbox: &MailboxRef) -> AppResult<MailboxCounts> {
            self.record(format!("mailbox_counts:{mailbox}"));
            self.ensure_online()?;
            let state = self.state.lock().unwrap();
            let key = (mailbox.account.clone(), mailbox.mailbox.clone());
            if state.failing_counts.contains(&key) {
                return Err(AppError::OperationFailed(format!(
                    "count probe failed for {mailbox}"
                )));
            }
            let records = state
                .messages
                .get(&key)
                .ok_or_else(|| AppError::NotFound(format!("no mailbox {mailbox}")))?;
            Ok(MailboxCounts {
                total: records.len() as i64,
                unread: records.iter().filter(|r| !r.is_read).count() as i64,
            })
        }

        async fn list_messages(
            &self,
            mailbox: &MailboxRef,
            cap: usize,
        ) -> AppResult<Vec<MessageRecord>> {
            self.record(format!("list_messages:{mailbox}"));
            self.ensure_online()?;
            let state = self.state.lock().unwrap();
            let key = (mailbox.account.clone(), mailbox.mailbox.clone());
            if state.failing_mailboxes.contains(&key) {
                return Err(AppError::OperationFailed(format!(
                    "listing failed for {mailbox}"
                )));
            }
            let records = state
                .messages
                .get(&key)
                .ok_or_else(|| AppError::NotFound(format!("no mailbox {mailbox}")))?;
            Ok(records.iter().take(cap).cloned().collect())
        }

        async fn find_message(
            &self,
            mailbox: &MailboxRef,
            message_id: &str,
        ) -> AppResult<Option<MessageRecord>> {
            self.record(format!("find_message:{mailbox}:{message_id}"));
            self.ensure_online()?;
            let state = self.state.lock().unwrap();
            let key = (mailbox.account.clone(), mailbox.mailbox.clone());
            if state.failing_mailboxes.contains(&key) {
                return Err(AppError::OperationFailed(format!(
                    "lookup failed for {mailbox}"
                )));
            }
            Ok(state
                .messages
                .get(&key)
                .and_then(|records| records.iter().find(|r| r.message_id == message_id))
                .cloned())
        }

        async fn read_message_body(
            &self,
            mailbox: &MailboxRef,
            message_id: &str,
        ) -> AppResult<String> {
            self.record(format!("read_message_body:{message_id}"));
            self.ensure_online()?;
            self.state
                .lock()
                .unwrap()
                .bodies
                .get(message_id)
                .cloned()
                .ok_or_else(|| {
                    AppError::NotFound(format!("no body for message {message_id} in {mailbox}"))
                })
        }

        async fn move_message(
            &self,
            from: &MailboxRef,
            message_id: &str,
            to: &MailboxRef,
        ) -> AppResult<()> {
            self.record(format!("move_message:{message_id}->{to}"));
            self.ensure_online()?;
            let record = self.take_message(from, message_id)?;
            self.put_message(to, record);
            Ok(())
        }

        async fn copy_message(
            &self,
            from: &MailboxRef,
            message_id: &str,
            to: &MailboxRef,
        ) -> AppResult<()> {
            self.record(format!("copy_message:{message_id}->{to}"));
            self.ensure_online()?;
            let record = {
                let state = self.state.lock().unwrap();
                state
                    .messages
                    .get(&(from.account.clone(), from.mailbox.clone()))
                    .and_then(|records| records.iter().find(|r| r.message_id == message_id))
                    .cloned()
                    .ok_or_else(|| {
                        AppError::NotFound(format!("message {message_id} not in {from}"))
                    })?
            };
            self.put_message(to, record);
            Ok(())
        }

        async fn archive_message(&self, from: &MailboxRef, message_id: &str) -> AppResult<()> {
            self.record(format!("archive_message:{message_id}"));
            self.ensure_online()?;
            if !self.state.lock().unwrap().native_archive {
                return Err(AppError::OperationFailed(
                    "archive verb not supported by this account".to_owned(),
                ));
            }
            let record = self.take_message(from, message_id)?;
            self.put_message(&MailboxRef::new(from.account.clone(), "Archive"), record);
            Ok(())
        }

        async fn trash_message(&self, from: &MailboxRef, message_id: &str) -> AppResult<()> {
            self.record(format!("trash_message:{message_id}"));
            self.ensure_online()?;
            let record = self.take_message(from, message_id)?;
            self.put_message(&MailboxRef::new(from.account.clone(), "Trash"), record);
            Ok(())
        }

        async fn new_outgoing_message(
            &self,
            to: Option<&str>,
            subject: &str,
            body: &str,
        ) -> AppResult<DraftRef> {
            self.record(format!(
                "new_outgoing_message:{}:{subject}",
                to.unwrap_or("-")
            ));
            self.ensure_online()?;
            let mut state = self.state.lock().unwrap();
            state.draft_seq += 1;
            let id = format!("draft-{}", state.draft_seq);
            state.draft_contents.insert(id.clone(), body.to_owned());
            Ok(DraftRef { id })
        }

        async fn open_reply(
            &self,
            mailbox: &MailboxRef,
            message_id: &str,
        ) -> AppResult<DraftRef> {
            self.record(format!("open_reply:{message_id}"));
            self.ensure_online()?;
            let mut state = self.state.lock().unwrap();
            let exists = state
                .messages
                .get(&(mailbox.account.clone(), mailbox.mailbox.clone()))
                .is_some_and(|records| records.iter().any(|r| r.message_id == message_id));
            if !exists {
                return Err(AppError::NotFound(format!(
                    "message {message_id} not in {mailbox}"
                )));
            }
            state.draft_seq += 1;
            state.draft_content_reads = 0;
            let id = format!("draft-{}", state.draft_seq);
            state.draft_contents.insert(id.clone(), String::new());
            Ok(DraftRef { id })
        }

        async fn read_draft_content(&self, draft: &DraftRef) -> AppResult<String> {
            self.record(format!("read_draft_content:{}", draft.id));
            self.ensure_online()?;
            let mut state = self.state.lock().unwrap();
            state.draft_content_reads += 1;
            if state.draft_content_reads >= state.reply_ready_after {
                Ok(state.reply_quoted.clone())
            } else {
                Ok(String::new())
            }
        }

        async fn set_draft_content(&self, draft: &DraftRef, content: &str) -> AppResult<()> {
            self.record(format!("set_draft_content:{}", draft.id));
            self.ensure_online()?;
            self.state
                .lock()
                .unwrap()
                .draft_contents
                .insert(draft.id.clone(), content.to_owned());
            Ok(())
        }

        async fn attach_file(&self, draft: &DraftRef, path: &str) -> AppResult<()> {
            self.record(format!("attach_file:{}:{path}", draft.id));
            self.ensure_online()?;
            if self.state.lock().unwrap().attach_fails {
                return Err(AppError::OperationFailed(format!(
                    "could not attach '{path}'"
                )));
            }
            Ok(())
        }

        async fn save_draft(&self, draft: &DraftRef) -> AppResult<Option<String>> {
            self.record(format!("save_draft:{}", draft.id));
            self.ensure_online()?;
            Ok(Some(draft.id.clone()))
        }
    }

    /// Shorthand for building message records in tests
    pub fn message(id: &str, sender: &str, subject: &str, date: &str) -> MessageRecord {
        MessageRecord {
            message_id: id.to_owned(),
            sender: sender.to_owned(),
            subject: subject.to_owned(),
            date_received: super::parse_received_date(date),
            is_read: false,
            is_flagged: false,
        }
    }
}
