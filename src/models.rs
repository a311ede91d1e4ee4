//! Input/output DTOs and schema-bearing types
//!
//! Defines all data structures used in MCP tool contracts. Each type is
//! annotated with `JsonSchema` for automatic schema generation.

use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::bridge::MailboxRef;

/// Metadata included in all tool responses
///
/// Provides timing information and current UTC timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Meta {
    /// Current UTC timestamp in RFC 3339 format with milliseconds
    pub now_utc: String,
    /// Tool execution duration in milliseconds
    pub duration_ms: u64,
}

impl Meta {
    /// Create metadata populated with current time and elapsed duration
    pub fn now(duration_ms: u64) -> Self {
        Self {
            now_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            duration_ms,
        }
    }
}

/// Standard response envelope for all tools
///
/// Wraps tool-specific data with human-readable summary and execution metadata.
/// This structure provides consistent response shape across all MCP tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ToolEnvelope<T>
where
    T: JsonSchema,
{
    /// Human-readable summary of the operation outcome
    pub summary: String,
    /// Tool-specific data payload
    pub data: T,
    /// Execution metadata (timestamp, duration)
    pub meta: Meta,
}

/// A mailbox position, serialized as its `(account, mailbox)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MailboxLocation {
    /// Owning account name, or `local` for on-device folders
    pub account: String,
    /// Mailbox name within the account
    pub mailbox: String,
}

impl From<&MailboxRef> for MailboxLocation {
    fn from(location: &MailboxRef) -> Self {
        Self {
            account: location.account.clone(),
            mailbox: location.mailbox.clone(),
        }
    }
}

/// Mailbox metadata returned by `mail_list_mailboxes`
///
/// Counts are present for inbox-like mailboxes only and are best-effort
/// snapshots; `-1` marks a count the mail application failed to compute.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MailboxInfo {
    /// Owning account name, or `local` for on-device folders
    pub account: String,
    /// Mailbox name within the account
    pub mailbox: String,
    /// Total message count (inbox-like mailboxes only; `-1` on failure)
    pub total_count: Option<i64>,
    /// Unread message count (inbox-like mailboxes only; `-1` on failure)
    pub unread_count: Option<i64>,
}

/// Message summary returned by `mail_list_emails`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmailSummary {
    /// Identifier unique within the mail store
    pub message_id: String,
    /// Sender display string as the mail application reports it
    pub sender: String,
    pub subject: String,
    /// Receipt time in RFC 3339; absent when the mail application's date
    /// text could not be parsed
    pub date_received: Option<String>,
    pub is_read: bool,
    pub is_flagged: bool,
    /// Mailbox the message was found in
    pub location: MailboxLocation,
}

/// A hyperlink extracted from a message body
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmailLink {
    /// Link text, or the URL itself for bare links
    pub text: String,
    pub href: String,
}

/// Fully read message returned by `mail_read_emails`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmailContent {
    /// Identifier unique within the mail store
    pub message_id: String,
    pub sender: String,
    pub subject: String,
    /// Receipt time in RFC 3339
    pub date_received: Option<String>,
    pub is_read: bool,
    pub is_flagged: bool,
    /// Mailbox the message was found in
    pub location: MailboxLocation,
    /// Full body text
    pub content: String,
    /// Hyperlinks extracted from the body (bounded)
    pub links: Vec<EmailLink>,
}

/// Per-item outcome of a mutating batch operation
///
/// The outcome list is always the same length and order as the request
/// list. Metadata fields are captured before the mutating step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmailActionOutcome {
    /// Echoes the request's message id
    pub message_id: String,
    pub success: bool,
    pub sender: Option<String>,
    pub subject: Option<String>,
    /// Receipt time in RFC 3339
    pub date_received: Option<String>,
    /// Where the message was found before the operation
    pub source: Option<MailboxLocation>,
    /// Where the operation put (or copied) the message
    pub target: Option<MailboxLocation>,
    /// Human-readable failure reason
    pub error: Option<String>,
}

impl EmailActionOutcome {
    /// Failure outcome carrying only the echoed id and the reason
    pub fn failure(message_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            success: false,
            sender: None,
            subject: None,
            date_received: None,
            source: None,
            target: None,
            error: Some(error.into()),
        }
    }
}

/// Per-item outcome of `mail_read_emails`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadEmailOutcome {
    /// Echoes the request's message id
    pub message_id: String,
    pub success: bool,
    pub email: Option<EmailContent>,
    /// Human-readable failure reason
    pub error: Option<String>,
}

/// Batch-level report for mutating operations
///
/// `success` is true iff at least one item succeeded; callers must inspect
/// `results` for full accuracy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    pub success: bool,
    /// Items that succeeded
    pub succeeded: usize,
    /// Items attempted (equals the request count)
    pub attempted: usize,
    /// Positionally aligned per-item outcomes
    pub results: Vec<EmailActionOutcome>,
}

impl BatchReport {
    pub fn from_results(results: Vec<EmailActionOutcome>) -> Self {
        let succeeded = results.iter().filter(|outcome| outcome.success).count();
        Self {
            success: succeeded > 0,
            succeeded,
            attempted: results.len(),
            results,
        }
    }
}

/// Batch-level report for `mail_read_emails`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadBatchReport {
    pub success: bool,
    /// Items that succeeded
    pub succeeded: usize,
    /// Items attempted (equals the request count)
    pub attempted: usize,
    /// Positionally aligned per-item outcomes
    pub results: Vec<ReadEmailOutcome>,
}

impl ReadBatchReport {
    pub fn from_results(results: Vec<ReadEmailOutcome>) -> Self {
        let succeeded = results.iter().filter(|outcome| outcome.success).count();
        Self {
            success: succeeded > 0,
            succeeded,
            attempted: results.len(),
            results,
        }
    }
}

/// Result of `mail_create_draft`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DraftReport {
    pub success: bool,
    /// Human-readable outcome description
    pub message: String,
    /// Bridge-assigned draft identifier, when the application exposed one
    pub draft_id: Option<String>,
}

/// Input: list emails with optional selectors and filters
///
/// Used by `mail_list_emails`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListEmailsInput {
    /// Fuzzy search term matched against subject and sender
    pub search_term: Option<String>,
    /// Maximum messages to return (default 25)
    #[serde(default = "default_list_limit")]
    pub limit: usize,
    /// Restrict to one account
    pub account_name: Option<String>,
    /// Restrict to mailboxes with this name (case-insensitive)
    pub mailbox_name: Option<String>,
    /// Filter by read state
    pub is_read: Option<bool>,
    /// Filter by flagged state
    pub is_flagged: Option<bool>,
}

/// One message to read in a `mail_read_emails` batch
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadRequestItem {
    /// Message identifier
    pub message_id: String,
    /// Account the message is expected in (location hint)
    pub account_name: Option<String>,
    /// Mailbox the message is expected in (location hint)
    pub mailbox_name: Option<String>,
}

/// Input: read full content of one or more emails
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadEmailsInput {
    /// Messages to read; duplicates are coalesced but results stay
    /// positionally aligned to this list
    pub messages: Vec<ReadRequestItem>,
}

/// One message to move or copy
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TransferRequestItem {
    /// Message identifier
    pub message_id: String,
    /// Account that owns the destination mailbox
    pub target_account_name: String,
    /// Destination mailbox name (case-insensitive)
    pub target_mailbox_name: String,
    /// Account the message is expected in (location hint)
    pub account_name: Option<String>,
    /// Mailbox the message is expected in (location hint)
    pub mailbox_name: Option<String>,
}

/// Input: move one or more emails; a single move is a batch of size one
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MoveEmailsInput {
    pub messages: Vec<TransferRequestItem>,
}

/// Input: copy one or more emails
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CopyEmailsInput {
    pub messages: Vec<TransferRequestItem>,
}

/// One message to archive or trash (targets are implicit)
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FileRequestItem {
    /// Message identifier
    pub message_id: String,
    /// Account the message is expected in (location hint)
    pub account_name: Option<String>,
    /// Mailbox the message is expected in (location hint)
    pub mailbox_name: Option<String>,
}

/// Input: archive one or more emails into their own account's Archive
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ArchiveEmailsInput {
    pub messages: Vec<FileRequestItem>,
}

/// Input: move one or more emails to their own account's Trash
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TrashEmailsInput {
    pub messages: Vec<FileRequestItem>,
}

/// Input: create a new draft or a reply
///
/// Used by `mail_create_draft`. `original_message_id` is required when
/// `is_reply` is true.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateDraftInput {
    /// Compose a reply instead of a new message
    #[serde(default)]
    pub is_reply: bool,
    /// Message being replied to (required with `is_reply`)
    pub original_message_id: Option<String>,
    /// Single recipient for a new message
    pub to_address: Option<String>,
    pub subject: String,
    pub body: String,
    /// File to attach, passed to the mail application uninterpreted;
    /// attachment failure fails the whole operation
    pub attachment_path: Option<String>,
}

/// Format a parsed receipt time for DTOs
pub fn format_date(date: Option<DateTime<Utc>>) -> Option<String> {
    date.map(|value| value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Default value for `limit` in list_emails
///
/// Large enough for a useful overview without flooding the calling agent.
pub fn default_list_limit() -> usize {
    25
}
