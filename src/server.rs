//! MCP server implementation with tool handlers
//!
//! Implements the `ServerHandler` trait and registers 8 MCP tools. Handles
//! input validation, delegates orchestration to the engine components, and
//! formats response envelopes. Single-item operations are batches of size
//! one; the tool surface only exposes the batch contract.

use std::sync::Arc;
use std::time::Instant;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ErrorData, ServerCapabilities, ServerInfo};
use rmcp::{Json, ServerHandler, tool, tool_handler, tool_router};

use crate::batch::BatchOperationCoordinator;
use crate::bridge::MailBridge;
use crate::compose::DraftComposer;
use crate::config::ServerConfig;
use crate::directory::MailboxDirectory;
use crate::errors::{AppError, AppResult};
use crate::init::InitGate;
use crate::models::{
    ArchiveEmailsInput, BatchReport, CopyEmailsInput, CreateDraftInput, DraftReport,
    EmailSummary, ListEmailsInput, MailboxInfo, Meta, MoveEmailsInput, ReadBatchReport,
    ReadEmailsInput, ToolEnvelope, TrashEmailsInput, format_date,
};
use crate::query::{EmailQueryEngine, ListQuery};

/// Maximum messages returned by one list call
const MAX_LIST_LIMIT: usize = 500;
/// Maximum items in one batch request
const MAX_BATCH_ITEMS: usize = 100;

/// Mail bridge MCP server
///
/// Holds shared configuration, the bridge handle, and the initialization
/// gate. Implements MCP tool handlers via `#[tool]` attribute macro and
/// `ServerHandler` trait.
#[derive(Clone)]
pub struct MailBridgeServer {
    /// Server config (timeouts, caps, thresholds)
    config: Arc<ServerConfig>,
    /// Scripting bridge handle shared by all components
    bridge: Arc<dyn MailBridge>,
    /// Initialization state capability (never a module global)
    init: Arc<InitGate>,
    /// Tool router for dispatching MCP tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MailBridgeServer {
    /// Create a new MCP server instance
    pub fn new(config: ServerConfig, bridge: Arc<dyn MailBridge>, init: Arc<InitGate>) -> Self {
        Self {
            config: Arc::new(config),
            bridge,
            init,
            tool_router: Self::tool_router(),
        }
    }

    /// Tool: List every visible mailbox
    ///
    /// Enumerates mailboxes across enabled accounts plus local folders, with
    /// best-effort counts for inbox-like mailboxes.
    #[tool(
        name = "mail_list_mailboxes",
        description = "List all mailboxes across accounts"
    )]
    async fn list_mailboxes(&self) -> Result<Json<ToolEnvelope<Vec<MailboxInfo>>>, ErrorData> {
        let started = Instant::now();
        let result = self.track(self.list_mailboxes_impl().await);
        finalize_tool(
            started,
            result.map(|data| (format!("{} mailbox(es)", data.len()), data)),
        )
    }

    /// Tool: List emails with optional search and filters
    ///
    /// Fetches every resolved mailbox concurrently, then merges, dedups,
    /// sorts newest-first, and optionally fuzzy-ranks by a search term.
    #[tool(
        name = "mail_list_emails",
        description = "List emails with optional search, account/mailbox selectors, and filters"
    )]
    async fn list_emails(
        &self,
        Parameters(input): Parameters<ListEmailsInput>,
    ) -> Result<Json<ToolEnvelope<Vec<EmailSummary>>>, ErrorData> {
        let started = Instant::now();
        let result = self.track(self.list_emails_impl(input).await);
        finalize_tool(
            started,
            result.map(|data| (format!("{} email(s)", data.len()), data)),
        )
    }

    /// Tool: Read full content for a batch of emails
    ///
    /// Duplicate ids are coalesced before touching the bridge; results stay
    /// positionally aligned to the request list.
    #[tool(
        name = "mail_read_emails",
        description = "Read full content (including links) for one or more emails"
    )]
    async fn read_emails(
        &self,
        Parameters(input): Parameters<ReadEmailsInput>,
    ) -> Result<Json<ToolEnvelope<ReadBatchReport>>, ErrorData> {
        let started = Instant::now();
        let result = self.track(self.read_emails_impl(input).await);
        finalize_tool(
            started,
            result.map(|report| {
                (
                    format!("read {} of {} email(s)", report.succeeded, report.attempted),
                    report,
                )
            }),
        )
    }

    /// Tool: Move emails to a target mailbox
    ///
    /// Targets are validated against the live mailbox directory before any
    /// mutation; a single move is a batch of size one.
    #[tool(
        name = "mail_move_emails",
        description = "Move one or more emails to a target account/mailbox"
    )]
    async fn move_emails(
        &self,
        Parameters(input): Parameters<MoveEmailsInput>,
    ) -> Result<Json<ToolEnvelope<BatchReport>>, ErrorData> {
        let started = Instant::now();
        let result = self.track(self.move_emails_impl(input).await);
        finalize_tool(started, result.map(|report| (batch_summary("moved", &report), report)))
    }

    /// Tool: Copy emails to a target mailbox
    #[tool(
        name = "mail_copy_emails",
        description = "Copy one or more emails to a target account/mailbox"
    )]
    async fn copy_emails(
        &self,
        Parameters(input): Parameters<CopyEmailsInput>,
    ) -> Result<Json<ToolEnvelope<BatchReport>>, ErrorData> {
        let started = Instant::now();
        let result = self.track(self.copy_emails_impl(input).await);
        finalize_tool(
            started,
            result.map(|report| (batch_summary("copied", &report), report)),
        )
    }

    /// Tool: Archive emails into their own account's Archive
    ///
    /// Prefers the application's native archive verb, falling back to a
    /// Trash-hop for accounts that lack it.
    #[tool(
        name = "mail_archive_emails",
        description = "Archive one or more emails into their account's Archive mailbox"
    )]
    async fn archive_emails(
        &self,
        Parameters(input): Parameters<ArchiveEmailsInput>,
    ) -> Result<Json<ToolEnvelope<BatchReport>>, ErrorData> {
        let started = Instant::now();
        let result = self.track(self.archive_emails_impl(input).await);
        finalize_tool(
            started,
            result.map(|report| (batch_summary("archived", &report), report)),
        )
    }

    /// Tool: Move emails to their own account's Trash
    #[tool(
        name = "mail_trash_emails",
        description = "Move one or more emails to their account's Trash"
    )]
    async fn trash_emails(
        &self,
        Parameters(input): Parameters<TrashEmailsInput>,
    ) -> Result<Json<ToolEnvelope<BatchReport>>, ErrorData> {
        let started = Instant::now();
        let result = self.track(self.trash_emails_impl(input).await);
        finalize_tool(
            started,
            result.map(|report| (batch_summary("trashed", &report), report)),
        )
    }

    /// Tool: Create a draft or a reply
    #[tool(
        name = "mail_create_draft",
        description = "Create a new draft email or a reply, optionally with an attachment"
    )]
    async fn create_draft(
        &self,
        Parameters(input): Parameters<CreateDraftInput>,
    ) -> Result<Json<ToolEnvelope<DraftReport>>, ErrorData> {
        let started = Instant::now();
        let result = self.track(self.create_draft_impl(input).await);
        finalize_tool(
            started,
            result.map(|report| (report.message.clone(), report)),
        )
    }
}

/// MCP server handler implementation
///
/// Provides server info and capabilities to MCP client.
#[tool_handler(router = self.tool_router)]
impl ServerHandler for MailBridgeServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.instructions = Some(
            "Mail bridge MCP server. Operates on the desktop mail application through its \
             scripting interface; batch tools report per-item outcomes and never fail closed \
             on partial errors."
                .to_owned(),
        );
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info
    }
}

/// Tool implementation methods
///
/// Private methods handle the actual business logic for each tool, separated
/// from the public `#[tool]` methods that handle response formatting.
impl MailBridgeServer {
    /// Upgrade the init gate after any successful bridge-backed call
    fn track<T>(&self, result: AppResult<T>) -> AppResult<T> {
        if result.is_ok() {
            self.init.record_success();
        }
        result
    }

    async fn list_mailboxes_impl(&self) -> AppResult<Vec<MailboxInfo>> {
        let entries = MailboxDirectory::new(self.bridge.as_ref())
            .list_mailboxes()
            .await?;
        Ok(entries
            .into_iter()
            .map(|entry| MailboxInfo {
                account: entry.location.account.clone(),
                mailbox: entry.location.mailbox.clone(),
                total_count: entry.counts.map(|counts| counts.total),
                unread_count: entry.counts.map(|counts| counts.unread),
            })
            .collect())
    }

    async fn list_emails_impl(&self, input: ListEmailsInput) -> AppResult<Vec<EmailSummary>> {
        if let Some(term) = &input.search_term {
            validate_text(term, "search_term", 256)?;
        }
        if let Some(account) = &input.account_name {
            validate_text(account, "account_name", 256)?;
        }
        if let Some(mailbox) = &input.mailbox_name {
            validate_text(mailbox, "mailbox_name", 256)?;
        }
        if input.limit > MAX_LIST_LIMIT {
            return Err(AppError::invalid(format!(
                "limit must be at most {MAX_LIST_LIMIT}"
            )));
        }

        let engine = EmailQueryEngine::new(self.bridge.as_ref(), &self.config);
        let messages = engine
            .list(&ListQuery {
                search_term: input.search_term,
                limit: Some(input.limit),
                account: input.account_name,
                mailbox: input.mailbox_name,
                is_read: input.is_read,
                is_flagged: input.is_flagged,
            })
            .await?;

        Ok(messages
            .into_iter()
            .map(|message| EmailSummary {
                message_id: message.record.message_id.clone(),
                sender: message.record.sender.clone(),
                subject: message.record.subject.clone(),
                date_received: format_date(message.record.date_received),
                is_read: message.record.is_read,
                is_flagged: message.record.is_flagged,
                location: (&message.mailbox).into(),
            })
            .collect())
    }

    async fn read_emails_impl(&self, input: ReadEmailsInput) -> AppResult<ReadBatchReport> {
        validate_batch_size(input.messages.len())?;
        for item in &input.messages {
            validate_message_id(&item.message_id)?;
        }

        let coordinator = BatchOperationCoordinator::new(self.bridge.as_ref());
        let results = coordinator.read_messages(&input.messages).await?;
        Ok(ReadBatchReport::from_results(results))
    }

    async fn move_emails_impl(&self, input: MoveEmailsInput) -> AppResult<BatchReport> {
        validate_batch_size(input.messages.len())?;
        for item in &input.messages {
            validate_message_id(&item.message_id)?;
            validate_text(&item.target_account_name, "target_account_name", 256)?;
            validate_text(&item.target_mailbox_name, "target_mailbox_name", 256)?;
        }

        let coordinator = BatchOperationCoordinator::new(self.bridge.as_ref());
        let results = coordinator.move_messages(&input.messages).await?;
        Ok(BatchReport::from_results(results))
    }

    async fn copy_emails_impl(&self, input: CopyEmailsInput) -> AppResult<BatchReport> {
        validate_batch_size(input.messages.len())?;
        for item in &input.messages {
            validate_message_id(&item.message_id)?;
            validate_text(&item.target_account_name, "target_account_name", 256)?;
            validate_text(&item.target_mailbox_name, "target_mailbox_name", 256)?;
        }

        let coordinator = BatchOperationCoordinator::new(self.bridge.as_ref());
        let results = coordinator.copy_messages(&input.messages).await?;
        Ok(BatchReport::from_results(results))
    }

    async fn archive_emails_impl(&self, input: ArchiveEmailsInput) -> AppResult<BatchReport> {
        validate_batch_size(input.messages.len())?;
        for item in &input.messages {
            validate_message_id(&item.message_id)?;
        }

        let coordinator = BatchOperationCoordinator::new(self.bridge.as_ref());
        let results = coordinator.archive_messages(&input.messages).await?;
        Ok(BatchReport::from_results(results))
    }

    async fn trash_emails_impl(&self, input: TrashEmailsInput) -> AppResult<BatchReport> {
        validate_batch_size(input.messages.len())?;
        for item in &input.messages {
            validate_message_id(&item.message_id)?;
        }

        let coordinator = BatchOperationCoordinator::new(self.bridge.as_ref());
        let results = coordinator.trash_messages(&input.messages).await?;
        Ok(BatchReport::from_results(results))
    }

    async fn create_draft_impl(&self, input: CreateDraftInput) -> AppResult<DraftReport> {
        validate_text(&input.subject, "subject", 1_000)?;
        if let Some(address) = &input.to_address {
            validate_text(address, "to_address", 320)?;
        }
        if let Some(id) = &input.original_message_id {
            validate_message_id(id)?;
        }

        let composer = DraftComposer::new(self.bridge.as_ref(), &self.config);
        composer.create_draft(&input).await
    }
}

/// Calculate elapsed milliseconds
fn duration_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// Build a standardized MCP tool response envelope from business logic output
fn finalize_tool<T>(
    started: Instant,
    result: AppResult<(String, T)>,
) -> Result<Json<ToolEnvelope<T>>, ErrorData>
where
    T: schemars::JsonSchema,
{
    match result {
        Ok((summary, data)) => Ok(Json(ToolEnvelope {
            summary,
            data,
            meta: Meta::now(duration_ms(started)),
        })),
        Err(e) => Err(e.to_error_data()),
    }
}

/// Batch summary line, e.g. "moved 2 of 3 message(s)"
fn batch_summary(verb: &str, report: &BatchReport) -> String {
    format!(
        "{verb} {} of {} message(s)",
        report.succeeded, report.attempted
    )
}

/// Validate a message identifier
fn validate_message_id(message_id: &str) -> AppResult<()> {
    if message_id.trim().is_empty() || message_id.len() > 128 {
        return Err(AppError::invalid("message_id must be 1..128 characters"));
    }
    validate_no_controls(message_id, "message_id")
}

/// Validate a bounded, control-free text field
fn validate_text(value: &str, field: &str, max: usize) -> AppResult<()> {
    if value.is_empty() || value.len() > max {
        return Err(AppError::invalid(format!(
            "{field} must be 1..{max} characters"
        )));
    }
    validate_no_controls(value, field)
}

/// Reject control characters in user-provided values
fn validate_no_controls(value: &str, field: &str) -> AppResult<()> {
    if value.chars().any(|ch| ch.is_ascii_control()) {
        return Err(AppError::invalid(format!(
            "{field} must not contain control characters"
        )));
    }
    Ok(())
}

/// Validate batch request size
fn validate_batch_size(len: usize) -> AppResult<()> {
    if len == 0 {
        return Err(AppError::invalid(
            "messages must contain at least one item",
        ));
    }
    if len > MAX_BATCH_ITEMS {
        return Err(AppError::invalid(format!(
            "messages must contain at most {MAX_BATCH_ITEMS} items"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{
        MailBridgeServer, batch_summary, validate_batch_size, validate_message_id, validate_text,
    };
    use crate::bridge::MailBridge;
    use crate::bridge::fake::{FakeBridge, message};
    use crate::config::ServerConfig;
    use crate::errors::AppError;
    use crate::init::{InitGate, InitState};
    use crate::models::{
        BatchReport, EmailActionOutcome, ListEmailsInput, MoveEmailsInput, TransferRequestItem,
        default_list_limit,
    };

    fn test_config() -> ServerConfig {
        ServerConfig {
            launch_timeout_ms: 1_000,
            script_timeout_ms: 1_000,
            auto_launch: false,
            mailbox_fetch_cap: 200,
            fuzzy_threshold: 0.55,
            draft_content_attempts: 3,
            draft_content_delay_ms: 1,
        }
    }

    fn server_with(bridge: Arc<FakeBridge>) -> MailBridgeServer {
        let handle: Arc<dyn MailBridge> = bridge;
        MailBridgeServer::new(test_config(), handle, Arc::new(InitGate::new()))
    }

    fn populated_bridge() -> FakeBridge {
        FakeBridge::new()
            .with_account("Work", true)
            .with_mailbox("Work", "Inbox")
            .with_mailbox("Work", "Saved")
            .with_message(
                "Work",
                "Inbox",
                message("9", "gail@example.com", "summary", "2026-04-01T12:00:00Z"),
            )
    }

    #[test]
    fn rejects_control_chars_in_message_id() {
        let err = validate_message_id("81\n506").expect_err("must fail");
        assert!(err.to_string().contains("control characters"));
    }

    #[test]
    fn rejects_empty_and_oversized_fields() {
        assert!(validate_message_id("  ").is_err());
        assert!(validate_text("", "subject", 10).is_err());
        assert!(validate_text(&"x".repeat(11), "subject", 10).is_err());
        assert!(validate_text("fine", "subject", 10).is_ok());
    }

    #[test]
    fn bounds_batch_sizes() {
        assert!(validate_batch_size(0).is_err());
        assert!(validate_batch_size(1).is_ok());
        assert!(validate_batch_size(100).is_ok());
        assert!(validate_batch_size(101).is_err());
    }

    #[test]
    fn batch_summary_counts_successes() {
        let report = BatchReport::from_results(vec![
            EmailActionOutcome::failure("1", "nope"),
            EmailActionOutcome {
                success: true,
                ..EmailActionOutcome::failure("2", "")
            },
        ]);
        assert_eq!(batch_summary("moved", &report), "moved 1 of 2 message(s)");
        assert!(report.success);
    }

    #[test]
    fn default_limit_is_twenty_five() {
        assert_eq!(default_list_limit(), 25);
    }

    #[tokio::test]
    async fn list_mailboxes_impl_shapes_directory_entries() {
        let bridge = Arc::new(populated_bridge());
        let server = server_with(bridge);

        let mailboxes = server
            .list_mailboxes_impl()
            .await
            .expect("listing succeeds");

        assert_eq!(mailboxes.len(), 2);
        assert_eq!(mailboxes[0].account, "Work");
        assert_eq!(mailboxes[0].mailbox, "Inbox");
        assert_eq!(mailboxes[0].total_count, Some(1));
        assert_eq!(mailboxes[1].total_count, None);
    }

    #[tokio::test]
    async fn list_emails_impl_applies_default_limit() {
        let bridge = Arc::new(populated_bridge());
        let server = server_with(bridge);

        let emails = server
            .list_emails_impl(ListEmailsInput {
                search_term: None,
                limit: default_list_limit(),
                account_name: None,
                mailbox_name: None,
                is_read: None,
                is_flagged: None,
            })
            .await
            .expect("listing succeeds");

        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].message_id, "9");
        assert_eq!(emails[0].location.mailbox, "Inbox");
    }

    #[tokio::test]
    async fn single_move_is_a_batch_of_one() {
        let bridge = Arc::new(populated_bridge());
        let server = server_with(bridge.clone());

        let report = server
            .move_emails_impl(MoveEmailsInput {
                messages: vec![TransferRequestItem {
                    message_id: "9".to_owned(),
                    target_account_name: "Work".to_owned(),
                    target_mailbox_name: "Saved".to_owned(),
                    account_name: None,
                    mailbox_name: None,
                }],
            })
            .await
            .expect("move succeeds");

        assert!(report.success);
        assert_eq!(report.attempted, 1);
        assert_eq!(bridge.mailbox_message_ids("Work", "Saved"), vec!["9"]);
    }

    #[tokio::test]
    async fn successful_call_upgrades_degraded_gate() {
        let bridge = Arc::new(populated_bridge());
        let gate = Arc::new(InitGate::new());
        let handle: Arc<dyn MailBridge> = bridge;
        // Force the degraded path with an offline probe target.
        let offline: Arc<dyn MailBridge> = Arc::new(FakeBridge::new().offline());
        gate.bootstrap(&offline, std::time::Duration::from_millis(200))
            .await;
        assert_eq!(gate.current(), InitState::DegradedReady);

        let server = MailBridgeServer::new(test_config(), handle, gate.clone());
        let result = server.list_mailboxes_impl().await;
        server.track(result).expect("listing succeeds");
        assert_eq!(gate.current(), InitState::Ready);
    }
}
