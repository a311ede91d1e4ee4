//! Scripting bridge adapter
//!
//! The only module that knows the mail application is driven through
//! `osascript`. Script text generation and reply parsing live here as pure,
//! unit-testable functions; the orchestration layer above sees nothing but
//! the [`MailBridge`] trait.
//!
//! Scripts are JXA (JavaScript for Automation) IIFEs that print a JSON
//! document. `osascript` prints a script's completion value verbatim, so
//! stdout is decoded into one of the tagged [`BridgeReply`] shapes; stderr
//! and exit status carry script failures.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::bridge::{
    AccountRecord, DraftRef, MailBridge, MailboxCounts, MailboxRef, MessageRecord,
    parse_received_date,
};
use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};

/// Tagged decode of a bridge reply
///
/// The bridge returns a typed record, a list of typed records, or opaque
/// text; connectivity failures never reach this type.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeReply {
    Record(serde_json::Map<String, Value>),
    List(Vec<Value>),
    Text(String),
}

impl BridgeReply {
    fn into_record(self) -> AppResult<serde_json::Map<String, Value>> {
        match self {
            Self::Record(map) => Ok(map),
            other => Err(AppError::ParseFailed(format!(
                "expected a record reply, got {}",
                other.shape_name()
            ))),
        }
    }

    fn into_list(self) -> AppResult<Vec<Value>> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(AppError::ParseFailed(format!(
                "expected a list reply, got {}",
                other.shape_name()
            ))),
        }
    }

    fn shape_name(&self) -> &'static str {
        match self {
            Self::Record(_) => "record",
            Self::List(_) => "list",
            Self::Text(_) => "text",
        }
    }
}

/// Decode raw script output into a tagged reply
///
/// JSON objects and arrays map directly; a JSON string is unwrapped and, if
/// it itself encodes JSON, decoded one level deeper (some scripting layers
/// double-encode). Anything else is opaque text. Bare JSON scalars are the
/// one shape a well-formed script never produces, so they are a parse
/// failure rather than data.
pub fn decode_reply(raw: &str) -> AppResult<BridgeReply> {
    let trimmed = raw.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(BridgeReply::Record(map)),
        Ok(Value::Array(items)) => Ok(BridgeReply::List(items)),
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Object(map)) => Ok(BridgeReply::Record(map)),
            Ok(Value::Array(items)) => Ok(BridgeReply::List(items)),
            _ => Ok(BridgeReply::Text(inner)),
        },
        Ok(other) => Err(AppError::ParseFailed(format!(
            "unexpected scalar reply: {other}"
        ))),
        Err(_) => Ok(BridgeReply::Text(trimmed.to_owned())),
    }
}

/// Map a failed script's stderr to the error taxonomy
///
/// Only genuine reachability failures may become `BridgeUnavailable`;
/// everything else is an operation failure carrying the script's own
/// diagnostic text.
pub fn classify_script_error(stderr: &str) -> AppError {
    let lowered = stderr.to_ascii_lowercase();
    let unreachable = [
        "application isn't running",
        "application is not running",
        "can't find application",
        "connection is invalid",
        "not authorized to send apple events",
    ];
    if unreachable.iter().any(|needle| lowered.contains(needle)) {
        AppError::BridgeUnavailable(stderr.to_owned())
    } else if lowered.contains("can't get") || lowered.contains("doesn't understand") {
        AppError::NotFound(stderr.to_owned())
    } else {
        AppError::OperationFailed(stderr.to_owned())
    }
}

/// Quote a value as a JavaScript string literal
///
/// JSON string encoding is valid JavaScript and covers every escape.
fn js_string(value: &str) -> String {
    Value::String(value.to_owned()).to_string()
}

/// Script prelude binding the target mailbox to `box_`
///
/// Local mailboxes hang off the application object; account mailboxes off
/// their account. The dynamic `byName` lookups stay inside this adapter.
fn mailbox_binding(location: &MailboxRef) -> String {
    if location.is_local() {
        format!("const box_ = mail.mailboxes.byName({});", js_string(&location.mailbox))
    } else {
        format!(
            "const box_ = mail.accounts.byName({}).mailboxes.byName({});",
            js_string(&location.account),
            js_string(&location.mailbox)
        )
    }
}

/// Shared JS snippet serializing one message to a record
const MESSAGE_FIELDS: &str = r#"
function messageRecord(msg) {
    let date = "";
    try { const d = msg.dateReceived(); if (d) { date = d.toISOString(); } } catch (e) {}
    return {
        message_id: String(msg.id()),
        sender: String(msg.sender()),
        subject: String(msg.subject()),
        date_received: date,
        is_read: Boolean(msg.readStatus()),
        is_flagged: Boolean(msg.flaggedStatus()),
    };
}"#;

fn ping_script() -> String {
    r#"(() => {
    const mail = Application("Mail");
    return JSON.stringify({ running: mail.running() });
})()"#
        .to_owned()
}

fn launch_script() -> String {
    r#"(() => {
    const mail = Application("Mail");
    mail.activate();
    return JSON.stringify({ running: mail.running() });
})()"#
        .to_owned()
}

fn list_accounts_script() -> String {
    r#"(() => {
    const mail = Application("Mail");
    const records = mail.accounts().map(acct => ({
        name: String(acct.name()),
        enabled: Boolean(acct.enabled()),
    }));
    return JSON.stringify(records);
})()"#
        .to_owned()
}

fn account_mailboxes_script(account: &str) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    const acct = mail.accounts.byName({});
    return JSON.stringify(acct.mailboxes().map(box_ => ({{ name: String(box_.name()) }})));
}})()"#,
        js_string(account)
    )
}

fn local_mailboxes_script() -> String {
    r#"(() => {
    const mail = Application("Mail");
    return JSON.stringify(mail.mailboxes().map(box_ => ({ name: String(box_.name()) })));
})()"#
        .to_owned()
}

fn mailbox_counts_script(location: &MailboxRef) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    let total = -1;
    let unread = -1;
    try {{ total = box_.messages.length; }} catch (e) {{}}
    try {{ unread = box_.unreadCount(); }} catch (e) {{}}
    return JSON.stringify({{ total: total, unread: unread }});
}})()"#,
        mailbox_binding(location)
    )
}

fn list_messages_script(location: &MailboxRef, cap: usize) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    {MESSAGE_FIELDS}
    const count = Math.min(box_.messages.length, {cap});
    const records = [];
    for (let i = 0; i < count; i++) {{
        records.push(messageRecord(box_.messages[i]));
    }}
    return JSON.stringify(records);
}})()"#,
        mailbox_binding(location)
    )
}

fn find_message_script(location: &MailboxRef, message_id: &str) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    {MESSAGE_FIELDS}
    const matches = box_.messages.whose({{ id: Number({id}) }})();
    return JSON.stringify(matches.map(messageRecord));
}})()"#,
        mailbox_binding(location),
        id = js_string(message_id)
    )
}

fn read_body_script(location: &MailboxRef, message_id: &str) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    const msg = box_.messages.whose({{ id: Number({id}) }})()[0];
    if (!msg) {{ throw new Error("message not found"); }}
    return JSON.stringify({{ content: String(msg.content()) }});
}})()"#,
        mailbox_binding(location),
        id = js_string(message_id)
    )
}

/// Rebind `box_` for a transfer target as `target_`
fn target_binding(location: &MailboxRef) -> String {
    mailbox_binding(location).replace("const box_ =", "const target_ =")
}

fn move_message_script(from: &MailboxRef, message_id: &str, to: &MailboxRef) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    {}
    const msg = box_.messages.whose({{ id: Number({id}) }})()[0];
    if (!msg) {{ throw new Error("message not found"); }}
    mail.move(msg, {{ to: target_ }});
    return JSON.stringify({{ ok: true }});
}})()"#,
        mailbox_binding(from),
        target_binding(to),
        id = js_string(message_id)
    )
}

fn copy_message_script(from: &MailboxRef, message_id: &str, to: &MailboxRef) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    {}
    const msg = box_.messages.whose({{ id: Number({id}) }})()[0];
    if (!msg) {{ throw new Error("message not found"); }}
    mail.duplicate(msg, {{ to: target_ }});
    return JSON.stringify({{ ok: true }});
}})()"#,
        mailbox_binding(from),
        target_binding(to),
        id = js_string(message_id)
    )
}

fn archive_message_script(from: &MailboxRef, message_id: &str) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    const msg = box_.messages.whose({{ id: Number({id}) }})()[0];
    if (!msg) {{ throw new Error("message not found"); }}
    if (typeof mail.archive !== "function") {{
        throw new Error("archive verb not available");
    }}
    mail.archive(msg);
    return JSON.stringify({{ ok: true }});
}})()"#,
        mailbox_binding(from),
        id = js_string(message_id)
    )
}

fn trash_message_script(from: &MailboxRef, message_id: &str) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    const msg = box_.messages.whose({{ id: Number({id}) }})()[0];
    if (!msg) {{ throw new Error("message not found"); }}
    mail.delete(msg);
    return JSON.stringify({{ ok: true }});
}})()"#,
        mailbox_binding(from),
        id = js_string(message_id)
    )
}

fn new_outgoing_script(to: Option<&str>, subject: &str, body: &str) -> String {
    let recipient = match to {
        Some(address) => format!(
            "out.toRecipients.push(mail.Recipient({{ address: {} }}));",
            js_string(address)
        ),
        None => String::new(),
    };
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    const out = mail.OutgoingMessage({{
        subject: {subject},
        content: {body},
        visible: true,
    }});
    mail.outgoingMessages.push(out);
    {recipient}
    return JSON.stringify({{ id: String(out.id()) }});
}})()"#,
        subject = js_string(subject),
        body = js_string(body),
    )
}

fn open_reply_script(location: &MailboxRef, message_id: &str) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    const msg = box_.messages.whose({{ id: Number({id}) }})()[0];
    if (!msg) {{ throw new Error("message not found"); }}
    const draft = msg.reply({{ openingWindow: true }});
    return JSON.stringify({{ id: String(draft.id()) }});
}})()"#,
        mailbox_binding(location),
        id = js_string(message_id)
    )
}

/// Bind an outgoing message by id as `draft_`
fn draft_binding(draft: &DraftRef) -> String {
    format!(
        r#"const draft_ = mail.outgoingMessages.whose({{ id: Number({id}) }})()[0];
    if (!draft_) {{ throw new Error("draft window not found"); }}"#,
        id = js_string(&draft.id)
    )
}

fn read_draft_content_script(draft: &DraftRef) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    return JSON.stringify({{ content: String(draft_.content()) }});
}})()"#,
        draft_binding(draft)
    )
}

fn set_draft_content_script(draft: &DraftRef, content: &str) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    draft_.content = {content};
    return JSON.stringify({{ ok: true }});
}})()"#,
        draft_binding(draft),
        content = js_string(content)
    )
}

fn attach_file_script(draft: &DraftRef, path: &str) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    draft_.attachments.push(mail.Attachment({{ fileName: Path({path}) }}));
    return JSON.stringify({{ ok: true }});
}})()"#,
        draft_binding(draft),
        path = js_string(path)
    )
}

fn save_draft_script(draft: &DraftRef) -> String {
    format!(
        r#"(() => {{
    const mail = Application("Mail");
    {}
    draft_.save();
    return JSON.stringify({{ id: String(draft_.id()) }});
}})()"#,
        draft_binding(draft)
    )
}

/// Raw account record emitted by the account listing script
#[derive(Debug, Deserialize)]
struct RawAccount {
    name: String,
    enabled: bool,
}

/// Raw named item (mailbox listings)
#[derive(Debug, Deserialize)]
struct RawNamed {
    name: String,
}

/// Raw message record emitted by listing/lookup scripts
#[derive(Debug, Deserialize)]
struct RawMessage {
    message_id: String,
    sender: String,
    subject: String,
    #[serde(default)]
    date_received: String,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    is_flagged: bool,
}

impl From<RawMessage> for MessageRecord {
    fn from(raw: RawMessage) -> Self {
        Self {
            message_id: raw.message_id,
            sender: raw.sender,
            subject: raw.subject,
            date_received: parse_received_date(&raw.date_received),
            is_read: raw.is_read,
            is_flagged: raw.is_flagged,
        }
    }
}

fn decode_items<T>(items: Vec<Value>) -> AppResult<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<T>(item)
                .map_err(|error| AppError::ParseFailed(format!("malformed list item: {error}")))
        })
        .collect()
}

fn record_field<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> AppResult<&'a Value> {
    map.get(key)
        .ok_or_else(|| AppError::ParseFailed(format!("record is missing field '{key}'")))
}

/// Production [`MailBridge`] implementation driving `osascript`
pub struct ScriptBridge {
    script_timeout: Duration,
    auto_launch: bool,
}

impl ScriptBridge {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            script_timeout: Duration::from_millis(config.script_timeout_ms),
            auto_launch: config.auto_launch,
        }
    }

    /// Run one script and decode its reply
    async fn run(&self, script: String) -> AppResult<BridgeReply> {
        let output = timeout(
            self.script_timeout,
            Command::new("osascript")
                .arg("-l")
                .arg("JavaScript")
                .arg("-e")
                .arg(script)
                .output(),
        )
        .await
        .map_err(|_| {
            AppError::OperationFailed(format!(
                "bridge script exceeded {}ms",
                self.script_timeout.as_millis()
            ))
        })?
        .map_err(|error| {
            AppError::BridgeUnavailable(format!("could not run osascript: {error}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                return Err(AppError::Internal(format!(
                    "osascript exited with {} and no diagnostics",
                    output.status
                )));
            }
            return Err(classify_script_error(stderr));
        }
        decode_reply(&String::from_utf8_lossy(&output.stdout))
    }

    async fn ping(&self) -> AppResult<()> {
        let record = self.run(ping_script()).await?.into_record()?;
        match record_field(&record, "running")? {
            Value::Bool(true) => Ok(()),
            _ => Err(AppError::BridgeUnavailable(
                "mail application is not running".to_owned(),
            )),
        }
    }

    fn draft_from_reply(&self, reply: BridgeReply) -> AppResult<DraftRef> {
        let record = reply.into_record()?;
        let id = record_field(&record, "id")?
            .as_str()
            .ok_or_else(|| AppError::ParseFailed("draft id is not a string".to_owned()))?;
        Ok(DraftRef { id: id.to_owned() })
    }
}

#[async_trait]
impl MailBridge for ScriptBridge {
    async fn check_connectivity(&self) -> AppResult<()> {
        match self.ping().await {
            Ok(()) => Ok(()),
            Err(AppError::BridgeUnavailable(reason)) if self.auto_launch => {
                debug!(%reason, "mail application unreachable, attempting one launch");
                self.run(launch_script()).await?;
                self.ping().await
            }
            Err(error) => Err(error),
        }
    }

    async fn list_accounts(&self) -> AppResult<Vec<AccountRecord>> {
        let items = self.run(list_accounts_script()).await?.into_list()?;
        Ok(decode_items::<RawAccount>(items)?
            .into_iter()
            .map(|raw| AccountRecord {
                name: raw.name,
                enabled: raw.enabled,
            })
            .collect())
    }

    async fn list_account_mailboxes(&self, account: &str) -> AppResult<Vec<String>> {
        let items = self
            .run(account_mailboxes_script(account))
            .await?
            .into_list()?;
        Ok(decode_items::<RawNamed>(items)?
            .into_iter()
            .map(|raw| raw.name)
            .collect())
    }

    async fn list_local_mailboxes(&self) -> AppResult<Vec<String>> {
        let items = self.run(local_mailboxes_script()).await?.into_list()?;
        Ok(decode_items::<RawNamed>(items)?
            .into_iter()
            .map(|raw| raw.name)
            .collect())
    }

    async fn mailbox_counts(&self, mailbox: &MailboxRef) -> AppResult<MailboxCounts> {
        let record = self
            .run(mailbox_counts_script(mailbox))
            .await?
            .into_record()?;
        let total = record_field(&record, "total")?.as_i64().unwrap_or(-1);
        let unread = record_field(&record, "unread")?.as_i64().unwrap_or(-1);
        Ok(MailboxCounts { total, unread })
    }

    async fn list_messages(
        &self,
        mailbox: &MailboxRef,
        cap: usize,
    ) -> AppResult<Vec<MessageRecord>> {
        let items = self
            .run(list_messages_script(mailbox, cap))
            .await?
            .into_list()?;
        Ok(decode_items::<RawMessage>(items)?
            .into_iter()
            .map(MessageRecord::from)
            .collect())
    }

    async fn find_message(
        &self,
        mailbox: &MailboxRef,
        message_id: &str,
    ) -> AppResult<Option<MessageRecord>> {
        let items = self
            .run(find_message_script(mailbox, message_id))
            .await?
            .into_list()?;
        Ok(decode_items::<RawMessage>(items)?
            .into_iter()
            .next()
            .map(MessageRecord::from))
    }

    async fn read_message_body(
        &self,
        mailbox: &MailboxRef,
        message_id: &str,
    ) -> AppResult<String> {
        let record = self
            .run(read_body_script(mailbox, message_id))
            .await?
            .into_record()?;
        match record_field(&record, "content")? {
            Value::String(content) => Ok(content.clone()),
            _ => Err(AppError::ParseFailed(
                "message content is not a string".to_owned(),
            )),
        }
    }

    async fn move_message(
        &self,
        from: &MailboxRef,
        message_id: &str,
        to: &MailboxRef,
    ) -> AppResult<()> {
        self.run(move_message_script(from, message_id, to)).await?;
        Ok(())
    }

    async fn copy_message(
        &self,
        from: &MailboxRef,
        message_id: &str,
        to: &MailboxRef,
    ) -> AppResult<()> {
        self.run(copy_message_script(from, message_id, to)).await?;
        Ok(())
    }

    async fn archive_message(&self, from: &MailboxRef, message_id: &str) -> AppResult<()> {
        self.run(archive_message_script(from, message_id)).await?;
        Ok(())
    }

    async fn trash_message(&self, from: &MailboxRef, message_id: &str) -> AppResult<()> {
        self.run(trash_message_script(from, message_id)).await?;
        Ok(())
    }

    async fn new_outgoing_message(
        &self,
        to: Option<&str>,
        subject: &str,
        body: &str,
    ) -> AppResult<DraftRef> {
        let reply = self.run(new_outgoing_script(to, subject, body)).await?;
        self.draft_from_reply(reply)
    }

    async fn open_reply(&self, mailbox: &MailboxRef, message_id: &str) -> AppResult<DraftRef> {
        let reply = self.run(open_reply_script(mailbox, message_id)).await?;
        self.draft_from_reply(reply)
    }

    async fn read_draft_content(&self, draft: &DraftRef) -> AppResult<String> {
        let record = self
            .run(read_draft_content_script(draft))
            .await?
            .into_record()?;
        match record_field(&record, "content")? {
            Value::String(content) => Ok(content.clone()),
            _ => Err(AppError::ParseFailed(
                "draft content is not a string".to_owned(),
            )),
        }
    }

    async fn set_draft_content(&self, draft: &DraftRef, content: &str) -> AppResult<()> {
        self.run(set_draft_content_script(draft, content)).await?;
        Ok(())
    }

    async fn attach_file(&self, draft: &DraftRef, path: &str) -> AppResult<()> {
        self.run(attach_file_script(draft, path)).await?;
        Ok(())
    }

    async fn save_draft(&self, draft: &DraftRef) -> AppResult<Option<String>> {
        let record = self.run(save_draft_script(draft)).await?.into_record()?;
        Ok(record
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BridgeReply, classify_script_error, decode_reply, find_message_script, js_string,
        list_messages_script, new_outgoing_script,
    };
    use crate::bridge::MailboxRef;
    use crate::errors::AppError;

    #[test]
    fn decodes_record_list_and_text_replies() {
        assert!(matches!(
            decode_reply(r#"{"running": true}"#),
            Ok(BridgeReply::Record(_))
        ));
        assert!(matches!(
            decode_reply(r#"[{"name": "Inbox"}]"#),
            Ok(BridgeReply::List(_))
        ));
        assert_eq!(
            decode_reply("plain text output"),
            Ok(BridgeReply::Text("plain text output".to_owned()))
        );
    }

    #[test]
    fn decodes_double_encoded_json_one_level_deep() {
        let reply = decode_reply(r#""{\"total\": 3, \"unread\": 1}""#).expect("decodes");
        let BridgeReply::Record(map) = reply else {
            panic!("expected record");
        };
        assert_eq!(map["total"], 3);
    }

    #[test]
    fn json_string_reply_stays_text_when_not_nested_json() {
        assert_eq!(
            decode_reply(r#""just a message""#),
            Ok(BridgeReply::Text("just a message".to_owned()))
        );
    }

    #[test]
    fn scalar_replies_are_parse_failures() {
        assert!(matches!(
            decode_reply("42"),
            Err(AppError::ParseFailed(_))
        ));
        assert!(matches!(
            decode_reply("null"),
            Err(AppError::ParseFailed(_))
        ));
    }

    #[test]
    fn classifies_reachability_errors_as_bridge_unavailable() {
        assert!(matches!(
            classify_script_error("execution error: Application isn't running. (-600)"),
            AppError::BridgeUnavailable(_)
        ));
        assert!(matches!(
            classify_script_error("Not authorized to send Apple events to Mail."),
            AppError::BridgeUnavailable(_)
        ));
    }

    #[test]
    fn classifies_missing_objects_as_not_found() {
        assert!(matches!(
            classify_script_error("execution error: Error: Can't get mailbox \"Saved\". (-1728)"),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn other_script_errors_are_operation_failures() {
        let error = classify_script_error("execution error: Error: message not found (-2700)");
        assert!(matches!(error, AppError::OperationFailed(_)));
        assert!(error.to_string().contains("message not found"));
    }

    #[test]
    fn js_string_escapes_quotes_and_newlines() {
        assert_eq!(js_string(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(js_string("a\nb"), r#""a\nb""#);
    }

    #[test]
    fn scripts_embed_arguments_as_quoted_literals() {
        let script = find_message_script(&MailboxRef::new("Wo\"rk", "In\nbox"), "81506");
        assert!(script.contains(r#"byName("Wo\"rk")"#));
        assert!(script.contains(r#"byName("In\nbox")"#));
        assert!(script.contains(r#"Number("81506")"#));
    }

    #[test]
    fn local_mailboxes_bind_without_an_account() {
        let script = list_messages_script(&MailboxRef::new("local", "Receipts"), 200);
        assert!(script.contains(r#"mail.mailboxes.byName("Receipts")"#));
        assert!(!script.contains("accounts.byName"));
    }

    #[test]
    fn outgoing_script_only_adds_recipient_when_given() {
        let with = new_outgoing_script(Some("a@b.c"), "s", "b");
        assert!(with.contains(r#"Recipient({ address: "a@b.c" })"#));
        let without = new_outgoing_script(None, "s", "b");
        assert!(!without.contains("Recipient("));
    }
}
