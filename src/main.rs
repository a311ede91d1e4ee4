//! mail-bridge-mcp-rs: Mail orchestration MCP server over stdio
//!
//! This server lets an automated agent enumerate, search, read, file, and
//! compose email held by the desktop mail application, by translating MCP
//! tool calls into calls against the application's scripting bridge.
//!
//! # Architecture
//!
//! - [`main`]: Process entry point with env loading, init probe, and stdio serving
//! - [`config`]: Environment-driven tuning (timeouts, caps, thresholds)
//! - [`errors`]: Application error model with MCP error mapping
//! - [`bridge`]: Narrow capability trait over the scripting bridge
//! - [`script`]: osascript adapter (script generation + reply parsing)
//! - [`init`]: Initialization state machine (ready vs degraded start)
//! - [`directory`]: Mailbox directory resolution
//! - [`locator`]: Message location by id with optional hints
//! - [`query`]: Parallel multi-mailbox listing with search/filter/sort
//! - [`batch`]: Validated batch move/copy/archive/trash/read
//! - [`compose`]: Draft and reply composition
//! - [`retry`]: Bounded retry for eventually consistent reads
//! - [`fuzzy`]: Approximate similarity for search ranking
//! - [`links`]: Hyperlink extraction from bodies
//! - [`models`]: Input/output DTOs and schema-bearing types
//! - [`server`]: MCP tool handlers with validation

mod batch;
mod bridge;
mod compose;
mod config;
mod directory;
mod errors;
mod fuzzy;
mod init;
mod links;
mod locator;
mod models;
mod query;
mod retry;
mod script;
mod server;

use std::sync::Arc;
use std::time::Duration;

use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bridge::MailBridge;
use config::ServerConfig;
use init::InitGate;
use script::ScriptBridge;

/// Application entry point
///
/// Initializes tracing from environment, loads config, probes the mail
/// application within a bounded window (degrading rather than blocking),
/// and serves the MCP server over stdio. This process expects to be spawned
/// by an MCP client via `stdio` transport.
///
/// # Environment Variables
///
/// See [`ServerConfig::load_from_env`] for full configuration options.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::load_from_env()?;
    let bridge: Arc<dyn MailBridge> = Arc::new(ScriptBridge::new(&config));
    let init = Arc::new(InitGate::new());
    init.bootstrap(&bridge, Duration::from_millis(config.launch_timeout_ms))
        .await;
    info!(state = ?init.current(), "serving MCP over stdio");

    let service = server::MailBridgeServer::new(config, bridge, init)
        .serve(stdio())
        .await?;
    service.waiting().await?;
    Ok(())
}
