pub mod client;
pub mod config;
pub mod errors;
pub mod formatting;
pub mod harness;
pub mod models;
pub mod overdue;
pub mod pagination;
pub mod quality;
pub mod redaction;
pub mod server;
pub mod tools;

use crate::client::{OrderSource, OseonClient, RetryingSource};
use crate::config::OseonConfig;
use crate::redaction::Redactor;
use crate::server::McpServer;
use crate::tools::{ToolContext, ToolRegistry};
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Loads configuration, wires the client and serves MCP on stdin/stdout until stdin closes.
pub async fn run() -> anyhow::Result<()> {
    let log_dir = std::env::var("OSEON_LOG_DIR").ok().filter(|dir| !dir.trim().is_empty());
    init_tracing(log_dir.as_deref().map(Path::new))?;

    let config = OseonConfig::load()?;
    tracing::info!(
        base_url = %config.trimmed_base_url(),
        api_version = %config.api_version,
        demo_mode = config.demo_mode,
        max_retries = config.max_retries,
        "starting oseon mcp server"
    );

    let client = OseonClient::new(&config)?;
    let source: Arc<dyn OrderSource> = Arc::new(RetryingSource::from_config(client, &config));
    let registry = ToolRegistry::new(ToolContext::new(source, config.demo_mode, redactor_for(&config)));

    let server = McpServer::new(registry);
    tracing::info!(tools = server.registry().definitions().len(), "tool registry ready");
    server.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}

fn redactor_for(config: &OseonConfig) -> Redactor {
    let header = client::http::basic_auth_header(&config.username, &config.password);
    let token = header.trim_start_matches("Basic ").to_string();
    Redactor::new([config.password.clone(), token])
}

/// JSON logs to stderr, since stdout carries the protocol. With a log directory, logs go
/// to a daily rolling file instead.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let result = match log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = tracing_appender::rolling::daily(log_dir, "oseon-mcp.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(non_blocking)
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init(),
    };
    result.map_err(|error| anyhow::anyhow!("failed to initialize tracing: {}", error))
}

#[cfg(test)]
mod tests {
    use super::redactor_for;
    use crate::config::OseonConfig;

    #[test]
    fn redactor_covers_password_and_auth_token() {
        let config = OseonConfig {
            username: "planner".to_string(),
            password: "hunter22".to_string(),
            ..OseonConfig::default()
        };
        let redactor = redactor_for(&config);
        let scrubbed = redactor.scrub("sent hunter22 as cGxhbm5lcjpodW50ZXIyMg==");
        assert!(!scrubbed.contains("hunter22"));
        assert!(!scrubbed.contains("cGxhbm5lcjpodW50ZXIyMg=="));
    }
}
