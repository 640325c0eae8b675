//! Vacation MCP server binary
//!
//! Parses configuration from flags / environment, initializes logging and
//! runs the gateway until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use vacation_core::branding::{self, DEFAULT_PORT};
use vacation_core::SigningSecret;
use vacation_gateway::{ApiOverrides, GatewayConfig, GatewayServer};

#[derive(Debug, Parser)]
#[command(name = "vacation-mcp-server", version, about = "MCP server for the vacation workflow")]
struct Cli {
    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Downstream vacation API base URL (overrides the token's `link`)
    #[arg(long, env = "VACATION_API_URL")]
    api_url: Option<String>,

    /// Fallback `x-api-token` when no caller credential is available
    #[arg(long, env = "USER_SECRET", hide_env_values = true)]
    user_secret: Option<String>,

    /// Fallback `x-api-id` when the token carries no identifier
    #[arg(long, env = "USER_ID")]
    user_id: Option<String>,

    /// HMAC secret; when set, bearer token signatures are verified
    #[arg(long, env = "TOKEN_SIGNING_SECRET", hide_env_values = true)]
    token_secret: Option<String>,

    /// Close sessions idle for this many seconds
    #[arg(long, env = "SESSION_IDLE_TIMEOUT_SECS", default_value_t = 1800)]
    session_idle_timeout_secs: u64,

    /// Also write daily-rotated log files to this directory
    #[arg(long, env = "LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,
}

impl Cli {
    fn into_config(self) -> GatewayConfig {
        GatewayConfig {
            host: self.host,
            port: self.port,
            enable_cors: !self.no_cors,
            api: ApiOverrides {
                base_url: self.api_url,
                user_secret: self.user_secret,
                user_id: self.user_id,
            },
            signing_secret: self
                .token_secret
                .filter(|s| !s.is_empty())
                .map(SigningSecret::new),
            session_idle_timeout: Duration::from_secs(self.session_idle_timeout_secs),
            ..GatewayConfig::default()
        }
    }
}

/// Console logging always; file logging when a directory is given
///
/// The returned guard flushes the file writer and must outlive `main`'s work.
fn init_tracing(log_dir: Option<&PathBuf>) -> anyhow::Result<Option<WorkerGuard>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // RUST_LOG takes precedence
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info")
            .add_directive("vacation_core=debug".parse()?)
            .add_directive("vacation_gateway=debug".parse()?)
            .add_directive("vacation_mcp_server=debug".parse()?)
            .add_directive("rmcp=info".parse()?)
            .add_directive("tower_http=info".parse()?),
    };

    let console_layer = fmt::layer()
        .with_ansi(true)
        .compact()
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            // Creates files like: vacation-mcp.2026-01-22.log
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(branding::LOG_PREFIX)
                .filename_suffix("log")
                .build(dir)
                .context("failed to create log file appender")?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_ref())?;

    info!(
        "{} v{} starting",
        branding::DISPLAY_NAME,
        env!("CARGO_PKG_VERSION")
    );

    let server = GatewayServer::new(cli.into_config());
    let shutdown = server.shutdown_token();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C, graceful shutdown unavailable: {}", e),
        }
    });

    server.run().await.context("gateway server failed")
}
