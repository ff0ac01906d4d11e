//! IBAN validation HTTP service.
//!
//! # Endpoints
//!
//! - `GET /validate/{iban}?validateBankCode={0|1|true|false}&getBIC={0|1|true|false}`
//!   — validate an IBAN, optionally checking the bank code against the
//!   registry and resolving its BIC. Verdicts are cached per
//!   (identifier, flag set).
//!
//! # Configuration
//!
//! - `--data-path` — directory holding the national registry files
//! - `--pid-file` — singleton guard file; startup aborts while another
//!   instance holds it
//! - `--port` — bare port or `host:port` listen address
//! - `--shutdown-grace` — bound on the post-interrupt drain, in seconds
//! - `RUST_LOG` — log level filter (default: info)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use ibancheck_service::logging::{init_logging, LogFormat};
use ibancheck_service::{pidfile, server, AppState};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "HTTP service validating IBANs against format, checksum, and bank registry"
)]
struct Cli {
    /// Base path of the bank registry data files.
    #[arg(long, default_value = "data")]
    data_path: PathBuf,

    /// Pid file path; when set, refuse to start while another instance runs.
    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// HTTP port, or full host:port address, to listen on.
    #[arg(long, default_value = "8080")]
    port: String,

    /// Maximum seconds to wait for in-flight requests after an interrupt;
    /// waits unboundedly when not set.
    #[arg(long)]
    shutdown_grace: Option<u64>,

    /// Log output format.
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    // The guard must run before any socket is bound, so a conflicting
    // instance is detected without occupying the port.
    if let Some(pid_file) = &cli.pid_file {
        pidfile::acquire(pid_file).map_err(|e| {
            error!(error = %e, path = %pid_file.display(), "could not acquire pid file");
            e
        })?;
    }

    let state = AppState::load(&cli.data_path).map_err(|e| {
        error!(error = %e, path = %cli.data_path.display(), "failed to load bank registry");
        e
    })?;

    let addr = server::listen_addr(&cli.port);
    let grace = cli.shutdown_grace.map(Duration::from_secs);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        "starting ibancheck-service"
    );
    server::run(&addr, state, grace)
        .await
        .context("server terminated abnormally")
}
