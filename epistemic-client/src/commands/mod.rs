//! CLI Commands
//!
//! Each subcommand maps onto one or more client calls and prints the
//! service's answer as JSON.

pub mod bot;
pub mod claims;
pub mod governance;
pub mod status;
pub mod validators;
pub mod votes;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use epistemic_client::{CallOptions, CancellationToken, ClientConfig, EpistemicClient};

/// Connection overrides taken from the command line.
#[derive(Debug, Default, Clone)]
pub struct ConnectionArgs {
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
}

/// Default configuration file location (`~/.epistemic/client.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".epistemic").join("client.toml"))
}

/// Resolve the effective configuration.
///
/// An explicit `--config` must exist; the default location is used only if
/// present. Command-line flags override file values.
pub fn load_config(args: &ConnectionArgs) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => read_config(&path)?,
            None => ClientConfig::default(),
        },
    };

    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(retries) = args.retries {
        config.retry.retries = retries;
    }

    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<ClientConfig> {
    tracing::debug!("Loading configuration from {}", path.display());
    ClientConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Build a client whose calls are abandoned when `cancel` fires.
pub fn connect(args: &ConnectionArgs, cancel: CancellationToken) -> Result<EpistemicClient> {
    let config = load_config(args)?;
    tracing::debug!(
        "Using {} (timeout {} ms, {} retries)",
        config.base_url,
        config.timeout_ms,
        config.retry.retries
    );
    let client = EpistemicClient::new(config)?;
    Ok(client.with_options(CallOptions::new().with_cancellation(cancel)))
}

/// Print a response as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("\x1b[32m{}\x1b[0m", message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("\x1b[33mWarning:\x1b[0m {}", message);
}
