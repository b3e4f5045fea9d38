//! # Authorization diagnostic tool
//!
//! Loads a configuration and a request context and reports what the engine
//! would decide, without touching any host application.
//!
//! ## Usage
//!
//! ```text
//! authmgr-check <config.json> <context.json> [capability ...]
//! ```
//!
//! With no capabilities listed, every known capability is checked.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG` - Log level (default: info)

use anyhow::{bail, Context};
use authmgr::{AuthConfig, Authorizer, CapabilityDecision, RequestContext};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Report printed to stdout
#[derive(Debug, Serialize)]
struct CheckReport {
    version: &'static str,
    context: RequestContext,
    roles: Vec<String>,
    decisions: Vec<CapabilityDecision>,
    granted: Vec<String>,
    grant_sources: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(context_path)) = (args.next(), args.next()) else {
        bail!("usage: authmgr-check <config.json> <context.json> [capability ...]");
    };
    let requested: Vec<String> = args.collect();

    info!("authmgr-check v{}", authmgr::VERSION);

    let config = AuthConfig::from_json_file(PathBuf::from(&config_path))
        .with_context(|| format!("loading configuration from {}", config_path))?;

    let context_text = std::fs::read_to_string(&context_path)
        .with_context(|| format!("reading request context from {}", context_path))?;
    let context: RequestContext = serde_json::from_str(&context_text)
        .with_context(|| format!("parsing request context from {}", context_path))?;

    let authorizer = Authorizer::from_config(config).context("invalid configuration")?;

    let capabilities = if requested.is_empty() {
        authorizer.known_capabilities().to_vec()
    } else {
        requested
    };

    let decisions = capabilities
        .iter()
        .map(|capability| authorizer.check(capability, &context))
        .collect::<authmgr::Result<Vec<_>>>()?;

    let roles = match context.user() {
        Some(user) => authorizer.roles_of(user)?,
        None => Vec::new(),
    };

    let report = CheckReport {
        version: authmgr::VERSION,
        granted: authorizer.enumerate_granted(&context)?,
        grant_sources: authorizer.grant_sources(),
        roles,
        decisions,
        context,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
