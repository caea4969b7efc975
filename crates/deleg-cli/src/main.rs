// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! deleg CLI entrypoint.
//!
//! Developer-facing commands for the delegated-authority name registry:
//! computing name ids, listing capabilities, and running registry scripts
//! against an in-memory registry bootstrapped from config.
//!
//! # Usage
//! ```text
//! deleg namehash <name> [--hierarchy]
//! deleg interfaces [--json]
//! deleg run <script.json> [--config <file> | --config-dir <dir> [--config-key <key>] | --admin <principal>] [--json]
//! ```
//!
//! Command output goes to stdout; logs go to stderr. The exit code is non-zero
//! only when the input itself is unusable (unreadable script or config); failing
//! script steps are reported in the output.

// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod report;
mod script;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deleg_app_core::{ConfigService, RegistryConfig, DEFAULT_CONFIG_KEY};
use deleg_config_fs::FsConfigStore;
use deleg_core::{Labels, Principal, CAPABILITIES};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::script::Script;

#[derive(Parser, Debug)]
#[command(author, version, about = "Delegated-authority name registry tools")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node id of a dotted name
    Namehash {
        /// Dotted name, e.g. `a.b.eth` (`.` for the root)
        name: String,
        /// Also print the id of every suffix
        #[arg(long)]
        hierarchy: bool,
    },
    /// List the capability ids the registry answers true for
    Interfaces {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run a JSON registry script
    Run {
        /// Script file
        script: PathBuf,
        /// Registry config JSON file
        #[arg(long, conflicts_with_all = ["config_dir", "admin"])]
        config: Option<PathBuf>,
        /// Directory holding `<key>.json` config documents
        #[arg(long, conflicts_with = "admin")]
        config_dir: Option<PathBuf>,
        /// Config key to load from the config directory
        #[arg(long, default_value = DEFAULT_CONFIG_KEY)]
        config_key: String,
        /// Skip config and bootstrap a bare registry owned by this principal
        #[arg(long)]
        admin: Option<Principal>,
        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(fallback: Option<&str>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(fallback.unwrap_or("info"))
            .context("invalid log filter in config")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(
    config: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    config_key: &str,
    admin: Option<Principal>,
) -> Result<RegistryConfig> {
    if let Some(admin) = admin {
        return Ok(RegistryConfig::new(admin));
    }
    if let Some(path) = config {
        let bytes =
            std::fs::read(&path).with_context(|| format!("reading config {}", path.display()))?;
        return RegistryConfig::from_json(&bytes)
            .with_context(|| format!("parsing config {}", path.display()));
    }
    let store = match config_dir {
        Some(dir) => FsConfigStore::with_base(dir)?,
        None => FsConfigStore::new()?,
    };
    let base = store.base().display().to_string();
    let service = ConfigService::new(store);
    match RegistryConfig::load(&service, config_key)? {
        Some(config) => Ok(config),
        None => bail!("no registry config under key {config_key:?} in {base}"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.cmd {
        Command::Namehash { name, hierarchy } => {
            init_tracing(None)?;
            let labels =
                Labels::from_dotted(&name).with_context(|| format!("invalid name {name:?}"))?;
            if hierarchy {
                println!("{}", report::hierarchy_table(&labels));
            } else {
                println!("{}", labels.namehash());
            }
        }
        Command::Interfaces { json } => {
            init_tracing(None)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report::capabilities_json(CAPABILITIES))?
                );
            } else {
                println!("{}", report::capabilities_table(CAPABILITIES));
            }
        }
        Command::Run {
            script,
            config,
            config_dir,
            config_key,
            admin,
            json,
        } => {
            let config = load_config(config, config_dir, &config_key, admin)?;
            init_tracing(config.log_filter.as_deref())?;

            let bytes = std::fs::read(&script)
                .with_context(|| format!("reading script {}", script.display()))?;
            let script = Script::from_json(&bytes)?;
            let mut registry = config.build_registry()?;
            info!(steps = script.steps.len(), admin = %config.admin, "running script");

            let reports = script::run(&mut registry, &script);
            let events = registry.drain_events();
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report::run_json(&reports, &events))?
                );
            } else {
                println!("{}", report::steps_table(&reports));
                if !events.is_empty() {
                    println!("{}", report::events_table(&events));
                }
                let failed = reports.iter().filter(|r| !r.is_ok()).count();
                println!("{} steps, {failed} failed, {} events", reports.len(), events.len());
            }
        }
    }

    Ok(())
}
