use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use relgraph_core::{GraphBuilder, GraphSettings, Snapshot};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Turn an organisation/account/contact snapshot into a positioned graph for a diagram renderer.
#[derive(Debug, Parser)]
#[command(name = "relgraph", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the graph and print it as JSON ({nodes, edges})
    Build {
        /// Snapshot file. Reads stdin when omitted or "-".
        snapshot: Option<PathBuf>,
        /// Only render this account and the accounts it is directly linked with
        #[arg(long)]
        focus: Option<String>,
        /// Settings file to use instead of ~/.relgraph/settings.json
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the JSON Schema of the snapshot format
    Schema,
    /// Write default settings to ~/.relgraph/settings.json
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // stdout carries the graph; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    match Cli::parse().command {
        Command::Build {
            snapshot,
            focus,
            settings,
            pretty,
        } => {
            let settings = load_settings(settings.as_deref())?;
            let snapshot = load_snapshot(snapshot.as_deref())?;
            let graph =
                GraphBuilder::new(settings).build(&snapshot.organisations, focus.as_deref());
            if graph.is_empty() {
                tracing::info!("nothing to render");
            }
            println!("{}", graph.to_json(pretty)?);
        }
        Command::Schema => {
            let schema = schemars::schema_for!(Snapshot);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::Init { force } => init_settings(force)?,
    }
    Ok(())
}

/// `RUST_LOG` when it is set and valid, otherwise warnings only.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<GraphSettings> {
    match path {
        Some(path) => relgraph_core::read_settings_from(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(relgraph_core::read_settings()),
    }
}

fn load_snapshot(path: Option<&Path>) -> anyhow::Result<Snapshot> {
    match path {
        Some(path) if path != Path::new("-") => Ok(relgraph_core::read_snapshot(path)?),
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading snapshot from stdin")?;
            Ok(relgraph_core::parse_snapshot(&raw)?)
        }
    }
}

/// Write the default settings so they can be edited by hand.
fn init_settings(force: bool) -> anyhow::Result<()> {
    let path = relgraph_core::settings_path();
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    let written = relgraph_core::write_settings(&GraphSettings::default())?;
    eprintln!("Wrote {}", written.display());
    Ok(())
}
