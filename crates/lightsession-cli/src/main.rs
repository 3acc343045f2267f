//! CLI for LightSession conversation trimming.
//!
//! Subcommands:
//!  - `trim`     : trim one or more conversation JSON files to their last N turns.
//!  - `inspect`  : print the current branch of a conversation and its turn groups.
//!  - `settings` : print normalised settings (defaults, or read from a file).
//!
//! The command surface is a thin wrapper around the library crate
//! (`lightsession`); all window logic lives there. Diagnostics go to stderr
//! through `tracing` so JSON written to stdout stays clean.
//!
//! Usage examples:
//!  cargo run -p lightsession -- trim conversation.json --keep 4 --pretty
//!  cargo run -p lightsession -- trim a.json b.json --settings settings.json --out-dir trimmed/
//!  cargo run -p lightsession -- inspect conversation.json --keep 4

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use thiserror::Error;
use tracing::info;

mod batch;

use crate::batch::{output_path, trim_files, TrimOptions};

use lightsession::graph::{build_chain, build_groups, retention_start};
use lightsession::settings::{MAX_KEEP_LAST_N, MIN_KEEP_LAST_N};
use lightsession::utils::logging;
use lightsession::{load_payload_json, LightSessionSettings};

/// CLI entrypoint.
#[derive(Parser)]
#[command(
    name = "lightsession",
    about = "LightSession CLI: keep only the recent turns of long conversations",
    version
)]
struct Cli {
    /// Log debug diagnostics to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trim conversation JSON files to their last N turns.
    Trim(TrimArgs),

    /// Show the current branch, its turn groups and where a window would start.
    Inspect(InspectArgs),

    /// Print normalised settings.
    Settings(SettingsArgs),
}

/// Arguments for the `trim` subcommand.
#[derive(Args, Debug)]
struct TrimArgs {
    /// Conversation JSON files to trim.
    #[arg(required = true, value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Number of trailing turns to keep (1..=100). Overrides the settings file.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(MIN_KEEP_LAST_N as i64..=MAX_KEEP_LAST_N as i64))]
    keep: Option<u32>,

    /// Settings JSON file (settings object, or a storage dump containing it).
    #[arg(short = 's', long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Keep one extra turn, as the response rewriter does.
    #[arg(long)]
    fetch_window: bool,

    /// Directory to write trimmed files into (required for more than one input).
    #[arg(long, short = 'o', value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
struct InspectArgs {
    /// Conversation JSON file.
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Show where a window of this many turns would start.
    #[arg(short, long)]
    keep: Option<usize>,

    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

/// Arguments for the `settings` subcommand.
#[derive(Args, Debug)]
struct SettingsArgs {
    /// Settings JSON file; defaults are printed when omitted.
    #[arg(short = 's', long, value_name = "PATH")]
    settings: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("--out-dir <DIR> is required when trimming {0} files")]
    OutDirRequired(usize),

    #[error("{0} has no mapping or current_node")]
    NotAConversation(PathBuf),
}

/// Application entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logging::init_with_default("debug");
    } else {
        logging::init();
    }

    match cli.command {
        Commands::Trim(args) => run_trim(args),
        Commands::Inspect(args) => run_inspect(args),
        Commands::Settings(args) => run_settings(args),
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<LightSessionSettings> {
    match path {
        Some(path) => LightSessionSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(LightSessionSettings::default()),
    }
}

/// Run the `trim` subcommand.
///
/// Files that cannot be trimmed (not a conversation, no turns, trimming
/// disabled) are written out unchanged.
fn run_trim(args: TrimArgs) -> Result<()> {
    if args.inputs.len() > 1 && args.out_dir.is_none() {
        return Err(CliError::OutDirRequired(args.inputs.len()).into());
    }

    let mut settings = load_settings(args.settings.as_ref())?;
    if let Some(keep) = args.keep {
        settings.keep_last_n = keep;
    }
    let window = if args.fetch_window {
        settings.fetch_window()
    } else {
        settings.dom_window()
    };
    // Disabled settings keep everything; a window of zero trims nothing.
    let options = TrimOptions {
        window: window.unwrap_or(0),
        pretty: args.pretty,
    };
    info!(
        enabled = settings.enabled,
        keep_last_n = settings.keep_last_n,
        window = options.window,
        files = args.inputs.len(),
        "trimming"
    );

    let outcomes = trim_files(&args.inputs, options)?;

    match args.out_dir.as_ref() {
        Some(out_dir) => {
            fs::create_dir_all(out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;
            for outcome in &outcomes {
                let dest = output_path(out_dir, &outcome.input);
                fs::write(&dest, &outcome.output)
                    .with_context(|| format!("writing {}", dest.display()))?;
                println!("{} -> {}", outcome.summary(), dest.display());
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            for outcome in &outcomes {
                stdout.write_all(&outcome.output)?;
                stdout.write_all(b"\n")?;
                eprintln!("{}", outcome.summary());
            }
        }
    }

    Ok(())
}

/// Run the `inspect` subcommand.
fn run_inspect(args: InspectArgs) -> Result<()> {
    let payload = load_payload_json(&args.input)
        .with_context(|| format!("loading conversation from {}", args.input.display()))?;
    let (Some(mapping), Some(current)) = (payload.mapping.as_ref(), payload.current_node.as_deref())
    else {
        return Err(CliError::NotAConversation(args.input.clone()).into());
    };

    let chain = build_chain(mapping, current);
    let groups = build_groups(&chain, mapping);
    let start_index = args.keep.and_then(|keep| retention_start(&groups, keep));

    if args.json {
        let out = json!({
            "file": args.input.to_string_lossy().to_string(),
            "nodes": mapping.len(),
            "current_node": current,
            "chain": chain,
            "groups": groups,
            "keep": args.keep,
            "start_index": start_index,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{}: {} nodes, current_node={}, chain length {}, {} turns",
        args.input.display(),
        mapping.len(),
        current,
        chain.len(),
        groups.len()
    );
    for (i, group) in groups.iter().enumerate() {
        let ids = &chain[group.start_index..=group.end_index];
        println!(
            "  {:>3}. {:<10} positions {}..={} [{}]",
            i + 1,
            group.role,
            group.start_index,
            group.end_index,
            ids.join(", ")
        );
    }
    if let Some(keep) = args.keep {
        match start_index {
            Some(start) => println!(
                "Keeping {} turns retains {} of {} chain nodes (from {}).",
                keep,
                chain.len() - start,
                chain.len(),
                chain[start]
            ),
            None => println!("Keeping {} turns: nothing to trim.", keep),
        }
    }

    Ok(())
}

/// Run the `settings` subcommand.
fn run_settings(args: SettingsArgs) -> Result<()> {
    let settings = load_settings(args.settings.as_ref())?;
    let out = json!({
        "settings": settings,
        "fetch_window": settings.fetch_window(),
        "dom_window": settings.dom_window(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
