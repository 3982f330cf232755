mod replay;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use editor_support::SupportConfig;
use mimalloc::MiMalloc;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Replays authoring-tool edits against a rendered page.
#[derive(Parser, Debug)]
#[command(name = "livepatch")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a JSON-lines file of editor events to a page
    Replay(ReplayArgs),

    /// Print a page after one annotation pass
    Annotate(PageArgs),
}

#[derive(Args, Debug)]
struct PageArgs {
    /// Server-rendered page markup
    #[arg(long)]
    page: PathBuf,

    /// TOML file overriding attribute and class names
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    #[command(flatten)]
    page: PageArgs,

    /// One `{"type": ..., "detail": ...}` object per line
    #[arg(long)]
    events: PathBuf,

    /// Print an element outline instead of the final markup
    #[arg(long)]
    outline: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay(args) => {
            let config = load_config(args.page.config.as_deref())?;
            let report = replay::run(&args.page.page, &args.events, config)?;
            if args.outline {
                print!("{}", replay::outline(&report.document));
            } else {
                println!("{}", report.document.to_html());
            }
            tracing::info!(
                applied = report.tally.applied,
                reloaded = report.tally.reloaded,
                selected = report.tally.selected,
                ignored = report.tally.ignored,
                "replay finished"
            );
        }
        Command::Annotate(args) => {
            let config = load_config(args.config.as_deref())?;
            let doc = replay::annotate(&args.page, config)?;
            println!("{}", doc.to_html());
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SupportConfig> {
    let Some(path) = path else {
        return Ok(SupportConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
