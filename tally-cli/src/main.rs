use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tally_core::filter_existing;
use tally_ingest::{Extraction, MetadataExtractor, SourceInfo, StatementPipeline, TextExtractor, score};

mod config;
mod ledger;
mod output;
mod state;

use config::{Config, OutputFormat};
use ledger::CsvLedger;
use output::Report;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")"),
    about = "Bank statement PDFs to normalized transactions"
)]
struct Cli {
    /// Config file (default: ~/.tally/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract transactions from a statement
    Extract {
        file: PathBuf,

        /// FILE is already-extracted text, not a PDF
        #[arg(long)]
        text: bool,

        /// Name used in the source label (default: the file name)
        #[arg(long)]
        label: Option<String>,

        /// Owner id attached to every record
        #[arg(long, default_value = "local")]
        owner: String,

        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// CSV ledger used to suppress already-recorded transactions
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Append new transactions to the ledger
        #[arg(long)]
        record: bool,
    },

    /// Show the detected statement dialect and header metadata
    Detect {
        file: PathBuf,

        #[arg(long)]
        text: bool,
    },

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Extract { file, text, label, owner, format, ledger, record } => {
            let cfg = config::load_config(cli.config.as_deref())?;
            let format = format.unwrap_or(cfg.output.format);
            let ledger_path = match ledger.or_else(|| cfg.output.ledger.clone()) {
                Some(p) => p,
                None => state::default_ledger_path()?,
            };

            let name = label.unwrap_or_else(|| file_name(&file));
            let source = SourceInfo::new(owner).with_filename(name);
            let extraction = run_extract(&cfg, &file, text, &source)?;
            if extraction.is_empty() {
                println!("no transactions found");
                return Ok(());
            }

            let mut ledger = CsvLedger::open(&ledger_path)?;
            let (fresh, known) = filter_existing(&ledger, extraction.transactions.clone());

            let report = Report {
                file: file.display().to_string(),
                dialect: extraction.dialect,
                score: extraction.score,
                metadata: &extraction.metadata,
                stats: &extraction.stats,
                already_recorded: known.len(),
                transactions: &fresh,
            };
            let stdout = std::io::stdout();
            output::render(&report, format, &mut stdout.lock())?;

            if record && !fresh.is_empty() {
                ledger.append(&fresh)?;
                eprintln!(
                    "recorded {} transactions in {} ({} total)",
                    fresh.len(),
                    ledger.path().display(),
                    ledger.len()
                );
            }
        }

        Command::Detect { file, text } => {
            let cfg = config::load_config(cli.config.as_deref())?;
            let blob = read_text(&file, text)?;
            let s = score(&blob);
            let meta = MetadataExtractor::new(cfg.extract.header_scan_lines).extract(&blob);

            println!("dialect: {}{}", s.dialect(), if s.is_tie() { " (tie)" } else { "" });
            println!("score:   debit {} / credit {}", s.debit, s.credit);
            println!("holder:  {}", meta.holder_or("unknown"));
            match (meta.period_start, meta.period_end) {
                (Some(a), Some(b)) => println!("period:  {a} to {b}"),
                (None, Some(b)) => println!("period:  ending {b}"),
                _ => println!("period:  unknown"),
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config(cli.config.as_deref())?;
                print!("{}", config::render_config(&cfg)?);
            }
        },
    }

    Ok(())
}

fn run_extract(cfg: &Config, file: &Path, text: bool, source: &SourceInfo) -> Result<Extraction> {
    let pipeline = StatementPipeline::new(cfg.extract.clone());
    if text {
        let blob = read_text(file, true)?;
        return Ok(pipeline.extract_text(&blob, source));
    }
    let bytes = std::fs::read(file).with_context(|| format!("read {}", file.display()))?;
    pipeline
        .extract(&bytes, source)
        .with_context(|| format!("extracting {}", file.display()))
}

/// Statement text from a text file or a PDF.
fn read_text(file: &Path, text: bool) -> Result<String> {
    if !file.exists() {
        bail!("file not found: {}", file.display());
    }
    if text {
        return std::fs::read_to_string(file).with_context(|| format!("read {}", file.display()));
    }
    let bytes = std::fs::read(file).with_context(|| format!("read {}", file.display()))?;
    let extracted = TextExtractor::default()
        .extract(&bytes)
        .with_context(|| format!("extracting {}", file.display()))?;
    Ok(extracted.text)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
