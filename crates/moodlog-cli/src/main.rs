//! Moodlog CLI - an encrypted, CLI-first emotion diary
//!
//! Write a few lines, see which emotion they read as (with its colors and a
//! song to match), and keep the entries in an encrypted diary.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::{fmt, EnvFilter};

use moodlog_core::VERSION;

mod commands;
mod config;
mod helpers;
mod output;

/// Moodlog - an encrypted, CLI-first emotion diary
#[derive(Parser)]
#[command(name = "moodlog")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the diary file
    #[arg(short, long, global = true, env = "MOODLOG_PATH")]
    diary: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new encrypted diary
    Init {
        /// Path where the diary will be created
        #[arg(value_name = "PATH")]
        path: Option<String>,
    },

    /// Classify text without saving it
    Analyze {
        /// Text to analyze (reads stdin when omitted)
        #[arg(value_name = "TEXT")]
        text: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Re-classify the accumulated text after every stdin line
        #[arg(long)]
        follow: bool,
    },

    /// Write a new diary entry
    Add {
        /// Entry text (overrides stdin/editor)
        #[arg(long)]
        body: Option<String>,

        /// Set custom date/time (ISO-8601)
        #[arg(long)]
        date: Option<String>,

        /// Disable interactive prompts
        #[arg(long)]
        no_input: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List past entries, newest first
    List {
        /// Filter by emotion tag
        #[arg(long, value_name = "EMOTION")]
        emotion: Option<String>,

        /// Time window (e.g., "7d", "30d")
        #[arg(long, conflicts_with = "since")]
        last: Option<String>,

        /// Start date (ISO-8601)
        #[arg(long)]
        since: Option<String>,

        /// End date (ISO-8601)
        #[arg(long)]
        until: Option<String>,

        /// Limit number of results
        #[arg(long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Output format (table, plain)
        #[arg(long, value_name = "FORMAT")]
        format: Option<String>,
    },

    /// Search entry text
    Search {
        /// Text to look for (case-sensitive substring)
        #[arg(value_name = "QUERY")]
        query: String,

        /// Filter by emotion tag
        #[arg(long, value_name = "EMOTION")]
        emotion: Option<String>,

        /// Limit number of results
        #[arg(long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Output format (table, plain)
        #[arg(long, value_name = "FORMAT")]
        format: Option<String>,
    },

    /// Show a specific entry by ID
    Show {
        /// Entry ID (full UUID or prefix)
        #[arg(value_name = "ID")]
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count entries per emotion
    Stats {
        /// Time window (e.g., "7d", "30d")
        #[arg(long, conflicts_with = "since")]
        last: Option<String>,

        /// Start date (ISO-8601)
        #[arg(long)]
        since: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every emotion with its colors, music and keywords
    Emotions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export entries
    Export {
        /// Output format (json, jsonl)
        #[arg(long, default_value = "json")]
        format: String,

        /// Filter by emotion tag
        #[arg(long, value_name = "EMOTION")]
        emotion: Option<String>,

        /// Start date (ISO-8601)
        #[arg(long)]
        since: Option<String>,
    },

    /// Check diary integrity
    Check,

    /// Backup the diary file
    Backup {
        /// Destination path
        #[arg(value_name = "DEST")]
        destination: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = commands::Context::new(cli.diary, cli.quiet, cli.no_color);
    match cli.command {
        Some(command) => commands::run(&ctx, command),
        None => {
            println!("Moodlog v{}", VERSION);
            println!("\nRun `moodlog --help` for usage information.");
            Ok(())
        }
    }
}
