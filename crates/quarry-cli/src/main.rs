//! Quarry CLI - Batch ingestion of external sources into chunked text

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Quarry - Turn web pages, documents and media into chunked text
#[derive(Parser)]
#[command(name = "quarry")]
#[command(version)]
#[command(about = "Turn web pages, documents and media into chunked text", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Quarry (create config, database and settings)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show or change the ingestion settings shared by every batch
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Register a pending source
    Add {
        /// Source type (website, pdf, github, youtube, ...)
        source_type: String,

        /// File path or URL the source points at
        #[arg(short, long)]
        location: Option<String>,

        /// Inline content (for `text` sources)
        #[arg(short, long)]
        content: Option<String>,

        /// Type-specific options as a JSON object
        #[arg(short, long)]
        options: Option<String>,

        /// Knowledge base the source belongs to
        #[arg(long = "kb")]
        knowledge_base: Option<String>,
    },

    /// Dispatch a batch of sources
    Run {
        /// JSON file holding an array of source descriptors
        /// (defaults to every pending source)
        #[arg(short, long)]
        batch: Option<PathBuf>,

        /// Stop the batch after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Queue sources for another attempt
    Retry {
        /// Source IDs to reset to pending
        source_ids: Vec<String>,

        /// Also reset every failed source
        #[arg(long)]
        failed: bool,
    },

    /// Show source counts per status
    Status,

    /// List sources
    Sources {
        /// Filter by status (pending, processing, finished, failed)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show the chunks extracted from a source
    Chunks {
        /// Source ID
        source_id: String,

        /// Maximum number of chunks to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Check external tools and database health
    Doctor,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show the stored settings
    Show,

    /// Change one or more settings
    Set {
        /// Target chunk length in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared between neighbouring chunks
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Render pages with a headless browser
        #[arg(long)]
        headless_fetch: Option<bool>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quarry=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quarry=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Path => commands::config::path(),
        },
        Commands::Settings(cmd) => match cmd {
            SettingsCommands::Show => commands::settings::show(),
            SettingsCommands::Set {
                chunk_size,
                chunk_overlap,
                headless_fetch,
            } => commands::settings::set(chunk_size, chunk_overlap, headless_fetch),
        },
        Commands::Add {
            source_type,
            location,
            content,
            options,
            knowledge_base,
        } => commands::add::run(&source_type, location, content, options, knowledge_base),
        Commands::Run {
            batch,
            deadline_secs,
        } => commands::run::run(batch, deadline_secs),
        Commands::Retry { source_ids, failed } => commands::retry::run(source_ids, failed),
        Commands::Status => commands::status::run(),
        Commands::Sources { status } => commands::sources::run(status),
        Commands::Chunks { source_id, limit } => commands::chunks::run(&source_id, limit),
        Commands::Doctor => commands::doctor::run(),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
