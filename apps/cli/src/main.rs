//! Elimu CLI - offline learning resource library
//!
//! Download past papers and notes for offline study, manage the local
//! library, and get study recommendations from the resource catalog.

mod commands;
mod output;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Elimu - offline learning resources
#[derive(Parser)]
#[command(name = "elimu")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory for Elimu
    #[arg(long, env = "ELIMU_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "human")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog resources and whether they are available offline
    Catalog {
        /// Only show resources for this grade
        #[arg(short, long)]
        grade: Option<u8>,

        /// Only show resources for this subject
        #[arg(short, long)]
        subject: Option<String>,
    },

    /// Download catalog resources for offline use
    Download {
        /// Resource IDs from the catalog
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Download a resource that is not in the catalog
    Fetch {
        /// URL to download
        url: String,

        /// Resource ID to record it under
        #[arg(long)]
        id: String,

        /// Title used to name the local file
        #[arg(long)]
        title: Option<String>,
    },

    /// List downloaded files
    List,

    /// Show the local state of a resource
    Status {
        /// Resource ID
        id: String,
    },

    /// Delete a downloaded file
    Delete {
        /// Local file ID
        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Open a downloaded file with the default application
    Open {
        /// Local file ID
        id: String,
    },

    /// Suggest what to study next
    Recommend {
        /// Learner's grade
        #[arg(short, long)]
        grade: u8,

        /// Subjects the learner struggles with
        #[arg(short, long, value_delimiter = ',')]
        weak: Vec<String>,

        /// Resource IDs already completed
        #[arg(short, long, value_delimiter = ',')]
        completed: Vec<String>,
    },

    /// Show/update settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },

    /// Set a config value (empty value clears optional settings)
    Set {
        /// Config key
        key: String,

        /// Config value
        value: String,
    },

    /// Show all config
    Show,

    /// Reset to defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Commands::Completions { shell } = cli.command {
        use clap::CommandFactory;
        clap_complete::generate(shell, &mut Cli::command(), "elimu", &mut std::io::stdout());
        return Ok(());
    }

    // Determine data directory
    let data_dir = cli
        .data_dir
        .unwrap_or_else(elimu_types::default_data_dir);

    // Initialize core
    let core = elimu_core::ElimuCore::new(data_dir).await?;

    // Execute command
    match cli.command {
        Commands::Catalog { grade, subject } => {
            commands::show_catalog(&core, grade, subject, cli.output).await?
        }

        Commands::Download { ids } => commands::download_resources(&core, ids, cli.output).await?,

        Commands::Fetch { url, id, title } => {
            commands::fetch_url(&core, &url, &id, title, cli.output).await?
        }

        Commands::List => commands::list_files(&core, cli.output).await?,

        Commands::Status { id } => commands::show_status(&core, &id, cli.output).await?,

        Commands::Delete { id, yes } => commands::delete_file(&core, &id, yes, cli.output).await?,

        Commands::Open { id } => commands::open_file(&core, &id, cli.output).await?,

        Commands::Recommend {
            grade,
            weak,
            completed,
        } => commands::recommend(&core, grade, weak, completed, cli.output).await?,

        Commands::Config { action } => commands::config_action(&core, action, cli.output).await?,

        Commands::Completions { .. } => unreachable!("handled before core initialization"),
    }

    Ok(())
}
