mod clipboard;
mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, context::ContextSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dev",
    about = "Developer workflow tool: curate context modules and push them to the clipboard",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .dev/ or .git/)
    #[arg(long, global = true, env = "DEV_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Use this file as the clipboard instead of the system clipboard
    #[arg(long, global = true, env = "DEV_CLIPBOARD_FILE", value_name = "PATH")]
    clipboard_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize dev in the current project
    Init,

    /// Manage context modules, groups, and the active set
    Context {
        #[command(subcommand)]
        subcommand: ContextSubcommand,
    },

    /// Append a timestamped entry to today's log, or show a day's log
    Log {
        /// Entry text (omit to show the log)
        message: Vec<String>,
        /// Print the log instead of appending
        #[arg(long)]
        show: bool,
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long, requires = "show")]
        date: Option<String>,
    },

    /// Show or validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let clipboard_file = cli.clipboard_file.as_deref();

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Context { subcommand } => {
            cmd::context::run(&root, subcommand, clipboard_file, cli.json)
        }
        Commands::Log {
            message,
            show,
            date,
        } => cmd::log::run(&root, &message, show, date.as_deref(), cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
