//! Pagecraft CLI — the main entry point.
//!
//! Commands:
//! - `ask`      — Run one customization request against a stub page
//! - `scripts`  — Inspect and manage stored scripts

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "pagecraft",
    about = "Pagecraft — describe a website change, get a script",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one customization request and print the resulting script
    Ask {
        /// What to change on the page
        prompt: String,

        /// Domain the request applies to
        #[arg(short, long, default_value = "example.com")]
        domain: String,

        /// Tab id the session binds to
        #[arg(long, default_value_t = 1)]
        tab: u64,

        /// Approve every sensitive tool call without asking
        #[arg(short = 'y', long)]
        approve_all: bool,

        /// Edit an existing script instead of creating a new one
        #[arg(long)]
        script: Option<String>,
    },

    /// Manage stored scripts
    Scripts {
        #[command(subcommand)]
        action: ScriptsAction,
    },
}

#[derive(Subcommand)]
enum ScriptsAction {
    /// List scripts for a domain
    List {
        #[arg(short, long, default_value = "example.com")]
        domain: String,
    },

    /// Print one script in full
    Show { id: String },

    /// Delete a script
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Ask {
            prompt,
            domain,
            tab,
            approve_all,
            script,
        } => commands::ask::run(&prompt, &domain, tab, approve_all, script).await?,
        Commands::Scripts { action } => match action {
            ScriptsAction::List { domain } => commands::scripts::list(&domain).await?,
            ScriptsAction::Show { id } => commands::scripts::show(&id).await?,
            ScriptsAction::Delete { id } => commands::scripts::delete(&id).await?,
        },
    }

    Ok(())
}
