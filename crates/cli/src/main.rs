//! agentdesk CLI, the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP gateway
//! - `agents`: List the agent catalog
//! - `ask`: Send one query through the router
//! - `doctor`: Diagnose config, key, and provider reachability

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "agentdesk",
    about = "agentdesk: routes chat queries to specialist LLM agents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the bind address
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List available agents
    Agents {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask a single question
    Ask {
        /// Agent id (unknown ids fall back to the general agent)
        #[arg(short, long, default_value = "general")]
        agent: String,

        /// Use the vision model for attached images
        #[arg(long)]
        vision: bool,

        /// Image file to attach (repeatable)
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,

        /// The question
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(host, port).await?,
        Commands::Agents { json } => commands::agents::run(json)?,
        Commands::Ask {
            agent,
            vision,
            images,
            query,
        } => commands::ask::run(agent, query.join(" "), vision, images).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

/// `.env` is loaded before config so `GROQ_API_KEY` can live there.
fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        eprintln!("Warning: failed to load .env file: {err}");
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
