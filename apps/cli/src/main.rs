//! Plume CLI - write social media copy from the command line.
//!
//! This CLI provides a `plume` command for generating platform-specific posts,
//! analyzing images and managing the brand knowledge store.

mod commands;
mod config;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{brand, generate, image, providers};

/// Plume CLI - social media copy generator
///
/// Plume writes Facebook, Instagram and Threads posts with OpenAI, Gemini or
/// Claude, grounded in your brand documents and the latest news.
#[derive(Parser, Debug)]
#[command(
    name = "plume",
    author,
    version,
    about = "Plume - social media copy generator",
    long_about = "Plume writes platform-specific social media posts.\nIt can ground posts in brand documents, pull in live search results and run a plan/write/edit loop."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Config file (skips ~/.plume/config.toml and ./plume.toml discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a post
    ///
    /// Writes copy for one platform, optionally grounded in brand knowledge and
    /// web search, in a single call or through the plan/write/edit workflow.
    Generate {
        /// Target platform (facebook, instagram, threads)
        #[arg(short, long)]
        platform: String,

        /// What the post is about
        #[arg(short, long)]
        topic: String,

        /// Desired tone
        #[arg(short, long, default_value = plume_core::DEFAULT_STYLE)]
        style: String,

        /// Model to request
        #[arg(short, long, default_value = plume_models::DEFAULT_OPENAI_MODEL)]
        model: String,

        /// Provider to request (openai, google, anthropic)
        #[arg(long, default_value = "openai")]
        provider: String,

        /// Skip brand knowledge retrieval
        #[arg(long)]
        no_rag: bool,

        /// Run the plan/write/edit workflow
        #[arg(long)]
        agent: bool,

        /// Include live web search results
        #[arg(long)]
        search: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Describe an image for post ideas
    AnalyzeImage {
        /// Image file (jpg, jpeg, png, webp)
        path: PathBuf,

        /// Custom analysis prompt
        #[arg(long)]
        prompt: Option<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage brand knowledge
    #[command(subcommand)]
    Brand(BrandCommand),

    /// Show which providers are configured
    Providers {
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum BrandCommand {
    /// Add a brand document (pdf, txt, csv) to the knowledge store
    Ingest {
        /// Document to ingest
        path: PathBuf,
    },

    /// Search the knowledge store
    Search {
        /// Search text
        query: String,

        /// Maximum number of snippets
        #[arg(long)]
        limit: Option<usize>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    let config = config::load_config(args.config.as_deref())?;

    match command {
        Command::Generate {
            platform,
            topic,
            style,
            model,
            provider,
            no_rag,
            agent,
            search,
            json,
        } => {
            let request = plume_core::GenerationRequest {
                platform,
                topic,
                style,
                model,
                provider,
                use_rag: !no_rag,
                use_agent: agent,
                use_search: search,
            };
            generate::execute(&config, &request, json).await?;
        }
        Command::AnalyzeImage { path, prompt, json } => {
            image::execute(&config, &path, prompt.as_deref(), json).await?;
        }
        Command::Brand(BrandCommand::Ingest { path }) => {
            brand::ingest(&config, &path).await?;
        }
        Command::Brand(BrandCommand::Search { query, limit, json }) => {
            brand::search(&config, &query, limit, json).await?;
        }
        Command::Providers { json } => {
            providers::execute(&config, json)?;
        }
    }

    Ok(())
}
