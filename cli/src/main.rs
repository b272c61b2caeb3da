//! gemcraft-embed - command line front end for the embedding pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigureArgs, EmbedArgs, EstimateArgs, QueryArgs, TestArgs, ValidateArgs};

/// Generate embeddings for pre-chunked text with OpenAI or Gemini.
///
/// API keys are read from OPENAI_API_KEY / GEMINI_API_KEY, or from the
/// credentials file written by `configure`.
#[derive(Parser)]
#[command(name = "gemcraft-embed")]
#[command(about = "Embedding pipeline CLI tool")]
#[command(version)]
pub struct Cli {
    /// Service config file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store an API key for a provider family
    Configure(ConfigureArgs),
    /// List providers and whether they are configured
    Status,
    /// Check that a provider is reachable with the stored key
    Test(TestArgs),
    /// Quote the cost of embedding a chunk file
    Estimate(EstimateArgs),
    /// Embed a chunk file
    Embed(EmbedArgs),
    /// Embed a single query text
    Query(QueryArgs),
    /// Check a stored embedding for problems
    Validate(ValidateArgs),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Configure(args) => args.run(&cli).await,
        Commands::Status => commands::status(&cli).await,
        Commands::Test(args) => args.run(&cli).await,
        Commands::Estimate(args) => args.run().await,
        Commands::Embed(args) => args.run(&cli).await,
        Commands::Query(args) => args.run(&cli).await,
        Commands::Validate(args) => args.run().await,
    }
}
