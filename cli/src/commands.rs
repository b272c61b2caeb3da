//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Args;
use gemcraft_embeddings::{
    Chunk, EmbeddingService, ProviderFamily, ProviderKind, ServiceConfig, estimate_cost,
    validate_embedding_value,
};
use serde::Serialize;
use tracing::info;

use crate::Cli;

#[derive(Args)]
pub struct ConfigureArgs {
    /// Provider family (openai or gemini)
    family: ProviderFamily,
    /// API key
    api_key: String,
}

#[derive(Args)]
pub struct TestArgs {
    /// Provider key, e.g. openai-3-small (default: first configured)
    #[arg(long)]
    provider: Option<String>,
}

#[derive(Args)]
pub struct EstimateArgs {
    /// JSON file holding an array of chunks
    #[arg(short = 'f', long = "file")]
    input: PathBuf,
    /// Provider key
    #[arg(long, default_value_t = ProviderKind::default().to_string())]
    provider: String,
}

#[derive(Args)]
pub struct EmbedArgs {
    /// JSON file holding an array of chunks
    #[arg(short = 'f', long = "file")]
    input: PathBuf,
    /// Provider key
    #[arg(long, default_value_t = ProviderKind::default().to_string())]
    provider: String,
    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Text to embed
    text: String,
    /// Provider key
    #[arg(long, default_value_t = ProviderKind::default().to_string())]
    provider: String,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// JSON file holding one embedding
    #[arg(short = 'f', long = "file")]
    input: PathBuf,
    /// Expected dimensionality
    #[arg(long)]
    dimensions: usize,
}

#[derive(Serialize)]
struct ProviderStatus {
    key: String,
    name: &'static str,
    model: &'static str,
    dimensions: usize,
    cost_per_1k_tokens: f64,
    configured: bool,
}

async fn load_service(cli: &Cli) -> anyhow::Result<EmbeddingService> {
    let config = match cli.config {
        Some(ref path) => ServiceConfig::load(path)
            .await
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ServiceConfig::from_env(),
    };

    EmbeddingService::from_config(config)
        .await
        .context("failed to start embedding service")
}

async fn read_chunks(path: &Path) -> anyhow::Result<Vec<Chunk>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid chunk file {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Show the first and last four characters of a key.
pub(crate) fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}

impl ConfigureArgs {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("API key must not be empty");
        }

        let service = load_service(cli).await?;
        service.configure(self.family, self.api_key.trim()).await?;

        match service.credentials().path() {
            Some(path) => println!(
                "Saved {} key {} to {}",
                self.family,
                mask_api_key(self.api_key.trim()),
                path.display()
            ),
            None => println!("Set {} key for this session only", self.family),
        }
        Ok(())
    }
}

pub async fn status(cli: &Cli) -> anyhow::Result<()> {
    let service = load_service(cli).await?;

    let mut providers = Vec::new();
    for descriptor in ProviderKind::all() {
        providers.push(ProviderStatus {
            key: descriptor.kind.to_string(),
            name: descriptor.name,
            model: descriptor.model,
            dimensions: descriptor.dimensions,
            cost_per_1k_tokens: descriptor.cost_per_1k_tokens,
            configured: service.credentials().has_key(descriptor.family).await,
        });
    }

    print_json(&providers)
}

impl TestArgs {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let service = load_service(cli).await?;
        let status = service.test_connection(self.provider.as_deref()).await;
        print_json(&status)?;

        if !status.success {
            std::process::exit(1);
        }
        Ok(())
    }
}

impl EstimateArgs {
    pub async fn run(&self) -> anyhow::Result<()> {
        let chunks = read_chunks(&self.input).await?;
        let estimate = estimate_cost(&chunks, &self.provider)?;
        print_json(&estimate)
    }
}

impl EmbedArgs {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let chunks = read_chunks(&self.input).await?;
        let service = load_service(cli).await?;
        let run = service.generate_embeddings(&chunks, &self.provider).await?;

        match self.output {
            Some(ref path) => {
                let content = serde_json::to_string(&run)?;
                tokio::fs::write(path, content)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!("Wrote {} embeddings to {}", run.embeddings.len(), path.display());
                print_json(&run.stats)
            }
            None => print_json(&run),
        }
    }
}

impl QueryArgs {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let service = load_service(cli).await?;
        let embedding = service
            .generate_single_embedding(&self.text, &self.provider)
            .await?;
        print_json(&embedding)
    }
}

impl ValidateArgs {
    pub async fn run(&self) -> anyhow::Result<()> {
        let content = tokio::fs::read_to_string(&self.input)
            .await
            .with_context(|| format!("failed to read {}", self.input.display()))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", self.input.display()))?;

        let validation = validate_embedding_value(&value, self.dimensions);
        print_json(&validation)?;

        if !validation.is_valid {
            std::process::exit(1);
        }
        Ok(())
    }
}
