//! Blob pool commands: upload and fetch through the configured endpoints.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use gate_core::{BlobId, StorageError};
use gate_storage_walrus::{BlobResolver, PoolConfig};

/// Upload a file through the first working publisher
#[derive(Debug, Parser)]
pub struct BlobUpload {
    /// File to upload (already encrypted)
    pub file: PathBuf,

    /// Pool file (defaults to WALRUS_POOL_FILE or the bundled testnet pool)
    #[arg(long)]
    pub pool: Option<PathBuf>,
}

/// Fetch a blob from the first aggregator that has it
#[derive(Debug, Parser)]
pub struct BlobFetch {
    pub blob_id: String,

    /// Output file (defaults to <blob_id>.bin)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pool file (defaults to WALRUS_POOL_FILE or the bundled testnet pool)
    #[arg(long)]
    pub pool: Option<PathBuf>,
}

fn resolver(pool: Option<&PathBuf>) -> Result<BlobResolver> {
    let config = match pool {
        Some(path) => PoolConfig::from_file(path),
        None => PoolConfig::from_env(),
    }
    .context("Failed to load endpoint pool")?;

    let resolver = BlobResolver::from_config(&config).context("Invalid endpoint pool")?;
    println!(
        "  Pool: {} publishers, {} aggregators",
        resolver.pool().publishers().len(),
        resolver.pool().aggregators().len()
    );
    Ok(resolver)
}

/// Print every endpoint the resolver tried before giving up.
fn report_failures(error: &StorageError) {
    eprintln!("{}", style(format!("✗ {}", error)).red().bold());
    for failure in error.failures() {
        eprintln!("  {} {}", style(&failure.endpoint).dim(), failure.reason);
    }
}

impl BlobUpload {
    pub fn execute(&self) -> Result<()> {
        tokio::runtime::Runtime::new()?.block_on(self.execute_async())
    }

    async fn execute_async(&self) -> Result<()> {
        let data = std::fs::read(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;

        println!("📤 Uploading {} ({} bytes)", self.file.display(), data.len());
        let resolver = resolver(self.pool.as_ref())?;

        match resolver.upload(&data).await {
            Ok(blob_id) => {
                println!("{}", style("✅ Stored").green().bold());
                println!("Blob ID: {}", blob_id);
                Ok(())
            }
            Err(e) => {
                report_failures(&e);
                Err(e).context("Upload failed")
            }
        }
    }
}

impl BlobFetch {
    pub fn execute(&self) -> Result<()> {
        tokio::runtime::Runtime::new()?.block_on(self.execute_async())
    }

    async fn execute_async(&self) -> Result<()> {
        let blob_id = BlobId::new(self.blob_id.trim());
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.bin", blob_id)));

        println!("📥 Fetching {}", blob_id);
        let resolver = resolver(self.pool.as_ref())?;

        match resolver.download(&blob_id).await {
            Ok(data) => {
                std::fs::write(&output, &data)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                println!("{}", style("✅ Fetched").green().bold());
                println!("{} bytes → {}", data.len(), output.display());
                Ok(())
            }
            Err(e) => {
                report_failures(&e);
                Err(e).context("Fetch failed")
            }
        }
    }
}
