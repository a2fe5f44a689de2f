//! Sponsor key generation command.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use console::style;
use gate_chain_sui::default_keystore_path;
use sui_keys::keystore::{AccountKeystore, FileBasedKeystore, GenerateOptions, LocalGenerate};
use sui_types::crypto::SignatureScheme;

/// Generate a sponsor key in a Sui keystore
#[derive(Debug, Parser)]
pub struct Keygen {
    /// Alias for the generated key (optional, human-readable name)
    #[arg(short, long)]
    pub alias: Option<String>,

    /// Key scheme to use (ed25519, secp256k1, secp256r1)
    #[arg(short, long, default_value = "ed25519")]
    pub scheme: String,

    /// Keystore file (defaults to SUI_KEYSTORE_PATH or ~/.sui/sui_config/sui.keystore)
    #[arg(long)]
    pub keystore: Option<PathBuf>,
}

impl Keygen {
    pub fn execute(&self) -> Result<()> {
        tokio::runtime::Runtime::new()?.block_on(self.execute_async())
    }

    async fn execute_async(&self) -> Result<()> {
        println!("🔑 Generating sponsor key...");
        println!();

        let scheme = parse_scheme(&self.scheme)?;
        let keystore_path = self.keystore_path();

        let mut keystore = FileBasedKeystore::load_or_create(&keystore_path)
            .context("Failed to load or create keystore")?;

        if keystore.addresses().is_empty() {
            println!("📁 Creating new keystore at: {}", keystore_path.display());
        }

        let generated = keystore
            .generate(
                self.alias.clone(),
                GenerateOptions::Local(LocalGenerate {
                    key_scheme: scheme,
                    derivation_path: None,
                    word_length: None,
                }),
            )
            .await
            .context("Failed to generate new key")?;

        let address = generated.address;

        println!("{}", style("✅ Key generated").green().bold());
        println!();
        println!("Address:  {}", address);
        if let Some(ref alias) = self.alias {
            println!("Alias:    {}", alias);
        }
        println!("Scheme:   {:?}", scheme);
        println!("Keystore: {}", keystore_path.display());
        println!();
        println!("Fund this address, then point the server at it:");
        println!("  export SUI_KEYSTORE_PATH={}", keystore_path.display());
        println!("  export SUI_SPONSOR_ADDRESS={}", address);

        Ok(())
    }

    fn keystore_path(&self) -> PathBuf {
        self.keystore
            .clone()
            .or_else(|| std::env::var_os("SUI_KEYSTORE_PATH").map(PathBuf::from))
            .unwrap_or_else(default_keystore_path)
    }
}

fn parse_scheme(scheme: &str) -> Result<SignatureScheme> {
    match scheme.to_lowercase().as_str() {
        "ed25519" => Ok(SignatureScheme::ED25519),
        "secp256k1" => Ok(SignatureScheme::Secp256k1),
        "secp256r1" => Ok(SignatureScheme::Secp256r1),
        other => Err(anyhow!(
            "Invalid signature scheme: {}. Must be ed25519, secp256k1, or secp256r1",
            other
        )),
    }
}
