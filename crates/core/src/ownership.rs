//! NFT ownership checks.

use std::sync::Arc;

use crate::traits::ChainReader;
use crate::types::{Address, ObjectId};

/// Answers "does `address` hold `asset_id`?" against the tracked NFT type.
///
/// Fail-closed: any RPC error reads as "not owned".
#[derive(Clone)]
pub struct OwnershipVerifier {
    reader: Arc<dyn ChainReader>,
    nft_type: String,
}

impl OwnershipVerifier {
    pub fn new(reader: Arc<dyn ChainReader>, nft_type: impl Into<String>) -> Self {
        Self {
            reader,
            nft_type: nft_type.into(),
        }
    }

    pub fn nft_type(&self) -> &str {
        &self.nft_type
    }

    pub async fn verify_ownership(&self, address: &Address, asset_id: &ObjectId) -> bool {
        match self.reader.owned_objects(address, &self.nft_type).await {
            Ok(objects) => {
                let owned = objects.iter().any(|object| object.object_id == *asset_id);
                tracing::debug!(
                    %address,
                    %asset_id,
                    held = objects.len(),
                    owned,
                    "Ownership check complete"
                );
                owned
            }
            Err(e) => {
                tracing::warn!(
                    %address,
                    %asset_id,
                    "Ownership check failed, treating as not owned: {}",
                    e
                );
                false
            }
        }
    }
}
