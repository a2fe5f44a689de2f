//! Sponsored purchase: validate, build, submit, interpret.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, PurchaseError};
use crate::purchase::builder::PurchaseTransactionBuilder;
use crate::purchase::classify::{TransactionErrorKind, classify_transaction_error};
use crate::traits::{ChainReader, TransactionExecutor};
use crate::types::{
    Address, ExecutionStatus, ObjectChange, ObjectChangeKind, ObjectId, TxDigest,
    same_struct_type,
};

/// Purchase request as received from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PurchaseRequest {
    pub user_address: String,
    pub nft_id: String,
}

impl PurchaseRequest {
    pub fn new(user_address: impl Into<String>, nft_id: impl Into<String>) -> Self {
        Self {
            user_address: user_address.into(),
            nft_id: nft_id.into(),
        }
    }

    /// Check shape before anything touches the chain.
    pub fn validate(&self) -> Result<(Address, ObjectId), PurchaseError> {
        if self.user_address.trim().is_empty() {
            return Err(PurchaseError::InvalidRequest(
                "userAddress is required".to_string(),
            ));
        }
        if self.nft_id.trim().is_empty() {
            return Err(PurchaseError::InvalidRequest("nftId is required".to_string()));
        }

        let buyer = Address::parse(&self.user_address)
            .map_err(|e| PurchaseError::InvalidRequest(format!("userAddress: {e}")))?;
        let nft_id = Address::parse(&self.nft_id)
            .map_err(|e| PurchaseError::InvalidRequest(format!("nftId: {e}")))?;

        Ok((buyer, nft_id))
    }
}

/// A purchase that landed, with the asset at the buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub tx_digest: TxDigest,
    pub nft_id: ObjectId,
}

/// Wire response: `{success, txDigest, nftId}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PurchaseResponse {
    pub fn succeeded(receipt: &PurchaseReceipt) -> Self {
        Self {
            success: true,
            tx_digest: Some(receipt.tx_digest.to_string()),
            nft_id: Some(receipt.nft_id.to_string()),
            error: None,
        }
    }

    pub fn failed(error: &PurchaseError) -> Self {
        let tx_digest = match error {
            PurchaseError::AlreadySold { digest } | PurchaseError::Execution { digest, .. } => {
                digest.clone()
            }
            PurchaseError::AssetNotFound { digest } => Some(digest.clone()),
            _ => None,
        };

        Self {
            success: false,
            tx_digest,
            nft_id: None,
            error: Some(error.user_message()),
        }
    }
}

/// The id of the tracked asset that ended up owned by `owner`.
///
/// Only created, mutated, or transferred entries count; a success status
/// without such an entry means the result cannot be trusted.
pub fn extract_purchased_asset(
    changes: &[ObjectChange],
    nft_type: &str,
    owner: &Address,
) -> Option<ObjectId> {
    changes
        .iter()
        .find(|change| {
            matches!(
                change.kind,
                ObjectChangeKind::Created | ObjectChangeKind::Mutated | ObjectChangeKind::Transferred
            ) && change
                .object_type
                .as_deref()
                .is_some_and(|object_type| same_struct_type(object_type, nft_type))
                && change.owner.as_ref() == Some(owner)
        })
        .map(|change| change.object_id)
}

/// Runs sponsored purchases end to end. Never retries.
pub struct PurchaseOrchestrator {
    reader: Arc<dyn ChainReader>,
    executor: Arc<dyn TransactionExecutor>,
    builder: PurchaseTransactionBuilder,
}

impl PurchaseOrchestrator {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        executor: Arc<dyn TransactionExecutor>,
        builder: PurchaseTransactionBuilder,
    ) -> Self {
        Self {
            reader,
            executor,
            builder,
        }
    }

    pub fn builder(&self) -> &PurchaseTransactionBuilder {
        &self.builder
    }

    /// Buy `request.nft_id` from the kiosk on behalf of `request.user_address`.
    ///
    /// Submission runs on its own task: once the transaction is handed to
    /// the chain it completes even if the caller is dropped.
    pub async fn sponsor_purchase(
        &self,
        request: &PurchaseRequest,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let (buyer, nft_id) = request.validate()?;
        let config = self.builder.config();

        let listing = self
            .reader
            .listing(&config.kiosk.id, &nft_id)
            .await?
            .ok_or(PurchaseError::ListingNotFound(nft_id))?;

        let transaction = self.builder.build_purchase_transaction(&buyer, &listing);
        tracing::debug!(
            %buyer,
            %nft_id,
            price_mist = transaction.price_mist,
            royalty_mist = transaction.royalty_mist,
            "Submitting sponsored purchase"
        );

        let executor = Arc::clone(&self.executor);
        let outcome = tokio::spawn(async move { executor.execute_purchase(transaction).await })
            .await
            .map_err(|e| ChainError::Backend(format!("submission task failed: {e}")))??;

        let digest = outcome.digest;
        match outcome.status {
            ExecutionStatus::Failure { error } => match classify_transaction_error(&error) {
                TransactionErrorKind::AlreadySold => {
                    tracing::info!(%digest, %nft_id, "Purchase lost race: listing already sold");
                    Err(PurchaseError::AlreadySold {
                        digest: Some(digest.to_string()),
                    })
                }
                TransactionErrorKind::Other(message) => {
                    tracing::warn!(%digest, %nft_id, error = %message, "Purchase aborted");
                    Err(PurchaseError::Execution {
                        digest: Some(digest.to_string()),
                        message,
                    })
                }
            },
            ExecutionStatus::Success => {
                let purchased =
                    extract_purchased_asset(&outcome.object_changes, &config.nft_type, &buyer)
                        .ok_or_else(|| {
                            tracing::error!(%digest, %buyer, "Purchased asset missing from object changes");
                            PurchaseError::AssetNotFound {
                                digest: digest.to_string(),
                            }
                        })?;

                tracing::info!(%digest, %buyer, nft_id = %purchased, "Purchase complete");
                Ok(PurchaseReceipt {
                    tx_digest: digest,
                    nft_id: purchased,
                })
            }
        }
    }

    /// [`Self::sponsor_purchase`] folded into the wire response.
    pub async fn respond(&self, request: &PurchaseRequest) -> PurchaseResponse {
        match self.sponsor_purchase(request).await {
            Ok(receipt) => PurchaseResponse::succeeded(&receipt),
            Err(error) => PurchaseResponse::failed(&error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NFT_TYPE: &str = "0xabc::athlete_nft::AthleteNFT";

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn change(kind: ObjectChangeKind, id: &str, object_type: &str, owner: &str) -> ObjectChange {
        ObjectChange {
            kind,
            object_id: addr(id),
            object_type: Some(object_type.to_string()),
            owner: Some(addr(owner)),
        }
    }

    #[test]
    fn request_requires_both_fields() {
        assert!(matches!(
            PurchaseRequest::new("", "0x1").validate(),
            Err(PurchaseError::InvalidRequest(_))
        ));
        assert!(matches!(
            PurchaseRequest::new("0x1", " ").validate(),
            Err(PurchaseError::InvalidRequest(_))
        ));
    }

    #[test]
    fn request_rejects_malformed_addresses() {
        let err = PurchaseRequest::new("not-an-address", "0x1")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("userAddress"));
    }

    #[test]
    fn request_accepts_mixed_case() {
        let (buyer, nft) = PurchaseRequest::new("0xA11CE", "0x0100").validate().unwrap();
        assert_eq!(buyer, addr("0xa11ce"));
        assert_eq!(nft, addr("0x100"));
    }

    #[test]
    fn extraction_requires_type_kind_and_owner() {
        let buyer = addr("0xa11ce");
        let changes = vec![
            change(ObjectChangeKind::Mutated, "0x1", "0x2::kiosk::Kiosk", "0xa11ce"),
            change(ObjectChangeKind::Transferred, "0x2", NFT_TYPE, "0xb0b"),
            change(ObjectChangeKind::Deleted, "0x3", NFT_TYPE, "0xa11ce"),
            change(ObjectChangeKind::Transferred, "0x4", NFT_TYPE, "0xA11CE"),
        ];
        assert_eq!(
            extract_purchased_asset(&changes, NFT_TYPE, &buyer),
            Some(addr("0x4"))
        );
    }

    #[test]
    fn extraction_matches_long_form_package() {
        let long_type = format!("{}::athlete_nft::AthleteNFT", addr("0xabc"));
        let changes = vec![change(ObjectChangeKind::Created, "0x9", &long_type, "0xa11ce")];
        assert_eq!(
            extract_purchased_asset(&changes, NFT_TYPE, &addr("0xa11ce")),
            Some(addr("0x9"))
        );
    }

    #[test]
    fn extraction_without_match_is_none() {
        let changes = vec![change(ObjectChangeKind::Mutated, "0x1", "0x2::coin::Coin<0x2::sui::SUI>", "0xa11ce")];
        assert_eq!(extract_purchased_asset(&changes, NFT_TYPE, &addr("0xa11ce")), None);
    }

    #[test]
    fn failure_response_uses_friendly_message() {
        let response = PurchaseResponse::failed(&PurchaseError::AlreadySold {
            digest: Some("D1".to_string()),
        });
        assert!(!response.success);
        assert_eq!(response.tx_digest.as_deref(), Some("D1"));
        assert!(response.error.unwrap().contains("just purchased by someone else"));
    }

    #[test]
    fn success_response_serializes_camel_case() {
        let receipt = PurchaseReceipt {
            tx_digest: TxDigest::new("D2"),
            nft_id: addr("0x4"),
        };
        let json = serde_json::to_value(PurchaseResponse::succeeded(&receipt)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["txDigest"], "D2");
        assert_eq!(json["nftId"], addr("0x4").to_string());
        assert!(json.get("error").is_none());
    }
}
