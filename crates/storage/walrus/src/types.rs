//! Walrus publisher response types.
//!
//! Only `blobId` is required; everything else is optional and unknown
//! fields land in `extra`, so publisher API additions do not break parsing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Response from `PUT /v1/blobs`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlobResponse {
    /// Blob was newly stored.
    NewlyCreated(Box<NewlyCreated>),
    /// Identical content was already certified.
    AlreadyCertified(AlreadyCertified),
}

impl BlobResponse {
    pub fn blob_id(&self) -> &str {
        match self {
            BlobResponse::NewlyCreated(info) => &info.blob_object.blob_id,
            BlobResponse::AlreadyCertified(info) => &info.blob_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewlyCreated {
    pub blob_object: BlobObject,

    /// Storage cost in MIST
    #[serde(default)]
    pub cost: u64,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlreadyCertified {
    pub blob_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_epoch: Option<u64>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The Sui object registering the blob.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Walrus blob id (URL-safe base64), used for retrieval
    pub blob_id: String,

    #[serde(default)]
    pub size: u64,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newly_created_parses() {
        let raw = r#"{
            "newlyCreated": {
                "blobObject": {
                    "id": "0x1234",
                    "blobId": "E7_nNXvFU_3qZVu3OH1yycRG7LZlyn1-UxEDCDDqGGU",
                    "size": 17,
                    "encodingType": "RS2",
                    "storage": {"startEpoch": 1, "endEpoch": 6}
                },
                "resourceOperation": {"registerFromScratch": {}},
                "cost": 132300
            }
        }"#;
        let response: BlobResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            response.blob_id(),
            "E7_nNXvFU_3qZVu3OH1yycRG7LZlyn1-UxEDCDDqGGU"
        );
        match response {
            BlobResponse::NewlyCreated(info) => {
                assert_eq!(info.cost, 132_300);
                assert_eq!(info.blob_object.size, 17);
                assert!(info.extra.contains_key("resourceOperation"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn already_certified_parses() {
        let raw = r#"{
            "alreadyCertified": {
                "blobId": "E7_nNXvFU_3qZVu3OH1yycRG7LZlyn1-UxEDCDDqGGU",
                "event": {"txDigest": "abc", "eventSeq": "0"},
                "endEpoch": 6
            }
        }"#;
        let response: BlobResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            response.blob_id(),
            "E7_nNXvFU_3qZVu3OH1yycRG7LZlyn1-UxEDCDDqGGU"
        );
    }
}
