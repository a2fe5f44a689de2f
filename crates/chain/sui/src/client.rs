//! Read-only Sui queries behind [`ChainReader`].
//!
//! The marketplace is a Sui kiosk. Each listing is a dynamic field keyed by
//! `0x2::kiosk::Listing { id, is_exclusive }` whose value is the price in
//! MIST; the listed item itself stays queryable by its object id.

use anyhow::Context;
use async_trait::async_trait;
use gate_core::{
    Address, ChainError, ChainReader, Listing, ObjectId, OwnedObject, RawListing,
    same_struct_type,
};
use serde_json::{Value, json};
use sui_sdk::rpc_types::{
    SuiObjectData, SuiObjectDataFilter, SuiObjectDataOptions, SuiObjectResponseQuery,
    SuiParsedData,
};
use sui_sdk::{SuiClient, SuiClientBuilder};
use sui_types::base_types::ObjectID;
use sui_types::dynamic_field::DynamicFieldName;
use sui_types::object::Owner;

use crate::config::{SuiConfig, SuiNetwork};
use crate::convert::{flatten_fields, from_object_id, parse_u64, to_object_id, to_sui_address};
use crate::error::{Result, SuiError};

/// Dynamic field key type of kiosk listings.
pub const KIOSK_LISTING_TYPE: &str = "0x2::kiosk::Listing";

/// Sui full-node client for ownership and marketplace queries.
#[derive(Clone)]
pub struct SuiChainClient {
    sui_client: SuiClient,
    network: SuiNetwork,
}

impl SuiChainClient {
    /// Connect to the configured full node.
    pub async fn connect(config: &SuiConfig) -> Result<Self> {
        let rpc_url = config.get_rpc_url();
        let sui_client = SuiClientBuilder::default()
            .build(rpc_url)
            .await
            .map_err(|e| SuiError::Network(format!("failed to connect to {rpc_url}: {e}")))?;

        tracing::info!(network = config.network.name(), rpc_url, "Connected to Sui");
        Ok(Self::from_client(sui_client, config.network))
    }

    pub fn from_client(sui_client: SuiClient, network: SuiNetwork) -> Self {
        Self {
            sui_client,
            network,
        }
    }

    pub fn sui_client(&self) -> &SuiClient {
        &self.sui_client
    }

    pub fn network(&self) -> SuiNetwork {
        self.network
    }

    async fn fetch_owned_objects(
        &self,
        owner: &Address,
        struct_type: &str,
    ) -> Result<Vec<OwnedObject>> {
        let struct_tag = sui_types::parse_sui_struct_tag(struct_type)
            .with_context(|| format!("invalid struct type {struct_type}"))?;
        let owner = to_sui_address(owner);

        let mut objects = Vec::new();
        let mut cursor = None;
        loop {
            let query = SuiObjectResponseQuery::new(
                Some(SuiObjectDataFilter::StructType(struct_tag.clone())),
                Some(SuiObjectDataOptions::new().with_type()),
            );
            let page = self
                .sui_client
                .read_api()
                .get_owned_objects(owner, Some(query), cursor, None)
                .await?;

            objects.extend(page.data.into_iter().filter_map(|response| {
                response.data.map(|data| OwnedObject {
                    object_id: from_object_id(data.object_id),
                    object_type: data.type_.map(|t| t.to_string()),
                })
            }));

            match page.next_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn fetch_listing(&self, kiosk: &ObjectId, nft_id: &ObjectId) -> Result<Option<Listing>> {
        let name = DynamicFieldName {
            type_: sui_types::parse_sui_type_tag(KIOSK_LISTING_TYPE)
                .context("invalid listing key type")?,
            value: json!({ "id": nft_id.to_string(), "is_exclusive": false }),
        };

        let response = self
            .sui_client
            .read_api()
            .get_dynamic_field_object(to_object_id(kiosk), name)
            .await?;

        let Some(data) = response.data else {
            return Ok(None);
        };
        let price_mist = listing_price(&data)?;
        Ok(Some(Listing {
            nft_id: *nft_id,
            price_mist,
        }))
    }

    async fn fetch_listings(&self, kiosk: &ObjectId) -> Result<Vec<RawListing>> {
        let kiosk = to_object_id(kiosk);

        let mut listing_fields = Vec::new();
        let mut cursor = None;
        loop {
            let page = self
                .sui_client
                .read_api()
                .get_dynamic_fields(kiosk, cursor, None)
                .await?;

            for info in page.data {
                if !same_struct_type(&info.name.type_.to_string(), KIOSK_LISTING_TYPE) {
                    continue;
                }
                if info.name.value.get("is_exclusive") == Some(&Value::Bool(true)) {
                    continue;
                }
                let Some(nft_id) = info
                    .name
                    .value
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|id| Address::parse(id).ok())
                else {
                    tracing::warn!(field = %info.object_id, "Listing key without an item id");
                    continue;
                };
                listing_fields.push((nft_id, info.object_id));
            }

            match page.next_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        let mut listings = Vec::with_capacity(listing_fields.len());
        for (nft_id, field_id) in listing_fields {
            let price_mist = match self.fetch_content(field_id).await {
                Ok(data) => listing_price(&data)?,
                Err(e) => {
                    tracing::warn!(%nft_id, error = %e, "Listing vanished while reading");
                    continue;
                }
            };

            let fields = match self.fetch_content(to_object_id(&nft_id)).await {
                Ok(data) => move_fields(&data).map(|f| flatten_fields(&f)).unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(%nft_id, error = %e, "Listed item has no readable content");
                    Default::default()
                }
            };

            listings.push(RawListing {
                nft_id,
                price_mist,
                fields,
            });
        }

        tracing::debug!(count = listings.len(), "Read kiosk listings");
        Ok(listings)
    }

    async fn fetch_content(&self, object_id: ObjectID) -> Result<SuiObjectData> {
        self.sui_client
            .read_api()
            .get_object_with_options(
                object_id,
                SuiObjectDataOptions::new().with_type().with_content(),
            )
            .await?
            .data
            .ok_or_else(|| SuiError::ObjectNotFound(object_id.to_string()))
    }

    async fn fetch_shared_version(&self, object_id: &ObjectId) -> Result<Option<u64>> {
        let id = to_object_id(object_id);
        let data = self
            .sui_client
            .read_api()
            .get_object_with_options(id, SuiObjectDataOptions::new().with_owner())
            .await?
            .data
            .ok_or_else(|| SuiError::ObjectNotFound(id.to_string()))?;

        Ok(match data.owner {
            Some(Owner::Shared {
                initial_shared_version,
            }) => Some(initial_shared_version.value()),
            _ => None,
        })
    }
}

/// Top-level Move fields of an object with content.
fn move_fields(data: &SuiObjectData) -> Option<Value> {
    match &data.content {
        Some(SuiParsedData::MoveObject(object)) => Some(object.fields.clone().to_json_value()),
        _ => None,
    }
}

/// Price stored in a `Field<Listing, u64>` object.
fn listing_price(data: &SuiObjectData) -> Result<u64> {
    move_fields(data)
        .as_ref()
        .and_then(|fields| fields.get("value"))
        .and_then(parse_u64)
        .ok_or_else(|| {
            SuiError::InvalidResponse(format!("listing field {} has no u64 value", data.object_id))
        })
}

#[async_trait]
impl ChainReader for SuiChainClient {
    async fn owned_objects(
        &self,
        owner: &Address,
        struct_type: &str,
    ) -> std::result::Result<Vec<OwnedObject>, ChainError> {
        Ok(self.fetch_owned_objects(owner, struct_type).await?)
    }

    async fn listing(
        &self,
        marketplace: &ObjectId,
        nft_id: &ObjectId,
    ) -> std::result::Result<Option<Listing>, ChainError> {
        Ok(self.fetch_listing(marketplace, nft_id).await?)
    }

    async fn listings(
        &self,
        marketplace: &ObjectId,
    ) -> std::result::Result<Vec<RawListing>, ChainError> {
        Ok(self.fetch_listings(marketplace).await?)
    }

    async fn shared_version(
        &self,
        object_id: &ObjectId,
    ) -> std::result::Result<Option<u64>, ChainError> {
        Ok(self.fetch_shared_version(object_id).await?)
    }

    async fn ping(&self) -> std::result::Result<(), ChainError> {
        self.sui_client
            .read_api()
            .get_chain_identifier()
            .await
            .map(|_| ())
            .map_err(|e| ChainError::Network(e.to_string()))
    }
}
