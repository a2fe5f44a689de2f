//! Display-ready marketplace listings.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::purchase::royalty_amount;
use crate::traits::ChainReader;
use crate::types::{ObjectId, RawListing};

pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Fixed split of the revenue-split payment, in percent. Enforced on chain
/// by the transfer policy; mirrored here for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueShares {
    pub athlete: u8,
    pub partner: u8,
    pub platform: u8,
}

impl RevenueShares {
    pub const STANDARD: RevenueShares = RevenueShares {
        athlete: 70,
        partner: 25,
        platform: 5,
    };

    /// Split `amount` MIST. Rounding dust goes to the platform share.
    pub fn split(&self, amount: u64) -> RevenueSplit {
        let part = |percent: u8| (u128::from(amount) * u128::from(percent) / 100) as u64;
        let athlete_mist = part(self.athlete);
        let partner_mist = part(self.partner);
        RevenueSplit {
            athlete_mist,
            partner_mist,
            platform_mist: amount - athlete_mist - partner_mist,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSplit {
    pub athlete_mist: u64,
    pub partner_mist: u64,
    pub platform_mist: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub nft_id: ObjectId,
    pub name: String,
    pub athlete: String,
    pub description: String,
    pub image_url: Option<String>,
    pub blob_id: Option<String>,
    pub price_mist: u64,
    pub price_sui: String,
    pub revenue_split: RevenueSplit,
}

/// MIST as a SUI decimal string with trailing zeros trimmed (`1.5`, `2`).
pub fn format_sui(mist: u64) -> String {
    let whole = mist / MIST_PER_SUI;
    let frac = mist % MIST_PER_SUI;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:09}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

fn field(raw: &RawListing, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| raw.fields.get(*key))
        .filter(|value| !value.is_empty())
        .cloned()
}

/// Reads the kiosk and shapes entries for the UI.
pub struct ListingsReader {
    reader: Arc<dyn ChainReader>,
    marketplace: ObjectId,
    royalty_bps: u16,
    royalty_min_mist: u64,
    shares: RevenueShares,
}

impl ListingsReader {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        marketplace: ObjectId,
        royalty_bps: u16,
        royalty_min_mist: u64,
    ) -> Self {
        Self {
            reader,
            marketplace,
            royalty_bps,
            royalty_min_mist,
            shares: RevenueShares::STANDARD,
        }
    }

    pub fn to_record(&self, raw: &RawListing) -> ListingRecord {
        let royalty = royalty_amount(raw.price_mist, self.royalty_bps, self.royalty_min_mist);
        ListingRecord {
            nft_id: raw.nft_id,
            name: field(raw, &["name"]).unwrap_or_else(|| raw.nft_id.to_string()),
            athlete: field(raw, &["athlete", "athlete_name"]).unwrap_or_default(),
            description: field(raw, &["description"]).unwrap_or_default(),
            image_url: field(raw, &["image_url", "imageUrl", "url"]),
            blob_id: field(raw, &["blob_id", "blobId", "video_blob_id"]),
            price_mist: raw.price_mist,
            price_sui: format_sui(raw.price_mist),
            revenue_split: self.shares.split(royalty),
        }
    }

    /// Every listing, cheapest first.
    pub async fn list(&self) -> Result<Vec<ListingRecord>, ChainError> {
        let raw = self.reader.listings(&self.marketplace).await?;
        let mut records: Vec<ListingRecord> = raw.iter().map(|r| self.to_record(r)).collect();
        records.sort_by(|a, b| a.price_mist.cmp(&b.price_mist).then(a.nft_id.cmp(&b.nft_id)));
        tracing::debug!(count = records.len(), "Listings read");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::mock::MockChain;
    use crate::types::Address;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn raw(id: &str, price: u64, name: &str) -> RawListing {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), name.to_string());
        fields.insert("athlete".to_string(), "J. Doe".to_string());
        fields.insert("blob_id".to_string(), "blob-1".to_string());
        RawListing {
            nft_id: addr(id),
            price_mist: price,
            fields,
        }
    }

    #[test]
    fn sui_amounts_are_trimmed() {
        assert_eq!(format_sui(0), "0");
        assert_eq!(format_sui(2 * MIST_PER_SUI), "2");
        assert_eq!(format_sui(1_500_000_000), "1.5");
        assert_eq!(format_sui(1), "0.000000001");
    }

    #[test]
    fn split_conserves_amount() {
        let split = RevenueShares::STANDARD.split(101);
        assert_eq!(split.athlete_mist, 70);
        assert_eq!(split.partner_mist, 25);
        assert_eq!(split.platform_mist, 6);
        assert_eq!(
            split.athlete_mist + split.partner_mist + split.platform_mist,
            101
        );
    }

    #[tokio::test]
    async fn listings_are_sorted_by_price() {
        let chain = Arc::new(MockChain::new());
        let kiosk = addr("0xb105");
        chain.list_raw(kiosk, raw("0x2", 3_000_000_000, "Gold"));
        chain.list_raw(kiosk, raw("0x1", 1_000_000_000, "Bronze"));

        let reader = ListingsReader::new(chain, kiosk, 1_000, 0);
        let records = reader.list().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Bronze");
        assert_eq!(records[0].price_sui, "1");
        assert_eq!(records[0].blob_id.as_deref(), Some("blob-1"));
        assert_eq!(records[0].revenue_split.athlete_mist, 70_000_000);
        assert_eq!(records[1].name, "Gold");
    }

    #[tokio::test]
    async fn read_failure_propagates() {
        let chain = Arc::new(MockChain::new());
        chain.fail_reads(true);
        let reader = ListingsReader::new(chain, addr("0xb105"), 1_000, 0);
        assert!(reader.list().await.is_err());
    }
}
