//! Common types shared by the session, purchase, and storage layers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::AddressError;

// ============================================================================
// Identifiers
// ============================================================================

/// 32-byte Sui address.
///
/// Parsing accepts `0x`-prefixed hex of up to 64 digits in any case and
/// left-pads short forms (`0x2` is the framework address), so two spellings
/// of the same address compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; Address::LENGTH]);

/// Object ids share the address format.
pub type ObjectId = Address;

impl Address {
    pub const LENGTH: usize = 32;

    /// The Sui framework package (`0x2`).
    pub const FRAMEWORK: Address = {
        let mut bytes = [0u8; Address::LENGTH];
        bytes[Address::LENGTH - 1] = 2;
        Address(bytes)
    };

    pub fn new(bytes: [u8; Address::LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(trimmed.to_string()))?;

        if digits.is_empty() {
            return Err(AddressError::Empty);
        }
        if digits.len() > Self::LENGTH * 2 {
            return Err(AddressError::TooLong(trimmed.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex(trimmed.to_string()));
        }

        let padded = format!("{:0>64}", digits.to_ascii_lowercase());
        let mut bytes = [0u8; Self::LENGTH];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|_| AddressError::InvalidHex(trimmed.to_string()))?;

        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; Address::LENGTH] {
        &self.0
    }

    /// Hex digits without the `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Address::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Move struct type such as `0x2::coin::Coin`.
///
/// Compared structurally: the package address is normalized and the
/// module/name/type-parameter tail must match exactly.
pub fn same_struct_type(left: &str, right: &str) -> bool {
    fn split(tag: &str) -> Option<(Address, &str)> {
        let (address, rest) = tag.split_once("::")?;
        Some((Address::parse(address).ok()?, rest))
    }

    match (split(left), split(right)) {
        (Some((la, lr)), Some((ra, rr))) => la == ra && lr == rr,
        _ => left == right,
    }
}

/// Walrus blob identifier (URL-safe base64 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(pub String);

impl BlobId {
    pub fn new(blob_id: impl Into<String>) -> Self {
        Self(blob_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction digest as reported by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxDigest(pub String);

impl TxDigest {
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content-addressed session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// SHA-256 over `user|nft|created_at_millis`, hex encoded.
    ///
    /// Reproducible from its inputs, not guessable without them.
    pub fn derive(user: &Address, nft_id: &ObjectId, created_at: DateTime<Utc>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(user.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(nft_id.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(created_at.timestamp_millis().to_string().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn new(session_id: impl Into<String>) -> Self {
        Self(session_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// Decryption material handed to the viewer: the identity under which the
/// video was sealed and the key-server threshold needed to open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealIdentity {
    pub package_id: ObjectId,
    /// Hex-encoded identity bytes (the NFT object id).
    pub identity: String,
    pub threshold: u8,
}

impl SealIdentity {
    pub fn for_nft(package_id: ObjectId, nft_id: &ObjectId, threshold: u8) -> Self {
        Self {
            package_id,
            identity: nft_id.to_hex(),
            threshold,
        }
    }
}

/// Time-bounded content-access grant. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub user_address: Address,
    pub nft_id: ObjectId,
    pub blob_id: BlobId,
    pub decryption: SealIdentity,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Valid iff `now <= expires_at`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }

    pub fn matches(&self, user: &Address, nft_id: &ObjectId) -> bool {
        self.user_address == *user && self.nft_id == *nft_id
    }
}

// ============================================================================
// Chain data
// ============================================================================

/// An object returned by an owned-objects query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedObject {
    pub object_id: ObjectId,
    pub object_type: Option<String>,
}

/// Current price of an item listed in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    pub nft_id: ObjectId,
    pub price_mist: u64,
}

/// A marketplace entry as read from the chain, with the item's display
/// fields flattened to strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListing {
    pub nft_id: ObjectId,
    pub price_mist: u64,
    pub fields: BTreeMap<String, String>,
}

/// How an object was touched by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectChangeKind {
    Created,
    Mutated,
    Transferred,
    Deleted,
    Wrapped,
    Published,
}

/// One entry of a transaction's object-change report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectChange {
    pub kind: ObjectChangeKind,
    pub object_id: ObjectId,
    pub object_type: Option<String>,
    /// Address owner after the transaction, if the object is address-owned.
    pub owner: Option<Address>,
}

/// On-chain execution status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failure { error: String },
}

/// Effects of an executed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub digest: TxDigest,
    pub status: ExecutionStatus,
    pub object_changes: Vec<ObjectChange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_short_form_is_padded() {
        let short = Address::parse("0x2").unwrap();
        assert_eq!(short, Address::FRAMEWORK);
        assert_eq!(
            short.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000002"
        );
    }

    #[test]
    fn address_comparison_ignores_case() {
        let lower = Address::parse("0xabcdef").unwrap();
        let upper = Address::parse("0xABCDEF").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn address_rejects_malformed_input() {
        assert_eq!(Address::parse(""), Err(AddressError::Empty));
        assert_eq!(Address::parse("0x"), Err(AddressError::Empty));
        assert!(matches!(
            Address::parse("abcdef"),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            Address::parse("0xzz"),
            Err(AddressError::InvalidHex(_))
        ));
        let too_long = format!("0x{}", "a".repeat(65));
        assert!(matches!(
            Address::parse(&too_long),
            Err(AddressError::TooLong(_))
        ));
    }

    #[test]
    fn struct_types_compare_with_normalized_package() {
        assert!(same_struct_type(
            "0x00000000000000000000000000000000000000000000000000000000000000ab::nft::AthleteNFT",
            "0xAB::nft::AthleteNFT"
        ));
        assert!(!same_struct_type(
            "0xab::nft::AthleteNFT",
            "0xab::nft::Other"
        ));
        assert!(!same_struct_type("0xab::nft::AthleteNFT", "0xac::nft::AthleteNFT"));
    }

    #[test]
    fn session_id_is_reproducible_and_input_sensitive() {
        let user = Address::parse("0x1").unwrap();
        let nft = Address::parse("0x2").unwrap();
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let a = SessionId::derive(&user, &nft, at);
        let b = SessionId::derive(&user, &nft, at);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);

        let later = SessionId::derive(&user, &nft, at + chrono::Duration::milliseconds(1));
        assert_ne!(a, later);

        let other_nft = SessionId::derive(&user, &Address::parse("0x3").unwrap(), at);
        assert_ne!(a, other_nft);
    }

    #[test]
    fn seal_identity_is_scoped_to_nft() {
        let package = Address::parse("0x99").unwrap();
        let nft = Address::parse("0x1234").unwrap();
        let identity = SealIdentity::for_nft(package, &nft, 2);
        assert_eq!(identity.identity, nft.to_hex());
        assert_eq!(identity.threshold, 2);
    }

    #[test]
    fn session_serializes_camel_case() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let user = Address::parse("0x1").unwrap();
        let nft = Address::parse("0x2").unwrap();
        let session = Session {
            session_id: SessionId::derive(&user, &nft, at),
            user_address: user,
            nft_id: nft,
            blob_id: BlobId::new("blob"),
            decryption: SealIdentity::for_nft(nft, &nft, 2),
            created_at: at,
            expires_at: at + chrono::Duration::seconds(60),
        };

        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("sessionId").is_some());
        assert!(json.get("userAddress").is_some());
        assert!(json.get("expiresAt").is_some());

        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }
}
