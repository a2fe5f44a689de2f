//! In-memory collaborators for tests.
//!
//! Simulates the chain, a clock, a cipher, and blob storage without any
//! network.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::{ChainError, CipherError, StorageError};
use crate::purchase::PurchaseTransaction;
use crate::traits::{BlobStore, ChainReader, Clock, SealCipher, TransactionExecutor};
use crate::types::{
    Address, BlobId, ExecutionOutcome, ExecutionStatus, Listing, ObjectChange, ObjectChangeKind,
    ObjectId, OwnedObject, RawListing, SealIdentity, TxDigest, same_struct_type,
};

/// Abort text the node reports when the kiosk item is already gone.
pub const ALREADY_SOLD_ABORT: &str = "MoveAbort(MoveLocation { module: ModuleId { address: 0000000000000000000000000000000000000000000000000000000000000002, name: Identifier(\"dynamic_field\") }, function: 11, instruction: 0, function_name: Some(\"remove_child_object\") }, 1) in command 1";

// ============================================================================
// Chain
// ============================================================================

/// Mock chain for testing without network.
///
/// Tracks ownership and kiosk listings in memory. Unless an outcome is
/// scripted, executing a purchase moves the listed item to the buyer, or
/// aborts with [`ALREADY_SOLD_ABORT`] if the item is no longer listed.
#[derive(Clone)]
pub struct MockChain {
    owned: Arc<Mutex<Vec<(Address, OwnedObject)>>>,
    listings: Arc<Mutex<HashMap<ObjectId, Vec<RawListing>>>>,
    shared_versions: Arc<Mutex<HashMap<ObjectId, u64>>>,
    scripted: Arc<Mutex<VecDeque<Result<ExecutionOutcome, ChainError>>>>,
    executed: Arc<Mutex<Vec<PurchaseTransaction>>>,
    nft_type: Arc<Mutex<String>>,
    fail_reads: Arc<AtomicBool>,
    balance: Arc<AtomicU64>,
    tx_counter: Arc<AtomicU64>,
    sponsor: Address,
}

impl MockChain {
    pub const DEFAULT_NFT_TYPE: &'static str = "0xabc::athlete_nft::AthleteNFT";

    pub fn new() -> Self {
        Self {
            owned: Arc::new(Mutex::new(Vec::new())),
            listings: Arc::new(Mutex::new(HashMap::new())),
            shared_versions: Arc::new(Mutex::new(HashMap::new())),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            executed: Arc::new(Mutex::new(Vec::new())),
            nft_type: Arc::new(Mutex::new(Self::DEFAULT_NFT_TYPE.to_string())),
            fail_reads: Arc::new(AtomicBool::new(false)),
            balance: Arc::new(AtomicU64::new(10_000_000_000)),
            tx_counter: Arc::new(AtomicU64::new(0)),
            sponsor: Address::new([0x5a; Address::LENGTH]),
        }
    }

    /// Type stamped on items the simulated purchase transfers.
    pub fn set_nft_type(&self, nft_type: &str) {
        *self.nft_type.lock().unwrap() = nft_type.to_string();
    }

    /// Record that `owner` holds `object_id` of `object_type`.
    pub fn give(&self, owner: Address, object_id: ObjectId, object_type: &str) {
        self.owned.lock().unwrap().push((
            owner,
            OwnedObject {
                object_id,
                object_type: Some(object_type.to_string()),
            },
        ));
    }

    /// List `nft_id` in `kiosk` at `price_mist`.
    pub fn list(&self, kiosk: ObjectId, nft_id: ObjectId, price_mist: u64) {
        self.list_raw(
            kiosk,
            RawListing {
                nft_id,
                price_mist,
                fields: Default::default(),
            },
        );
    }

    pub fn list_raw(&self, kiosk: ObjectId, listing: RawListing) {
        self.listings
            .lock()
            .unwrap()
            .entry(kiosk)
            .or_default()
            .push(listing);
    }

    /// Remove a listing, as a competing buyer would.
    pub fn delist(&self, nft_id: &ObjectId) {
        for entries in self.listings.lock().unwrap().values_mut() {
            entries.retain(|entry| entry.nft_id != *nft_id);
        }
    }

    pub fn set_shared_version(&self, object_id: ObjectId, version: u64) {
        self.shared_versions
            .lock()
            .unwrap()
            .insert(object_id, version);
    }

    /// Make every read fail with a network error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Queue the result of the next execution.
    pub fn script(&self, result: Result<ExecutionOutcome, ChainError>) {
        self.scripted.lock().unwrap().push_back(result);
    }

    /// Transactions submitted so far.
    pub fn executed(&self) -> Vec<PurchaseTransaction> {
        self.executed.lock().unwrap().clone()
    }

    pub fn set_balance(&self, mist: u64) {
        self.balance.store(mist, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), ChainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ChainError::Network("mock read failure".to_string()));
        }
        Ok(())
    }

    fn next_digest(&self) -> TxDigest {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        TxDigest::new(format!("MockTx{n}"))
    }

    fn simulate(&self, transaction: &PurchaseTransaction) -> ExecutionOutcome {
        let digest = self.next_digest();

        let mut listings = self.listings.lock().unwrap();
        let listed = listings.values_mut().find_map(|entries| {
            let position = entries
                .iter()
                .position(|entry| entry.nft_id == transaction.nft_id)?;
            Some(entries.remove(position))
        });

        if listed.is_none() {
            return ExecutionOutcome {
                digest,
                status: ExecutionStatus::Failure {
                    error: ALREADY_SOLD_ABORT.to_string(),
                },
                object_changes: Vec::new(),
            };
        }

        let nft_type = self.nft_type.lock().unwrap().clone();
        let cost = transaction.total_payment();
        let _ = self
            .balance
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |balance| {
                Some(balance.saturating_sub(cost))
            });
        drop(listings);
        self.give(transaction.buyer, transaction.nft_id, &nft_type);

        ExecutionOutcome {
            digest,
            status: ExecutionStatus::Success,
            object_changes: vec![ObjectChange {
                kind: ObjectChangeKind::Transferred,
                object_id: transaction.nft_id,
                object_type: Some(nft_type),
                owner: Some(transaction.buyer),
            }],
        }
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn owned_objects(
        &self,
        owner: &Address,
        struct_type: &str,
    ) -> Result<Vec<OwnedObject>, ChainError> {
        self.check_reads()?;
        Ok(self
            .owned
            .lock()
            .unwrap()
            .iter()
            .filter(|(holder, object)| {
                holder == owner
                    && object
                        .object_type
                        .as_deref()
                        .is_some_and(|t| same_struct_type(t, struct_type))
            })
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn listing(
        &self,
        marketplace: &ObjectId,
        nft_id: &ObjectId,
    ) -> Result<Option<Listing>, ChainError> {
        self.check_reads()?;
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(marketplace)
            .and_then(|entries| entries.iter().find(|entry| entry.nft_id == *nft_id))
            .map(|entry| Listing {
                nft_id: entry.nft_id,
                price_mist: entry.price_mist,
            }))
    }

    async fn listings(&self, marketplace: &ObjectId) -> Result<Vec<RawListing>, ChainError> {
        self.check_reads()?;
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(marketplace)
            .cloned()
            .unwrap_or_default())
    }

    async fn shared_version(&self, object_id: &ObjectId) -> Result<Option<u64>, ChainError> {
        self.check_reads()?;
        Ok(self.shared_versions.lock().unwrap().get(object_id).copied())
    }

    async fn ping(&self) -> Result<(), ChainError> {
        self.check_reads()
    }
}

#[async_trait]
impl TransactionExecutor for MockChain {
    async fn execute_purchase(
        &self,
        transaction: PurchaseTransaction,
    ) -> Result<ExecutionOutcome, ChainError> {
        self.executed.lock().unwrap().push(transaction.clone());

        let scripted = self.scripted.lock().unwrap().pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(self.simulate(&transaction)),
        }
    }

    fn sponsor_address(&self) -> Address {
        self.sponsor
    }

    async fn sponsor_balance(&self) -> Result<u64, ChainError> {
        self.check_reads()?;
        Ok(self.balance.load(Ordering::SeqCst))
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Start at a unix timestamp in seconds.
    pub fn at_timestamp(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// Cipher and storage
// ============================================================================

/// Toy cipher: XOR with a SHA-256 stream keyed by the identity. Not secure.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorCipher;

impl XorCipher {
    fn keystream(identity: &SealIdentity, len: usize) -> Vec<u8> {
        use sha2::{Digest, Sha256};

        let mut out = Vec::with_capacity(len);
        let mut counter: u64 = 0;
        while out.len() < len {
            let mut hasher = Sha256::new();
            hasher.update(identity.package_id.as_bytes());
            hasher.update(identity.identity.as_bytes());
            hasher.update(counter.to_le_bytes());
            out.extend_from_slice(&hasher.finalize());
            counter += 1;
        }
        out.truncate(len);
        out
    }

    fn apply(identity: &SealIdentity, data: &[u8]) -> Vec<u8> {
        Self::keystream(identity, data.len())
            .iter()
            .zip(data)
            .map(|(k, b)| k ^ b)
            .collect()
    }
}

#[async_trait]
impl SealCipher for XorCipher {
    async fn encrypt(
        &self,
        identity: &SealIdentity,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        Ok(Self::apply(identity, plaintext))
    }

    async fn decrypt(
        &self,
        identity: &SealIdentity,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        if identity.threshold == 0 {
            return Err(CipherError::Decrypt("threshold must be at least 1".to_string()));
        }
        Ok(Self::apply(identity, ciphertext))
    }
}

/// Content-addressed in-memory blob store.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<BlobId, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, blob_id: BlobId, data: Vec<u8>) {
        self.blobs.lock().unwrap().insert(blob_id, data);
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload_blob(&self, data: Vec<u8>) -> Result<BlobId, StorageError> {
        use sha2::{Digest, Sha256};

        let blob_id = BlobId::new(hex::encode(Sha256::digest(&data)));
        self.insert(blob_id.clone(), data);
        Ok(blob_id)
    }

    async fn get_encrypted_blob(&self, blob_id: &BlobId) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .lock()
            .unwrap()
            .get(blob_id)
            .cloned()
            .ok_or_else(|| StorageError::BlobNotFound {
                blob_id: blob_id.clone(),
                tried: 1,
                errors: Vec::new(),
            })
    }

    fn blob_url(&self, blob_id: &BlobId) -> Option<String> {
        Some(format!("memory://{blob_id}"))
    }
}
