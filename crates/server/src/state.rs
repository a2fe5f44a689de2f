//! Shared handler state.

use std::sync::Arc;

use gate_core::{
    BlobStore, ChainReader, Clock, ConfigError, ListingsReader, MarketplaceConfig,
    OwnershipVerifier, PurchaseOrchestrator, PurchaseTransactionBuilder, SessionConfig,
    SessionManager, SessionStore, TransactionExecutor,
};

/// Collaborators wired once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub purchases: Arc<PurchaseOrchestrator>,
    pub listings: Arc<ListingsReader>,
    pub blobs: Arc<dyn BlobStore>,
    pub chain: Arc<dyn ChainReader>,
    pub executor: Arc<dyn TransactionExecutor>,
    pub clock: Arc<dyn Clock>,
}

/// External collaborators, usually real adapters; mocks in tests.
pub struct Collaborators {
    pub chain: Arc<dyn ChainReader>,
    pub executor: Arc<dyn TransactionExecutor>,
    pub blobs: Arc<dyn BlobStore>,
    pub store: Arc<dyn SessionStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        collaborators: Collaborators,
        marketplace: MarketplaceConfig,
        session: SessionConfig,
    ) -> Result<Self, ConfigError> {
        let Collaborators {
            chain,
            executor,
            blobs,
            store,
            clock,
        } = collaborators;

        let verifier = OwnershipVerifier::new(Arc::clone(&chain), marketplace.nft_type.clone());
        let sessions = SessionManager::new(store, verifier, Arc::clone(&clock), session)?;

        let listings = ListingsReader::new(
            Arc::clone(&chain),
            marketplace.kiosk.id,
            marketplace.royalty_bps,
            marketplace.royalty_min_mist,
        );
        let purchases = PurchaseOrchestrator::new(
            Arc::clone(&chain),
            Arc::clone(&executor),
            PurchaseTransactionBuilder::new(marketplace)?,
        );

        Ok(Self {
            sessions: Arc::new(sessions),
            purchases: Arc::new(purchases),
            listings: Arc::new(listings),
            blobs,
            chain,
            executor,
            clock,
        })
    }
}
