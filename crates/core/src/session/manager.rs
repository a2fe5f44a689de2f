//! Converts a one-time ownership check into a short-lived access grant.
//!
//! ```text
//! NonExistent ──create (owned)──→ Valid ──now > expires_at──→ Expired
//!                                   │                            │
//!                                   └──────── sweep ─────────────┘ (removed)
//! ```
//!
//! Sessions are never renewed in place; renewal is a new `create_session`.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AccessError, ConfigError};
use crate::ownership::OwnershipVerifier;
use crate::session::store::SessionStore;
use crate::traits::Clock;
use crate::types::{Address, BlobId, ObjectId, SealIdentity, Session, SessionId};

/// Session lifetime and decryption-material parameters.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a grant stays valid. Short on purpose: it bounds exposure
    /// of decrypted content.
    pub duration: Duration,

    /// Package whose access policy the sealed videos were encrypted under.
    pub seal_package_id: ObjectId,

    /// Key-server shares needed to decrypt.
    pub seal_threshold: u8,
}

impl SessionConfig {
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(120);
    pub const DEFAULT_THRESHOLD: u8 = 2;

    pub fn new(seal_package_id: ObjectId) -> Self {
        Self {
            duration: Self::DEFAULT_DURATION,
            seal_package_id,
            seal_threshold: Self::DEFAULT_THRESHOLD,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.seal_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration.is_zero() {
            return Err(ConfigError::Invalid {
                key: "SESSION_DURATION_SECONDS",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.seal_threshold == 0 {
            return Err(ConfigError::Invalid {
                key: "SEAL_THRESHOLD",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Creates, validates, reuses, and expires access sessions.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    verifier: OwnershipVerifier,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    duration: chrono::Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        verifier: OwnershipVerifier,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let duration =
            chrono::Duration::from_std(config.duration).map_err(|e| ConfigError::Invalid {
                key: "SESSION_DURATION_SECONDS",
                reason: e.to_string(),
            })?;

        Ok(Self {
            store,
            verifier,
            clock,
            config,
            duration,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Grant access to `nft_id`'s video for `user`.
    ///
    /// Fails with [`AccessError::NotOwned`] unless the chain confirms
    /// ownership. A still-valid session for the same `(user, nft_id)` is
    /// returned unchanged; its expiry is not extended.
    pub async fn create_session(
        &self,
        user: &Address,
        nft_id: &ObjectId,
        blob_id: BlobId,
    ) -> Result<Session, AccessError> {
        if !self.verifier.verify_ownership(user, nft_id).await {
            tracing::info!(%user, %nft_id, "Access denied: NFT not owned");
            return Err(AccessError::NotOwned {
                user: *user,
                nft_id: *nft_id,
            });
        }

        let now = self.clock.now();
        let candidate = Session {
            session_id: SessionId::derive(user, nft_id, now),
            user_address: *user,
            nft_id: *nft_id,
            blob_id,
            decryption: SealIdentity::for_nft(
                self.config.seal_package_id,
                nft_id,
                self.config.seal_threshold,
            ),
            created_at: now,
            expires_at: now + self.duration,
        };

        let session = self.store.put_or_reuse(candidate, now)?;
        if session.created_at == now {
            tracing::info!(
                session_id = %session.session_id,
                %user,
                %nft_id,
                expires_at = %session.expires_at,
                "Session created"
            );
        } else {
            tracing::debug!(
                session_id = %session.session_id,
                "Reusing live session"
            );
        }

        Ok(session)
    }

    /// Redeem a session id.
    ///
    /// Expired sessions are deleted on the way out so the same id reads as
    /// not-found afterwards.
    pub fn validate_session(&self, session_id: &SessionId) -> Result<Session, AccessError> {
        let session = self
            .store
            .get(session_id)?
            .ok_or_else(|| AccessError::SessionNotFound(session_id.clone()))?;

        if !session.is_valid_at(self.clock.now()) {
            self.store.delete(session_id)?;
            tracing::debug!(%session_id, "Session expired");
            return Err(AccessError::SessionExpired {
                session_id: session_id.clone(),
                expired_at: session.expires_at,
            });
        }

        Ok(session)
    }

    /// Remove every expired session. Returns how many were removed.
    pub fn cleanup_expired_sessions(&self) -> Result<usize, AccessError> {
        let removed = self.store.sweep(self.clock.now())?;
        if removed > 0 {
            tracing::debug!(removed, "Swept expired sessions");
        }
        Ok(removed)
    }

    /// Sessions valid right now.
    pub fn active_session_count(&self) -> Result<usize, AccessError> {
        Ok(self.store.count_live(self.clock.now())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ManualClock, MockChain};
    use crate::session::store::InMemorySessionStore;

    const NFT_TYPE: &str = "0xabc::athlete_nft::AthleteNFT";

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    struct Fixture {
        chain: Arc<MockChain>,
        clock: Arc<ManualClock>,
        manager: SessionManager,
    }

    fn fixture(duration_secs: u64) -> Fixture {
        let chain = Arc::new(MockChain::new());
        let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
        let config =
            SessionConfig::new(addr("0xabc")).with_duration(Duration::from_secs(duration_secs));
        let manager = SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            OwnershipVerifier::new(chain.clone(), NFT_TYPE),
            clock.clone(),
            config,
        )
        .unwrap();

        Fixture {
            chain,
            clock,
            manager,
        }
    }

    #[tokio::test]
    async fn not_owned_is_rejected() {
        let f = fixture(60);
        let err = f
            .manager
            .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotOwned { .. }));
        assert_eq!(f.manager.active_session_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn repeat_create_reuses_live_session() {
        let f = fixture(60);
        f.chain.give(addr("0xa11ce"), addr("0x100"), NFT_TYPE);

        let first = f
            .manager
            .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
            .await
            .unwrap();
        f.clock.advance_secs(10);
        let second = f
            .manager
            .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(f.manager.active_session_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn reuse_keeps_original_expiry() {
        let f = fixture(60);
        f.chain.give(addr("0xa11ce"), addr("0x100"), NFT_TYPE);

        let first = f
            .manager
            .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
            .await
            .unwrap();
        f.clock.advance_secs(50);
        let reused = f
            .manager
            .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
            .await
            .unwrap();

        assert_eq!(reused.expires_at, first.expires_at);
    }

    #[tokio::test]
    async fn expired_session_is_deleted_on_validate() {
        let f = fixture(60);
        f.chain.give(addr("0xa11ce"), addr("0x100"), NFT_TYPE);

        let session = f
            .manager
            .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
            .await
            .unwrap();
        f.clock.advance_secs(61);

        assert!(matches!(
            f.manager.validate_session(&session.session_id),
            Err(AccessError::SessionExpired { .. })
        ));
        assert!(matches!(
            f.manager.validate_session(&session.session_id),
            Err(AccessError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let f = fixture(60);
        assert!(matches!(
            f.manager.validate_session(&SessionId::new("nope")),
            Err(AccessError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn cleanup_counts_removed_sessions() {
        let f = fixture(60);
        f.chain.give(addr("0xa11ce"), addr("0x100"), NFT_TYPE);
        f.chain.give(addr("0xa11ce"), addr("0x101"), NFT_TYPE);

        assert_eq!(f.manager.cleanup_expired_sessions().unwrap(), 0);

        for nft in ["0x100", "0x101"] {
            f.manager
                .create_session(&addr("0xa11ce"), &addr(nft), BlobId::new("b"))
                .await
                .unwrap();
        }
        f.clock.advance_secs(61);

        assert_eq!(f.manager.active_session_count().unwrap(), 0);
        assert_eq!(f.manager.cleanup_expired_sessions().unwrap(), 2);
        assert_eq!(f.manager.cleanup_expired_sessions().unwrap(), 0);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let config = SessionConfig::new(addr("0xabc")).with_duration(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: "SESSION_DURATION_SECONDS",
                ..
            })
        ));
    }
}
