use std::sync::{Arc, Barrier};
use std::time::Duration;

use gate_core::{
    AccessError, Address, BlobId, InMemorySessionStore, ManualClock, MockChain,
    OwnershipVerifier, SealIdentity, Session, SessionConfig, SessionId, SessionManager,
    SessionStore,
};

const NFT_TYPE: &str = MockChain::DEFAULT_NFT_TYPE;

fn addr(s: &str) -> Address {
    Address::parse(s).expect("test address should parse")
}

fn manager(chain: Arc<MockChain>, clock: Arc<ManualClock>, duration_secs: u64) -> SessionManager {
    let config = SessionConfig::new(addr("0xabc")).with_duration(Duration::from_secs(duration_secs));
    SessionManager::new(
        Arc::new(InMemorySessionStore::new()),
        OwnershipVerifier::new(chain, NFT_TYPE),
        clock,
        config,
    )
    .expect("session config should be valid")
}

/// Session Expiry Scenario
///
/// 1. Owner creates a 60 second session at t=0
/// 2. At t=59 the session validates and is unchanged
/// 3. At t=61 validation reports Expired
/// 4. The same id then reads as not found
#[tokio::test]
async fn test_session_expiry_scenario() {
    let chain = Arc::new(MockChain::new());
    let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
    let sessions = manager(chain.clone(), clock.clone(), 60);

    let user = addr("0xa11ce");
    let nft = addr("0x100");
    chain.give(user, nft, NFT_TYPE);

    // PHASE 1: create
    let created = sessions
        .create_session(&user, &nft, BlobId::new("blob-100"))
        .await
        .expect("owner should get a session");
    assert_eq!(sessions.active_session_count().unwrap(), 1);

    // PHASE 2: redeem just before expiry
    clock.advance_secs(59);
    let redeemed = sessions
        .validate_session(&created.session_id)
        .expect("session should still be valid at t=59");
    assert_eq!(redeemed.session_id, created.session_id);
    assert_eq!(redeemed.user_address, created.user_address);
    assert_eq!(redeemed.nft_id, created.nft_id);
    assert_eq!(redeemed.expires_at, created.expires_at);

    // PHASE 3: redeem just after expiry
    clock.advance_secs(2);
    let err = sessions
        .validate_session(&created.session_id)
        .expect_err("session should be expired at t=61");
    assert!(matches!(err, AccessError::SessionExpired { .. }));

    // PHASE 4: expired entry is gone
    let err = sessions
        .validate_session(&created.session_id)
        .expect_err("expired session should be removed");
    assert!(matches!(err, AccessError::SessionNotFound(_)));
    assert_eq!(sessions.cleanup_expired_sessions().unwrap(), 0);
}

/// Exactly at `expires_at` the session is still valid.
#[tokio::test]
async fn test_expiry_boundary_is_inclusive() {
    let chain = Arc::new(MockChain::new());
    let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
    let sessions = manager(chain.clone(), clock.clone(), 60);
    chain.give(addr("0xa11ce"), addr("0x100"), NFT_TYPE);

    let created = sessions
        .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
        .await
        .expect("owner should get a session");

    clock.set(created.expires_at);
    assert!(sessions.validate_session(&created.session_id).is_ok());
}

/// Repeated polling by the same viewer reuses one session; a different
/// viewer or NFT gets its own.
#[tokio::test]
async fn test_polling_reuses_one_session_per_pair() {
    let chain = Arc::new(MockChain::new());
    let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
    let sessions = manager(chain.clone(), clock.clone(), 60);

    chain.give(addr("0xa11ce"), addr("0x100"), NFT_TYPE);
    chain.give(addr("0xa11ce"), addr("0x101"), NFT_TYPE);
    chain.give(addr("0xb0b"), addr("0x102"), NFT_TYPE);

    let first = sessions
        .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
        .await
        .unwrap();
    for _ in 0..5 {
        clock.advance_secs(5);
        let again = sessions
            .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
            .await
            .unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(sessions.active_session_count().unwrap(), 1);

    sessions
        .create_session(&addr("0xa11ce"), &addr("0x101"), BlobId::new("b"))
        .await
        .unwrap();
    sessions
        .create_session(&addr("0xb0b"), &addr("0x102"), BlobId::new("b"))
        .await
        .unwrap();
    assert_eq!(sessions.active_session_count().unwrap(), 3);
}

/// After expiry a new request mints a fresh session with a new id.
#[tokio::test]
async fn test_renewal_after_expiry_mints_new_session() {
    let chain = Arc::new(MockChain::new());
    let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
    let sessions = manager(chain.clone(), clock.clone(), 60);
    chain.give(addr("0xa11ce"), addr("0x100"), NFT_TYPE);

    let first = sessions
        .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
        .await
        .unwrap();
    clock.advance_secs(61);
    let renewed = sessions
        .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
        .await
        .unwrap();

    assert_ne!(renewed.session_id, first.session_id);
    assert!(renewed.expires_at > first.expires_at);
    assert_eq!(sessions.active_session_count().unwrap(), 1);
    assert_eq!(sessions.cleanup_expired_sessions().unwrap(), 1);
}

/// Selling the NFT stops new sessions; a network failure does too.
#[tokio::test]
async fn test_ownership_gate_fails_closed() {
    let chain = Arc::new(MockChain::new());
    let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
    let sessions = manager(chain.clone(), clock, 60);
    chain.give(addr("0xa11ce"), addr("0x100"), NFT_TYPE);

    chain.fail_reads(true);
    let err = sessions
        .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
        .await
        .expect_err("RPC failure must not grant access");
    assert!(matches!(err, AccessError::NotOwned { .. }));
    assert_eq!(sessions.active_session_count().unwrap(), 0);
}

/// Concurrent creates for the same pair converge on one session, even
/// though each request mints a candidate with its own id.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_converge() {
    let chain = Arc::new(MockChain::new());
    let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
    let sessions = Arc::new(manager(chain.clone(), clock.clone(), 60));
    chain.give(addr("0xa11ce"), addr("0x100"), NFT_TYPE);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let sessions = Arc::clone(&sessions);
        handles.push(tokio::spawn(async move {
            sessions
                .create_session(&addr("0xa11ce"), &addr("0x100"), BlobId::new("b"))
                .await
                .unwrap()
                .session_id
        }));
        clock.advance(chrono::Duration::milliseconds(1));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(sessions.active_session_count().unwrap(), 1);
}

/// Racing `put_or_reuse` calls with distinct candidates for one pair leave
/// exactly one stored session, and every caller gets that session back.
#[test]
fn test_racing_candidates_store_one_session() {
    let user = addr("0xa11ce");
    let nft = addr("0x100");
    let base = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();

    for _ in 0..32 {
        let store = InMemorySessionStore::new();
        let barrier = Barrier::new(16);

        let winners: Vec<SessionId> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let created_at = base + chrono::Duration::milliseconds(i);
                    let candidate = Session {
                        session_id: SessionId::derive(&user, &nft, created_at),
                        user_address: user,
                        nft_id: nft,
                        blob_id: BlobId::new("b"),
                        decryption: SealIdentity::for_nft(addr("0xabc"), &nft, 2),
                        created_at,
                        expires_at: created_at + chrono::Duration::seconds(60),
                    };
                    let store = &store;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        store.put_or_reuse(candidate, base).unwrap().session_id
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(store.len().unwrap(), 1);
        assert!(winners.iter().all(|id| id == &winners[0]));
    }
}
