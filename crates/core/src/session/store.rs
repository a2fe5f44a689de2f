//! Session storage contract and the in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::types::{Address, ObjectId, Session, SessionId};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage for access sessions.
///
/// Shared by every request; implementations must be safe for concurrent
/// read/insert/delete. Not persistent unless the backend says otherwise.
pub trait SessionStore: Send + Sync {
    /// Load a session by id, expired or not.
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Insert or replace a session.
    fn put(&self, session: Session) -> StoreResult<()>;

    /// Remove a session. Returns whether it existed.
    fn delete(&self, session_id: &SessionId) -> StoreResult<bool>;

    /// Remove every session with `expires_at < now`. Returns how many went.
    fn sweep(&self, now: DateTime<Utc>) -> StoreResult<usize>;

    /// A session for `(user, nft_id)` still valid at `now`.
    fn find_live(
        &self,
        user: &Address,
        nft_id: &ObjectId,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Session>>;

    /// Number of sessions valid at `now`, counted live.
    fn count_live(&self, now: DateTime<Utc>) -> StoreResult<usize>;

    /// Return the live session for the candidate's `(user, nft_id)` pair if
    /// one exists, otherwise store the candidate and return it.
    ///
    /// The default is not atomic; backends that can should override it.
    fn put_or_reuse(&self, candidate: Session, now: DateTime<Utc>) -> StoreResult<Session> {
        if let Some(existing) = self.find_live(&candidate.user_address, &candidate.nft_id, now)? {
            return Ok(existing);
        }
        self.put(candidate.clone())?;
        Ok(candidate)
    }
}

/// In-memory session store.
///
/// Thread-safe but not persistent across process restarts.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    /// Create a new empty in-memory session store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Total entries, including expired ones not yet swept.
    pub fn len(&self) -> StoreResult<usize> {
        let sessions = self.sessions.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(sessions.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn live_match<'a>(
    sessions: &'a HashMap<SessionId, Session>,
    user: &Address,
    nft_id: &ObjectId,
    now: DateTime<Utc>,
) -> Option<&'a Session> {
    sessions
        .values()
        .filter(|session| session.matches(user, nft_id) && session.is_valid_at(now))
        .max_by_key(|session| session.expires_at)
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let sessions = self.sessions.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(sessions.get(session_id).cloned())
    }

    fn put(&self, session: Session) -> StoreResult<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<bool> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(sessions.remove(session_id).is_some())
    }

    fn sweep(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_valid_at(now));
        Ok(before - sessions.len())
    }

    fn find_live(
        &self,
        user: &Address,
        nft_id: &ObjectId,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Session>> {
        let sessions = self.sessions.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(live_match(&sessions, user, nft_id, now).cloned())
    }

    fn count_live(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let sessions = self.sessions.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(sessions
            .values()
            .filter(|session| session.is_valid_at(now))
            .count())
    }

    // Check and insert under one write lock so concurrent requests for the
    // same pair cannot both mint a session.
    fn put_or_reuse(&self, candidate: Session, now: DateTime<Utc>) -> StoreResult<Session> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;

        if let Some(existing) =
            live_match(&sessions, &candidate.user_address, &candidate.nft_id, now)
        {
            return Ok(existing.clone());
        }

        sessions.insert(candidate.session_id.clone(), candidate.clone());
        Ok(candidate)
    }
}
