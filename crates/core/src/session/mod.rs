//! Access sessions: storage contract and lifecycle.

pub mod manager;
pub mod store;

pub use manager::{SessionConfig, SessionManager};
pub use store::{InMemorySessionStore, SessionStore, StoreResult};
