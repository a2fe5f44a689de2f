//! Sponsored kiosk purchases.

pub mod builder;
pub mod classify;
pub mod orchestrator;
pub mod transaction;

pub use builder::{
    MarketplaceConfig, PurchaseTransactionBuilder, SharedObjectRef, royalty_amount,
};
pub use classify::{MoveAbort, TransactionErrorKind, classify_transaction_error};
pub use orchestrator::{
    PurchaseOrchestrator, PurchaseReceipt, PurchaseRequest, PurchaseResponse,
    extract_purchased_asset,
};
pub use transaction::{
    Argument, Command, Input, MoveCall, PureArg, PurchaseTransaction, TransactionBlock,
};
