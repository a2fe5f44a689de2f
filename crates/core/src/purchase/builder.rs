//! Builds the atomic sponsored-purchase transaction.
//!
//! Command order (one transaction, all or nothing):
//!
//! ```text
//! 0. SplitCoins(gas, [price, royalty])               → payment, royalty coin
//! 1. 0x2::kiosk::purchase<T>(kiosk, nft_id, payment) → (item, request)
//! 2. <rule>::royalty_rule::pay<T>(policy, request, royalty coin)
//! 3. 0x2::transfer_policy::confirm_request<T>(policy, request)
//! 4. TransferObjects([item], buyer)
//! ```
//!
//! The 70/25/5 revenue split lives in the transfer policy's rule and is not
//! passed per purchase.

use crate::error::ConfigError;
use crate::purchase::transaction::{
    Argument, Command, MoveCall, PureArg, PurchaseTransaction, TransactionBlock, nested,
};
use crate::types::{Address, Listing, ObjectId};

pub const KIOSK_MODULE: &str = "kiosk";
pub const KIOSK_PURCHASE: &str = "purchase";
pub const ROYALTY_RULE_MODULE: &str = "royalty_rule";
pub const ROYALTY_RULE_PAY: &str = "pay";
pub const TRANSFER_POLICY_MODULE: &str = "transfer_policy";
pub const TRANSFER_POLICY_CONFIRM: &str = "confirm_request";

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Shared object addressed by id and initial shared version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedObjectRef {
    pub id: ObjectId,
    pub initial_shared_version: u64,
}

/// Static marketplace object references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceConfig {
    /// Package defining the NFT type.
    pub package_id: ObjectId,
    /// Fully qualified NFT struct type (`0x..::module::Struct`).
    pub nft_type: String,
    /// Shared kiosk holding the listings.
    pub kiosk: SharedObjectRef,
    /// Shared transfer policy for the NFT type.
    pub transfer_policy: SharedObjectRef,
    /// Package providing `royalty_rule::pay`.
    pub royalty_rule_package_id: ObjectId,
    /// Revenue-split payment as a share of the price.
    pub royalty_bps: u16,
    /// Smallest payment the royalty rule accepts.
    pub royalty_min_mist: u64,
}

impl MarketplaceConfig {
    pub const DEFAULT_ROYALTY_BPS: u16 = 1_000;
    pub const DEFAULT_ROYALTY_MIN_MIST: u64 = 0;

    /// Default NFT type for a package: `<package>::athlete_nft::AthleteNFT`.
    pub fn default_nft_type(package_id: &ObjectId) -> String {
        format!("{}::athlete_nft::AthleteNFT", package_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parts: Vec<&str> = self.nft_type.split("::").collect();
        if parts.len() != 3
            || Address::parse(parts[0]).is_err()
            || parts[1].is_empty()
            || parts[2].is_empty()
        {
            return Err(ConfigError::Invalid {
                key: "NFT_TYPE",
                reason: format!("expected 0x<package>::<module>::<Struct>, got {}", self.nft_type),
            });
        }

        if self.kiosk.initial_shared_version == 0 {
            return Err(ConfigError::Invalid {
                key: "KIOSK_INITIAL_SHARED_VERSION",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.transfer_policy.initial_shared_version == 0 {
            return Err(ConfigError::Invalid {
                key: "TRANSFER_POLICY_INITIAL_SHARED_VERSION",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.royalty_bps == 0 || u64::from(self.royalty_bps) > BPS_DENOMINATOR {
            return Err(ConfigError::Invalid {
                key: "ROYALTY_BPS",
                reason: format!("must be within 1..={}", BPS_DENOMINATOR),
            });
        }

        Ok(())
    }
}

/// Revenue-split payment owed for `price_mist`: `price * bps / 10_000`,
/// truncated, never below `min_mist`.
///
/// `royalty_rule::pay` requires the coin to equal this value exactly.
pub fn royalty_amount(price_mist: u64, royalty_bps: u16, min_mist: u64) -> u64 {
    let owed = u128::from(price_mist) * u128::from(royalty_bps) / u128::from(BPS_DENOMINATOR);
    // bps <= 10_000, so the quotient never exceeds the price
    (owed as u64).max(min_mist)
}

/// Pure transaction construction; no I/O.
#[derive(Debug, Clone)]
pub struct PurchaseTransactionBuilder {
    config: MarketplaceConfig,
}

impl PurchaseTransactionBuilder {
    /// Fails if any object reference is unset or malformed.
    pub fn new(config: MarketplaceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    pub fn build_purchase_transaction(
        &self,
        buyer: &Address,
        listing: &Listing,
    ) -> PurchaseTransaction {
        let config = &self.config;
        let royalty_mist = royalty_amount(
            listing.price_mist,
            config.royalty_bps,
            config.royalty_min_mist,
        );
        let nft_type = vec![config.nft_type.clone()];

        let mut tx = TransactionBlock::new();

        let kiosk = tx.shared_object(config.kiosk.id, config.kiosk.initial_shared_version, true);
        let policy = tx.shared_object(
            config.transfer_policy.id,
            config.transfer_policy.initial_shared_version,
            true,
        );
        let nft_id = tx.pure(PureArg::Id(listing.nft_id));
        let price = tx.pure(PureArg::U64(listing.price_mist));
        let royalty = tx.pure(PureArg::U64(royalty_mist));
        let recipient = tx.pure(PureArg::Address(*buyer));

        let coins = tx.command(Command::SplitCoins {
            coin: Argument::GasCoin,
            amounts: vec![price, royalty],
        });
        let payment = nested(coins, 0);
        let royalty_coin = nested(coins, 1);

        let purchased = tx.command(Command::MoveCall(MoveCall {
            package: Address::FRAMEWORK,
            module: KIOSK_MODULE.to_string(),
            function: KIOSK_PURCHASE.to_string(),
            type_arguments: nft_type.clone(),
            arguments: vec![kiosk, nft_id, payment],
        }));
        let item = nested(purchased, 0);
        let request = nested(purchased, 1);

        tx.command(Command::MoveCall(MoveCall {
            package: config.royalty_rule_package_id,
            module: ROYALTY_RULE_MODULE.to_string(),
            function: ROYALTY_RULE_PAY.to_string(),
            type_arguments: nft_type.clone(),
            arguments: vec![policy, request, royalty_coin],
        }));

        tx.command(Command::MoveCall(MoveCall {
            package: Address::FRAMEWORK,
            module: TRANSFER_POLICY_MODULE.to_string(),
            function: TRANSFER_POLICY_CONFIRM.to_string(),
            type_arguments: nft_type,
            arguments: vec![policy, request],
        }));

        tx.command(Command::TransferObjects {
            objects: vec![item],
            recipient,
        });

        let (inputs, commands) = tx.finish();
        PurchaseTransaction {
            buyer: *buyer,
            nft_id: listing.nft_id,
            price_mist: listing.price_mist,
            royalty_mist,
            inputs,
            commands,
        }
    }
}
