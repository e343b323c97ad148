//! # Error Types

use keep_core::errors::KeepError;
use keep_types::{Address, TokenId, U256};
use thiserror::Error;

/// Errors returned by the redemption calculator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RedemptionError {
    /// No start time recorded for the `(unit, id)` pair, or it is in the future.
    #[error("redemption of token {id} on {unit} has not started")]
    RedemptionNotStarted {
        /// Unit.
        unit: Address,
        /// Token id.
        id: TokenId,
    },

    /// Asset list not strictly ascending.
    #[error("asset {asset} does not follow {previous}")]
    InvalidAssetOrder {
        /// Previous asset.
        previous: Address,
        /// Offending asset.
        asset: Address,
    },

    /// Nothing in circulation to redeem against.
    #[error("token {0} has no supply")]
    EmptySupply(TokenId),

    /// The unit refused the burn.
    #[error("burn rejected: {0}")]
    Burn(#[from] KeepError),

    /// An asset transfer failed.
    #[error("asset transfer failed: {0}")]
    Asset(#[from] AssetError),
}

/// Errors from the asset ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Holder balance too small.
    #[error("insufficient {asset} balance for {owner}: have {balance}, need {required}")]
    InsufficientBalance {
        /// Asset.
        asset: Address,
        /// Holder.
        owner: Address,
        /// Current balance.
        balance: U256,
        /// Amount requested.
        required: U256,
    },

    /// Spender allowance too small.
    #[error("insufficient {asset} allowance from {owner} to {spender}")]
    InsufficientAllowance {
        /// Asset.
        asset: Address,
        /// Holder.
        owner: Address,
        /// Spender.
        spender: Address,
    },
}
