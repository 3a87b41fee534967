//! Ledger error types.
//!
//! This module classifies every failure the ledger can surface: client
//! mistakes, lock contention and storage failures. Storage details are kept
//! for logging but never exposed through [`LedgerError::public_message`].

use thiserror::Error;
use walletd_shared::WalletId;

use crate::store::StoreError;
use crate::wallet::WalletError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount must be strictly positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Withdrawal exceeds the current balance.
    #[error("Insufficient balance in wallet {wallet_id}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// The wallet.
        wallet_id: WalletId,
        /// Balance observed under lock.
        balance: i64,
        /// Requested withdrawal.
        requested: i64,
    },

    /// Deposit would overflow the balance.
    #[error("Deposit of {amount} would overflow wallet {wallet_id}")]
    BalanceOverflow {
        /// The wallet.
        wallet_id: WalletId,
        /// Requested deposit.
        amount: i64,
    },

    // ========== Lookup Errors ==========
    /// Balance query for a wallet that does not exist.
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    // ========== Concurrency Errors ==========
    /// The wallet lock was not acquired before the deadline.
    #[error("Timed out waiting for wallet {0}, please retry")]
    LockTimeout(WalletId),

    // ========== Storage Errors ==========
    /// Storage cannot be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Any other storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Lifts an entity error, attaching the wallet it concerns.
    #[must_use]
    pub fn from_wallet(wallet_id: WalletId, err: WalletError) -> Self {
        match err {
            WalletError::InvalidAmount(amount) => Self::InvalidAmount(amount),
            WalletError::InsufficientBalance { balance, requested } => Self::InsufficientBalance {
                wallet_id,
                balance,
                requested,
            },
            WalletError::BalanceOverflow { amount, .. } => Self::BalanceOverflow { wallet_id, amount },
            WalletError::NegativeBalance(_) => Self::Storage(err.to_string()),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::LockTimeout(_) => "LOCK_TIMEOUT",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::Storage(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount(_)
            | Self::InsufficientBalance { .. }
            | Self::BalanceOverflow { .. } => 400,

            // 404 Not Found
            Self::WalletNotFound(_) => 404,

            // 409 Conflict - contention
            Self::LockTimeout(_) => 409,

            // 503 Service Unavailable
            Self::StorageUnavailable(_) => 503,

            // 500 Internal Server Error
            Self::Storage(_) => 500,
        }
    }

    /// Returns true if retrying the whole operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout(_))
    }

    /// Returns true if the caller caused the error.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InsufficientBalance { .. }
                | Self::BalanceOverflow { .. }
                | Self::WalletNotFound(_)
        )
    }

    /// Message safe to show to API clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidAmount(_) => "Amount must be a positive integer".to_string(),
            Self::InsufficientBalance { .. } => "Insufficient balance".to_string(),
            Self::BalanceOverflow { .. } => "Deposit would overflow the wallet balance".to_string(),
            Self::WalletNotFound(_) => "Wallet not found".to_string(),
            Self::LockTimeout(_) => "Wallet is busy, please retry".to_string(),
            Self::StorageUnavailable(_) => "Service temporarily unavailable".to_string(),
            Self::Storage(_) => "An error occurred".to_string(),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LockTimeout(id) => Self::LockTimeout(id),
            StoreError::Unavailable(msg) => Self::StorageUnavailable(msg),
            StoreError::Backend(msg) => Self::Storage(msg),
        }
    }
}
