//! Wallet entity and its balance rules.
//!
//! The entity is a transient value: it is loaded, mutated and saved within one
//! ledger transaction. Every mutation either succeeds completely or leaves the
//! wallet untouched.

use thiserror::Error;
use walletd_shared::WalletId;

use super::operation::{Operation, OperationKind};

/// Errors raised by wallet mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// Amount was zero or negative.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Withdrawal exceeds the current balance.
    #[error("Insufficient balance: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// Balance at the time of the request.
        balance: i64,
        /// Requested withdrawal.
        requested: i64,
    },

    /// Deposit would overflow the balance type.
    #[error("Deposit of {amount} would overflow balance {balance}")]
    BalanceOverflow {
        /// Balance at the time of the request.
        balance: i64,
        /// Requested deposit.
        amount: i64,
    },

    /// A balance below zero was supplied when constructing a wallet.
    #[error("Balance cannot be negative, got {0}")]
    NegativeBalance(i64),
}

/// A wallet: identity plus a non-negative balance in minimal currency units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    id: WalletId,
    balance: i64,
}

impl Wallet {
    /// Builds a wallet from stored state.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::NegativeBalance` if `balance < 0`.
    pub const fn new(id: WalletId, balance: i64) -> Result<Self, WalletError> {
        if balance < 0 {
            return Err(WalletError::NegativeBalance(balance));
        }
        Ok(Self { id, balance })
    }

    /// A wallet that has never been funded.
    #[must_use]
    pub const fn empty(id: WalletId) -> Self {
        Self { id, balance: 0 }
    }

    /// Wallet identifier.
    #[must_use]
    pub const fn id(&self) -> WalletId {
        self.id
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> i64 {
        self.balance
    }

    /// Adds `amount` to the balance.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount <= 0`, `BalanceOverflow` if the sum does not fit.
    pub fn deposit(&mut self, amount: i64) -> Result<(), WalletError> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow {
                balance: self.balance,
                amount,
            })?;
        Ok(())
    }

    /// Subtracts `amount` from the balance.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount <= 0`, `InsufficientBalance` if `amount > balance`.
    pub fn withdraw(&mut self, amount: i64) -> Result<(), WalletError> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }
        if amount > self.balance {
            return Err(WalletError::InsufficientBalance {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Applies an operation by dispatching on its kind.
    ///
    /// # Errors
    ///
    /// Same as [`Wallet::deposit`] / [`Wallet::withdraw`].
    pub fn apply(&mut self, operation: Operation) -> Result<(), WalletError> {
        match operation.kind {
            OperationKind::Deposit => self.deposit(operation.amount),
            OperationKind::Withdraw => self.withdraw(operation.amount),
        }
    }
}
