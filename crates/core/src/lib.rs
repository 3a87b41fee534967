//! Core business logic for walletd.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the [`store::WalletStore`] port.
//!
//! # Modules
//!
//! - `wallet` - Wallet entity and balance operations
//! - `store` - Persistence port and the in-memory implementation
//! - `ledger` - Atomic operation application

pub mod ledger;
pub mod store;
pub mod wallet;

pub use ledger::{LedgerError, LedgerService};
pub use store::{InMemoryWalletStore, StoreError, WalletStore};
pub use wallet::{Operation, OperationKind, Wallet, WalletError};
