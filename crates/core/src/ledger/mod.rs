//! Wallet ledger.
//!
//! This module implements the operation-application protocol:
//! - Error taxonomy for ledger operations
//! - Ledger service running lock-mutate-save-commit as one transaction

pub mod error;
pub mod service;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use service::LedgerService;
