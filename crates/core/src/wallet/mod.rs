//! Wallet domain: the entity and the operations that mutate it.

pub mod entity;
pub mod operation;

pub use entity::{Wallet, WalletError};
pub use operation::{Operation, OperationKind};
