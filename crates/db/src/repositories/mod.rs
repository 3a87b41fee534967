//! Repository implementations for data access.
//!
//! Repositories implement the storage ports declared in `walletd-core`,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod wallet;

pub use wallet::PgWalletStore;
