//! Persistence port for wallets.
//!
//! The ledger talks to storage only through [`WalletStore`]. Every data call
//! takes the caller's transaction explicitly, so a load, the mutation and the
//! save that follows are guaranteed to share one unit of work.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use walletd_shared::WalletId;

use crate::wallet::Wallet;

pub use memory::InMemoryWalletStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The wallet lock could not be acquired before the deadline.
    #[error("Timed out waiting for lock on wallet {0}")]
    LockTimeout(WalletId),

    /// The backend cannot be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure (constraint violations included).
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Transactional storage for wallets.
///
/// Contract:
/// - `load_for_update` holds an exclusive lock on `id` until the transaction
///   ends. A second transaction calling it for the same id waits, then sees the
///   committed result of the first. This also applies to ids with no stored
///   wallet yet; such a claim disappears on rollback.
/// - `save` must be called with the transaction that locked the wallet.
/// - Dropping a transaction without committing discards its writes.
/// - A read-only transaction takes no locks and writes nothing.
#[async_trait]
pub trait WalletStore: Send + Sync + 'static {
    /// Unit-of-work handle threaded through every call.
    type Tx: Send;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Opens a transaction that may only `load`.
    ///
    /// `load_for_update` and `save` fail inside it.
    async fn begin_read_only(&self) -> Result<Self::Tx, StoreError>;

    /// Commits and releases every lock held by `tx`.
    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Discards all writes and releases every lock held by `tx`.
    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Reads a wallet without locking it.
    async fn load(&self, tx: &mut Self::Tx, id: WalletId) -> Result<Option<Wallet>, StoreError>;

    /// Reads a wallet and locks it for the rest of `tx`.
    async fn load_for_update(
        &self,
        tx: &mut Self::Tx,
        id: WalletId,
    ) -> Result<Option<Wallet>, StoreError>;

    /// Inserts or updates the wallet's balance.
    async fn save(&self, tx: &mut Self::Tx, wallet: &Wallet) -> Result<(), StoreError>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
