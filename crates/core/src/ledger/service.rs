//! Ledger service: applies wallet operations atomically.
//!
//! Every mutation runs as one transaction:
//! 1. Validate the amount (before touching storage)
//! 2. Load the wallet for update, or start from an empty wallet
//! 3. Apply the operation in memory
//! 4. Save within the same transaction
//! 5. Commit, or roll back on any failure
//!
//! The lock taken in step 2 is held until step 5, so concurrent operations on
//! one wallet serialize in lock-acquisition order.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use walletd_shared::WalletId;

use super::error::LedgerError;
use crate::store::WalletStore;
use crate::wallet::{Operation, OperationKind, Wallet};

/// Ledger service over any [`WalletStore`].
pub struct LedgerService<S> {
    store: Arc<S>,
}

impl<S> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: WalletStore> LedgerService<S> {
    /// Creates a ledger service over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns a snapshot of the wallet, read in a read-only transaction.
    ///
    /// # Errors
    ///
    /// `WalletNotFound` if no wallet exists for `id`, or a storage error.
    pub async fn get_balance(&self, id: WalletId) -> Result<Wallet, LedgerError> {
        let mut tx = self
            .store
            .begin_read_only()
            .await
            .map_err(|e| self.storage_failure(id, e.into()))?;

        let outcome = self.store.load(&mut tx, id).await;
        let loaded = match outcome {
            Ok(loaded) => loaded,
            Err(e) => {
                self.discard(tx, id).await;
                return Err(self.storage_failure(id, e.into()));
            }
        };
        self.store
            .commit(tx)
            .await
            .map_err(|e| self.storage_failure(id, e.into()))?;

        loaded.ok_or_else(|| {
            debug!(wallet_id = %id, "Wallet not found");
            LedgerError::WalletNotFound(id)
        })
    }

    /// Applies a deposit or withdrawal and returns the committed wallet.
    ///
    /// Unknown wallets start at balance 0, so a deposit creates the wallet and
    /// a withdrawal fails with `InsufficientBalance`.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `InsufficientBalance`, `BalanceOverflow`, `LockTimeout`
    /// or a storage error. Nothing is persisted on error.
    pub async fn apply_operation(
        &self,
        id: WalletId,
        kind: OperationKind,
        amount: i64,
    ) -> Result<Wallet, LedgerError> {
        if amount <= 0 {
            warn!(wallet_id = %id, operation = %kind, amount, "Rejected non-positive amount");
            return Err(LedgerError::InvalidAmount(amount));
        }
        let operation = Operation { kind, amount };

        let mut tx = self.store.begin().await.map_err(|e| self.storage_failure(id, e.into()))?;

        let outcome = self.mutate(&mut tx, id, operation).await;
        let wallet = match outcome {
            Ok(wallet) => wallet,
            Err(e) => {
                self.discard(tx, id).await;
                return Err(self.report(id, operation, e));
            }
        };

        self.store
            .commit(tx)
            .await
            .map_err(|e| self.report(id, operation, e.into()))?;

        info!(
            wallet_id = %id,
            operation = %kind,
            amount,
            balance = wallet.balance(),
            "Operation applied"
        );
        Ok(wallet)
    }

    /// Checks that storage is reachable.
    ///
    /// # Errors
    ///
    /// Returns the storage error mapped to a `LedgerError`.
    pub async fn health(&self) -> Result<(), LedgerError> {
        self.store.ping().await.map_err(LedgerError::from)
    }

    /// Steps 2-4: lock, mutate, save. The caller owns commit/rollback.
    async fn mutate(
        &self,
        tx: &mut S::Tx,
        id: WalletId,
        operation: Operation,
    ) -> Result<Wallet, LedgerError> {
        let mut wallet = self
            .store
            .load_for_update(tx, id)
            .await?
            .unwrap_or_else(|| Wallet::empty(id));

        wallet
            .apply(operation)
            .map_err(|e| LedgerError::from_wallet(id, e))?;

        self.store.save(tx, &wallet).await?;
        Ok(wallet)
    }

    async fn discard(&self, tx: S::Tx, id: WalletId) {
        if let Err(e) = self.store.rollback(tx).await {
            error!(wallet_id = %id, error = %e, "Rollback failed");
        }
    }

    fn report(&self, id: WalletId, operation: Operation, err: LedgerError) -> LedgerError {
        if err.is_client_error() {
            warn!(
                wallet_id = %id,
                operation = %operation.kind,
                amount = operation.amount,
                error = %err,
                "Operation rejected"
            );
            err
        } else {
            self.storage_failure(id, err)
        }
    }

    #[allow(clippy::unused_self)]
    fn storage_failure(&self, id: WalletId, err: LedgerError) -> LedgerError {
        if err.is_retryable() {
            warn!(wallet_id = %id, error = %err, "Lock contention");
        } else {
            error!(wallet_id = %id, error = %err, "Storage failure");
        }
        err
    }
}
