//! In-memory wallet store.
//!
//! Intended for tests/dev. Each wallet id owns an async mutex; a transaction
//! keeps the guard for every id it loaded for update and applies its staged
//! balances on commit, before the guards are released. A mutex is dropped from
//! the lock table once its last holder or waiter is gone, so the table only
//! grows with contended ids, not with every id ever touched.
//!
//! Balances themselves are never evicted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use walletd_shared::WalletId;

use super::{StoreError, WalletStore};
use crate::wallet::Wallet;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Wallet store backed by process memory.
#[derive(Debug)]
pub struct InMemoryWalletStore {
    balances: DashMap<WalletId, i64>,
    locks: DashMap<WalletId, Arc<Mutex<()>>>,
    lock_timeout: Duration,
}

/// Transaction handle for [`InMemoryWalletStore`].
#[derive(Debug, Default)]
pub struct MemoryTx {
    guards: HashMap<WalletId, OwnedMutexGuard<()>>,
    staged: HashMap<WalletId, i64>,
    read_only: bool,
}

impl InMemoryWalletStore {
    /// Creates an empty store with the default lock timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates an empty store whose lock waits give up after `lock_timeout`.
    #[must_use]
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            balances: DashMap::new(),
            locks: DashMap::new(),
            lock_timeout,
        }
    }

    fn committed(&self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        self.balances
            .get(&id)
            .map(|balance| Wallet::new(id, *balance))
            .transpose()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Drops lock table entries nobody holds or waits on.
    fn release(&self, ids: impl IntoIterator<Item = WalletId>) {
        for id in ids {
            self.locks.remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
        }
    }

    fn visible(&self, tx: &MemoryTx, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        match tx.staged.get(&id) {
            Some(balance) => Wallet::new(id, *balance)
                .map(Some)
                .map_err(|e| StoreError::Backend(e.to_string())),
            None => self.committed(id),
        }
    }
}

impl Default for InMemoryWalletStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx::default())
    }

    async fn begin_read_only(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx {
            read_only: true,
            ..MemoryTx::default()
        })
    }

    async fn commit(&self, tx: MemoryTx) -> Result<(), StoreError> {
        let MemoryTx { guards, staged, .. } = tx;
        for (id, balance) in staged {
            self.balances.insert(id, balance);
        }
        let ids: Vec<WalletId> = guards.keys().copied().collect();
        drop(guards);
        self.release(ids);
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<(), StoreError> {
        let ids: Vec<WalletId> = tx.guards.keys().copied().collect();
        drop(tx);
        self.release(ids);
        Ok(())
    }

    async fn load(&self, tx: &mut MemoryTx, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        self.visible(tx, id)
    }

    async fn load_for_update(
        &self,
        tx: &mut MemoryTx,
        id: WalletId,
    ) -> Result<Option<Wallet>, StoreError> {
        if tx.read_only {
            return Err(StoreError::Backend(format!(
                "wallet {id} locked in a read-only transaction"
            )));
        }
        if !tx.guards.contains_key(&id) {
            let lock = self.locks.entry(id).or_default().clone();
            let acquired = tokio::time::timeout(self.lock_timeout, lock.lock_owned()).await;
            let Ok(guard) = acquired else {
                self.release([id]);
                return Err(StoreError::LockTimeout(id));
            };
            tx.guards.insert(id, guard);
        }
        self.visible(tx, id)
    }

    async fn save(&self, tx: &mut MemoryTx, wallet: &Wallet) -> Result<(), StoreError> {
        let id = wallet.id();
        if tx.read_only {
            return Err(StoreError::Backend(format!(
                "wallet {id} saved in a read-only transaction"
            )));
        }
        if !tx.guards.contains_key(&id) {
            return Err(StoreError::Backend(format!(
                "wallet {id} saved without holding its lock"
            )));
        }
        if wallet.balance() < 0 {
            return Err(StoreError::Backend(format!(
                "balance check violated for wallet {id}"
            )));
        }
        tx.staged.insert(id, wallet.balance());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
