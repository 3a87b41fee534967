//! Postgres implementation of the wallet store.
//!
//! Locking is done by Postgres, not by this process, so several replicas of the
//! service can share one database safely:
//! - `load_for_update` issues `SELECT ... FOR UPDATE`.
//! - An id with no row yet is claimed by inserting a zero-balance row with
//!   `ON CONFLICT DO NOTHING`. A concurrent claimer blocks on the uncommitted
//!   key until the first transaction ends, so first deposits serialize too.
//!   Rolling back removes the claim.
//! - `begin` sets `lock_timeout` for the transaction; lock waits past it fail
//!   with SQLSTATE `55P03`, reported as `StoreError::LockTimeout`.
//! - `begin_read_only` opens a `READ ONLY` transaction, in which Postgres
//!   itself refuses `FOR UPDATE` and writes.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QuerySelect, RuntimeErr, Set, TransactionTrait,
};
use tracing::debug;
use walletd_core::{StoreError, Wallet, WalletStore};
use walletd_shared::WalletId;

use crate::entities::wallets;

/// `lock_not_available`, raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";
/// `check_violation`.
const CHECK_VIOLATION: &str = "23514";

/// Wallet store backed by the `wallets` table.
#[derive(Debug, Clone)]
pub struct PgWalletStore {
    db: DatabaseConnection,
    lock_timeout: Duration,
}

impl PgWalletStore {
    /// Creates a new wallet store.
    #[must_use]
    pub const fn new(db: DatabaseConnection, lock_timeout: Duration) -> Self {
        Self { db, lock_timeout }
    }

    async fn find_locked(
        txn: &DatabaseTransaction,
        id: WalletId,
    ) -> Result<Option<wallets::Model>, DbErr> {
        wallets::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
    }

    /// Inserts a zero-balance row for `id` unless one exists.
    ///
    /// Returns `true` if this transaction inserted (and therefore locks) it.
    async fn claim(txn: &DatabaseTransaction, id: WalletId) -> Result<bool, DbErr> {
        let row = wallets::ActiveModel {
            id: Set(id.into_inner()),
            balance: Set(0),
        };
        let inserted = wallets::Entity::insert(row)
            .on_conflict(OnConflict::column(wallets::Column::Id).do_nothing().to_owned())
            .exec_without_returning(txn)
            .await?;
        Ok(inserted == 1)
    }
}

#[async_trait]
impl WalletStore for PgWalletStore {
    type Tx = DatabaseTransaction;

    async fn begin(&self) -> Result<DatabaseTransaction, StoreError> {
        let txn = self.db.begin().await.map_err(|e| classify(None, e))?;
        txn.execute_unprepared(&lock_timeout_sql(self.lock_timeout))
            .await
            .map_err(|e| classify(None, e))?;
        Ok(txn)
    }

    async fn begin_read_only(&self) -> Result<DatabaseTransaction, StoreError> {
        self.db
            .begin_with_config(None, Some(AccessMode::ReadOnly))
            .await
            .map_err(|e| classify(None, e))
    }

    async fn commit(&self, tx: DatabaseTransaction) -> Result<(), StoreError> {
        tx.commit().await.map_err(|e| classify(None, e))
    }

    async fn rollback(&self, tx: DatabaseTransaction) -> Result<(), StoreError> {
        tx.rollback().await.map_err(|e| classify(None, e))
    }

    async fn load(
        &self,
        tx: &mut DatabaseTransaction,
        id: WalletId,
    ) -> Result<Option<Wallet>, StoreError> {
        wallets::Entity::find_by_id(id.into_inner())
            .one(&*tx)
            .await
            .map_err(|e| classify(Some(id), e))?
            .map(to_wallet)
            .transpose()
    }

    async fn load_for_update(
        &self,
        tx: &mut DatabaseTransaction,
        id: WalletId,
    ) -> Result<Option<Wallet>, StoreError> {
        let txn: &DatabaseTransaction = tx;

        if let Some(row) = Self::find_locked(txn, id)
            .await
            .map_err(|e| classify(Some(id), e))?
        {
            return to_wallet(row).map(Some);
        }

        if Self::claim(txn, id).await.map_err(|e| classify(Some(id), e))? {
            debug!(wallet_id = %id, "Claimed new wallet row");
            return Ok(None);
        }

        // Another transaction created the row while we waited on its key.
        Self::find_locked(txn, id)
            .await
            .map_err(|e| classify(Some(id), e))?
            .map(to_wallet)
            .transpose()?
            .ok_or_else(|| StoreError::Backend(format!("wallet {id} disappeared while locking")))
            .map(Some)
    }

    async fn save(&self, tx: &mut DatabaseTransaction, wallet: &Wallet) -> Result<(), StoreError> {
        let id = wallet.id();
        let row = wallets::ActiveModel {
            id: Set(id.into_inner()),
            balance: Set(wallet.balance()),
        };
        wallets::Entity::insert(row)
            .on_conflict(
                OnConflict::column(wallets::Column::Id)
                    .update_column(wallets::Column::Balance)
                    .to_owned(),
            )
            .exec_without_returning(&*tx)
            .await
            .map_err(|e| classify(Some(id), e))?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.ping().await.map_err(|e| classify(None, e))
    }
}

fn to_wallet(row: wallets::Model) -> Result<Wallet, StoreError> {
    Wallet::new(WalletId::from_uuid(row.id), row.balance)
        .map_err(|e| StoreError::Backend(e.to_string()))
}

fn lock_timeout_sql(timeout: Duration) -> String {
    format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis())
}

/// Extracts the Postgres SQLSTATE from a driver error, if any.
fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e))
        | DbErr::Conn(RuntimeErr::SqlxError(e)) => {
            let e: &sqlx::Error = e;
            e.as_database_error()
                .and_then(|db| db.code())
                .map(std::borrow::Cow::into_owned)
        }
        _ => None,
    }
}

/// True for failures of the transport rather than of the statement.
fn is_connection_failure(err: &DbErr) -> bool {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e)) => {
            let e: &sqlx::Error = e;
            matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        }
        _ => false,
    }
}

/// Maps a `SeaORM` error onto the store's error taxonomy.
fn classify(id: Option<WalletId>, err: DbErr) -> StoreError {
    match (sqlstate(&err).as_deref(), id) {
        (Some(LOCK_NOT_AVAILABLE | DEADLOCK_DETECTED), Some(id)) => StoreError::LockTimeout(id),
        (Some(CHECK_VIOLATION), _) => StoreError::Backend(format!("balance check violated: {err}")),
        _ if is_connection_failure(&err) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_timeout_sql_format() {
        assert_eq!(
            lock_timeout_sql(Duration::from_millis(1500)),
            "SET LOCAL lock_timeout = '1500ms'"
        );
        assert_eq!(
            lock_timeout_sql(Duration::from_secs(5)),
            "SET LOCAL lock_timeout = '5000ms'"
        );
    }

    #[test]
    fn test_connection_errors_are_unavailable() {
        let err = DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout);
        assert!(matches!(classify(None, err), StoreError::Unavailable(_)));
    }

    #[test]
    fn test_other_errors_are_backend() {
        let err = DbErr::Custom("boom".to_string());
        assert!(matches!(classify(Some(WalletId::new()), err), StoreError::Backend(_)));
    }

    #[test]
    fn test_to_wallet_rejects_negative_rows() {
        let row = wallets::Model {
            id: uuid::Uuid::new_v4(),
            balance: -1,
        };
        assert!(matches!(to_wallet(row), Err(StoreError::Backend(_))));
    }
}
