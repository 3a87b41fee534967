//! Wallets migration.
//!
//! Creates the single table the ledger persists to. The check constraint backs
//! up the non-negative balance rule enforced by the wallet entity.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(WALLETS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS wallets CASCADE;")
            .await?;
        Ok(())
    }
}

const WALLETS_SQL: &str = r"
-- One row per wallet, balance in minimal currency units
CREATE TABLE wallets (
    id UUID PRIMARY KEY,
    balance BIGINT NOT NULL DEFAULT 0,
    CONSTRAINT chk_wallets_balance_non_negative CHECK (balance >= 0)
);

COMMENT ON TABLE wallets IS 'User wallets';
COMMENT ON COLUMN wallets.balance IS 'Current balance in minimal currency units';
";
