//! Property-based tests for LedgerService.
//!
//! - Balance integrity: the committed balance equals the sum of accepted
//!   deposits minus accepted withdrawals and is never negative.
//! - Atomicity: a rejected operation leaves the committed balance untouched.

use std::sync::Arc;

use proptest::prelude::*;
use walletd_shared::WalletId;

use super::error::LedgerError;
use super::service::LedgerService;
use crate::store::InMemoryWalletStore;
use crate::wallet::OperationKind;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

fn kind() -> impl Strategy<Value = OperationKind> {
    prop_oneof![Just(OperationKind::Deposit), Just(OperationKind::Withdraw)]
}

/// Amounts including zero and negatives so rejections are exercised.
fn amount() -> impl Strategy<Value = i64> {
    prop_oneof![
        4 => 1i64..5_000,
        1 => -100i64..=0,
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Sequential operations: every outcome matches an in-test model.
    #[test]
    fn prop_sequential_operations_match_model(
        ops in prop::collection::vec((kind(), amount()), 1..40),
    ) {
        let rt = runtime();
        let ledger = LedgerService::new(Arc::new(InMemoryWalletStore::new()));
        let id = WalletId::new();
        let mut model = 0i64;

        for (kind, amount) in ops {
            let result = rt.block_on(ledger.apply_operation(id, kind, amount));
            match (kind, result) {
                (_, Err(LedgerError::InvalidAmount(a))) => prop_assert!(a <= 0 && a == amount),
                (OperationKind::Withdraw, Err(LedgerError::InsufficientBalance { balance, requested, .. })) => {
                    prop_assert_eq!(balance, model);
                    prop_assert!(requested > model);
                }
                (OperationKind::Deposit, Ok(w)) => {
                    model += amount;
                    prop_assert_eq!(w.balance(), model);
                }
                (OperationKind::Withdraw, Ok(w)) => {
                    model -= amount;
                    prop_assert_eq!(w.balance(), model);
                }
                (_, Err(e)) => prop_assert!(false, "unexpected error: {e}"),
            }
            prop_assert!(model >= 0);
        }

        match rt.block_on(ledger.get_balance(id)) {
            Ok(w) => prop_assert_eq!(w.balance(), model),
            Err(LedgerError::WalletNotFound(_)) => prop_assert_eq!(model, 0),
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    /// Concurrent operations: final balance equals accepted deposits minus
    /// accepted withdrawals, whatever order the locks were granted in.
    #[test]
    fn prop_concurrent_operations_conserve_balance(
        ops in prop::collection::vec((kind(), 1i64..100), 1..60),
    ) {
        let rt = runtime();
        let ledger = LedgerService::new(Arc::new(InMemoryWalletStore::new()));
        let id = WalletId::new();

        let outcomes = rt.block_on(async {
            let handles: Vec<_> = ops
                .iter()
                .map(|&(kind, amount)| {
                    let ledger = ledger.clone();
                    tokio::spawn(async move {
                        (kind, amount, ledger.apply_operation(id, kind, amount).await)
                    })
                })
                .collect();
            futures::future::join_all(handles).await
        });

        let mut expected = 0i64;
        for outcome in outcomes {
            let (kind, amount, result) = outcome.unwrap();
            match result {
                Ok(w) => {
                    prop_assert!(w.balance() >= 0);
                    match kind {
                        OperationKind::Deposit => expected += amount,
                        OperationKind::Withdraw => expected -= amount,
                    }
                }
                Err(LedgerError::InsufficientBalance { .. }) => {
                    prop_assert_eq!(kind, OperationKind::Withdraw);
                }
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
        }

        prop_assert!(expected >= 0);
        match rt.block_on(ledger.get_balance(id)) {
            Ok(w) => prop_assert_eq!(w.balance(), expected),
            Err(LedgerError::WalletNotFound(_)) => prop_assert_eq!(expected, 0),
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }
}
