//! Balance operations requested by clients.

use serde::{Deserialize, Serialize};

/// Kind of balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    /// Add funds to the wallet.
    Deposit,
    /// Remove funds from the wallet.
    Withdraw,
}

impl OperationKind {
    /// Wire name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdraw => "WITHDRAW",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested deposit or withdrawal. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// What to do.
    pub kind: OperationKind,
    /// Amount in minimal currency units. Must be strictly positive to be applied.
    pub amount: i64,
}

impl Operation {
    /// Deposit of `amount`.
    #[must_use]
    pub const fn deposit(amount: i64) -> Self {
        Self {
            kind: OperationKind::Deposit,
            amount,
        }
    }

    /// Withdrawal of `amount`.
    #[must_use]
    pub const fn withdraw(amount: i64) -> Self {
        Self {
            kind: OperationKind::Withdraw,
            amount,
        }
    }
}
