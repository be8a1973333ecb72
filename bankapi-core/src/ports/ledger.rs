//! Account ledger port - balance storage abstraction

use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{Balance, BalanceView};

/// One field overwrite produced by a ledger operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerWrite {
    Cash { username: String, cash: Decimal },
    Debt { username: String, debt: Decimal },
}

impl LedgerWrite {
    pub fn cash(username: impl Into<String>, cash: Decimal) -> Self {
        Self::Cash {
            username: username.into(),
            cash,
        }
    }

    pub fn debt(username: impl Into<String>, debt: Decimal) -> Self {
        Self::Debt {
            username: username.into(),
            debt,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Self::Cash { username, .. } | Self::Debt { username, .. } => username,
        }
    }
}

/// Key-value store of account balances
///
/// The ledger has no business rules: it never checks amounts and never
/// sequences concurrent callers. Serializing read-modify-write spans is the
/// caller's job (see `AccountLocks`).
pub trait AccountLedger: Send + Sync {
    /// Whether an account with this username exists
    fn exists(&self, username: &str) -> Result<bool>;

    /// Get cash and debt, `NotFound` if the account does not exist
    fn get_balance(&self, username: &str) -> Result<Balance>;

    /// Overwrite cash, `NotFound` if the account does not exist
    fn set_cash(&self, username: &str, cash: Decimal) -> Result<()>;

    /// Overwrite debt, `NotFound` if the account does not exist
    fn set_debt(&self, username: &str, debt: Decimal) -> Result<()>;

    /// Create an account with zero balances, `AlreadyExists` if taken
    fn create(&self, username: &str, password_hash: &str) -> Result<()>;

    /// All balances ordered by username
    fn list_balances(&self) -> Result<Vec<BalanceView>>;

    /// Apply a batch of writes
    ///
    /// Adapters backed by a transactional store override this so the batch
    /// commits or rolls back as a whole.
    fn apply(&self, writes: &[LedgerWrite]) -> Result<()> {
        for write in writes {
            match write {
                LedgerWrite::Cash { username, cash } => self.set_cash(username, *cash)?,
                LedgerWrite::Debt { username, debt } => self.set_debt(username, *debt)?,
            }
        }
        Ok(())
    }
}
