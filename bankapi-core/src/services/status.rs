//! Status service - ledger totals

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::BalanceView;
use crate::ports::AccountLedger;

/// Status service for ledger summaries
pub struct StatusService {
    ledger: Arc<dyn AccountLedger>,
    bank_account: String,
    fee: Decimal,
}

impl StatusService {
    pub fn new(ledger: Arc<dyn AccountLedger>, bank_account: impl Into<String>, fee: Decimal) -> Self {
        Self {
            ledger,
            bank_account: bank_account.into(),
            fee,
        }
    }

    /// Get overall status summary
    ///
    /// Totals cover user accounts only; the bank's cash is reported as
    /// fees collected.
    pub fn summary(&self) -> Result<StatusSummary> {
        let balances = self.ledger.list_balances()?;
        let (bank, users): (Vec<BalanceView>, Vec<BalanceView>) = balances
            .into_iter()
            .partition(|b| b.username == self.bank_account);

        Ok(StatusSummary {
            total_accounts: users.len() as i64,
            total_cash: users.iter().map(|b| b.cash).sum(),
            total_debt: users.iter().map(|b| b.debt).sum(),
            fees_collected: bank.first().map(|b| b.cash).unwrap_or(Decimal::ZERO),
            fee: self.fee,
            bank_account: self.bank_account.clone(),
            bank_account_exists: !bank.is_empty(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_accounts: i64,
    pub total_cash: Decimal,
    pub total_debt: Decimal,
    pub fees_collected: Decimal,
    pub fee: Decimal,
    pub bank_account: String,
    pub bank_account_exists: bool,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::adapters::memory::MemoryLedger;
    use crate::ports::LedgerWrite;

    #[test]
    fn test_summary_separates_bank() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.create("BANK", "!locked").unwrap();
        ledger.create("alice", "h").unwrap();
        ledger.create("bob", "h").unwrap();
        ledger
            .apply(&[
                LedgerWrite::cash("BANK", dec!(2)),
                LedgerWrite::cash("alice", dec!(49)),
                LedgerWrite::cash("bob", dec!(149)),
                LedgerWrite::debt("bob", dec!(100)),
            ])
            .unwrap();

        let summary = StatusService::new(ledger, "BANK", dec!(1)).summary().unwrap();
        assert_eq!(summary.total_accounts, 2);
        assert_eq!(summary.total_cash, dec!(198));
        assert_eq!(summary.total_debt, dec!(100));
        assert_eq!(summary.fees_collected, dec!(2));
        assert!(summary.bank_account_exists);
    }

    #[test]
    fn test_summary_of_empty_ledger() {
        let summary = StatusService::new(Arc::new(MemoryLedger::new()), "BANK", dec!(1))
            .summary()
            .unwrap();
        assert_eq!(summary.total_accounts, 0);
        assert_eq!(summary.fees_collected, Decimal::ZERO);
        assert!(!summary.bank_account_exists);
    }
}
