//! Doctor service - ledger health checks

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::domain::result::Result;
use crate::domain::BalanceView;
use crate::ports::AccountLedger;

/// Doctor service for health checks
pub struct DoctorService {
    ledger: Arc<dyn AccountLedger>,
    bank_account: String,
}

impl DoctorService {
    pub fn new(ledger: Arc<dyn AccountLedger>, bank_account: impl Into<String>) -> Self {
        Self {
            ledger,
            bank_account: bank_account.into(),
        }
    }

    /// Run all health checks
    pub fn run_checks(&self) -> Result<DoctorResult> {
        let mut checks = BTreeMap::new();
        let balances = self.ledger.list_balances()?;

        // Fee collector must exist or every deposit and transfer fails
        let bank_exists = balances.iter().any(|b| b.username == self.bank_account);
        checks.insert("bank_account".to_string(), CheckResult {
            status: if bank_exists { "pass" } else { "error" }.to_string(),
            message: if bank_exists {
                format!("Fee account '{}' exists", self.bank_account)
            } else {
                format!("Fee account '{}' is missing", self.bank_account)
            },
            details: None,
        });

        // Transfers only require positive cash, so overdrawn accounts can occur
        let overdrawn = users_where(&balances, |b| b.cash < Decimal::ZERO);
        checks.insert("negative_cash".to_string(), CheckResult {
            status: if overdrawn.is_empty() { "pass" } else { "warning" }.to_string(),
            message: if overdrawn.is_empty() {
                "No account has negative cash".to_string()
            } else {
                format!("{} account(s) have negative cash", overdrawn.len())
            },
            details: if overdrawn.is_empty() { None } else { Some(overdrawn) },
        });

        // Paying more than owed leaves debt below zero
        let overpaid = users_where(&balances, |b| b.debt < Decimal::ZERO);
        checks.insert("negative_debt".to_string(), CheckResult {
            status: if overpaid.is_empty() { "pass" } else { "warning" }.to_string(),
            message: if overpaid.is_empty() {
                "No account has negative debt".to_string()
            } else {
                format!("{} account(s) have paid back more than they borrowed", overpaid.len())
            },
            details: if overpaid.is_empty() { None } else { Some(overpaid) },
        });

        // Calculate summary
        let passed = checks.values().filter(|c| c.status == "pass").count() as i64;
        let warnings = checks.values().filter(|c| c.status == "warning").count() as i64;
        let errors = checks.values().filter(|c| c.status == "error").count() as i64;

        Ok(DoctorResult {
            checks,
            summary: DoctorSummary { passed, warnings, errors },
        })
    }
}

fn users_where<F>(balances: &[BalanceView], predicate: F) -> Vec<serde_json::Value>
where
    F: Fn(&BalanceView) -> bool,
{
    balances
        .iter()
        .filter(|b| predicate(b))
        .map(|b| json!({"username": b.username, "cash": b.cash, "debt": b.debt}))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct DoctorResult {
    pub checks: BTreeMap<String, CheckResult>,
    pub summary: DoctorSummary,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub struct DoctorSummary {
    pub passed: i64,
    pub warnings: i64,
    pub errors: i64,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::adapters::memory::MemoryLedger;
    use crate::ports::LedgerWrite;

    #[test]
    fn test_healthy_ledger_passes() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.create("BANK", "!locked").unwrap();
        ledger.create("alice", "h").unwrap();

        let result = DoctorService::new(ledger, "BANK").run_checks().unwrap();
        assert_eq!(result.summary.passed, 3);
        assert_eq!(result.summary.warnings, 0);
        assert_eq!(result.summary.errors, 0);
    }

    #[test]
    fn test_missing_bank_and_negative_balances() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.create("alice", "h").unwrap();
        ledger
            .apply(&[LedgerWrite::cash("alice", dec!(-5)), LedgerWrite::debt("alice", dec!(-1))])
            .unwrap();

        let result = DoctorService::new(ledger, "BANK").run_checks().unwrap();
        assert_eq!(result.checks["bank_account"].status, "error");
        assert_eq!(result.checks["negative_cash"].status, "warning");
        assert_eq!(result.checks["negative_debt"].status, "warning");

        let details = result.checks["negative_cash"].details.as_ref().unwrap();
        assert_eq!(details[0]["username"], "alice");
        assert_eq!(result.summary.errors, 1);
        assert_eq!(result.summary.warnings, 2);
    }
}
