//! Transaction engine - the money-movement operations
//!
//! Every mutating operation follows the same shape:
//!
//! 1. Authenticate through the credential gate (nothing is locked yet)
//! 2. Claim every account the operation touches, BANK included
//! 3. Read balances and check preconditions under the claim
//! 4. Hand the resulting writes to the ledger as one batch
//!
//! A failed precondition returns before step 4, so rejected requests never
//! write anything. That includes a change that would push a balance past
//! [`MAX_BALANCE`], which fails with [`Error::BalanceLimit`].

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::gate::CredentialGate;
use super::locks::AccountLocks;
use crate::domain::result::{Error, Result};
use crate::domain::{
    shift_amount, Balance, BalanceView, Request, BANK_USERNAME, LOCKED_PASSWORD_HASH, MAX_BALANCE,
};
use crate::ports::{AccountLedger, LedgerWrite};

/// Fee charged on every deposit and transfer unless configured otherwise
pub const DEFAULT_FEE: Decimal = Decimal::ONE;

/// Balance changes staged against fresh reads
///
/// Reads are cached so an account touched twice in one operation (a
/// self-transfer, or BANK depositing into itself) sees its own earlier
/// change.
struct StagedWrites<'a> {
    ledger: &'a dyn AccountLedger,
    balances: BTreeMap<String, Balance>,
    writes: Vec<LedgerWrite>,
}

impl<'a> StagedWrites<'a> {
    fn new(ledger: &'a dyn AccountLedger) -> Self {
        Self {
            ledger,
            balances: BTreeMap::new(),
            writes: Vec::new(),
        }
    }

    fn balance(&mut self, username: &str) -> Result<Balance> {
        if let Some(balance) = self.balances.get(username) {
            return Ok(*balance);
        }
        let balance = self.ledger.get_balance(username)?;
        self.balances.insert(username.to_string(), balance);
        Ok(balance)
    }

    fn add_cash(&mut self, username: &str, delta: Decimal) -> Result<()> {
        let mut balance = self.balance(username)?;
        balance.cash = shift_amount(balance.cash, delta).ok_or(Error::BalanceLimit)?;
        self.balances.insert(username.to_string(), balance);
        self.writes.push(LedgerWrite::cash(username, balance.cash));
        Ok(())
    }

    fn add_debt(&mut self, username: &str, delta: Decimal) -> Result<()> {
        let mut balance = self.balance(username)?;
        balance.debt = shift_amount(balance.debt, delta).ok_or(Error::BalanceLimit)?;
        self.balances.insert(username.to_string(), balance);
        self.writes.push(LedgerWrite::debt(username, balance.debt));
        Ok(())
    }

    fn commit(self) -> Result<()> {
        self.ledger.apply(&self.writes)
    }
}

/// Executes ledger operations with per-account serialization
pub struct TransactionEngine {
    ledger: Arc<dyn AccountLedger>,
    gate: CredentialGate,
    locks: AccountLocks,
    fee: Decimal,
    bank_account: String,
}

impl TransactionEngine {
    pub fn new(ledger: Arc<dyn AccountLedger>, gate: CredentialGate) -> Self {
        Self {
            ledger,
            gate,
            locks: AccountLocks::new(),
            fee: DEFAULT_FEE,
            bank_account: BANK_USERNAME.to_string(),
        }
    }

    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_bank_account(mut self, bank_account: impl Into<String>) -> Self {
        self.bank_account = bank_account.into();
        self
    }

    pub fn fee(&self) -> Decimal {
        self.fee
    }

    pub fn bank_account(&self) -> &str {
        &self.bank_account
    }

    pub fn ledger(&self) -> &Arc<dyn AccountLedger> {
        &self.ledger
    }

    fn less_fee(&self, amount: Decimal) -> Result<Decimal> {
        amount
            .checked_sub(self.fee)
            .filter(|net| net.abs() <= MAX_BALANCE)
            .ok_or(Error::BalanceLimit)
    }

    /// Create the fee-collecting account if it does not exist yet
    ///
    /// Without a password the account gets a hash that never verifies.
    /// Returns whether the account was created.
    pub fn ensure_bank_account(&self, password: Option<&str>) -> Result<bool> {
        let _guard = self.locks.lock([self.bank_account.as_str()])?;
        if self.ledger.exists(&self.bank_account)? {
            return Ok(false);
        }

        let hash = match password {
            Some(password) => self.gate.hash_password(password)?,
            None => LOCKED_PASSWORD_HASH.to_string(),
        };
        self.ledger.create(&self.bank_account, &hash)?;
        tracing::info!(account = %self.bank_account, "created bank account");
        Ok(true)
    }

    /// Register a new account with zero balances
    pub fn register(&self, username: &str, password: &str) -> Result<()> {
        if self.ledger.exists(username)? {
            return Err(Error::AlreadyExists(username.to_string()));
        }

        // Hashing is slow; keep it outside the claim
        let hash = self.gate.hash_password(password)?;

        let _guard = self.locks.lock([username])?;
        self.ledger.create(username, &hash)?;
        tracing::debug!(route = "register", "account created");
        Ok(())
    }

    /// Credit `amount - fee` to the caller and `fee` to BANK
    pub fn deposit(&self, username: &str, password: &str, amount: Decimal) -> Result<()> {
        Request::check_amount(amount)?;
        self.gate.authenticate(username, password)?;
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }

        let _guard = self.locks.lock([username, self.bank_account.as_str()])?;
        let mut staged = StagedWrites::new(self.ledger.as_ref());
        staged.add_cash(&self.bank_account, self.fee)?;
        staged.add_cash(username, self.less_fee(amount)?)?;
        staged.commit()?;

        tracing::debug!(route = "add", "deposit applied");
        Ok(())
    }

    /// Move `amount` from the caller to `to`, less the fee which goes to BANK
    ///
    /// The funds check only requires the sender's cash to be positive, so a
    /// transfer larger than the balance drives the sender negative.
    pub fn transfer(&self, username: &str, password: &str, to: &str, amount: Decimal) -> Result<()> {
        Request::check_amount(amount)?;
        self.gate.authenticate(username, password)?;

        let _guard = self
            .locks
            .lock([username, to, self.bank_account.as_str()])?;
        let mut staged = StagedWrites::new(self.ledger.as_ref());

        if staged.balance(username)?.cash <= Decimal::ZERO {
            return Err(Error::InsufficientFunds);
        }
        if !self.ledger.exists(to)? {
            return Err(Error::InvalidReceiver);
        }

        staged.add_cash(&self.bank_account, self.fee)?;
        staged.add_cash(to, self.less_fee(amount)?)?;
        staged.add_cash(username, -amount)?;
        staged.commit()?;

        tracing::debug!(route = "transfer", "transfer applied");
        Ok(())
    }

    /// Add `amount` to both cash and debt
    pub fn take_loan(&self, username: &str, password: &str, amount: Decimal) -> Result<()> {
        Request::check_amount(amount)?;
        self.gate.authenticate(username, password)?;

        let _guard = self.locks.lock([username])?;
        let mut staged = StagedWrites::new(self.ledger.as_ref());
        staged.add_cash(username, amount)?;
        staged.add_debt(username, amount)?;
        staged.commit()?;

        tracing::debug!(route = "takeloan", "loan applied");
        Ok(())
    }

    /// Subtract `amount` from both cash and debt, if cash covers it
    pub fn pay_loan(&self, username: &str, password: &str, amount: Decimal) -> Result<()> {
        Request::check_amount(amount)?;
        self.gate.authenticate(username, password)?;

        let _guard = self.locks.lock([username])?;
        let mut staged = StagedWrites::new(self.ledger.as_ref());
        if staged.balance(username)?.cash < amount {
            return Err(Error::InsufficientFunds);
        }
        staged.add_cash(username, -amount)?;
        staged.add_debt(username, -amount)?;
        staged.commit()?;

        tracing::debug!(route = "payloan", "loan payment applied");
        Ok(())
    }

    /// Current cash and debt of the caller
    pub fn balance(&self, username: &str, password: &str) -> Result<BalanceView> {
        self.gate.authenticate(username, password)?;
        let balance = self.ledger.get_balance(username)?;
        Ok(BalanceView::new(username, balance))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::adapters::argon2::Argon2Verifier;
    use crate::adapters::memory::MemoryLedger;
    use crate::domain::Argon2Params;

    fn engine() -> (TransactionEngine, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        let verifier = Arc::new(Argon2Verifier::new(&Argon2Params::minimal()).unwrap());
        let gate = CredentialGate::new(ledger.clone(), verifier);
        let engine = TransactionEngine::new(ledger.clone(), gate);
        engine.ensure_bank_account(None).unwrap();
        (engine, ledger)
    }

    fn cash(ledger: &MemoryLedger, username: &str) -> Decimal {
        ledger.get_balance(username).unwrap().cash
    }

    #[test]
    fn test_ensure_bank_account_is_idempotent() {
        let (engine, _) = engine();
        assert!(!engine.ensure_bank_account(None).unwrap());
    }

    #[test]
    fn test_bank_cannot_authenticate_without_password() {
        let (engine, _) = engine();
        assert!(matches!(engine.balance("BANK", "x"), Err(Error::InvalidPassword)));
    }

    #[test]
    fn test_deposit_charges_fee() {
        let (engine, ledger) = engine();
        engine.register("alice", "pw").unwrap();
        engine.deposit("alice", "pw", dec!(100)).unwrap();

        assert_eq!(cash(&ledger, "alice"), dec!(99));
        assert_eq!(cash(&ledger, "BANK"), dec!(1));
    }

    #[test]
    fn test_deposit_at_or_below_fee_is_applied_literally() {
        let (engine, ledger) = engine();
        engine.register("alice", "pw").unwrap();
        engine.deposit("alice", "pw", dec!(0.5)).unwrap();

        assert_eq!(cash(&ledger, "alice"), dec!(-0.5));
        assert_eq!(cash(&ledger, "BANK"), dec!(1));
    }

    #[test]
    fn test_self_transfer_costs_only_the_fee() {
        let (engine, ledger) = engine();
        engine.register("alice", "pw").unwrap();
        engine.deposit("alice", "pw", dec!(11)).unwrap();
        engine.transfer("alice", "pw", "alice", dec!(5)).unwrap();

        assert_eq!(cash(&ledger, "alice"), dec!(9));
        assert_eq!(cash(&ledger, "BANK"), dec!(2));
    }

    #[test]
    fn test_bank_with_password_can_deposit_to_itself() {
        let ledger = Arc::new(MemoryLedger::new());
        let verifier = Arc::new(Argon2Verifier::new(&Argon2Params::minimal()).unwrap());
        let engine = TransactionEngine::new(ledger.clone(), CredentialGate::new(ledger.clone(), verifier));
        assert!(engine.ensure_bank_account(Some("vault")).unwrap());

        engine.deposit("BANK", "vault", dec!(10)).unwrap();
        assert_eq!(cash(&ledger, "BANK"), dec!(10));
    }

    #[test]
    fn test_custom_fee_and_bank_account() {
        let ledger = Arc::new(MemoryLedger::new());
        let verifier = Arc::new(Argon2Verifier::new(&Argon2Params::minimal()).unwrap());
        let engine = TransactionEngine::new(ledger.clone(), CredentialGate::new(ledger.clone(), verifier))
            .with_fee(dec!(2.5))
            .with_bank_account("TREASURY");
        engine.ensure_bank_account(None).unwrap();
        engine.register("alice", "pw").unwrap();
        engine.deposit("alice", "pw", dec!(10)).unwrap();

        assert_eq!(cash(&ledger, "alice"), dec!(7.5));
        assert_eq!(cash(&ledger, "TREASURY"), dec!(2.5));
        assert!(!ledger.exists("BANK").unwrap());
    }

    #[test]
    fn test_balance_limit_rejects_without_writing() {
        let (engine, ledger) = engine();
        engine.register("alice", "pw").unwrap();
        engine.take_loan("alice", "pw", MAX_BALANCE).unwrap();

        let before = ledger.get_balance("alice").unwrap();
        assert!(matches!(engine.take_loan("alice", "pw", dec!(1)), Err(Error::BalanceLimit)));
        assert!(matches!(engine.deposit("alice", "pw", dec!(2)), Err(Error::BalanceLimit)));
        assert_eq!(ledger.get_balance("alice").unwrap(), before);
        assert_eq!(cash(&ledger, "BANK"), Decimal::ZERO);
    }

    #[test]
    fn test_oversized_amounts_are_rejected_before_arithmetic() {
        let (engine, ledger) = engine();
        engine.register("alice", "pw").unwrap();
        engine.take_loan("alice", "pw", dec!(90000000000000)).unwrap();

        for amount in [Decimal::MAX, Decimal::MIN, MAX_BALANCE + dec!(1)] {
            assert!(matches!(engine.deposit("alice", "pw", amount), Err(Error::MalformedRequest(_))));
            assert!(matches!(engine.take_loan("alice", "pw", amount), Err(Error::MalformedRequest(_))));
            assert!(matches!(engine.transfer("alice", "pw", "alice", amount), Err(Error::MalformedRequest(_))));
        }
        assert_eq!(cash(&ledger, "alice"), dec!(90000000000000));
    }

    #[test]
    fn test_sub_precision_amount_is_rejected() {
        let (engine, ledger) = engine();
        engine.register("alice", "pw").unwrap();
        engine.deposit("alice", "pw", dec!(100)).unwrap();

        let err = engine.transfer("alice", "pw", "alice", dec!(0.00004)).unwrap_err();
        assert!(matches!(err, Error::MalformedRequest(_)));
        assert_eq!(cash(&ledger, "alice"), dec!(99));
    }

    #[test]
    fn test_fee_larger_than_limit_cannot_overflow() {
        let ledger = Arc::new(MemoryLedger::new());
        let verifier = Arc::new(Argon2Verifier::new(&Argon2Params::minimal()).unwrap());
        let engine = TransactionEngine::new(ledger.clone(), CredentialGate::new(ledger.clone(), verifier))
            .with_fee(Decimal::MAX);
        engine.ensure_bank_account(None).unwrap();
        engine.register("alice", "pw").unwrap();

        assert!(matches!(engine.deposit("alice", "pw", dec!(10)), Err(Error::BalanceLimit)));
        assert_eq!(cash(&ledger, "alice"), Decimal::ZERO);
    }
}
