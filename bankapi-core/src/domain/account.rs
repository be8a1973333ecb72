//! Account domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Username of the reserved account that collects transaction fees
pub const BANK_USERNAME: &str = "BANK";

/// Decimal places stored for cash and debt
pub const AMOUNT_SCALE: u32 = 4;

/// Largest cash or debt magnitude the ledger stores (99999999999999.9999)
pub const MAX_BALANCE: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, AMOUNT_SCALE);

/// A registered ledger account
///
/// The password hash is deliberately not serialized; callers that need to
/// show an account to a user go through [`BalanceView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub cash: Decimal,
    pub debt: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balances
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            cash: Decimal::ZERO,
            debt: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn balance(&self) -> Balance {
        Balance {
            cash: self.cash,
            debt: self.debt,
        }
    }

    /// Validate a username before it is stored
    pub fn validate_username(username: &str) -> Result<(), &'static str> {
        if username.trim().is_empty() {
            return Err("username cannot be empty");
        }
        if username.trim() != username {
            return Err("username cannot start or end with whitespace");
        }
        Ok(())
    }

    /// Check that an amount can be stored without rounding or overflow
    pub fn validate_amount(amount: Decimal) -> Result<(), String> {
        if amount.normalize().scale() > AMOUNT_SCALE {
            return Err(format!("{} has more than {} decimal places", amount, AMOUNT_SCALE));
        }
        if amount.abs() > MAX_BALANCE {
            return Err(format!("{} exceeds the ledger limit of {}", amount, MAX_BALANCE));
        }
        Ok(())
    }
}

/// `value + delta`, or None when the result leaves the storable range
pub fn shift_amount(value: Decimal, delta: Decimal) -> Option<Decimal> {
    value.checked_add(delta).filter(|sum| sum.abs() <= MAX_BALANCE)
}

/// Cash and debt held by one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub cash: Decimal,
    pub debt: Decimal,
}

/// Balance as reported to a user, without any credential material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub username: String,
    pub cash: Decimal,
    pub debt: Decimal,
}

impl BalanceView {
    pub fn new(username: impl Into<String>, balance: Balance) -> Self {
        Self {
            username: username.into(),
            cash: balance.cash,
            debt: balance.debt,
        }
    }
}
