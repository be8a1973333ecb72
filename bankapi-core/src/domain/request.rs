//! Typed requests, one per ledger operation
//!
//! Raw JSON bodies are turned into these structures before any business
//! logic runs. Missing fields, wrong types and non-numeric amounts are all
//! reported as [`Error::MalformedRequest`].

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use super::account::Account;
use super::result::{Error, Result};

/// Operation addressed by a request, named after the public routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Register,
    Add,
    Transfer,
    Balance,
    TakeLoan,
    PayLoan,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Register,
        Route::Add,
        Route::Transfer,
        Route::Balance,
        Route::TakeLoan,
        Route::PayLoan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Register => "register",
            Route::Add => "add",
            Route::Transfer => "transfer",
            Route::Balance => "balance",
            Route::TakeLoan => "takeloan",
            Route::PayLoan => "payloan",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().trim_start_matches('/').to_lowercase();
        Route::ALL
            .into_iter()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| Error::malformed(format!("unknown route: {}", s)))
    }
}

/// Amounts must arrive as JSON numbers; strings and booleans are rejected
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    let text = number.to_string();
    Decimal::from_str_exact(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| serde::de::Error::custom(format!("invalid amount {}: {}", text, e)))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DepositRequest {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransferRequest {
    pub username: String,
    pub password: String,
    pub to: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
}

/// Body shared by take-loan and pay-loan
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoanRequest {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BalanceRequest {
    pub username: String,
    pub password: String,
}

/// A validated request for any route
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Register(RegisterRequest),
    Deposit(DepositRequest),
    Transfer(TransferRequest),
    TakeLoan(LoanRequest),
    PayLoan(LoanRequest),
    Balance(BalanceRequest),
}

impl Request {
    /// Parse and validate a JSON body for the given route
    pub fn parse(route: Route, body: serde_json::Value) -> Result<Self> {
        let request = match route {
            Route::Register => Request::Register(from_body(body)?),
            Route::Add => Request::Deposit(from_body(body)?),
            Route::Transfer => Request::Transfer(from_body(body)?),
            Route::TakeLoan => Request::TakeLoan(from_body(body)?),
            Route::PayLoan => Request::PayLoan(from_body(body)?),
            Route::Balance => Request::Balance(from_body(body)?),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn route(&self) -> Route {
        match self {
            Request::Register(_) => Route::Register,
            Request::Deposit(_) => Route::Add,
            Request::Transfer(_) => Route::Transfer,
            Request::TakeLoan(_) => Route::TakeLoan,
            Request::PayLoan(_) => Route::PayLoan,
            Request::Balance(_) => Route::Balance,
        }
    }

    /// Reject amounts the ledger would round or could not store
    pub fn check_amount(amount: Decimal) -> Result<()> {
        Account::validate_amount(amount).map_err(|e| Error::malformed(format!("amount: {}", e)))
    }

    /// Check usernames, password and amount before the request reaches the engine
    pub fn validate(&self) -> Result<()> {
        let (username, password) = match self {
            Request::Register(r) => (&r.username, &r.password),
            Request::Deposit(r) => {
                Self::check_amount(r.amount)?;
                (&r.username, &r.password)
            }
            Request::Transfer(r) => {
                Account::validate_username(&r.to).map_err(|e| Error::malformed(format!("to: {}", e)))?;
                Self::check_amount(r.amount)?;
                (&r.username, &r.password)
            }
            Request::TakeLoan(r) | Request::PayLoan(r) => {
                Self::check_amount(r.amount)?;
                (&r.username, &r.password)
            }
            Request::Balance(r) => (&r.username, &r.password),
        };
        Account::validate_username(username).map_err(|e| Error::malformed(format!("username: {}", e)))?;
        if password.is_empty() {
            return Err(Error::malformed("password cannot be empty"));
        }
        Ok(())
    }
}

fn from_body<T: for<'de> Deserialize<'de>>(body: serde_json::Value) -> Result<T> {
    if !body.is_object() {
        return Err(Error::malformed("request body must be a JSON object"));
    }
    serde_json::from_value(body).map_err(|e| Error::malformed(e.to_string()))
}
