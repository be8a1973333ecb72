//! Result and error types for the core library

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status code returned for every successful operation
pub const STATUS_OK: u16 = 200;

/// Core library error type
///
/// The first group are business outcomes surfaced to the caller with a
/// distinct status code. The rest are infrastructure failures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Username already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid Username")]
    InvalidUsername,

    #[error("Incorrect Password or Username")]
    InvalidPassword,

    #[error("The money amount entered must be greater than 0")]
    InvalidAmount,

    #[error("Not enough cash in your account")]
    InsufficientFunds,

    #[error("Receiver username is invalid")]
    InvalidReceiver,

    #[error("Amount would take a balance past the ledger limit")]
    BalanceLimit,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a malformed request error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    /// Status code reported to the caller for this error
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidUsername => 301,
            Self::InvalidPassword => 302,
            Self::InsufficientFunds => 303,
            Self::InvalidAmount => 304,
            Self::AlreadyExists(_) => 305,
            Self::InvalidReceiver => 306,
            Self::BalanceLimit => 307,
            Self::MalformedRequest(_) | Self::Json(_) => 400,
            Self::NotFound(_) => 404,
            Self::Database(_)
            | Self::Config(_)
            | Self::Credential(_)
            | Self::Io(_)
            | Self::Other(_) => 500,
        }
    }

    /// True for expected business outcomes, false for infrastructure failures
    pub fn is_rejection(&self) -> bool {
        self.status() < 500
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Response envelope returned to callers of the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub balance: Option<super::BalanceView>,
}

impl Response {
    /// Create a successful response with a message
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK,
            msg: Some(msg.into()),
            balance: None,
        }
    }

    /// Create a successful balance response
    pub fn balance(view: super::BalanceView) -> Self {
        Self {
            status: STATUS_OK,
            msg: None,
            balance: Some(view),
        }
    }

    /// Create a failed response from an error
    pub fn fail(error: &Error) -> Self {
        Self {
            status: error.status(),
            msg: Some(error.to_string()),
            balance: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

impl From<Result<Response>> for Response {
    fn from(result: Result<Response>) -> Self {
        match result {
            Ok(response) => response,
            Err(e) => Self::fail(&e),
        }
    }
}
