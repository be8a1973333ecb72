//! Core domain entities
//!
//! All ledger entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod credential;
pub mod request;
pub mod result;

pub use account::{shift_amount, Account, Balance, BalanceView, AMOUNT_SCALE, BANK_USERNAME, MAX_BALANCE};
pub use credential::{Argon2Params, LOCKED_PASSWORD_HASH};
pub use request::{Request, Route};
pub use result::{Error, Response, Result};
