//! Ledger commands - one per route

use std::env;
use std::process::ExitCode;

use anyhow::{bail, Result};
use bankapi_core::domain::request::{
    BalanceRequest, DepositRequest, LoanRequest, RegisterRequest, TransferRequest,
};
use bankapi_core::Request;
use dialoguer::Password;
use rust_decimal::Decimal;

use super::dispatch;

/// Resolve the account password
///
/// Priority: --password flag, BANKAPI_PASSWORD, then an interactive prompt.
fn get_password(password_flag: Option<String>, confirm: bool) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if let Ok(p) = env::var("BANKAPI_PASSWORD") {
        return Ok(p);
    }

    if atty::isnt(atty::Stream::Stdin) {
        bail!("No password given; pass --password or set BANKAPI_PASSWORD");
    }

    let mut prompt = Password::new();
    prompt = prompt.with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

pub fn register(username: &str, password: Option<String>, json: bool) -> Result<ExitCode> {
    let request = Request::Register(RegisterRequest {
        username: username.to_string(),
        password: get_password(password, true)?,
    });
    dispatch(request, json)
}

pub fn deposit(username: &str, amount: Decimal, password: Option<String>, json: bool) -> Result<ExitCode> {
    let request = Request::Deposit(DepositRequest {
        username: username.to_string(),
        password: get_password(password, false)?,
        amount,
    });
    dispatch(request, json)
}

pub fn transfer(
    username: &str,
    to: &str,
    amount: Decimal,
    password: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let request = Request::Transfer(TransferRequest {
        username: username.to_string(),
        password: get_password(password, false)?,
        to: to.to_string(),
        amount,
    });
    dispatch(request, json)
}

pub fn balance(username: &str, password: Option<String>, json: bool) -> Result<ExitCode> {
    let request = Request::Balance(BalanceRequest {
        username: username.to_string(),
        password: get_password(password, false)?,
    });
    dispatch(request, json)
}

pub fn take_loan(username: &str, amount: Decimal, password: Option<String>, json: bool) -> Result<ExitCode> {
    let request = Request::TakeLoan(LoanRequest {
        username: username.to_string(),
        password: get_password(password, false)?,
        amount,
    });
    dispatch(request, json)
}

pub fn pay_loan(username: &str, amount: Decimal, password: Option<String>, json: bool) -> Result<ExitCode> {
    let request = Request::PayLoan(LoanRequest {
        username: username.to_string(),
        password: get_password(password, false)?,
        amount,
    });
    dispatch(request, json)
}
