//! Integration tests for bankapi-core
//!
//! These tests drive the full context (DuckDB ledger, Argon2 verifier,
//! transaction engine) in a temporary data directory.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use tempfile::TempDir;

use bankapi_core::config::Config;
use bankapi_core::domain::{Argon2Params, Balance, MAX_BALANCE};
use bankapi_core::ports::AccountLedger;
use bankapi_core::{BankContext, Error};

// ============================================================================
// Test Helpers
// ============================================================================

/// Config with cheap password hashing
fn test_config() -> Config {
    Config {
        argon2: Argon2Params::minimal(),
        ..Config::default()
    }
}

fn open_context(temp_dir: &TempDir) -> BankContext {
    BankContext::open_with_config(temp_dir.path(), test_config()).expect("Failed to open context")
}

fn balance(ctx: &BankContext, username: &str) -> Balance {
    ctx.ledger.get_balance(username).expect("Failed to read balance")
}

/// Register a user and give them some cash
fn funded_user(ctx: &BankContext, username: &str, deposit: Decimal) {
    ctx.engine.register(username, "pw").unwrap();
    if deposit > Decimal::ZERO {
        ctx.engine.deposit(username, "pw", deposit).unwrap();
    }
}

/// Snapshot of every balance, to assert that nothing changed
fn all_balances(ctx: &BankContext) -> Vec<(String, Decimal, Decimal)> {
    ctx.ledger
        .list_balances()
        .unwrap()
        .into_iter()
        .map(|b| (b.username, b.cash, b.debt))
        .collect()
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_register_twice_keeps_one_account() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);

    ctx.engine.register("alice", "pw").unwrap();
    let err = ctx.engine.register("alice", "other").unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));

    let names: Vec<String> = all_balances(&ctx).into_iter().map(|b| b.0).collect();
    assert_eq!(names, vec!["BANK", "alice"]);

    // The first password still works
    assert!(ctx.engine.balance("alice", "pw").is_ok());
    assert!(matches!(ctx.engine.balance("alice", "other"), Err(Error::InvalidPassword)));
}

#[test]
fn test_cannot_register_bank() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);

    assert!(matches!(ctx.engine.register("BANK", "pw"), Err(Error::AlreadyExists(_))));
}

// ============================================================================
// Deposit
// ============================================================================

#[test]
fn test_deposit_credits_amount_less_fee() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", dec!(40));

    let bank_before = balance(&ctx, "BANK").cash;
    ctx.engine.deposit("alice", "pw", dec!(25.5)).unwrap();

    assert_eq!(balance(&ctx, "alice").cash, dec!(39) + dec!(24.5));
    assert_eq!(balance(&ctx, "BANK").cash, bank_before + dec!(1));
}

#[test]
fn test_non_positive_deposit_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", dec!(10));
    let before = all_balances(&ctx);

    for amount in [dec!(0), dec!(-5)] {
        assert!(matches!(
            ctx.engine.deposit("alice", "pw", amount),
            Err(Error::InvalidAmount)
        ));
    }
    assert_eq!(all_balances(&ctx), before);
}

#[test]
fn test_authentication_runs_before_amount_check() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", Decimal::ZERO);

    assert!(matches!(ctx.engine.deposit("bob", "pw", dec!(0)), Err(Error::InvalidUsername)));
    assert!(matches!(ctx.engine.deposit("alice", "x", dec!(0)), Err(Error::InvalidPassword)));
}

// ============================================================================
// Transfer
// ============================================================================

/// alice deposits 100, transfers 50 to bob
#[test]
fn test_alice_pays_bob() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);

    ctx.engine.register("alice", "pw").unwrap();
    ctx.engine.register("bob", "pw").unwrap();
    ctx.engine.deposit("alice", "pw", dec!(100)).unwrap();

    assert_eq!(balance(&ctx, "alice").cash, dec!(99));
    assert_eq!(balance(&ctx, "BANK").cash, dec!(1));

    ctx.engine.transfer("alice", "pw", "bob", dec!(50)).unwrap();

    assert_eq!(balance(&ctx, "alice").cash, dec!(49));
    assert_eq!(balance(&ctx, "bob").cash, dec!(49));
    assert_eq!(balance(&ctx, "BANK").cash, dec!(2));
}

#[test]
fn test_transfer_requires_positive_cash() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", Decimal::ZERO);
    funded_user(&ctx, "bob", dec!(10));
    let before = all_balances(&ctx);

    let err = ctx.engine.transfer("alice", "pw", "bob", dec!(1)).unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds));
    assert_eq!(all_balances(&ctx), before);
}

#[test]
fn test_transfer_may_overdraw_positive_sender() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", dec!(11));
    funded_user(&ctx, "bob", Decimal::ZERO);

    ctx.engine.transfer("alice", "pw", "bob", dec!(30)).unwrap();

    assert_eq!(balance(&ctx, "alice").cash, dec!(-20));
    assert_eq!(balance(&ctx, "bob").cash, dec!(29));
}

#[test]
fn test_transfer_to_unknown_receiver() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", dec!(20));
    let before = all_balances(&ctx);

    let err = ctx.engine.transfer("alice", "pw", "ghost", dec!(5)).unwrap_err();
    assert!(matches!(err, Error::InvalidReceiver));
    assert_eq!(all_balances(&ctx), before);
    assert!(!ctx.ledger.exists("ghost").unwrap());
}

#[test]
fn test_funds_check_precedes_receiver_check() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", Decimal::ZERO);

    let err = ctx.engine.transfer("alice", "pw", "ghost", dec!(5)).unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds));
}

// ============================================================================
// Loans
// ============================================================================

#[test]
fn test_take_and_pay_loan() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", Decimal::ZERO);

    ctx.engine.take_loan("alice", "pw", dec!(500)).unwrap();
    assert_eq!(balance(&ctx, "alice"), Balance { cash: dec!(500), debt: dec!(500) });

    ctx.engine.pay_loan("alice", "pw", dec!(200)).unwrap();
    assert_eq!(balance(&ctx, "alice"), Balance { cash: dec!(300), debt: dec!(300) });

    // Loans carry no fee
    assert_eq!(balance(&ctx, "BANK").cash, Decimal::ZERO);
}

#[test]
fn test_negative_loan_is_applied_literally() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", Decimal::ZERO);

    ctx.engine.take_loan("alice", "pw", dec!(-5)).unwrap();
    assert_eq!(balance(&ctx, "alice"), Balance { cash: dec!(-5), debt: dec!(-5) });
}

#[test]
fn test_pay_loan_needs_cash() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", dec!(11));
    let before = all_balances(&ctx);

    let err = ctx.engine.pay_loan("alice", "pw", dec!(10.01)).unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds));
    assert_eq!(all_balances(&ctx), before);
}

#[test]
fn test_overpaying_loan_leaves_negative_debt() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", dec!(21));

    ctx.engine.pay_loan("alice", "pw", dec!(20)).unwrap();
    assert_eq!(balance(&ctx, "alice"), Balance { cash: dec!(0), debt: dec!(-20) });

    let report = ctx.doctor_service.run_checks().unwrap();
    assert_eq!(report.checks["negative_debt"].status, "warning");
}

// ============================================================================
// Balance query and dispatch
// ============================================================================

#[test]
fn test_balance_response_has_no_credentials() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    ctx.dispatcher
        .handle("/register", json!({"username": "alice", "password": "s3cret"}));
    ctx.dispatcher.handle(
        "/add",
        json!({"username": "alice", "password": "s3cret", "amount": 100}),
    );

    let response = ctx
        .dispatcher
        .handle("/balance", json!({"username": "alice", "password": "s3cret"}));
    assert!(response.is_ok());

    let text = serde_json::to_string(&response).unwrap();
    assert!(!text.contains("s3cret"));
    assert!(!text.contains("argon2"));
    assert!(!text.contains("password"));

    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["status"], 200);
    assert_eq!(body["cash"], "99");
    assert_eq!(body["debt"], "0");
}

#[test]
fn test_dispatch_full_session() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    let d = &ctx.dispatcher;

    let steps = [
        ("register", json!({"username": "alice", "password": "pw"}), 200),
        ("register", json!({"username": "bob", "password": "pw"}), 200),
        ("add", json!({"username": "alice", "password": "pw", "amount": 100}), 200),
        ("transfer", json!({"username": "alice", "password": "pw", "to": "bob", "amount": 50}), 200),
        ("takeloan", json!({"username": "bob", "password": "pw", "amount": 100}), 200),
        ("payloan", json!({"username": "bob", "password": "pw", "amount": 1000}), 303),
        ("payloan", json!({"username": "bob", "password": "pw", "amount": 100}), 200),
        ("transfer", json!({"username": "bob", "password": "pw", "to": "carol", "amount": 1}), 306),
        ("add", json!({"username": "alice", "password": "pw", "amount": "lots"}), 400),
        ("add", json!(["alice", "pw", 10]), 400),
    ];

    for (route, body, expected) in steps {
        let response = d.handle(route, body.clone());
        assert_eq!(response.status, expected, "{} {}", route, body);
    }

    assert_eq!(balance(&ctx, "alice").cash, dec!(49));
    assert_eq!(balance(&ctx, "bob"), Balance { cash: dec!(49), debt: dec!(0) });

    let summary = ctx.status_service.summary().unwrap();
    assert_eq!(summary.total_accounts, 2);
    assert_eq!(summary.fees_collected, dec!(2));
}

// ============================================================================
// Amount precision and range
// ============================================================================

#[test]
fn test_smallest_stored_unit_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", dec!(100));
    funded_user(&ctx, "bob", Decimal::ZERO);

    ctx.engine.transfer("alice", "pw", "bob", dec!(0.0001)).unwrap();

    assert_eq!(balance(&ctx, "alice").cash, dec!(98.9999));
    assert_eq!(balance(&ctx, "bob").cash, dec!(-0.9999));
    assert_eq!(balance(&ctx, "BANK").cash, dec!(2));
}

#[test]
fn test_amount_finer_than_ledger_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", dec!(100));
    funded_user(&ctx, "bob", Decimal::ZERO);
    let before = all_balances(&ctx);

    let err = ctx.engine.transfer("alice", "pw", "bob", dec!(0.00004)).unwrap_err();
    assert!(matches!(err, Error::MalformedRequest(_)));

    let response = ctx.dispatcher.handle(
        "transfer",
        json!({"username": "alice", "password": "pw", "to": "bob", "amount": 0.00004}),
    );
    assert_eq!(response.status, 400);
    assert_eq!(all_balances(&ctx), before);
}

#[test]
fn test_balance_at_ledger_limit() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);
    funded_user(&ctx, "alice", Decimal::ZERO);

    ctx.engine.take_loan("alice", "pw", MAX_BALANCE).unwrap();
    assert_eq!(balance(&ctx, "alice"), Balance { cash: MAX_BALANCE, debt: MAX_BALANCE });
    let before = all_balances(&ctx);

    let err = ctx.engine.deposit("alice", "pw", dec!(5)).unwrap_err();
    assert!(matches!(err, Error::BalanceLimit));
    assert_eq!(err.status(), 307);

    let steps = [
        ("takeloan", json!({"username": "alice", "password": "pw", "amount": 1}), 307),
        ("add", json!({"username": "alice", "password": "pw", "amount": 7.922816251426433e28}), 400),
        ("takeloan", json!({"username": "alice", "password": "pw", "amount": 1e15}), 400),
    ];
    for (route, body, expected) in steps {
        let response = ctx.dispatcher.handle(route, body.clone());
        assert_eq!(response.status, expected, "{} {}", route, body);
    }

    assert_eq!(all_balances(&ctx), before);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_configured_fee_and_bank_password() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        fee: dec!(0.25),
        bank_password: Some("vault".to_string()),
        ..test_config()
    };
    let ctx = BankContext::open_with_config(temp_dir.path(), config).unwrap();
    funded_user(&ctx, "alice", dec!(10));

    assert_eq!(balance(&ctx, "alice").cash, dec!(9.75));
    let bank = ctx.engine.balance("BANK", "vault").unwrap();
    assert_eq!(bank.cash, dec!(0.25));
}

#[test]
fn test_settings_file_is_used_by_open() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("settings.json"),
        r#"{"ledger": {"fee": 2, "bankAccount": "TREASURY"},
            "security": {"argon2": {"timeCost": 1, "memoryCost": 8, "parallelism": 1, "hashLen": 32}}}"#,
    )
    .unwrap();

    let ctx = BankContext::open(temp_dir.path()).unwrap();
    funded_user(&ctx, "alice", dec!(10));

    assert_eq!(balance(&ctx, "alice").cash, dec!(8));
    assert_eq!(balance(&ctx, "TREASURY").cash, dec!(2));
    assert!(!ctx.ledger.exists("BANK").unwrap());
}
