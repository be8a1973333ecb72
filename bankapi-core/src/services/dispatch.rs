//! Request dispatch - JSON bodies in, status envelopes out

use std::sync::Arc;

use serde_json::Value;

use super::engine::TransactionEngine;
use crate::domain::result::{Response, Result};
use crate::domain::{Request, Route};

pub const MSG_REGISTERED: &str = "You succesfully signed up for the API";
pub const MSG_DEPOSITED: &str = "Amount added succesfully to account";
pub const MSG_TRANSFERRED: &str = "Amount transfered succesfully";
pub const MSG_LOAN_TAKEN: &str = "Loan added to your account";
pub const MSG_LOAN_PAID: &str = "You've succesfully paid your loan";

/// Routes raw requests to the transaction engine
pub struct Dispatcher {
    engine: Arc<TransactionEngine>,
}

impl Dispatcher {
    pub fn new(engine: Arc<TransactionEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &TransactionEngine {
        &self.engine
    }

    /// Handle a request addressed by route name
    ///
    /// Never fails: every error is folded into the response status.
    pub fn handle(&self, route: &str, body: Value) -> Response {
        let result = route
            .parse::<Route>()
            .and_then(|route| Request::parse(route, body))
            .and_then(|request| self.handle_request(&request));
        Self::finish(route, result)
    }

    /// Handle a request built in code rather than parsed from JSON
    pub fn execute(&self, request: &Request) -> Response {
        let result = request
            .validate()
            .and_then(|_| self.handle_request(request));
        Self::finish(request.route().as_str(), result)
    }

    fn finish(route: &str, result: Result<Response>) -> Response {
        if let Err(e) = &result {
            if e.is_rejection() {
                tracing::debug!(route, status = e.status(), "request rejected");
            } else {
                tracing::error!(route, error = %e, "request failed");
            }
        }
        result.into()
    }

    /// Execute an already validated request
    pub fn handle_request(&self, request: &Request) -> Result<Response> {
        match request {
            Request::Register(r) => {
                self.engine.register(&r.username, &r.password)?;
                Ok(Response::ok(MSG_REGISTERED))
            }
            Request::Deposit(r) => {
                self.engine.deposit(&r.username, &r.password, r.amount)?;
                Ok(Response::ok(MSG_DEPOSITED))
            }
            Request::Transfer(r) => {
                self.engine.transfer(&r.username, &r.password, &r.to, r.amount)?;
                Ok(Response::ok(MSG_TRANSFERRED))
            }
            Request::TakeLoan(r) => {
                self.engine.take_loan(&r.username, &r.password, r.amount)?;
                Ok(Response::ok(MSG_LOAN_TAKEN))
            }
            Request::PayLoan(r) => {
                self.engine.pay_loan(&r.username, &r.password, r.amount)?;
                Ok(Response::ok(MSG_LOAN_PAID))
            }
            Request::Balance(r) => {
                let view = self.engine.balance(&r.username, &r.password)?;
                Ok(Response::balance(view))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::argon2::Argon2Verifier;
    use crate::adapters::memory::MemoryLedger;
    use crate::domain::Argon2Params;
    use crate::services::CredentialGate;

    fn dispatcher() -> Dispatcher {
        let ledger = Arc::new(MemoryLedger::new());
        let verifier = Arc::new(Argon2Verifier::new(&Argon2Params::minimal()).unwrap());
        let engine = TransactionEngine::new(ledger.clone(), CredentialGate::new(ledger, verifier));
        engine.ensure_bank_account(None).unwrap();
        Dispatcher::new(Arc::new(engine))
    }

    #[test]
    fn test_register_then_balance() {
        let d = dispatcher();
        let response = d.handle("/register", json!({"username": "alice", "password": "pw"}));
        assert_eq!(response, Response::ok(MSG_REGISTERED));

        let response = d.handle("balance", json!({"username": "alice", "password": "pw"}));
        assert!(response.is_ok());
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["cash"], "0");
        assert_eq!(body["debt"], "0");
        assert!(body.get("password").is_none());
    }

    #[test]
    fn test_execute_validates_typed_requests() {
        use crate::domain::request::RegisterRequest;

        let d = dispatcher();
        let request = Request::Register(RegisterRequest {
            username: " ".to_string(),
            password: "pw".to_string(),
        });
        assert_eq!(d.execute(&request).status, 400);

        let request = Request::Register(RegisterRequest {
            username: "alice".to_string(),
            password: "pw".to_string(),
        });
        assert_eq!(d.execute(&request), Response::ok(MSG_REGISTERED));
    }

    #[test]
    fn test_unknown_route_is_malformed() {
        let response = dispatcher().handle("/withdraw", json!({}));
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let d = dispatcher();
        d.handle("register", json!({"username": "alice", "password": "pw"}));

        let response = d.handle("add", json!({"username": "alice", "password": "pw"}));
        assert_eq!(response.status, 400);
        let response = d.handle("add", json!({"username": "alice", "password": "pw", "amount": "10"}));
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let d = dispatcher();
        let response = d.handle(
            "register",
            json!({"username": "alice", "password": "pw", "email": "a@example.com"}),
        );
        assert!(response.is_ok());
    }

    #[test]
    fn test_failure_statuses() {
        let d = dispatcher();
        d.handle("register", json!({"username": "alice", "password": "pw"}));

        let dup = d.handle("register", json!({"username": "alice", "password": "other"}));
        assert_eq!(dup.status, 305);

        let unknown = d.handle("add", json!({"username": "bob", "password": "pw", "amount": 5}));
        assert_eq!(unknown.status, 301);

        let wrong = d.handle("add", json!({"username": "alice", "password": "nope", "amount": 5}));
        assert_eq!(wrong.status, 302);

        let broke = d.handle(
            "transfer",
            json!({"username": "alice", "password": "pw", "to": "BANK", "amount": 5}),
        );
        assert_eq!(broke.status, 303);

        let zero = d.handle("add", json!({"username": "alice", "password": "pw", "amount": 0}));
        assert_eq!(zero.status, 304);

        d.handle("add", json!({"username": "alice", "password": "pw", "amount": 10}));
        let nobody = d.handle(
            "transfer",
            json!({"username": "alice", "password": "pw", "to": "ghost", "amount": 5}),
        );
        assert_eq!(nobody.status, 306);
    }
}
