//! Credential gate - authenticates a caller before any ledger access

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::ports::{CredentialStore, PasswordVerifier};

/// Checks a (username, password) pair against the credential store
pub struct CredentialGate {
    store: Arc<dyn CredentialStore>,
    verifier: Arc<dyn PasswordVerifier>,
}

impl CredentialGate {
    pub fn new(store: Arc<dyn CredentialStore>, verifier: Arc<dyn PasswordVerifier>) -> Self {
        Self { store, verifier }
    }

    /// `InvalidUsername` for an unknown account, `InvalidPassword` on mismatch
    pub fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        let hash = self
            .store
            .lookup(username)?
            .ok_or(Error::InvalidUsername)?;

        if self.verifier.verify(password, &hash)? {
            Ok(())
        } else {
            Err(Error::InvalidPassword)
        }
    }

    /// Hash a password for a new account
    pub fn hash_password(&self, password: &str) -> Result<String> {
        self.verifier.hash(password)
    }
}
