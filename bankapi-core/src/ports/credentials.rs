//! Credential ports - stored password hashes and their verification

use crate::domain::result::Result;

/// Lookup of the stored password hash for a username
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when no account has this username
    fn lookup(&self, username: &str) -> Result<Option<String>>;
}

/// Password hashing and verification
pub trait PasswordVerifier: Send + Sync {
    /// Hash a password into a self-describing string for storage
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a password against a stored hash
    ///
    /// Returns `Ok(false)` for a mismatch or an unparseable hash; errors are
    /// reserved for failures of the verifier itself.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}
