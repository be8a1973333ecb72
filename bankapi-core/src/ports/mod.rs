//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod credentials;
mod ledger;

pub use credentials::{CredentialStore, PasswordVerifier};
pub use ledger::{AccountLedger, LedgerWrite};
