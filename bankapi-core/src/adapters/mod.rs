//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the AccountLedger and CredentialStore ports
//! - An in-memory map for the same ports, used by tests
//! - Argon2id for the PasswordVerifier port

pub mod argon2;
pub mod duckdb;
pub mod memory;
