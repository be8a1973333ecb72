//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod dispatch;
mod doctor;
mod engine;
mod gate;
mod locks;
pub mod logging;
pub mod migration;
mod status;

use chrono::Utc;

pub use dispatch::{
    Dispatcher, MSG_DEPOSITED, MSG_LOAN_PAID, MSG_LOAN_TAKEN, MSG_REGISTERED, MSG_TRANSFERRED,
};
pub use doctor::{CheckResult, DoctorResult, DoctorService, DoctorSummary};
pub use engine::{TransactionEngine, DEFAULT_FEE};
pub use gate::CredentialGate;
pub use locks::{AccountGuard, AccountLocks};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService, StatusCount};
pub use migration::{MigrationResult, MigrationService};
pub use status::{StatusService, StatusSummary};

/// Current UTC time in the textual form DuckDB casts to TIMESTAMP
pub(crate) fn now_timestamp() -> String {
    Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
