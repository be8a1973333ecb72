//! CLI command implementations

pub mod batch;
pub mod call;
pub mod config;
pub mod doctor;
pub mod ledger;
pub mod logs;
pub mod status;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bankapi_core::services::{EntryPoint, LogEvent, LoggingService};
use bankapi_core::{BankContext, Request, Response};

use crate::output;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger(entry_point: EntryPoint) -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    match LoggingService::new(&data_dir, entry_point, env!("CARGO_PKG_VERSION")) {
        Ok(service) => Some(service),
        Err(e) => {
            tracing::debug!(error = %e, "event log unavailable");
            None
        }
    }
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BANKAPI_DIR") {
        Ok(PathBuf::from(dir))
    } else {
        Ok(dirs::home_dir()
            .context("Could not find home directory; set BANKAPI_DIR")?
            .join(".bankapi"))
    }
}

/// Open the ledger context
pub fn get_context() -> Result<BankContext> {
    let data_dir = get_data_dir()?;
    BankContext::open(&data_dir).context("Failed to open ledger")
}

/// Run one request, print the response and map its status to an exit code
pub fn dispatch(request: Request, json: bool) -> Result<ExitCode> {
    let route = request.route().as_str();
    let logger = get_logger(EntryPoint::Cli);
    log_event(&logger, LogEvent::new("command_executed").with_command(route));

    let response = {
        let ctx = get_context()?;
        ctx.dispatcher.execute(&request)
    };
    log_event(
        &logger,
        LogEvent::new("request_handled").with_request(route, response.status),
    );

    output::response(&response, json)?;
    Ok(exit_code(&response))
}

pub fn exit_code(response: &Response) -> ExitCode {
    if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
