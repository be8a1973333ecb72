//! Logs command - inspect the request log kept in logs.duckdb

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Subcommand;
use colored::{ColoredString, Colorize};

use super::get_data_dir;
use crate::output;
use bankapi_core::services::{logging::now_ms, EntryPoint, LogEntry, LoggingService};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries, newest first
    List {
        /// Number of entries to read
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only requests to this route
        #[arg(long)]
        route: Option<String>,
        /// Only requests that finished with this status
        #[arg(long)]
        status: Option<u16>,
        /// Only entries carrying an error message
        #[arg(long)]
        errors: bool,
        #[arg(long)]
        json: bool,
    },
    /// Delete entries older than N days
    Clear {
        #[arg(long, default_value = "30")]
        older_than_days: u32,
        #[arg(long)]
        json: bool,
    },
    /// Entry totals and requests per status
    Stats {
        #[arg(long)]
        json: bool,
    },
}

/// What a status code means, for the stats table
fn status_label(status: u16) -> &'static str {
    match status {
        200 => "ok",
        301 => "invalid username",
        302 => "invalid password",
        303 => "insufficient funds",
        304 => "invalid amount",
        305 => "already exists",
        306 => "invalid receiver",
        307 => "balance limit",
        400 => "malformed request",
        404 => "not found",
        500 => "internal error",
        _ => "other",
    }
}

fn colored_status(status: u16) -> ColoredString {
    match status {
        200 => status.to_string().green(),
        300..=499 => status.to_string().yellow(),
        _ => status.to_string().red(),
    }
}

fn keep_entry(entry: &LogEntry, route: Option<&str>, status: Option<u16>) -> bool {
    let route = route.map(|r| r.trim_start_matches('/'));
    route.map_or(true, |r| entry.route.as_deref() == Some(r))
        && status.map_or(true, |s| entry.status == Some(s))
}

fn open_log() -> Result<LoggingService> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

pub fn run(command: LogsCommands) -> Result<()> {
    let service = open_log()?;
    match command {
        LogsCommands::List {
            limit,
            route,
            status,
            errors,
            json,
        } => list(&service, limit, route.as_deref(), status, errors, json),
        LogsCommands::Clear { older_than_days, json } => {
            let deleted = service.delete_before(now_ms() - i64::from(older_than_days) * DAY_MS)?;
            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Deleted {} entries older than {} days", deleted, older_than_days));
            }
            Ok(())
        }
        LogsCommands::Stats { json } => stats(&service, json),
    }
}

fn list(
    service: &LoggingService,
    limit: usize,
    route: Option<&str>,
    status: Option<u16>,
    errors: bool,
    json: bool,
) -> Result<()> {
    let entries: Vec<LogEntry> = if errors {
        service.get_errors(limit)?
    } else {
        service.get_recent(limit)?
    }
    .into_iter()
    .filter(|entry| keep_entry(entry, route, status))
    .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No matching log entries.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time (UTC)", "Source", "Event", "Route", "Status", "Detail"]);
    for entry in entries {
        let time = Utc
            .timestamp_millis_opt(entry.timestamp)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());
        let detail = entry
            .error_message
            .as_deref()
            .or(entry.command.as_deref())
            .unwrap_or_default()
            .to_string();
        table.add_row(vec![
            time,
            entry.entry_point,
            entry.event,
            entry.route.unwrap_or_default(),
            entry.status.map(|s| colored_status(s).to_string()).unwrap_or_default(),
            detail,
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn stats(service: &LoggingService, json: bool) -> Result<()> {
    let total = service.count()?;
    let by_status = service.status_counts()?;
    let db_path = service.db_path();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "totalEntries": total,
                "requestsByStatus": by_status,
                "databasePath": db_path.to_string_lossy(),
            })
        );
        return Ok(());
    }

    println!("{} ({} entries)", "Request log".bold(), total);
    println!("{}", db_path.display().to_string().dimmed());
    if by_status.is_empty() {
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Status", "Meaning", "Requests"]);
    for row in &by_status {
        table.add_row(vec![
            colored_status(row.status).to_string(),
            status_label(row.status).to_string(),
            row.count.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}
