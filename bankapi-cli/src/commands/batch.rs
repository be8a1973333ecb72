//! Batch command - replay a JSON-lines file of requests on worker threads
//!
//! Each line is `{"route": "add", "body": {...}}`. Lines run concurrently, so
//! the final balances only match a sequential replay when the ledger keeps
//! per-account updates serialized.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use anyhow::{bail, Context, Result};
use bankapi_core::services::{EntryPoint, LogEvent};
use bankapi_core::{Error, Response};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use super::{get_context, get_logger, log_event};
use crate::output;

#[derive(Debug, Deserialize)]
struct BatchRecord {
    route: String,
    #[serde(default)]
    body: serde_json::Value,
}

/// Parse one line; a bad line becomes a ready-made 400 response
fn parse_line(line: &str) -> std::result::Result<BatchRecord, Response> {
    serde_json::from_str(line).map_err(|e| Response::fail(&Error::malformed(e.to_string())))
}

pub fn run(file: &Path, workers: usize, json: bool) -> Result<ExitCode> {
    if workers == 0 {
        bail!("--workers must be at least 1");
    }

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let logger = get_logger(EntryPoint::Batch);
    log_event(&logger, LogEvent::new("command_executed").with_command("batch"));

    let ctx = get_context()?;
    let next = AtomicUsize::new(0);
    let tally: Mutex<BTreeMap<u16, usize>> = Mutex::new(BTreeMap::new());

    let progress = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(lines.len() as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} requests ({elapsed})")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );

    thread::scope(|scope| {
        for _ in 0..workers.min(lines.len().max(1)) {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some(line) = lines.get(index) else {
                    break;
                };

                let (route, response) = match parse_line(line) {
                    Ok(record) => {
                        let response = ctx.dispatcher.handle(&record.route, record.body);
                        (Some(record.route), response)
                    }
                    Err(response) => (None, response),
                };

                if let Some(route) = route {
                    log_event(
                        &logger,
                        LogEvent::new("request_handled")
                            .with_request(route.trim_start_matches('/'), response.status),
                    );
                }
                if let Ok(mut tally) = tally.lock() {
                    *tally.entry(response.status).or_insert(0) += 1;
                }
                progress.inc(1);
            });
        }
    });
    progress.finish_and_clear();
    drop(ctx);

    let tally = tally
        .into_inner()
        .map_err(|_| anyhow::anyhow!("Result tally poisoned"))?;
    output::batch_summary(&tally, json)?;

    let all_ok = tally.keys().all(|status| *status == bankapi_core::domain::result::STATUS_OK);
    Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
