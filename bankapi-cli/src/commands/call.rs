//! Call command - send a raw JSON request to a route

use std::io::Read;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use bankapi_core::services::{EntryPoint, LogEvent};

use super::{exit_code, get_context, get_logger, log_event};
use crate::output;

pub fn run(route: &str, body: Option<String>) -> Result<ExitCode> {
    let raw = match body {
        Some(b) => b,
        None if atty::isnt(atty::Stream::Stdin) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request body from stdin")?;
            buf
        }
        None => bail!("No request body; pass --body or pipe JSON on stdin"),
    };

    let logger = get_logger(EntryPoint::Cli);
    log_event(&logger, LogEvent::new("command_executed").with_command("call"));

    // A body that is not JSON at all is answered like any other malformed request
    let body: serde_json::Value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);

    let response = {
        let ctx = get_context()?;
        ctx.dispatcher.handle(route, body)
    };
    log_event(
        &logger,
        LogEvent::new("request_handled").with_request(route.trim_start_matches('/'), response.status),
    );

    // Raw calls always answer in JSON, like the routes they stand in for
    output::response(&response, true)?;
    Ok(exit_code(&response))
}
