//! Output formatting utilities

use std::collections::BTreeMap;

use anyhow::Result;
use bankapi_core::Response;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print a ledger response, as JSON or for a human
pub fn response(response: &Response, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    if let Some(balance) = &response.balance {
        let mut table = create_table();
        table.set_header(vec!["Account", "Cash", "Debt"]);
        table.add_row(vec![
            balance.username.clone(),
            balance.cash.to_string(),
            balance.debt.to_string(),
        ]);
        println!("{}", table);
        return Ok(());
    }

    let msg = response.msg.as_deref().unwrap_or_default();
    if response.is_ok() {
        success(msg);
    } else {
        error(&format!("[{}] {}", response.status, msg));
    }
    Ok(())
}

/// Print per-status request counts after a batch
pub fn batch_summary(tally: &BTreeMap<u16, usize>, json: bool) -> Result<()> {
    let total: usize = tally.values().sum();

    if json {
        let by_status: BTreeMap<String, usize> =
            tally.iter().map(|(status, count)| (status.to_string(), *count)).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "total": total,
                "by_status": by_status,
            }))?
        );
        return Ok(());
    }

    println!("{}", format!("Processed {} request(s)", total).bold());
    let mut table = create_table();
    table.set_header(vec!["Status", "Count"]);
    for (status, count) in tally {
        let label = if *status == 200 {
            status.to_string().green().to_string()
        } else {
            status.to_string().red().to_string()
        };
        table.add_row(vec![label, count.to_string()]);
    }
    println!("{}", table);
    Ok(())
}
