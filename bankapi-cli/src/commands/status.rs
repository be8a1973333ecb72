//! Status command - show ledger totals

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.summary()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Ledger Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Accounts".to_string(), status.total_accounts.to_string()]);
    table.add_row(vec!["Total cash".to_string(), status.total_cash.to_string()]);
    table.add_row(vec!["Total debt".to_string(), status.total_debt.to_string()]);
    table.add_row(vec!["Fees collected".to_string(), status.fees_collected.to_string()]);
    table.add_row(vec!["Fee per transaction".to_string(), status.fee.to_string()]);
    println!("{}", table);

    if !status.bank_account_exists {
        println!();
        println!(
            "{}",
            format!("Fee account '{}' is missing; run `bank doctor`", status.bank_account).yellow()
        );
    }

    Ok(())
}
