//! Config command - view and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use rust_decimal::Decimal;

use super::get_data_dir;
use crate::output;
use bankapi_core::config::Config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the fee charged on deposits and transfers
    SetFee {
        /// New fee (zero or more)
        fee: Decimal,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let data_dir = get_data_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&data_dir)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "dataDir": data_dir.to_string_lossy(),
                        "fee": config.fee,
                        "bankAccount": config.bank_account,
                        "bankPasswordSet": config.bank_password.is_some(),
                        "argon2": config.argon2,
                    }))?
                );
                return Ok(());
            }

            println!("{}", "Settings".bold());
            let mut table = output::create_table();
            table.add_row(vec!["Data directory".to_string(), data_dir.display().to_string()]);
            table.add_row(vec!["Fee".to_string(), config.fee.to_string()]);
            table.add_row(vec!["Bank account".to_string(), config.bank_account.clone()]);
            table.add_row(vec![
                "Bank password".to_string(),
                if config.bank_password.is_some() { "set" } else { "locked" }.to_string(),
            ]);
            table.add_row(vec![
                "Argon2".to_string(),
                format!(
                    "t={} m={} p={}",
                    config.argon2.time_cost, config.argon2.memory_cost, config.argon2.parallelism
                ),
            ]);
            println!("{}", table);
        }
        ConfigCommands::SetFee { fee } => {
            std::fs::create_dir_all(&data_dir)?;
            let mut config = Config::load(&data_dir)?;
            config.fee = fee;
            config.save(&data_dir)?;
            output::success(&format!("Fee set to {}", fee));
        }
    }

    Ok(())
}
