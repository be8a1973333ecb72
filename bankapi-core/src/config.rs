//! Configuration management
//!
//! Settings live in settings.json inside the data directory:
//! ```json
//! {
//!   "ledger": { "fee": 1, "bankAccount": "BANK", "bankPassword": null },
//!   "security": { "argon2": { "timeCost": 3, "memoryCost": 65536, "parallelism": 4, "hashLen": 32 } }
//! }
//! ```
//! Keys this crate does not know about are kept when the file is saved.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Account, Argon2Params, BANK_USERNAME};
use crate::services::DEFAULT_FEE;

/// Environment variable overriding the configured fee
pub const FEE_ENV_VAR: &str = "BANKAPI_FEE";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    ledger: LedgerSettings,
    #[serde(default)]
    security: SecuritySettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerSettings {
    #[serde(default = "default_fee")]
    fee: Decimal,
    #[serde(default = "default_bank_account")]
    bank_account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bank_password: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            fee: default_fee(),
            bank_account: default_bank_account(),
            bank_password: None,
            other: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecuritySettings {
    #[serde(default)]
    argon2: Argon2Params,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

fn default_fee() -> Decimal {
    DEFAULT_FEE
}

fn default_bank_account() -> String {
    BANK_USERNAME.to_string()
}

/// Ledger configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub fee: Decimal,
    pub bank_account: String,
    pub bank_password: Option<String>,
    pub argon2: Argon2Params,
    // Keep the raw settings for preservation when saving
    #[doc(hidden)]
    pub _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_raw(SettingsFile::default())
    }
}

impl Config {
    fn from_raw(raw: SettingsFile) -> Self {
        Self {
            fee: raw.ledger.fee,
            bank_account: raw.ledger.bank_account.clone(),
            bank_password: raw.ledger.bank_password.clone(),
            argon2: raw.security.argon2.clone(),
            _raw_settings: raw,
        }
    }

    /// Load config from the data directory
    ///
    /// The fee can be overridden with the BANKAPI_FEE environment variable.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            match serde_json::from_str(&content) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(error = %e, "settings.json is invalid, using defaults");
                    SettingsFile::default()
                }
            }
        } else {
            SettingsFile::default()
        };

        let mut config = Self::from_raw(raw);

        if let Ok(fee) = std::env::var(FEE_ENV_VAR) {
            config.fee = Decimal::from_str(fee.trim())
                .with_context(|| format!("{} is not a decimal: {}", FEE_ENV_VAR, fee))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.fee < Decimal::ZERO {
            bail!("Fee cannot be negative: {}", self.fee);
        }
        if let Err(e) = Account::validate_amount(self.fee) {
            bail!("Invalid fee: {}", e);
        }
        if self.bank_account.trim().is_empty() || self.bank_account.trim() != self.bank_account {
            bail!("Invalid bank account name: {:?}", self.bank_account);
        }
        Ok(())
    }

    /// Save config to the data directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        self.validate()?;
        let settings_path = data_dir.join("settings.json");

        // Load existing settings to preserve fields we don't manage
        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            self._raw_settings.clone()
        };

        // Update only the fields we manage
        settings.ledger.fee = self.fee;
        settings.ledger.bank_account = self.bank_account.clone();
        settings.ledger.bank_password = self.bank_password.clone();
        settings.security.argon2 = self.argon2.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }
}
