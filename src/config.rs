//! Ledger policy knobs.
//!
//! The library takes a [`LedgerConfig`] value at construction; the binary
//! builds one from the environment.

use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable that lets postings land on inactive cash boxes.
pub const ALLOW_INACTIVE_ENV: &str = "CASHBOX_ALLOW_INACTIVE_POSTINGS";

/// Environment variable overriding the cash box code prefix.
pub const CODE_PREFIX_ENV: &str = "CASHBOX_CODE_PREFIX";

/// Policy settings for a ledger instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// When `false`, posting to an inactive box fails with `CashBoxInactive`.
    pub allow_inactive_postings: bool,

    /// Prefix for generated cash box codes (`CB` gives `CB001`).
    pub code_prefix: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            allow_inactive_postings: false,
            code_prefix: "CB".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Reads overrides from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LedgerConfig::default();

        if let Some(value) = lookup(ALLOW_INACTIVE_ENV) {
            config.allow_inactive_postings = parse_flag(&value);
        }

        if let Some(prefix) = lookup(CODE_PREFIX_ENV) {
            let prefix = prefix.trim();
            if !prefix.is_empty() {
                config.code_prefix = prefix.to_string();
            }
        }

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
