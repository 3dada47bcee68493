use crate::error::{DashboardError, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub primary_lcd: String,
    pub secondary_lcd: String,
    pub profile_lcd: Option<String>,
    pub bech32_prefix: String,
    pub coin_denom: String,
    pub parallel_limit: usize,
    pub page_size: usize,
    pub wallet_address: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let primary_lcd = env::var("PRIMARY_LCD")
            .map_err(|_| DashboardError::Config("PRIMARY_LCD must be set".to_string()))?;
        let secondary_lcd = env::var("SECONDARY_LCD").unwrap_or_else(|_| primary_lcd.clone());

        Ok(Self {
            primary_lcd,
            secondary_lcd,
            profile_lcd: env::var("PROFILE_LCD").ok().filter(|s| !s.is_empty()),
            bech32_prefix: env::var("BECH32_PREFIX").unwrap_or_else(|_| "cosmos".to_string()),
            coin_denom: env::var("COIN_DENOM").unwrap_or_else(|_| "uatom".to_string()),
            parallel_limit: parse_var("PARALLEL_LIMIT", 16)?,
            page_size: parse_var("PAGE_SIZE", 20)?,
            wallet_address: env::var("WALLET_ADDRESS").ok().filter(|s| !s.is_empty()),
        })
    }

    pub fn prefixes(&self) -> Bech32Prefixes {
        Bech32Prefixes::from_base(&self.bech32_prefix)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| DashboardError::Config(format!("{} is not a valid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

/// Address prefixes derived from the chain's base prefix, following the
/// Cosmos SDK convention (`cosmos`, `cosmosvaloper`, `cosmosvalcons`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bech32Prefixes {
    pub account: String,
    pub validator_operator: String,
    pub consensus: String,
}

impl Bech32Prefixes {
    pub fn from_base(base: &str) -> Self {
        Self {
            account: base.to_string(),
            validator_operator: format!("{}valoper", base),
            consensus: format!("{}valcons", base),
        }
    }
}
