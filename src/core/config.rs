use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::core::derivation::HARDENED_OFFSET;
use crate::core::errors::WalletError;
use crate::core::mnemonic::SUPPORTED_WORD_COUNTS;

/// Derivation path configuration
///
/// Account paths are rendered as `m/{purpose}'/{coin_type}'/{account}'/{change}'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationConfig {
    /// BIP44 purpose component
    #[serde(default = "DerivationConfig::default_purpose")]
    pub purpose: u32,

    /// SLIP-0044 coin type (501 = Solana)
    #[serde(default = "DerivationConfig::default_coin_type")]
    pub coin_type: u32,

    /// Trailing change component, always hardened
    #[serde(default = "DerivationConfig::default_change")]
    pub change: u32,
}

impl DerivationConfig {
    fn default_purpose() -> u32 { 44 }
    fn default_coin_type() -> u32 { 501 }
    fn default_change() -> u32 { 0 }
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            purpose: Self::default_purpose(),
            coin_type: Self::default_coin_type(),
            change: Self::default_change(),
        }
    }
}

/// Recovery phrase configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MnemonicConfig {
    /// Word count used when the caller does not ask for one
    #[serde(default = "MnemonicConfig::default_word_count")]
    pub default_word_count: usize,

    /// Word counts accepted when generating a new phrase
    #[serde(default = "MnemonicConfig::default_allowed_word_counts")]
    pub allowed_word_counts: Vec<usize>,
}

impl MnemonicConfig {
    fn default_word_count() -> usize { 12 }
    fn default_allowed_word_counts() -> Vec<usize> { SUPPORTED_WORD_COUNTS.to_vec() }
}

impl Default for MnemonicConfig {
    fn default() -> Self {
        Self {
            default_word_count: Self::default_word_count(),
            allowed_word_counts: Self::default_allowed_word_counts(),
        }
    }
}

/// Session behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Keep the stretched master seed in memory for the session instead of
    /// re-running PBKDF2 on every derivation
    #[serde(default = "SessionConfig::default_cache_master_seed")]
    pub cache_master_seed: bool,
}

impl SessionConfig {
    fn default_cache_master_seed() -> bool { true }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { cache_master_seed: Self::default_cache_master_seed() }
    }
}

/// Keyring configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub derivation: DerivationConfig,

    #[serde(default)]
    pub mnemonic: MnemonicConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl WalletConfig {
    /// Parse a TOML document; missing sections and fields fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, WalletError> {
        let config: WalletConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, then apply `WALLET_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading keyring configuration");
        let content = std::fs::read_to_string(path).map_err(|e| {
            WalletError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for callers without a config file.
    pub fn from_env() -> Result<Self, WalletError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `WALLET_WORD_COUNT`, `WALLET_COIN_TYPE` and `WALLET_CACHE_SEED`.
    pub fn apply_env_overrides(&mut self) -> Result<(), WalletError> {
        if let Some(count) = env_parse::<usize>("WALLET_WORD_COUNT")? {
            self.mnemonic.default_word_count = count;
        }
        if let Some(coin_type) = env_parse::<u32>("WALLET_COIN_TYPE")? {
            self.derivation.coin_type = coin_type;
        }
        if let Some(cache) = env_parse::<bool>("WALLET_CACHE_SEED")? {
            self.session.cache_master_seed = cache;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        let d = &self.derivation;
        for (name, value) in [("purpose", d.purpose), ("coin_type", d.coin_type), ("change", d.change)] {
            if value >= HARDENED_OFFSET {
                return Err(WalletError::Config(format!(
                    "derivation.{} must be below 2^31, got {}",
                    name, value
                )));
            }
        }

        let m = &self.mnemonic;
        if m.allowed_word_counts.is_empty() {
            return Err(WalletError::Config("mnemonic.allowed_word_counts is empty".into()));
        }
        if let Some(bad) = m.allowed_word_counts.iter().find(|c| !SUPPORTED_WORD_COUNTS.contains(c)) {
            return Err(WalletError::Config(format!(
                "mnemonic.allowed_word_counts contains unsupported count {}",
                bad
            )));
        }
        if !m.allowed_word_counts.contains(&m.default_word_count) {
            return Err(WalletError::Config(format!(
                "mnemonic.default_word_count {} is not in allowed_word_counts",
                m.default_word_count
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, WalletError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| WalletError::Config(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_solana() {
        let cfg = WalletConfig::default();
        assert_eq!(cfg.derivation.purpose, 44);
        assert_eq!(cfg.derivation.coin_type, 501);
        assert_eq!(cfg.mnemonic.default_word_count, 12);
        assert!(cfg.session.cache_master_seed);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = WalletConfig::from_toml_str("[mnemonic]\ndefault_word_count = 24\n").unwrap();
        assert_eq!(cfg.mnemonic.default_word_count, 24);
        assert_eq!(cfg.mnemonic.allowed_word_counts, vec![12, 15, 18, 21, 24]);
        assert_eq!(cfg.derivation, DerivationConfig::default());
    }

    #[test]
    fn test_rejects_hardened_range_component() {
        let err = WalletConfig::from_toml_str("[derivation]\ncoin_type = 2147483648\n").unwrap_err();
        assert!(matches!(err, WalletError::Config(_)));
    }

    #[test]
    fn test_rejects_nonstandard_word_count() {
        let err = WalletConfig::from_toml_str("[mnemonic]\nallowed_word_counts = [12, 13]\n")
            .unwrap_err();
        assert!(err.to_string().contains("13"));
    }

    #[test]
    fn test_rejects_default_outside_allowed() {
        let toml = "[mnemonic]\ndefault_word_count = 24\nallowed_word_counts = [12]\n";
        assert!(WalletConfig::from_toml_str(toml).is_err());
    }
}
