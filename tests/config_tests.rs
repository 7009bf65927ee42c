use std::io::Write;

use serial_test::serial;
use sol_hd_keyring::core::config::WalletConfig;
use sol_hd_keyring::{AccountRegistry, WalletError};

const ENV_KEYS: [&str; 3] = ["WALLET_WORD_COUNT", "WALLET_COIN_TYPE", "WALLET_CACHE_SEED"];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn load_reads_file_and_env() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[derivation]\ncoin_type = 1\n\n[session]\ncache_master_seed = false").unwrap();

    std::env::set_var("WALLET_WORD_COUNT", "24");
    let config = WalletConfig::load(file.path()).unwrap();
    clear_env();

    assert_eq!(config.derivation.coin_type, 1);
    assert_eq!(config.derivation.purpose, 44);
    assert!(!config.session.cache_master_seed);
    assert_eq!(config.mnemonic.default_word_count, 24);
}

#[test]
#[serial]
fn env_overrides_defaults() {
    clear_env();
    std::env::set_var("WALLET_COIN_TYPE", "60");
    std::env::set_var("WALLET_CACHE_SEED", "false");
    let config = WalletConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.derivation.coin_type, 60);
    assert!(!config.session.cache_master_seed);
}

#[test]
#[serial]
fn bad_env_value_is_a_config_error() {
    clear_env();
    std::env::set_var("WALLET_WORD_COUNT", "thirteen");
    let err = WalletConfig::from_env().unwrap_err();
    clear_env();
    assert!(matches!(err, WalletError::Config(ref m) if m.contains("WALLET_WORD_COUNT")));

    std::env::set_var("WALLET_WORD_COUNT", "13");
    let err = WalletConfig::from_env().unwrap_err();
    clear_env();
    assert!(matches!(err, WalletError::Config(_)));
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = WalletConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, WalletError::Config(ref m) if m.contains("absent.toml")));
}

#[test]
fn malformed_toml_is_rejected() {
    assert!(matches!(
        WalletConfig::from_toml_str("[derivation\ncoin_type = 1"),
        Err(WalletError::Config(_))
    ));
}

#[test]
fn registry_honours_narrowed_word_counts() {
    let config = WalletConfig::from_toml_str(
        "[mnemonic]\ndefault_word_count = 24\nallowed_word_counts = [24]\n",
    )
    .unwrap();
    let mut registry = AccountRegistry::from_config(&config).unwrap();
    assert_eq!(registry.create_wallet(12).unwrap_err(), WalletError::UnsupportedWordCount(12));
    assert_eq!(registry.create_wallet(24).unwrap().phrase.split(' ').count(), 24);
}
