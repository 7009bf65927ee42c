use std::sync::OnceLock;

use proptest::prelude::*;
use sol_hd_keyring::core::derivation::{DerivationPath, PathTemplate};
use sol_hd_keyring::core::keypair::KeypairConstructor;
use sol_hd_keyring::crypto::seed::{MasterSeed, SeedDeriver};
use sol_hd_keyring::crypto::slip10::PathDeriver;
use sol_hd_keyring::{KeyEngine, WalletError};
use test_case::test_case;

const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

// BIP39 reference vector (entropy 00..00, passphrase "TREZOR")
const TREZOR_SEED: &str = "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04";

// Standard Solana wallet address at m/44'/501'/0'/0' for ABANDON_ABOUT
const SOLANA_ACCOUNT_ZERO: &str = "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk";

fn shared_seed() -> &'static MasterSeed {
    static SEED: OnceLock<MasterSeed> = OnceLock::new();
    SEED.get_or_init(|| SeedDeriver.to_seed_str(ABANDON_ABOUT, "").unwrap())
}

#[test]
fn bip39_seed_vector() {
    let seed = SeedDeriver.to_seed_str(ABANDON_ABOUT, "TREZOR").unwrap();
    assert_eq!(hex::encode(seed.as_bytes()), TREZOR_SEED);
}

#[test]
fn first_solana_address_for_abandon_about() {
    let engine = KeyEngine::default();
    let identity = engine.derive_identity(shared_seed(), 0).unwrap();
    assert_eq!(identity.to_base58(), SOLANA_ACCOUNT_ZERO);
    assert_eq!(
        engine.keypair_from_phrase(ABANDON_ABOUT, "", 0).unwrap().public_key().to_base58(),
        SOLANA_ACCOUNT_ZERO
    );
}

#[test]
fn seed_ignores_phrase_formatting() {
    let messy = format!("  {}\n", ABANDON_ABOUT.to_uppercase().replace(' ', "\t "));
    let seed = SeedDeriver.to_seed_str(&messy, "").unwrap();
    assert_eq!(seed.as_bytes(), shared_seed().as_bytes());
}

#[test_case("m/44'/501'/0'/0'", 4; "solana account zero")]
#[test_case("m/44h/501h/7h/0h", 4; "h marker")]
#[test_case("m/0'", 1; "single step")]
#[test_case("m", 0; "root only")]
fn parses_hardened_paths(text: &str, depth: usize) {
    let path: DerivationPath = text.parse().unwrap();
    assert_eq!(path.len(), depth);
    assert!(path.first_unhardened().is_none());
}

#[test_case("44'/501'"; "missing root")]
#[test_case("m//0'"; "empty component")]
#[test_case("m/2147483648'"; "index out of range")]
#[test_case("m/abc'"; "not a number")]
fn rejects_malformed_paths(text: &str) {
    let err = text.parse::<DerivationPath>().unwrap_err();
    assert!(matches!(err, WalletError::InvalidPath(_)), "{} gave {:?}", text, err);
}

#[test]
fn unhardened_component_fails_derivation() {
    let path: DerivationPath = "m/44'/501'/0'/0".parse().unwrap();
    assert!(path.first_unhardened().is_some());
    let err = PathDeriver.derive(shared_seed(), &path).unwrap_err();
    assert!(matches!(err, WalletError::InvalidPath(_)));
}

#[test]
fn template_matches_solana_convention() {
    let template = PathTemplate::default();
    for account in [0u32, 1, 42] {
        assert_eq!(
            template.for_account(account).unwrap(),
            DerivationPath::solana_account(account).unwrap()
        );
        assert_eq!(
            template.for_account(account).unwrap().to_string(),
            format!("m/44'/501'/{}'/0'", account)
        );
    }
}

#[test]
fn engine_equals_manual_pipeline() {
    let engine = KeyEngine::default();
    let path = DerivationPath::solana_account(3).unwrap();
    let derived = PathDeriver.derive(shared_seed(), &path).unwrap();
    let manual = KeypairConstructor.keypair_from_seed(derived.as_bytes()).unwrap();

    let via_engine = engine.derive_keypair(shared_seed(), 3).unwrap();
    assert_eq!(via_engine.public_key(), manual.public_key());
    assert_eq!(via_engine.to_keypair_bytes().as_slice(), manual.to_keypair_bytes().as_slice());
}

#[test]
fn signatures_verify_under_derived_identity() {
    let engine = KeyEngine::default();
    let keypair = engine.keypair_from_phrase(ABANDON_ABOUT, "", 0).unwrap();
    let signature = keypair.sign(b"message");
    assert!(keypair.public_key().verify(b"message", &signature));

    let other = engine.derive_identity(shared_seed(), 1).unwrap();
    assert!(!other.verify(b"message", &signature));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn derivation_is_deterministic(index in 0u32..0x8000_0000) {
        let engine = KeyEngine::default();
        let a = engine.derive_identity(shared_seed(), index).unwrap();
        let b = engine.derive_identity(shared_seed(), index).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn neighbouring_accounts_differ(index in 0u32..0x7fff_ffff) {
        let engine = KeyEngine::default();
        let a = engine.derive_identity(shared_seed(), index).unwrap();
        let b = engine.derive_identity(shared_seed(), index + 1).unwrap();
        prop_assert_ne!(a, b);
    }

    #[test]
    fn path_text_roundtrips(components in proptest::collection::vec(0u32..0x8000_0000, 0..6)) {
        let text = components.iter().fold(String::from("m"), |acc, c| format!("{}/{}'", acc, c));
        let path: DerivationPath = text.parse().unwrap();
        prop_assert_eq!(path.to_string(), text);
    }
}
