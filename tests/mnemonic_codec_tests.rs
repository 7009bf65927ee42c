use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sol_hd_keyring::core::mnemonic::{
    entropy_len_for, EntropySource, FixedEntropy, MnemonicCodec, OsEntropy, RecoveryPhrase,
};
use sol_hd_keyring::WalletError;
use test_case::test_case;

const LEGAL_WINNER: &str =
    "legal winner thank year wave sausage worth useful legal winner thank yellow";

#[test_case(12, 16; "128 bits")]
#[test_case(15, 20; "160 bits")]
#[test_case(18, 24; "192 bits")]
#[test_case(21, 28; "224 bits")]
#[test_case(24, 32; "256 bits")]
fn generates_every_standard_size(word_count: usize, entropy_bytes: usize) {
    let codec = MnemonicCodec::default();
    let phrase = codec.generate(word_count, &mut OsEntropy).unwrap();

    assert_eq!(phrase.word_count(), word_count);
    assert_eq!(phrase.entropy().len(), entropy_bytes);
    assert_eq!(entropy_len_for(word_count), Some(entropy_bytes));
    assert!(codec.validate(&phrase.expose()));
}

#[test_case(0)]
#[test_case(11)]
#[test_case(13)]
#[test_case(25)]
fn rejects_nonstandard_sizes(word_count: usize) {
    let err = MnemonicCodec::default()
        .generate(word_count, &mut OsEntropy)
        .unwrap_err();
    assert_eq!(err, WalletError::UnsupportedWordCount(word_count));
}

#[test]
fn known_entropy_decodes() {
    let phrase: RecoveryPhrase = LEGAL_WINNER.parse().unwrap();
    assert_eq!(phrase.entropy().as_slice(), &[0x7f; 16]);

    let regenerated = MnemonicCodec::default()
        .generate(12, &mut FixedEntropy::new(vec![0x7f]))
        .unwrap();
    assert_eq!(regenerated, phrase);
}

#[test]
fn invalid_phrase_reasons() {
    let codec = MnemonicCodec::default();
    let too_short = codec.parse("legal winner thank").unwrap_err();
    assert!(matches!(too_short, WalletError::InvalidPhrase(ref m) if m.contains("3 words")));

    let unknown = codec.parse(&LEGAL_WINNER.replace("sausage", "sausages")).unwrap_err();
    assert!(matches!(unknown, WalletError::InvalidPhrase(ref m) if m.contains("#6")));
}

/// Deterministic source built outside the crate, to show any RNG can be plugged in.
struct SeededEntropy(StdRng);

impl EntropySource for SeededEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest);
    }
}

#[test]
fn custom_entropy_source_is_reproducible() {
    let codec = MnemonicCodec::default();
    let a = codec.generate(24, &mut SeededEntropy(StdRng::seed_from_u64(7))).unwrap();
    let b = codec.generate(24, &mut SeededEntropy(StdRng::seed_from_u64(7))).unwrap();
    let c = codec.generate(24, &mut SeededEntropy(StdRng::seed_from_u64(8))).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

fn generated_phrase() -> impl Strategy<Value = (usize, Vec<u8>)> {
    prop_oneof![Just(12usize), Just(15), Just(18), Just(21), Just(24)].prop_flat_map(|words| {
        let len = entropy_len_for(words).unwrap_or(16);
        (Just(words), proptest::collection::vec(any::<u8>(), len))
    })
}

proptest! {
    #[test]
    fn generated_phrases_validate((words, entropy) in generated_phrase()) {
        let codec = MnemonicCodec::default();
        let phrase = codec.generate(words, &mut FixedEntropy::new(entropy.clone())).unwrap();
        prop_assert!(codec.validate(&phrase.expose()));
        let decoded = phrase.entropy();
        prop_assert_eq!(decoded.as_slice(), entropy.as_slice());
    }

    #[test]
    fn truncated_phrases_fail((words, entropy) in generated_phrase(), drop in 1usize..3) {
        let codec = MnemonicCodec::default();
        let phrase = codec.generate(words, &mut FixedEntropy::new(entropy)).unwrap();
        let kept: Vec<&str> = phrase.words().take(words - drop).collect();
        prop_assert!(!codec.validate(&kept.join(" ")));
    }

    // A single substituted word keeps the length valid, so only the checksum
    // catches it. With 4..8 checksum bits, 1 in 16 to 1 in 256 substitutions
    // slip through, so count them instead of asserting on each one.
    #[test]
    fn substituted_word_is_usually_caught(
        (words, entropy) in generated_phrase(),
        position in any::<prop::sample::Index>(),
    ) {
        let codec = MnemonicCodec::default();
        let phrase = codec.generate(words, &mut FixedEntropy::new(entropy)).unwrap();
        let original: Vec<&str> = phrase.words().collect();
        let at = position.index(original.len());

        let wordlist = bip39::Language::English.word_list();
        let mut accepted = 0usize;
        let mut tried = 0usize;
        for candidate in wordlist.iter().step_by(37) {
            if *candidate == original[at] {
                continue;
            }
            let mut changed = original.clone();
            changed[at] = *candidate;
            tried += 1;
            if codec.validate(&changed.join(" ")) {
                accepted += 1;
            }
        }
        prop_assert!(accepted * 3 <= tried, "{} of {} substitutions accepted", accepted, tried);
    }
}
