//! Recovery phrase codec (BIP39, English wordlist)
//!
//! Entropy of 128..=256 bits is extended with a SHA-256 checksum and encoded
//! as 12..=24 words. Decoding recomputes the checksum, so a phrase with a
//! substituted or missing word is rejected.

use std::fmt;
use std::str::FromStr;

use bip39::{Language, Mnemonic};
use rand_core::{OsRng, RngCore};
use tracing::debug;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::core::config::MnemonicConfig;
use crate::core::errors::WalletError;
use crate::security::redaction::redact_phrase;
use crate::security::secret::{SecretString, SecretVec};

/// Word counts defined by BIP39.
pub const SUPPORTED_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Entropy size in bytes for a BIP39 word count, `None` if unsupported.
///
/// Each word carries 11 bits and the checksum is one bit per 32 bits of
/// entropy, so `ENT = words * 32 / 3` bits.
pub fn entropy_len_for(word_count: usize) -> Option<usize> {
    SUPPORTED_WORD_COUNTS
        .contains(&word_count)
        .then(|| word_count * 4 / 3)
}

/// Source of the random bytes a new phrase is built from.
pub trait EntropySource {
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

/// Replays a fixed byte pattern, cycling when exhausted.
///
/// Only meant for reproducible tests; never use it to create a real wallet.
#[derive(Clone)]
pub struct FixedEntropy {
    bytes: Zeroizing<Vec<u8>>,
    position: usize,
}

impl FixedEntropy {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: Zeroizing::new(bytes.into()), position: 0 }
    }
}

impl EntropySource for FixedEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if self.bytes.is_empty() {
            dest.fill(0);
            return;
        }
        for byte in dest.iter_mut() {
            *byte = self.bytes[self.position];
            self.position = (self.position + 1) % self.bytes.len();
        }
    }
}

impl fmt::Debug for FixedEntropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedEntropy").field("len", &self.bytes.len()).finish()
    }
}

/// A checksum-valid mnemonic. Immutable once built; word indices are wiped on drop.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct RecoveryPhrase {
    mnemonic: Mnemonic,
}

impl RecoveryPhrase {
    pub fn word_count(&self) -> usize {
        self.mnemonic.word_count()
    }

    pub fn words(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.mnemonic.words()
    }

    /// Words joined by single spaces, in a buffer wiped on drop.
    pub fn expose(&self) -> SecretString {
        let mut out = Zeroizing::new(String::with_capacity(self.word_count() * 9));
        for (i, word) in self.words().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(word);
        }
        out
    }

    /// Raw entropy recovered from the word indices.
    pub fn entropy(&self) -> SecretVec {
        Zeroizing::new(self.mnemonic.to_entropy())
    }

    pub(crate) fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoveryPhrase({})", redact_phrase(&self.expose()))
    }
}

impl FromStr for RecoveryPhrase {
    type Err = WalletError;

    /// Accepts any BIP39 length; case and surrounding whitespace are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)?;
        Ok(Self { mnemonic })
    }
}

/// Lower-cases and collapses whitespace so pasted phrases decode.
fn normalize(input: &str) -> SecretString {
    let mut out = Zeroizing::new(String::with_capacity(input.len()));
    for word in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

/// Generates, validates and parses recovery phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnemonicCodec {
    allowed_word_counts: Vec<usize>,
}

impl MnemonicCodec {
    /// Codec restricted to `allowed_word_counts` for generation.
    pub fn new(allowed_word_counts: Vec<usize>) -> Result<Self, WalletError> {
        if let Some(bad) = allowed_word_counts.iter().find(|c| entropy_len_for(**c).is_none()) {
            return Err(WalletError::UnsupportedWordCount(*bad));
        }
        Ok(Self { allowed_word_counts })
    }

    pub fn from_config(cfg: &MnemonicConfig) -> Result<Self, WalletError> {
        Self::new(cfg.allowed_word_counts.clone())
    }

    pub fn allowed_word_counts(&self) -> &[usize] {
        &self.allowed_word_counts
    }

    /// Draw entropy for `word_count` words from `entropy` and encode it.
    pub fn generate(
        &self,
        word_count: usize,
        entropy: &mut dyn EntropySource,
    ) -> Result<RecoveryPhrase, WalletError> {
        let len = entropy_len_for(word_count)
            .filter(|_| self.allowed_word_counts.contains(&word_count))
            .ok_or(WalletError::UnsupportedWordCount(word_count))?;

        let mut bytes: SecretVec = Zeroizing::new(vec![0u8; len]);
        entropy.fill_bytes(&mut bytes);
        let mnemonic = Mnemonic::from_entropy_in(Language::English, &bytes)
            .map_err(|e| WalletError::Internal(format!("entropy encoding failed: {}", e)))?;

        debug!(word_count, "Generated recovery phrase");
        Ok(RecoveryPhrase { mnemonic })
    }

    /// Checksum check that reports failure as `false`, never as an error.
    pub fn validate(&self, phrase: &str) -> bool {
        phrase.parse::<RecoveryPhrase>().is_ok()
    }

    /// Decode a phrase, failing with `InvalidPhrase`.
    pub fn parse(&self, phrase: &str) -> Result<RecoveryPhrase, WalletError> {
        phrase.parse()
    }
}

impl Default for MnemonicCodec {
    fn default() -> Self {
        Self { allowed_word_counts: SUPPORTED_WORD_COUNTS.to_vec() }
    }
}
