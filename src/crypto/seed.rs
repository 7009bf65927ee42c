//! Mnemonic → master seed stretching
//!
//! BIP39 seed derivation: PBKDF2-HMAC-SHA512, 2048 rounds, salt
//! `"mnemonic" || passphrase` (NFKD). The round count is what makes offline
//! guessing of a weak passphrase expensive; the cost is paid once per
//! session when the seed is cached.
//!
//! Phrases are always validated before stretching: `to_seed` takes a parsed
//! `RecoveryPhrase`, and `to_seed_str` parses first.

use std::fmt;

use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::core::errors::WalletError;
use crate::core::mnemonic::RecoveryPhrase;
use crate::security::redaction::redact_hex_bytes;

/// Length of a BIP39 seed in bytes.
pub const MASTER_SEED_LEN: usize = 64;

/// PBKDF2 iteration count fixed by BIP39.
pub const PBKDF2_ROUNDS: u32 = 2048;

/// 64-byte BIP39 seed, wiped on drop.
pub struct MasterSeed(Zeroizing<[u8; MASTER_SEED_LEN]>);

impl MasterSeed {
    pub fn from_bytes(bytes: [u8; MASTER_SEED_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl fmt::Debug for MasterSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterSeed({})", redact_hex_bytes(self.as_bytes()))
    }
}

/// Stretches recovery phrases into master seeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedDeriver;

impl SeedDeriver {
    /// Deterministic: the same phrase and passphrase always give the same seed.
    pub fn to_seed(&self, phrase: &RecoveryPhrase, passphrase: &str) -> MasterSeed {
        debug!(rounds = PBKDF2_ROUNDS, words = phrase.word_count(), "Stretching recovery phrase");
        let mut raw = phrase.mnemonic().to_seed(passphrase);
        let seed = MasterSeed::from_bytes(raw);
        raw.zeroize();
        seed
    }

    /// Parse and validate `phrase`, then stretch it.
    pub fn to_seed_str(&self, phrase: &str, passphrase: &str) -> Result<MasterSeed, WalletError> {
        let phrase: RecoveryPhrase = phrase.parse()?;
        Ok(self.to_seed(&phrase, passphrase))
    }
}
