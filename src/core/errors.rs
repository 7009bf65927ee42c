//! Error type shared by the keyring engine and the account registry.
//!
//! Every variant is recoverable: callers surface the message and let the user
//! retry. Messages never carry phrase words, seeds or secret keys.

use thiserror::Error;

/// Errors produced by phrase handling, derivation and registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// Requested mnemonic length is not one of the supported word counts.
    #[error("Unsupported word count: {0}")]
    UnsupportedWordCount(usize),

    /// Phrase failed to decode (word count, unknown word or checksum).
    #[error("Invalid recovery phrase: {0}")]
    InvalidPhrase(String),

    /// Derivation path is malformed or contains a non-hardened component.
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    /// Keypair construction received a seed of the wrong length.
    #[error("Invalid seed length: expected {expected} bytes, got {actual}")]
    InvalidSeedLength { expected: usize, actual: usize },

    /// Operation needs an active phrase but the registry is empty.
    #[error("No active recovery phrase")]
    NoActivePhrase,

    /// Removing the identity would leave the registry without any identity.
    #[error("Cannot remove the last remaining identity")]
    LastIdentityProtected,

    /// No live identity exists at the given account index.
    #[error("No identity at index {0}")]
    IndexNotFound(u32),

    /// A stored identity no longer matches what the phrase derives.
    #[error("Stored identity at index {index} does not match re-derivation")]
    DerivationMismatch { index: u32 },

    /// Public key text is not a valid base58 ed25519 key.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure (primitive misuse, task join failure).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// True for the error kinds a user can trigger through normal input,
    /// as opposed to configuration or internal faults.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            WalletError::UnsupportedWordCount(_)
                | WalletError::InvalidPhrase(_)
                | WalletError::InvalidPath(_)
                | WalletError::InvalidSeedLength { .. }
                | WalletError::NoActivePhrase
                | WalletError::LastIdentityProtected
                | WalletError::IndexNotFound(_)
                | WalletError::InvalidPublicKey(_)
        )
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = WalletError> = std::result::Result<T, E>;

impl From<bip39::Error> for WalletError {
    fn from(err: bip39::Error) -> Self {
        // The bip39 messages only mention counts and positions, never words.
        let reason = match err {
            bip39::Error::BadWordCount(count) => format!("{} words is not a valid phrase length", count),
            bip39::Error::UnknownWord(position) => {
                format!("word #{} is not in the wordlist", position + 1)
            }
            bip39::Error::InvalidChecksum => "checksum mismatch".to_string(),
            other => other.to_string(),
        };
        WalletError::InvalidPhrase(reason)
    }
}

impl From<toml::de::Error> for WalletError {
    fn from(err: toml::de::Error) -> Self {
        WalletError::Config(err.to_string())
    }
}
