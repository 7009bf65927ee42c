//! ed25519 keypair construction from a derived 32-byte seed
//!
//! The derived seed is used directly as the RFC 8032 secret key; the public
//! key is its base58 rendering, which is also the Solana address.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::core::errors::WalletError;
use crate::crypto::slip10::DerivedKeySeed;

/// Length of the ed25519 secret seed.
pub const SECRET_SEED_LEN: usize = 32;

/// Length of a public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Public half of a derived keypair. Displays and serializes as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicIdentity([u8; PUBLIC_KEY_LEN]);

impl PublicIdentity {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Check an ed25519 signature made by the matching secret key.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        match VerifyingKey::from_bytes(&self.0) {
            Ok(key) => key.verify(message, &Signature::from_bytes(signature)).is_ok(),
            Err(_) => false,
        }
    }
}

impl fmt::Display for PublicIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for PublicIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicIdentity({})", self.to_base58())
    }
}

impl FromStr for PublicIdentity {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidPublicKey(e.to_string()))?;
        let bytes: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            WalletError::InvalidPublicKey(format!("expected {} bytes, got {}", PUBLIC_KEY_LEN, v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for PublicIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for PublicIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Full signing keypair. The secret half is wiped when this is dropped.
///
/// The registry never stores one of these; callers that need to sign get a
/// fresh keypair and drop it as soon as they are done.
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    pub fn public_key(&self) -> PublicIdentity {
        PublicIdentity(self.signing.verifying_key().to_bytes())
    }

    /// The 32-byte secret seed.
    pub fn secret_seed(&self) -> Zeroizing<[u8; SECRET_SEED_LEN]> {
        Zeroizing::new(self.signing.to_bytes())
    }

    /// 64-byte `secret || public` encoding used by Solana keypair files.
    pub fn to_keypair_bytes(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.signing.to_keypair_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Expands derived seeds into keypairs. Pure, no randomness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeypairConstructor;

impl KeypairConstructor {
    /// Build a keypair from a raw seed, which must be exactly 32 bytes.
    pub fn keypair_from_seed(&self, seed: &[u8]) -> Result<Keypair, WalletError> {
        let bytes: &[u8; SECRET_SEED_LEN] = seed.try_into().map_err(|_| WalletError::InvalidSeedLength {
            expected: SECRET_SEED_LEN,
            actual: seed.len(),
        })?;
        Ok(Keypair { signing: SigningKey::from_bytes(bytes) })
    }

    pub fn keypair_from_derived(&self, seed: &DerivedKeySeed) -> Keypair {
        Keypair { signing: SigningKey::from_bytes(seed.as_bytes()) }
    }
}
