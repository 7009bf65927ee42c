//! SLIP-0010 hierarchical derivation for ed25519
//!
//! Master: `I = HMAC-SHA512("ed25519 seed", seed)`.
//! Child:  `I = HMAC-SHA512(c_par, 0x00 || k_par || ser32(i))`, hardened only.
//! In both cases `I[..32]` is the key and `I[32..]` the chain code. No public
//! key point arithmetic is involved, which is why ed25519 cannot support
//! non-hardened steps.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha512;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::derivation::{ChildIndex, DerivationPath};
use crate::core::errors::WalletError;
use crate::crypto::seed::MasterSeed;
use crate::security::redaction::redact_hex_bytes;

type HmacSha512 = Hmac<Sha512>;

/// HMAC key for the master node, fixed by SLIP-0010 for ed25519.
const ED25519_CURVE_KEY: &[u8] = b"ed25519 seed";

/// Length of a derived key and of a chain code.
pub const DERIVED_KEY_LEN: usize = 32;

/// 32-byte child secret at the end of a path, wiped on drop.
pub struct DerivedKeySeed(Zeroizing<[u8; DERIVED_KEY_LEN]>);

impl DerivedKeySeed {
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKeySeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKeySeed({})", redact_hex_bytes(self.0.as_ref()))
    }
}

/// Key plus chain code at one node of the tree.
struct ExtendedKey {
    key: Zeroizing<[u8; DERIVED_KEY_LEN]>,
    chain_code: Zeroizing<[u8; DERIVED_KEY_LEN]>,
}

impl ExtendedKey {
    fn master(seed: &[u8]) -> Result<Self, WalletError> {
        let mut mac = HmacSha512::new_from_slice(ED25519_CURVE_KEY)
            .map_err(|e| WalletError::Internal(format!("HMAC initialization failed: {}", e)))?;
        mac.update(seed);
        Ok(Self::from_hmac(mac))
    }

    fn derive_hardened(&self, child: ChildIndex) -> Result<Self, WalletError> {
        if !child.is_hardened() {
            return Err(WalletError::InvalidPath(format!(
                "ed25519 derivation supports hardened components only, got {}",
                child
            )));
        }

        let mut mac = HmacSha512::new_from_slice(self.chain_code.as_ref())
            .map_err(|e| WalletError::Internal(format!("HMAC initialization failed: {}", e)))?;
        mac.update(&[0x00]);
        mac.update(self.key.as_ref());
        mac.update(&child.to_u32().to_be_bytes());
        Ok(Self::from_hmac(mac))
    }

    fn from_hmac(mac: HmacSha512) -> Self {
        let mut output = Zeroizing::new([0u8; 64]);
        output.copy_from_slice(&mac.finalize().into_bytes());

        let mut key = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
        let mut chain_code = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
        key.copy_from_slice(&output[..DERIVED_KEY_LEN]);
        chain_code.copy_from_slice(&output[DERIVED_KEY_LEN..]);
        Self { key, chain_code }
    }
}

/// Walks a derivation path over a master seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathDeriver;

impl PathDeriver {
    /// Derive the 32-byte child secret at `path`.
    ///
    /// Fails with `InvalidPath` before doing any work if the path contains a
    /// non-hardened component.
    pub fn derive(&self, seed: &MasterSeed, path: &DerivationPath) -> Result<DerivedKeySeed, WalletError> {
        self.derive_from_bytes(seed.as_bytes(), path)
    }

    /// Same as [`derive`](Self::derive) for a seed held as raw bytes.
    pub fn derive_from_bytes(&self, seed: &[u8], path: &DerivationPath) -> Result<DerivedKeySeed, WalletError> {
        if let Some((position, component)) = path.first_unhardened() {
            return Err(WalletError::InvalidPath(format!(
                "component {} ({}) of {} is not hardened",
                position + 1,
                component,
                path
            )));
        }

        debug!(%path, "Deriving child key");
        let mut node = ExtendedKey::master(seed)?;
        for component in path.components() {
            node = node.derive_hardened(*component)?;
        }
        Ok(DerivedKeySeed(node.key))
    }
}
