//! Derivation path model
//!
//! Solana accounts live at `m/44'/501'/{account}'/0'`. Every component of
//! that path is hardened, which is the only kind of step SLIP-0010 allows on
//! ed25519. Non-hardened components can still be parsed and represented so
//! that the deriver can reject them explicitly instead of mis-deriving.

use std::fmt;
use std::str::FromStr;

use crate::core::config::DerivationConfig;
use crate::core::errors::WalletError;

/// Offset added to an index to mark it hardened (2^31).
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One step of a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildIndex {
    index: u32,
    hardened: bool,
}

impl ChildIndex {
    /// Hardened step `index'`. The index must be below 2^31.
    pub fn hardened(index: u32) -> Result<Self, WalletError> {
        Self::checked(index, true)
    }

    /// Non-hardened step `index`. The index must be below 2^31.
    pub fn normal(index: u32) -> Result<Self, WalletError> {
        Self::checked(index, false)
    }

    fn checked(index: u32, hardened: bool) -> Result<Self, WalletError> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::InvalidPath(format!(
                "component index {} is out of range (must be below 2^31)",
                index
            )));
        }
        Ok(Self { index, hardened })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// Serialized form fed into the HMAC (`index | 2^31` when hardened).
    pub fn to_u32(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Ordered list of derivation steps rooted at the master key `m`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    components: Vec<ChildIndex>,
}

impl DerivationPath {
    pub fn new(components: Vec<ChildIndex>) -> Self {
        Self { components }
    }

    /// Solana account path `m/44'/501'/{account}'/0'`.
    pub fn solana_account(account: u32) -> Result<Self, WalletError> {
        PathTemplate::default().for_account(account)
    }

    pub fn components(&self) -> &[ChildIndex] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// First non-hardened component, if any.
    pub fn first_unhardened(&self) -> Option<(usize, ChildIndex)> {
        self.components
            .iter()
            .copied()
            .enumerate()
            .find(|(_, c)| !c.is_hardened())
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    /// Parses `m/44'/501'/0'/0'`. `'` and `h` both mark a hardened step.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.split('/');
        match parts.next() {
            Some("m") | Some("M") => {}
            _ => {
                return Err(WalletError::InvalidPath(format!(
                    "path must start with 'm': {:?}",
                    trimmed
                )))
            }
        }

        let mut components = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(WalletError::InvalidPath(format!("invalid component {:?}", part)));
            }
            let index: u32 = digits
                .parse()
                .map_err(|_| WalletError::InvalidPath(format!("component {:?} overflows", part)))?;
            components.push(ChildIndex::checked(index, hardened)?);
        }

        Ok(Self { components })
    }
}

/// Fixed prefix plus the account-selecting component.
///
/// Only the account index varies between identities; purpose, coin type and
/// the trailing change step come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTemplate {
    purpose: u32,
    coin_type: u32,
    change: u32,
}

impl PathTemplate {
    pub fn new(purpose: u32, coin_type: u32, change: u32) -> Self {
        Self { purpose, coin_type, change }
    }

    pub fn for_account(&self, account: u32) -> Result<DerivationPath, WalletError> {
        Ok(DerivationPath::new(vec![
            ChildIndex::hardened(self.purpose)?,
            ChildIndex::hardened(self.coin_type)?,
            ChildIndex::hardened(account)?,
            ChildIndex::hardened(self.change)?,
        ]))
    }
}

impl Default for PathTemplate {
    fn default() -> Self {
        Self::from(&DerivationConfig::default())
    }
}

impl From<&DerivationConfig> for PathTemplate {
    fn from(cfg: &DerivationConfig) -> Self {
        Self::new(cfg.purpose, cfg.coin_type, cfg.change)
    }
}
