//! Account registry
//!
//! Holds the active recovery phrase and the ordered list of public identities
//! derived from it. Identities are addressed by account index; indices are
//! handed out from a counter that only ever moves forward, so a removed index
//! is never reissued.
//!
//! Every operation computes its result before touching state. A failed call
//! leaves the registry exactly as it was.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::config::WalletConfig;
use crate::core::derivation::HARDENED_OFFSET;
use crate::core::engine::KeyEngine;
use crate::core::errors::WalletError;
use crate::core::keypair::{Keypair, PublicIdentity};
use crate::core::mnemonic::{EntropySource, OsEntropy, RecoveryPhrase};
use crate::crypto::seed::MasterSeed;
use crate::security::secret::{string_to_secret, SecretString};

/// A live account: its index and public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub index: u32,
    pub public_key: PublicIdentity,
}

/// Result of creating a wallet. The phrase buffer is wiped on drop.
pub struct CreatedWallet {
    pub phrase: SecretString,
    pub first_public_key: PublicIdentity,
}

impl fmt::Debug for CreatedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatedWallet")
            .field("phrase", &"<redacted>")
            .field("first_public_key", &self.first_public_key)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryStatus {
    Empty,
    Active,
}

struct ActiveWallet {
    phrase: RecoveryPhrase,
    passphrase: SecretString,
    seed: Option<MasterSeed>,
    next_index: u32,
    identities: Vec<Identity>,
}

impl ActiveWallet {
    /// Derive every index in `0..count` and build the wallet state.
    fn build(
        engine: &KeyEngine,
        phrase: RecoveryPhrase,
        passphrase: SecretString,
        count: u32,
        cache_seed: bool,
    ) -> Result<Self, WalletError> {
        let seed = engine.master_seed(&phrase, &passphrase);
        let identities = (0..count)
            .map(|index| {
                engine
                    .derive_identity(&seed, index)
                    .map(|public_key| Identity { index, public_key })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            phrase,
            passphrase,
            seed: cache_seed.then_some(seed),
            next_index: count,
            identities,
        })
    }

    /// Runs `f` against the cached seed, or a freshly stretched one that is
    /// dropped as soon as `f` returns.
    fn with_seed<T>(
        &self,
        engine: &KeyEngine,
        f: impl FnOnce(&MasterSeed) -> Result<T, WalletError>,
    ) -> Result<T, WalletError> {
        match &self.seed {
            Some(seed) => f(seed),
            None => f(&engine.master_seed(&self.phrase, &self.passphrase)),
        }
    }

    fn position_of(&self, index: u32) -> Option<usize> {
        self.identities.iter().position(|identity| identity.index == index)
    }
}

/// Ordered, gap-tolerant collection of identities derived from one phrase.
///
/// Single-threaded; wrap it in [`WalletService`](crate::service::WalletService)
/// to share it.
pub struct AccountRegistry {
    engine: KeyEngine,
    entropy: Box<dyn EntropySource + Send>,
    cache_seed: bool,
    default_word_count: usize,
    active: Option<ActiveWallet>,
}

impl AccountRegistry {
    /// Empty registry over `engine`, drawing new phrases from `entropy`.
    pub fn new(engine: KeyEngine, entropy: Box<dyn EntropySource + Send>) -> Self {
        Self {
            engine,
            entropy,
            cache_seed: true,
            default_word_count: 12,
            active: None,
        }
    }

    /// Registry built from configuration, using the OS CSPRNG.
    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        let engine = KeyEngine::from_config(config)?;
        Ok(Self::new(engine, Box::new(OsEntropy))
            .with_seed_cache(config.session.cache_master_seed)
            .with_default_word_count(config.mnemonic.default_word_count))
    }

    pub fn with_seed_cache(mut self, enabled: bool) -> Self {
        self.cache_seed = enabled;
        self
    }

    pub fn with_default_word_count(mut self, word_count: usize) -> Self {
        self.default_word_count = word_count;
        self
    }

    pub fn engine(&self) -> &KeyEngine {
        &self.engine
    }

    pub fn default_word_count(&self) -> usize {
        self.default_word_count
    }

    pub fn status(&self) -> RegistryStatus {
        if self.active.is_some() {
            RegistryStatus::Active
        } else {
            RegistryStatus::Empty
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Generate a new phrase, derive index 0 and replace any previous state.
    pub fn create_wallet(&mut self, word_count: usize) -> Result<CreatedWallet, WalletError> {
        self.create_wallet_with_passphrase(word_count, "")
    }

    pub fn create_wallet_with_passphrase(
        &mut self,
        word_count: usize,
        passphrase: &str,
    ) -> Result<CreatedWallet, WalletError> {
        let phrase = self.engine.generate_phrase(word_count, self.entropy.as_mut())?;
        let exported = phrase.expose();
        let wallet = ActiveWallet::build(
            &self.engine,
            phrase,
            string_to_secret(passphrase.to_owned()),
            1,
            self.cache_seed,
        )?;
        let first_public_key = wallet.identities[0].public_key;

        if self.active.is_some() {
            info!("Discarding previous wallet");
        }
        self.active = Some(wallet);
        info!(word_count, public_key = %first_public_key, "Created wallet");

        Ok(CreatedWallet { phrase: exported, first_public_key })
    }

    /// Replace state with the wallet behind an existing phrase, deriving
    /// indices `0..count`. A `count` of zero is treated as one.
    pub fn restore_wallet(
        &mut self,
        phrase: &str,
        passphrase: &str,
        count: u32,
    ) -> Result<Vec<Identity>, WalletError> {
        let phrase = self.engine.codec().parse(phrase).map_err(|e| {
            warn!(error = %e, "Rejected phrase on restore");
            e
        })?;
        if count > HARDENED_OFFSET {
            return Err(WalletError::InvalidPath(format!(
                "cannot restore {} identities past the last hardened account index",
                count
            )));
        }
        let count = count.max(1);
        let word_count = phrase.word_count();
        let wallet = ActiveWallet::build(
            &self.engine,
            phrase,
            string_to_secret(passphrase.to_owned()),
            count,
            self.cache_seed,
        )?;
        let identities = wallet.identities.clone();

        self.active = Some(wallet);
        info!(word_count, count, "Restored wallet");
        Ok(identities)
    }

    /// Derive the identity at the next unused index and append it.
    pub fn add_identity(&mut self) -> Result<Identity, WalletError> {
        let Some(wallet) = self.active.as_mut() else {
            warn!("add_identity called without an active phrase");
            return Err(WalletError::NoActivePhrase);
        };

        let index = wallet.next_index;
        let next = index
            .checked_add(1)
            .ok_or_else(|| WalletError::InvalidPath(format!("account index {} is exhausted", index)))?;
        let engine = &self.engine;
        let public_key = wallet.with_seed(engine, |seed| engine.derive_identity(seed, index))?;

        let identity = Identity { index, public_key };
        wallet.identities.push(identity);
        wallet.next_index = next;
        info!(index, public_key = %public_key, "Added identity");
        Ok(identity)
    }

    /// Remove the identity at `index`. The counter is not rewound.
    pub fn remove_identity(&mut self, index: u32) -> Result<(), WalletError> {
        let Some(wallet) = self.active.as_mut() else {
            warn!(index, "remove_identity called without an active phrase");
            return Err(WalletError::NoActivePhrase);
        };

        if wallet.identities.len() <= 1 {
            warn!(index, "Refusing to remove the last identity");
            return Err(WalletError::LastIdentityProtected);
        }
        let position = wallet.position_of(index).ok_or_else(|| {
            warn!(index, "No identity to remove");
            WalletError::IndexNotFound(index)
        })?;

        wallet.identities.remove(position);
        info!(index, remaining = wallet.identities.len(), "Removed identity");
        Ok(())
    }

    /// Drop the phrase, cached seed and identities.
    pub fn reset(&mut self) {
        if self.active.take().is_some() {
            info!("Wallet reset");
        } else {
            debug!("Reset on empty registry");
        }
    }

    /// Identities in ascending index order; empty when no wallet is active.
    pub fn list_identities(&self) -> Vec<Identity> {
        self.active
            .as_ref()
            .map(|wallet| wallet.identities.clone())
            .unwrap_or_default()
    }

    /// The active phrase, words joined by single spaces.
    pub fn export_phrase(&self) -> Result<SecretString, WalletError> {
        let wallet = self.active.as_ref().ok_or(WalletError::NoActivePhrase)?;
        info!(words = wallet.phrase.word_count(), "Phrase exported");
        Ok(wallet.phrase.expose())
    }

    /// Index the next `add_identity` will use, `None` when empty.
    pub fn next_index(&self) -> Option<u32> {
        self.active.as_ref().map(|wallet| wallet.next_index)
    }

    /// Re-derive every stored identity from the phrase and compare.
    ///
    /// Always stretches a fresh seed so a damaged cache is caught too.
    pub fn verify_identities(&self) -> Result<(), WalletError> {
        let wallet = self.active.as_ref().ok_or(WalletError::NoActivePhrase)?;
        let seed = self.engine.master_seed(&wallet.phrase, &wallet.passphrase);
        for identity in &wallet.identities {
            let derived = self.engine.derive_identity(&seed, identity.index)?;
            if derived != identity.public_key {
                warn!(index = identity.index, "Stored identity does not match re-derivation");
                return Err(WalletError::DerivationMismatch { index: identity.index });
            }
        }
        debug!(count = wallet.identities.len(), "All identities verified");
        Ok(())
    }

    /// Full keypair for a live identity. The registry does not keep it.
    pub fn keypair_for(&self, index: u32) -> Result<Keypair, WalletError> {
        let wallet = self.active.as_ref().ok_or(WalletError::NoActivePhrase)?;
        if wallet.position_of(index).is_none() {
            return Err(WalletError::IndexNotFound(index));
        }
        wallet.with_seed(&self.engine, |seed| self.engine.derive_keypair(seed, index))
    }
}

impl fmt::Debug for AccountRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRegistry")
            .field("status", &self.status())
            .field("next_index", &self.next_index())
            .field("identities", &self.active.as_ref().map_or(0, |w| w.identities.len()))
            .field("cache_seed", &self.cache_seed)
            .finish_non_exhaustive()
    }
}
