//! Key engine: phrase codec, seed stretching, path walking and keypair
//! construction wired together.
//!
//! Each stage is handed in through the constructor so a test can swap the
//! entropy source or path template without touching the others.

use tracing::debug;

use crate::core::config::WalletConfig;
use crate::core::derivation::{DerivationPath, PathTemplate};
use crate::core::errors::WalletError;
use crate::core::keypair::{Keypair, KeypairConstructor, PublicIdentity};
use crate::core::mnemonic::{EntropySource, MnemonicCodec, RecoveryPhrase};
use crate::crypto::seed::{MasterSeed, SeedDeriver};
use crate::crypto::slip10::PathDeriver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEngine {
    codec: MnemonicCodec,
    seeds: SeedDeriver,
    paths: PathDeriver,
    keypairs: KeypairConstructor,
    template: PathTemplate,
}

impl KeyEngine {
    pub fn new(
        codec: MnemonicCodec,
        seeds: SeedDeriver,
        paths: PathDeriver,
        keypairs: KeypairConstructor,
        template: PathTemplate,
    ) -> Self {
        Self { codec, seeds, paths, keypairs, template }
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        config.validate()?;
        Ok(Self::new(
            MnemonicCodec::from_config(&config.mnemonic)?,
            SeedDeriver,
            PathDeriver,
            KeypairConstructor,
            PathTemplate::from(&config.derivation),
        ))
    }

    pub fn codec(&self) -> &MnemonicCodec {
        &self.codec
    }

    /// Path of the identity at account `index`.
    pub fn path_for(&self, index: u32) -> Result<DerivationPath, WalletError> {
        self.template.for_account(index)
    }

    pub fn generate_phrase(
        &self,
        word_count: usize,
        entropy: &mut dyn EntropySource,
    ) -> Result<RecoveryPhrase, WalletError> {
        self.codec.generate(word_count, entropy)
    }

    pub fn master_seed(&self, phrase: &RecoveryPhrase, passphrase: &str) -> MasterSeed {
        self.seeds.to_seed(phrase, passphrase)
    }

    /// Keypair at account `index`. The derived sub-seed is wiped before returning.
    pub fn derive_keypair(&self, seed: &MasterSeed, index: u32) -> Result<Keypair, WalletError> {
        let path = self.path_for(index)?;
        let derived = self.paths.derive(seed, &path)?;
        let keypair = self.keypairs.keypair_from_derived(&derived);
        debug!(index, %path, public_key = %keypair.public_key(), "Derived keypair");
        Ok(keypair)
    }

    /// Public identity at account `index`; the secret half never leaves this call.
    pub fn derive_identity(&self, seed: &MasterSeed, index: u32) -> Result<PublicIdentity, WalletError> {
        Ok(self.derive_keypair(seed, index)?.public_key())
    }

    /// Whole pipeline from phrase text: validate, stretch, walk, expand.
    pub fn keypair_from_phrase(
        &self,
        phrase: &str,
        passphrase: &str,
        index: u32,
    ) -> Result<Keypair, WalletError> {
        let phrase = self.codec.parse(phrase)?;
        let seed = self.master_seed(&phrase, passphrase);
        self.derive_keypair(&seed, index)
    }
}

impl Default for KeyEngine {
    fn default() -> Self {
        Self::new(
            MnemonicCodec::default(),
            SeedDeriver,
            PathDeriver,
            KeypairConstructor,
            PathTemplate::default(),
        )
    }
}
