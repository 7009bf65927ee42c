//! Thread-safe facade over the account registry.
//!
//! Every call takes the registry lock for its whole duration, so concurrent
//! adds always see a consistent counter. The `*_async` variants move the
//! PBKDF2/HMAC work onto the blocking pool and take the same lock there.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;
use zeroize::Zeroizing;

use crate::core::config::WalletConfig;
use crate::core::engine::KeyEngine;
use crate::core::errors::WalletError;
use crate::core::keypair::Keypair;
use crate::core::mnemonic::OsEntropy;
use crate::core::registry::{AccountRegistry, CreatedWallet, Identity, RegistryStatus};
use crate::security::secret::SecretString;

/// Wallet service layer.
#[derive(Clone)]
pub struct WalletService {
    inner: Arc<Mutex<AccountRegistry>>,
}

impl WalletService {
    pub fn new(registry: AccountRegistry) -> Self {
        Self { inner: Arc::new(Mutex::new(registry)) }
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        Ok(Self::new(AccountRegistry::from_config(config)?))
    }

    pub fn create_wallet(&self, word_count: usize) -> Result<CreatedWallet, WalletError> {
        self.inner.lock().create_wallet(word_count)
    }

    /// Create a wallet with the configured default word count.
    pub fn create_default_wallet(&self) -> Result<CreatedWallet, WalletError> {
        let mut registry = self.inner.lock();
        let word_count = registry.default_word_count();
        registry.create_wallet(word_count)
    }

    pub fn restore_wallet(
        &self,
        phrase: &str,
        passphrase: &str,
        count: u32,
    ) -> Result<Vec<Identity>, WalletError> {
        self.inner.lock().restore_wallet(phrase, passphrase, count)
    }

    pub fn add_identity(&self) -> Result<Identity, WalletError> {
        self.inner.lock().add_identity()
    }

    pub fn remove_identity(&self, index: u32) -> Result<(), WalletError> {
        self.inner.lock().remove_identity(index)
    }

    pub fn reset_wallet(&self) {
        self.inner.lock().reset()
    }

    pub fn list_identities(&self) -> Vec<Identity> {
        self.inner.lock().list_identities()
    }

    pub fn export_phrase(&self) -> Result<SecretString, WalletError> {
        self.inner.lock().export_phrase()
    }

    pub fn verify_identities(&self) -> Result<(), WalletError> {
        self.inner.lock().verify_identities()
    }

    pub fn keypair_for(&self, index: u32) -> Result<Keypair, WalletError> {
        self.inner.lock().keypair_for(index)
    }

    pub fn next_index(&self) -> Option<u32> {
        self.inner.lock().next_index()
    }

    pub fn status(&self) -> RegistryStatus {
        self.inner.lock().status()
    }

    pub async fn create_wallet_async(&self, word_count: usize) -> Result<CreatedWallet, WalletError> {
        self.run_blocking(move |registry| registry.create_wallet(word_count)).await
    }

    pub async fn restore_wallet_async(
        &self,
        phrase: SecretString,
        passphrase: SecretString,
        count: u32,
    ) -> Result<Vec<Identity>, WalletError> {
        self.run_blocking(move |registry| registry.restore_wallet(&phrase, &passphrase, count))
            .await
    }

    pub async fn add_identity_async(&self) -> Result<Identity, WalletError> {
        self.run_blocking(|registry| registry.add_identity()).await
    }

    pub async fn verify_identities_async(&self) -> Result<(), WalletError> {
        self.run_blocking(|registry| registry.verify_identities()).await
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T, WalletError>
    where
        T: Send + 'static,
        F: FnOnce(&mut AccountRegistry) -> Result<T, WalletError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut registry = inner.lock();
            f(&mut registry)
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Registry task did not complete");
            WalletError::Internal(format!("registry task failed: {}", e))
        })?
    }
}

impl Default for WalletService {
    fn default() -> Self {
        Self::new(AccountRegistry::new(KeyEngine::default(), Box::new(OsEntropy)))
    }
}

impl fmt::Debug for WalletService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletService")
            .field("registry", &*self.inner.lock())
            .finish()
    }
}

/// Wrap a phrase read from user input for handing to the async API.
pub fn secret_input(input: &str) -> SecretString {
    Zeroizing::new(input.trim().to_owned())
}
