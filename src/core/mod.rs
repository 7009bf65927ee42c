pub mod config;
pub mod derivation;
pub mod engine;
pub mod errors;
pub mod keypair;
pub mod mnemonic;
pub mod registry;

// Re-export the types most callers need
pub use derivation::{ChildIndex, DerivationPath, PathTemplate};
pub use mnemonic::{EntropySource, MnemonicCodec, OsEntropy, RecoveryPhrase};
pub use registry::{AccountRegistry, RegistryStatus};
