#![allow(clippy::needless_return)]
// src/lib.rs

pub mod cli;
pub mod core;
pub mod crypto;
pub mod security;
pub mod service;

pub use crate::core::engine::KeyEngine;
pub use crate::core::errors::{Result, WalletError};
pub use crate::core::keypair::{Keypair, PublicIdentity};
pub use crate::core::registry::{AccountRegistry, CreatedWallet, Identity};
pub use crate::service::WalletService;
