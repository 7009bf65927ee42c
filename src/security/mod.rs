// src/security/mod.rs
//! Secret handling helpers
//!
//! Zeroizing buffer aliases and log redaction for recovery phrases and seeds.

pub mod redaction;
pub mod secret;

pub use redaction::{redact_hex_bytes, redact_phrase};
pub use secret::{SecretString, SecretVec};
