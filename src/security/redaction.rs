// Simple helpers to avoid accidental printing of secrets in logs/tests.
use std::env;

fn secrets_allowed() -> bool {
    env::var("DEV_PRINT_SECRETS").ok().as_deref() == Some("1")
}

/// Redact a recovery phrase unless DEV_PRINT_SECRETS=1 is set in the environment.
/// By default only the word count survives.
pub fn redact_phrase(phrase: &str) -> String {
    if secrets_allowed() {
        // Developer explicitly allowed printing secrets
        return phrase.to_string();
    }
    format!("<redacted {} words>", phrase.split_whitespace().count())
}

/// Redact hex-serializable bytes unless DEV_PRINT_SECRETS=1 is set.
pub fn redact_hex_bytes(bytes: &[u8]) -> String {
    if secrets_allowed() {
        return format!("0x{}", hex::encode(bytes));
    }
    format!("<redacted hex len={}>", bytes.len())
}
