//! Small helpers and aliases for secret buffers that must be zeroized on drop.
use zeroize::Zeroizing;

/// Secret byte buffer which will be zeroed when dropped.
pub type SecretVec = Zeroizing<Vec<u8>>;

/// Secret text (recovery phrases, passphrases) zeroed when dropped.
pub type SecretString = Zeroizing<String>;

/// Move a `String` into a `SecretString` so it is wiped on drop.
pub fn string_to_secret(s: String) -> SecretString {
    Zeroizing::new(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroize;

    #[test]
    fn test_secret_string_zeroize() {
        let mut secret = string_to_secret("correct horse battery staple".to_string());
        secret.zeroize();
        assert!(secret.is_empty());
    }
}
