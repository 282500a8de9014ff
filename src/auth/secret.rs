//! Supplies the symmetric key used to seal and open session tokens.

use std::{fmt::Debug, sync::OnceLock};

use rand::RngCore;

/// The name of the environment variable holding the hex encoded token key.
pub const TOKEN_KEY_ENV: &str = "AUTH_TOKEN_KEY";

/// The size of the token key in bytes.
pub const TOKEN_KEY_SIZE: usize = 32;

/// Errors for an operator supplied token key that cannot be used.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SecretError {
    /// The key is not valid hexadecimal.
    #[error("the token key is not valid hex")]
    InvalidHex,

    /// The key decoded to the wrong number of bytes.
    #[error("the token key must be {TOKEN_KEY_SIZE} bytes, got {0} bytes")]
    InvalidLength(usize),
}

/// A 256-bit symmetric key for session tokens.
#[derive(Clone, PartialEq)]
pub struct TokenKey([u8; TOKEN_KEY_SIZE]);

impl TokenKey {
    /// Decode a key from a hex string of exactly [TOKEN_KEY_SIZE] bytes.
    ///
    /// # Errors
    ///
    /// Returns [SecretError::InvalidHex] or [SecretError::InvalidLength] if
    /// the string is not a usable key.
    pub fn from_hex(hex_key: &str) -> Result<Self, SecretError> {
        let bytes = hex::decode(hex_key.trim()).map_err(|_| SecretError::InvalidHex)?;
        let key: [u8; TOKEN_KEY_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SecretError::InvalidLength(bytes.len()))?;

        Ok(Self(key))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; TOKEN_KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut key);

        Self(key)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; TOKEN_KEY_SIZE] {
        &self.0
    }
}

impl Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenKey(<redacted>)")
    }
}

/// Resolves the token key once for the lifetime of the process.
///
/// If an operator supplied key is present it is decoded and used, otherwise a
/// random key is generated. The outcome, including a decoding error, is
/// computed on first use and returned by every later call.
#[derive(Debug)]
pub struct SecretProvider {
    hex_key: Option<String>,
    key: OnceLock<Result<TokenKey, SecretError>>,
}

impl SecretProvider {
    /// Create a provider that will decode `hex_key`, or generate a random key
    /// if `hex_key` is `None` or empty.
    pub fn new(hex_key: Option<String>) -> Self {
        Self {
            hex_key: hex_key.filter(|key| !key.trim().is_empty()),
            key: OnceLock::new(),
        }
    }

    /// Create a provider from the [TOKEN_KEY_ENV] environment variable.
    pub fn from_env() -> Self {
        Self::new(std::env::var(TOKEN_KEY_ENV).ok())
    }

    /// Get the token key, resolving it on the first call.
    ///
    /// # Errors
    ///
    /// Returns the [SecretError] from decoding the operator supplied key.
    /// Once a key has failed to decode, every call fails with the same error.
    pub fn key(&self) -> Result<&TokenKey, SecretError> {
        self.key
            .get_or_init(|| match &self.hex_key {
                Some(hex_key) => TokenKey::from_hex(hex_key),
                None => {
                    tracing::warn!(
                        "{TOKEN_KEY_ENV} is not set, generating a random token key. \
                         Sessions will not survive a restart."
                    );
                    Ok(TokenKey::generate())
                }
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{SecretError, SecretProvider, TOKEN_KEY_SIZE, TokenKey};

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn decodes_operator_key() {
        let provider = SecretProvider::new(Some(TEST_KEY.to_owned()));

        let key = provider.key().unwrap();

        assert_eq!(key, &TokenKey::from_hex(TEST_KEY).unwrap());
        assert_eq!(key.as_bytes()[0], 0x01);
    }

    #[test]
    fn generates_key_when_unset() {
        let provider = SecretProvider::new(None);

        let key = provider.key().unwrap();

        assert_eq!(key.as_bytes().len(), TOKEN_KEY_SIZE);
    }

    #[test]
    fn empty_key_is_treated_as_unset() {
        let provider = SecretProvider::new(Some(String::new()));

        assert!(provider.key().is_ok());
    }

    #[test]
    fn generated_key_is_stable() {
        let provider = SecretProvider::new(None);

        let first = provider.key().unwrap().clone();
        let second = provider.key().unwrap().clone();

        assert_eq!(first, second);
    }

    #[test]
    fn generated_keys_differ_between_providers() {
        let first = SecretProvider::new(None);
        let second = SecretProvider::new(None);

        assert_ne!(first.key().unwrap(), second.key().unwrap());
    }

    #[test]
    fn bad_hex_is_a_sticky_error() {
        let provider = SecretProvider::new(Some("not hex!".to_owned()));

        assert_eq!(provider.key(), Err(SecretError::InvalidHex));
        assert_eq!(provider.key(), Err(SecretError::InvalidHex));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let provider = SecretProvider::new(Some("abcd".to_owned()));

        assert_eq!(provider.key(), Err(SecretError::InvalidLength(2)));
    }

    #[test]
    fn concurrent_first_use_resolves_one_key() {
        let provider = Arc::new(SecretProvider::new(None));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                std::thread::spawn(move || provider.key().unwrap().clone())
            })
            .collect();
        let keys: Vec<TokenKey> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(keys.iter().all(|key| key == &keys[0]));
    }

    #[test]
    fn debug_output_hides_key() {
        let key = TokenKey::from_hex(TEST_KEY).unwrap();

        assert_eq!(format!("{key:?}"), "TokenKey(<redacted>)");
    }
}
