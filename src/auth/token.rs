//! Issues and verifies the encrypted session tokens stored in the auth cookie.
//!
//! A token is the string `v1.local.` followed by the URL-safe, unpadded base64
//! encoding of a 96-bit nonce and the AES-256-GCM ciphertext of the JSON
//! claims. The header is bound to the ciphertext as associated data.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    auth::secret::{SecretError, SecretProvider},
    user::UserID,
};

/// The prefix of every token, also authenticated as associated data.
pub const TOKEN_HEADER: &str = "v1.local.";

/// How long a token is valid for after it is issued.
pub const TOKEN_TTL: Duration = Duration::hours(24);

const NONCE_SIZE: usize = 12;

/// The errors that may occur when issuing or verifying a token.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum TokenError {
    /// The token key could not be resolved.
    #[error("token key is misconfigured: {0}")]
    Configuration(#[from] SecretError),

    /// The claims could not be sealed.
    #[error("could not encrypt the token")]
    Encryption,

    /// The token does not have the expected structure.
    #[error("the token is malformed")]
    Malformed,

    /// The token failed authentication, e.g. it was sealed with another key
    /// or tampered with.
    #[error("the token could not be decrypted")]
    Decryption,

    /// The token's expiry has passed.
    #[error("the token has expired")]
    Expired,

    /// The token's subject is not a user ID.
    #[error("the token subject is not a valid user ID")]
    InvalidSubject,
}

/// The claims sealed inside a token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Claims {
    /// The user ID as a decimal string.
    sub: String,
    #[serde(with = "time::serde::rfc3339")]
    iat: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    exp: OffsetDateTime,
}

/// Issue a token for `user_id` that expires [TOKEN_TTL] from now.
///
/// # Errors
///
/// Returns [TokenError::Configuration] if the token key is misconfigured.
pub fn issue_token(user_id: UserID, secrets: &SecretProvider) -> Result<String, TokenError> {
    issue_token_at(user_id, secrets, OffsetDateTime::now_utc())
}

/// Issue a token for `user_id` as if the current time were `now`.
///
/// # Errors
///
/// Returns [TokenError::Configuration] if the token key is misconfigured.
pub fn issue_token_at(
    user_id: UserID,
    secrets: &SecretProvider,
    now: OffsetDateTime,
) -> Result<String, TokenError> {
    let key = secrets.key()?;
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + TOKEN_TTL,
    };
    let plaintext = serde_json::to_vec(&claims).map_err(|_| TokenError::Encryption)?;

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| TokenError::Encryption)?;
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: &plaintext,
                aad: TOKEN_HEADER.as_bytes(),
            },
        )
        .map_err(|_| TokenError::Encryption)?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);

    Ok(format!("{TOKEN_HEADER}{}", URL_SAFE_NO_PAD.encode(sealed)))
}

/// Verify `token` and return the user ID it was issued for.
///
/// # Errors
///
/// Returns [TokenError::Configuration] if the token key is misconfigured,
/// otherwise a validation error if the token is malformed, was not sealed
/// with the current key, has expired or does not name a user.
pub fn verify_token(token: &str, secrets: &SecretProvider) -> Result<UserID, TokenError> {
    verify_token_at(token, secrets, OffsetDateTime::now_utc())
}

/// Verify `token` as if the current time were `now`.
///
/// A token is valid strictly before its expiry, the expiry instant itself is
/// expired.
///
/// # Errors
///
/// See [verify_token].
pub fn verify_token_at(
    token: &str,
    secrets: &SecretProvider,
    now: OffsetDateTime,
) -> Result<UserID, TokenError> {
    let key = secrets.key()?;

    let encoded = token
        .strip_prefix(TOKEN_HEADER)
        .ok_or(TokenError::Malformed)?;
    let sealed = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| TokenError::Malformed)?;
    if sealed.len() <= NONCE_SIZE {
        return Err(TokenError::Malformed);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| TokenError::Decryption)?;
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad: TOKEN_HEADER.as_bytes(),
            },
        )
        .map_err(|_| TokenError::Decryption)?;

    let claims: Claims = serde_json::from_slice(&plaintext).map_err(|_| TokenError::Malformed)?;

    if now >= claims.exp {
        return Err(TokenError::Expired);
    }

    claims
        .sub
        .parse::<i64>()
        .map(UserID::new)
        .map_err(|_| TokenError::InvalidSubject)
}

#[cfg(test)]
mod tests {
    use aes_gcm::{
        Aes256Gcm, Nonce,
        aead::{Aead, KeyInit, Payload},
    };
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        auth::{
            secret::{SecretError, SecretProvider, TokenKey},
            token::{
                TOKEN_HEADER, TOKEN_TTL, TokenError, issue_token, issue_token_at, verify_token,
                verify_token_at,
            },
        },
        user::UserID,
    };

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
    const OTHER_KEY: &str = "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210";

    fn get_secrets() -> SecretProvider {
        SecretProvider::new(Some(TEST_KEY.to_owned()))
    }

    /// Seal arbitrary claims JSON with the test key.
    fn seal_raw(claims: &str) -> String {
        let key = TokenKey::from_hex(TEST_KEY).unwrap();
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).unwrap();
        let nonce = [7u8; 12];
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: claims.as_bytes(),
                    aad: TOKEN_HEADER.as_bytes(),
                },
            )
            .unwrap();
        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);

        format!("{TOKEN_HEADER}{}", URL_SAFE_NO_PAD.encode(sealed))
    }

    #[test]
    fn issued_token_verifies_to_same_user() {
        let secrets = get_secrets();

        for id in [1, 42, i64::MAX] {
            let token = issue_token(UserID::new(id), &secrets).unwrap();

            assert_eq!(verify_token(&token, &secrets), Ok(UserID::new(id)));
        }
    }

    #[test]
    fn token_has_header() {
        let token = issue_token(UserID::new(1), &get_secrets()).unwrap();

        assert!(token.starts_with("v1.local."));
    }

    #[test]
    fn tokens_for_same_user_differ() {
        let secrets = get_secrets();
        let now = OffsetDateTime::now_utc();

        let first = issue_token_at(UserID::new(1), &secrets, now).unwrap();
        let second = issue_token_at(UserID::new(1), &secrets, now).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn token_is_valid_until_just_before_expiry() {
        let secrets = get_secrets();
        let issued_at = datetime!(2025-06-01 12:00:00 UTC);
        let token = issue_token_at(UserID::new(7), &secrets, issued_at).unwrap();

        let just_before = issued_at + TOKEN_TTL - Duration::seconds(1);

        assert_eq!(
            verify_token_at(&token, &secrets, just_before),
            Ok(UserID::new(7))
        );
    }

    #[test]
    fn token_is_expired_at_expiry_instant() {
        let secrets = get_secrets();
        let issued_at = datetime!(2025-06-01 12:00:00 UTC);
        let token = issue_token_at(UserID::new(7), &secrets, issued_at).unwrap();

        assert_eq!(
            verify_token_at(&token, &secrets, issued_at + TOKEN_TTL),
            Err(TokenError::Expired)
        );
        assert_eq!(
            verify_token_at(&token, &secrets, issued_at + TOKEN_TTL + Duration::hours(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let other = SecretProvider::new(Some(OTHER_KEY.to_owned()));
        let token = issue_token(UserID::new(1), &other).unwrap();

        assert_eq!(
            verify_token(&token, &get_secrets()),
            Err(TokenError::Decryption)
        );
    }

    #[test]
    fn tampered_token_is_rejected() {
        let secrets = get_secrets();
        let token = issue_token(UserID::new(1), &secrets).unwrap();
        let mut sealed = URL_SAFE_NO_PAD
            .decode(token.strip_prefix(TOKEN_HEADER).unwrap())
            .unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        let tampered = format!("{TOKEN_HEADER}{}", URL_SAFE_NO_PAD.encode(sealed));

        assert_eq!(
            verify_token(&tampered, &secrets),
            Err(TokenError::Decryption)
        );
    }

    #[test]
    fn token_with_other_header_is_rejected() {
        let secrets = get_secrets();
        let token = issue_token(UserID::new(1), &secrets).unwrap();
        let relabelled = token.replacen("v1.local.", "v2.local.", 1);

        assert_eq!(
            verify_token(&relabelled, &secrets),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let secrets = get_secrets();

        for token in ["", "not-a-valid-token", "v1.local.", "v1.local.!!!", "v1.local.AAAA"] {
            assert_eq!(
                verify_token(token, &secrets),
                Err(TokenError::Malformed),
                "token {token:?} should be malformed"
            );
        }
    }

    #[test]
    fn non_integer_subject_is_rejected() {
        let token = seal_raw(
            r#"{"sub":"alice","iat":"2025-06-01T12:00:00Z","exp":"2999-01-01T00:00:00Z"}"#,
        );

        assert_eq!(
            verify_token(&token, &get_secrets()),
            Err(TokenError::InvalidSubject)
        );
    }

    #[test]
    fn claims_without_expiry_are_malformed() {
        let token = seal_raw(r#"{"sub":"1","iat":"2025-06-01T12:00:00Z"}"#);

        assert_eq!(
            verify_token(&token, &get_secrets()),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn misconfigured_key_fails_every_operation() {
        let secrets = SecretProvider::new(Some("zz".to_owned()));
        let want = TokenError::Configuration(SecretError::InvalidHex);

        assert_eq!(issue_token(UserID::new(1), &secrets), Err(want.clone()));
        assert_eq!(verify_token("v1.local.AAAA", &secrets), Err(want));
    }
}
