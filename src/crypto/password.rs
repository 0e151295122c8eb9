//! One-way password digests (Argon2id, salted, fixed cost).

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to hash password: {0}")]
    Hash(password_hash::Error),
    #[error("stored password digest is malformed: {0}")]
    MalformedDigest(password_hash::Error),
    #[error("password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hashes and verifies passwords.
///
/// Digests are PHC strings, so verification reads the cost parameters back
/// out of the digest rather than from the codec.
#[derive(Clone)]
pub struct CredentialCodec {
    params: Params,
}

impl Default for CredentialCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialCodec {
    /// Codec with the production work factor.
    pub fn new() -> Self {
        Self {
            params: Params::DEFAULT,
        }
    }

    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes `plaintext` with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(CredentialError::Hash)?;
        Ok(digest.to_string())
    }

    /// Returns `Ok(false)` when the candidate does not match.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(digest).map_err(CredentialError::MalformedDigest)?;
        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::MalformedDigest(e)),
        }
    }

    /// `hash` on the blocking pool so request workers are not stalled.
    pub async fn hash_blocking(&self, plaintext: &str) -> Result<String, CredentialError> {
        let codec = self.clone();
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || codec.hash(&plaintext)).await?
    }

    pub async fn verify_blocking(
        &self,
        plaintext: &str,
        digest: &str,
    ) -> Result<bool, CredentialError> {
        let codec = self.clone();
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || codec.verify(&plaintext, &digest)).await?
    }
}

#[cfg(test)]
pub(crate) fn test_codec() -> CredentialCodec {
    // Minimum Argon2 cost; production keeps Params::DEFAULT.
    let params = Params::new(8, 1, 1, None).expect("valid argon2 params");
    CredentialCodec::with_params(params)
}
