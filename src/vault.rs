// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-user secret encryption.
//!
//! Users store one sensitive string each (an external AI provider API key).
//! The vault derives a per-user key from the master secret plus the user's
//! unique salt (PBKDF2-HMAC-SHA256) and encrypts with AES-256-GCM, so a
//! leaked derived key exposes only that one user, and rotating the master
//! secret invalidates every stored secret at once.
//!
//! Decryption fails closed: wrong salt, corrupted ciphertext, or a rotated
//! master secret all yield `Ok(None)` ("no secret configured"), never a
//! garbled plaintext and never a panic. The handler reacts by prompting the
//! user to re-enter their key. A *missing* salt is different: that breaks
//! the data-model invariant and fails loudly.

use std::num::NonZeroU32;

use base64ct::{Base64, Base64Url, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use crate::config::SECRET_KEY_ENV;

/// PBKDF2 iteration count. Fixed; changing it invalidates stored secrets.
const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => panic!("iteration count must be nonzero"),
};

/// Salt length in bytes (base64url-encoded for storage on the user row).
const SALT_LEN: usize = 16;

/// Derived AES-256 key length.
const KEY_LEN: usize = 32;

/// Errors that indicate a contract violation, not a decryption failure.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// A salt is required whenever a non-empty secret is processed.
    #[error("encryption salt is required")]
    MissingSalt,
    /// The salt is not valid base64url (encrypt path only; on decrypt a bad
    /// salt is indistinguishable from a wrong one and fails closed).
    #[error("invalid salt encoding")]
    InvalidSalt,
    /// Master secret not configured in the environment.
    #[error("{SECRET_KEY_ENV} is not set")]
    MissingMasterSecret,
    /// The AEAD primitive rejected its inputs.
    #[error("encryption failed")]
    Crypto,
}

/// Vault over a single master secret.
///
/// Stateless apart from the master secret bytes; safe to share across
/// request handlers.
pub struct SecretVault {
    master_secret: Vec<u8>,
}

impl SecretVault {
    /// Create a vault from an explicit master secret.
    pub fn new(master_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            master_secret: master_secret.into(),
        }
    }

    /// Create a vault from the `TRAVELMIND_SECRET_KEY` environment variable.
    pub fn from_env() -> Result<Self, VaultError> {
        let secret =
            std::env::var(SECRET_KEY_ENV).map_err(|_| VaultError::MissingMasterSecret)?;
        Ok(Self::new(secret.into_bytes()))
    }

    /// Generate a fresh per-user salt (base64url, 16 random bytes).
    ///
    /// Generated once when a user first stores a secret and reused for that
    /// user afterwards.
    pub fn generate_salt(&self) -> Result<String, VaultError> {
        let mut bytes = [0u8; SALT_LEN];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| VaultError::Crypto)?;
        Ok(Base64Url::encode_string(&bytes))
    }

    /// Derive the per-user AES key. Deterministic over (master secret, salt).
    pub fn derive_key(&self, salt: &[u8]) -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            PBKDF2_ITERATIONS,
            salt,
            &self.master_secret,
            &mut key,
        );
        key
    }

    /// Encrypt `plaintext` under the key derived from `salt`.
    ///
    /// Output is base64(nonce || ciphertext || tag) with a fresh random
    /// nonce per call. An empty plaintext encrypts to an empty string
    /// ("no secret set"), not an error.
    ///
    /// # Errors
    /// A missing or undecodable salt with a non-empty plaintext is a
    /// contract violation and fails loudly.
    pub fn encrypt(&self, plaintext: &str, salt: &str) -> Result<String, VaultError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        if salt.is_empty() {
            return Err(VaultError::MissingSalt);
        }

        let salt_bytes = Base64Url::decode_vec(salt).map_err(|_| VaultError::InvalidSalt)?;
        let key = self.sealing_key(&salt_bytes)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut nonce_bytes)
            .map_err(|_| VaultError::Crypto)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::Crypto)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        Ok(Base64::encode_string(&sealed))
    }

    /// Decrypt `ciphertext` with the key derived from `salt`.
    ///
    /// Returns `Ok(None)` on any integrity or decoding failure (wrong salt,
    /// corruption, rotated master secret): the secret is unavailable and the
    /// user must re-enter it. An empty ciphertext round-trips to an empty
    /// plaintext.
    ///
    /// # Errors
    /// Only a missing salt with a non-empty ciphertext, which violates the
    /// "no ciphertext without its salt" invariant.
    pub fn decrypt(&self, ciphertext: &str, salt: &str) -> Result<Option<String>, VaultError> {
        if ciphertext.is_empty() {
            return Ok(Some(String::new()));
        }
        if salt.is_empty() {
            return Err(VaultError::MissingSalt);
        }

        let Ok(salt_bytes) = Base64Url::decode_vec(salt) else {
            tracing::warn!(reason = "undecodable salt", "secret_decrypt_failed");
            return Ok(None);
        };
        let Ok(sealed) = Base64::decode_vec(ciphertext) else {
            tracing::warn!(reason = "undecodable ciphertext", "secret_decrypt_failed");
            return Ok(None);
        };
        if sealed.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            tracing::warn!(reason = "ciphertext too short", "secret_decrypt_failed");
            return Ok(None);
        }

        let key = self.sealing_key(&salt_bytes)?;
        let (nonce_bytes, sealed_data) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| VaultError::Crypto)?;

        let mut in_out = sealed_data.to_vec();
        let plaintext = match key.open_in_place(nonce, Aad::empty(), &mut in_out) {
            Ok(plaintext) => plaintext,
            Err(_) => {
                // Wrong salt or master secret rotation lands here: the GCM
                // tag does not verify and nothing is released.
                tracing::warn!(reason = "authentication failed", "secret_decrypt_failed");
                return Ok(None);
            }
        };

        match std::str::from_utf8(plaintext) {
            Ok(text) => Ok(Some(text.to_string())),
            Err(_) => {
                tracing::warn!(reason = "plaintext not utf-8", "secret_decrypt_failed");
                Ok(None)
            }
        }
    }

    fn sealing_key(&self, salt: &[u8]) -> Result<LessSafeKey, VaultError> {
        let key = self.derive_key(salt);
        let unbound = UnboundKey::new(&AES_256_GCM, &key).map_err(|_| VaultError::Crypto)?;
        Ok(LessSafeKey::new(unbound))
    }
}
