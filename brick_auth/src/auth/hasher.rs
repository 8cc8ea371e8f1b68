//! Argon2id credential hashing.

use std::fmt;

use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::errors::{AuthError, AuthResult};

/// One-way, salted password transform with an optional server-side pepper.
///
/// Output is a PHC string (`$argon2id$v=19$...`) that embeds the salt and
/// cost parameters, so verification needs nothing but the stored string.
#[derive(Clone, Default)]
pub struct CredentialHasher {
    pepper: String,
}

impl CredentialHasher {
    /// Create a hasher. An empty pepper hashes the password as given.
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
        }
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// * `AuthError::HashingFailed` - Salt generation or Argon2 failed
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let peppered = self.pepper(password);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|e| {
                log::error!("Argon2 hashing failed: {e}");
                AuthError::HashingFailed
            })?
            .to_string())
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`, never an error.
    ///
    /// # Errors
    ///
    /// * `AuthError::HashingFailed` - The stored hash is not a valid PHC string
    pub fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            log::error!("Stored password hash is malformed: {e}");
            AuthError::HashingFailed
        })?;
        let peppered = self.pepper(password);

        match Argon2::default().verify_password(peppered.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                log::error!("Argon2 verification failed: {e}");
                Err(AuthError::HashingFailed)
            }
        }
    }

    fn pepper(&self, password: &str) -> String {
        format!("{}{}", password, self.pepper)
    }
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("peppered", &!self.pepper.is_empty())
            .finish()
    }
}
