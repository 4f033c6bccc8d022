//! Server-side generation of the write-only customer credential.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, Rng};
use secrecy::SecretString;
use thiserror::Error;

const GENERATED_PASSWORD_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

pub trait CredentialIssuer: Send + Sync {
    /// Returns the value to persist as the customer's credential.
    fn issue(&self) -> Result<SecretString, CredentialError>;
}

/// Generates a random password and stores only its Argon2id PHC hash.
#[derive(Clone, Copy, Debug, Default)]
pub struct Argon2CredentialIssuer;

impl Argon2CredentialIssuer {
    fn generate_password() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_PASSWORD_LEN)
            .map(char::from)
            .collect()
    }
}

impl CredentialIssuer for Argon2CredentialIssuer {
    fn issue(&self) -> Result<SecretString, CredentialError> {
        let password = Self::generate_password();
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|error| CredentialError::Hash(error.to_string()))?;

        Ok(hash.to_string().into())
    }
}

/// Hands out the same value every time. Meant for tests and demo fixtures.
#[derive(Clone, Debug)]
pub struct StaticCredentialIssuer {
    value: String,
}

impl StaticCredentialIssuer {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

impl Default for StaticCredentialIssuer {
    fn default() -> Self {
        Self::new("static-credential")
    }
}

impl CredentialIssuer for StaticCredentialIssuer {
    fn issue(&self) -> Result<SecretString, CredentialError> {
        Ok(self.value.clone().into())
    }
}

#[cfg(test)]
mod tests {
    use argon2::password_hash::PasswordHash;
    use secrecy::ExposeSecret;

    use super::{Argon2CredentialIssuer, CredentialIssuer, StaticCredentialIssuer};

    #[test]
    fn argon2_issuer_produces_distinct_phc_hashes() {
        let issuer = Argon2CredentialIssuer;
        let first = issuer.issue().expect("first hash");
        let second = issuer.issue().expect("second hash");

        let parsed = PasswordHash::new(first.expose_secret()).expect("valid PHC string");
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert_ne!(first.expose_secret(), second.expose_secret());
    }

    #[test]
    fn static_issuer_is_deterministic_and_redacted_in_debug() {
        let issuer = StaticCredentialIssuer::new("fixture-secret");
        let credential = issuer.issue().expect("static credential");

        assert_eq!(credential.expose_secret(), "fixture-secret");
        assert!(!format!("{credential:?}").contains("fixture-secret"));
    }
}
