//! Shared admin secret hashing.
//!
//! A tournament stores only the Argon2id hash of its admin secret. Every
//! write verifies the presented secret against it.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::errors::{TournamentError, TournamentResult};

/// Shortest accepted admin secret
pub const MIN_SECRET_LEN: usize = 4;

/// Argon2id hasher with a server-side pepper
#[derive(Clone)]
pub struct AdminSecretHasher {
    pepper: String,
}

impl std::fmt::Debug for AdminSecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSecretHasher").finish_non_exhaustive()
    }
}

impl AdminSecretHasher {
    pub fn new(pepper: String) -> Self {
        Self { pepper }
    }

    /// Hash a new admin secret
    pub fn hash(&self, secret: &str) -> TournamentResult<String> {
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(TournamentError::WeakSecret(format!(
                "must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        let peppered = format!("{}{}", secret, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| TournamentError::HashingFailed)?
            .to_string())
    }

    /// Verify a presented secret against a stored hash
    pub fn verify(&self, secret: &str, hash: &str) -> TournamentResult<()> {
        let peppered = format!("{}{}", secret, self.pepper);
        let parsed = PasswordHash::new(hash).map_err(|_| TournamentError::Unauthorized)?;

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed)
            .map_err(|_| TournamentError::Unauthorized)
    }
}
