use crate::error::DomainError;
use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHasher as _, SaltString};

/// Memory cost in KiB
const M_COST: u32 = 19 * 1024;
const T_COST: u32 = 2;
const P_COST: u32 = 1;

/// Argon2id with fixed, moderate cost parameters.
#[derive(Clone)]
pub struct PasswordHasher {
    argon: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Result<Self, DomainError> {
        let params = Params::new(M_COST, T_COST, P_COST, None)
            .map_err(|e| DomainError::InternalError(format!("invalid argon2 params: {e}")))?;
        Ok(Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// PHC string for the given password, with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon.hash_password(password.as_bytes(), &salt)?.to_string();
        Ok(hash)
    }

    #[cfg(test)]
    fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        use password_hash::{PasswordHash, PasswordVerifier};

        let parsed = PasswordHash::new(hash)?;
        Ok(self.argon.verify_password(password.as_bytes(), &parsed).is_ok())
    }

    /// Hashes on the blocking pool so the runtime workers are not stalled by argon2.
    pub async fn hash_blocking(&self, password: String) -> Result<String, DomainError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::InternalError(format!("password hashing task failed: {e}")))?
    }
}
