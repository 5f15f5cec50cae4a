use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::{OsRng, RngCore}},
};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::password_hasher::PasswordHasher,
};

/// Argon2id with the crate's default parameters; hashes are PHC strings.
#[derive(Default, Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    dummy_hash: OnceLock<String>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        let hasher = Self::default();
        hasher.dummy_hash();
        hasher
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    fn dummy_hash(&self) -> &str {
        self.dummy_hash.get_or_init(|| {
            let mut secret = [0u8; 32];
            OsRng.fill_bytes(&mut secret);
            self.hash(&hex::encode(secret)).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to prepare dummy password hash");
                String::new()
            })
        })
    }
}
