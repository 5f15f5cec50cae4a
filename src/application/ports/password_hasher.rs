use crate::app_error::AppResult;

/// Port for one-way password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> AppResult<String>;

    /// Never errors: an unparseable stored hash is a failed verification.
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// A well-formed hash no signin can match, verified in place of a missing
    /// account so both paths cost the same.
    fn dummy_hash(&self) -> &str;
}
