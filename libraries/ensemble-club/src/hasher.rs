//! Credential hashing seam

use async_trait::async_trait;
use ensemble_core::Result;

/// Hashes and checks passwords.
///
/// The server implements this with bcrypt; the club only stores and
/// compares what the hasher produces.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String>;

    async fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}
