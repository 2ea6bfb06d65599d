// Password hashing and verification utilities using bcrypt

use thiserror::Error;

/// Errors that can occur during password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),

    #[error("Failed to verify password: {0}")]
    VerificationError(String),

    #[error("Hashing task failed: {0}")]
    TaskFailed(String),
}

/// Hash a password with bcrypt at the given cost.
///
/// bcrypt is CPU bound, so the work runs on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
        .map_err(|e| PasswordError::HashingError(e.to_string()))
}

/// Verify a password against a stored bcrypt hash
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
        .map_err(|e| PasswordError::VerificationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the tests fast
    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery", TEST_COST)
            .await
            .expect("hashing failed");

        assert!(hash.starts_with("$2"));
        assert!(verify_password("correct horse battery", &hash).await.unwrap());
        assert!(!verify_password("wrong password", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_password_different_hashes() {
        let first = hash_password("repeat-me-please", TEST_COST).await.unwrap();
        let second = hash_password("repeat-me-please", TEST_COST).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_verify_with_malformed_hash() {
        let result = verify_password("anything", "not-a-bcrypt-hash").await;
        assert!(matches!(result, Err(PasswordError::VerificationError(_))));
    }
}
