use tokio::task;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("password worker stopped: {0}")]
    Worker(#[from] task::JoinError),
}

/// bcrypt hashing moved onto the blocking pool so request workers stay responsive.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_string();
        let cost = self.cost;
        let hashed = task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_string();
        let hash = hash.to_string();
        let matches = task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashes_verify_only_the_original_password() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("s3cret!pass").await.expect("hash");
        assert_ne!(hash, "s3cret!pass");
        assert!(hasher.verify("s3cret!pass", &hash).await.expect("verify"));
        assert!(!hasher.verify("wrong!pass1", &hash).await.expect("verify"));
    }
}
