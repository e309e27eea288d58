//! bcrypt password hashing.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use std::sync::{Arc, OnceLock};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Salted one-way hashing with a fixed work factor.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    // Hash at `cost` checked against when a login names no account.
    decoy: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            decoy: Arc::new(OnceLock::new()),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, plaintext: String) -> Result<String, PasswordError> {
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| PasswordError::Hashing(e.to_string()))?
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// True when `plaintext` matches `hash`. A hash that cannot be parsed
    /// never matches.
    pub async fn verify(&self, plaintext: String, hash: String) -> Result<bool, PasswordError> {
        let matches = tokio::task::spawn_blocking(move || match bcrypt::verify(plaintext, &hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("Stored password hash is unreadable: {}", e);
                false
            }
        })
        .await
        .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(matches)
    }

    /// Do the bcrypt work of [`verify`](Self::verify) for a login that matched
    /// no account.
    pub async fn verify_absent(&self, plaintext: String) -> Result<(), PasswordError> {
        let decoy = match self.decoy.get() {
            Some(hash) => hash.clone(),
            None => {
                let hash = self.hash("travelmate-decoy".to_string()).await?;
                self.decoy.get_or_init(|| hash).clone()
            }
        };
        self.verify(plaintext, decoy).await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn decoy_ready(&self) -> bool {
        self.decoy.get().is_some()
    }
}
