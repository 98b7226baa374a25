//! In-memory reset token store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::UserId;
use crate::domain::ports::{
    PasswordResetRecord, PasswordResetRepository, PasswordResetRepositoryError,
};

#[derive(Debug, Default)]
pub struct InMemoryPasswordResetRepository {
    grants: RwLock<HashMap<String, PasswordResetRecord>>,
}

impl InMemoryPasswordResetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PasswordResetRepository for InMemoryPasswordResetRepository {
    async fn store(&self, record: &PasswordResetRecord) -> Result<(), PasswordResetRepositoryError> {
        self.grants
            .write()
            .await
            .insert(record.token_digest.clone(), record.clone());
        Ok(())
    }

    async fn consume(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, PasswordResetRepositoryError> {
        let grant = self.grants.write().await.remove(token_digest);
        Ok(grant
            .filter(|record| record.expires_at > now)
            .map(|record| record.user_id))
    }
}
