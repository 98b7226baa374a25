//! In-memory account store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{StoredCredentials, UserRepository, UserRepositoryError};
use crate::domain::{EmailAddress, UserAccount, UserId};

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    accounts: RwLock<HashMap<UserId, StoredCredentials>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(
        &self,
        account: &UserAccount,
        password_hash: &str,
    ) -> Result<(), UserRepositoryError> {
        let mut accounts = self.accounts.write().await;
        if accounts
            .values()
            .any(|stored| stored.account.email() == account.email())
        {
            return Err(UserRepositoryError::duplicate_email(account.email().as_ref()));
        }
        accounts.insert(
            account.id().clone(),
            StoredCredentials {
                account: account.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserRepositoryError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(id).map(|stored| stored.account.clone()))
    }

    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|stored| stored.account.email() == email)
            .cloned())
    }

    async fn update_profile(&self, account: &UserAccount) -> Result<(), UserRepositoryError> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts
            .get_mut(account.id())
            .ok_or_else(|| UserRepositoryError::missing(account.id().as_ref()))?;
        stored.account = account.clone();
        Ok(())
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<(), UserRepositoryError> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts
            .get_mut(id)
            .ok_or_else(|| UserRepositoryError::missing(id.as_ref()))?;
        password_hash.clone_into(&mut stored.password_hash);
        Ok(())
    }
}
