//! Driving ports for the signed-in user's profile.

use async_trait::async_trait;

use crate::domain::{Error, ProfileUpdate, UserAccount, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileQuery: Send + Sync {
    /// Fetch the account for `user_id`; a deleted account yields `unauthorized`.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<UserAccount, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileCommand: Send + Sync {
    async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserAccount, Error>;
}
