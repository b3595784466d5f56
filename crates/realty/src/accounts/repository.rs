use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{
    AgentProfile, AgentSummary, NewUser, ProfileUpdate, ResetTicket, User, UserCredentials, UserId,
};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

/// Storage abstraction for accounts so the service can be exercised without Postgres.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError>;
    async fn credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<UserCredentials>, RepositoryError>;
    async fn record_login(&self, id: UserId) -> Result<(), RepositoryError>;
    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError>;
    async fn set_password(&self, id: UserId, password_hash: &str) -> Result<bool, RepositoryError>;
    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError>;
    async fn store_reset_ticket(
        &self,
        id: UserId,
        ticket: &ResetTicket,
    ) -> Result<(), RepositoryError>;
    /// Only returns a user whose ticket matches and expires after `now`.
    async fn user_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError>;
    /// Stores the new hash and clears the outstanding ticket in one step.
    async fn complete_reset(&self, id: UserId, password_hash: &str)
        -> Result<(), RepositoryError>;
    async fn agents(
        &self,
        location: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AgentSummary>, RepositoryError>;
    async fn agent_profile(&self, id: UserId) -> Result<Option<AgentProfile>, RepositoryError>;
}
