use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder};

use super::listings::{ListingRow, LISTING_COLUMNS};
use super::{corrupt, like_pattern, total, PgStore};
use crate::accounts::domain::{
    AgentProfile, AgentSummary, NewUser, ProfileUpdate, ResetTicket, User, UserCredentials,
    UserId,
};
use crate::accounts::repository::UserRepository;
use crate::listings::domain::{Listing, ListingSummary};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.phone, u.role, u.avatar, u.bio, u.location, \
     u.created_at, u.updated_at, u.last_login";

const AGENT_COLUMNS: &str =
    "u.id, u.name, u.email, u.phone, u.avatar, u.bio, u.location, u.created_at";

const RECENT_AGENT_LISTINGS: i64 = 5;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    avatar: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: row.role.parse().map_err(corrupt)?,
            avatar: row.avatar,
            bio: row.bio,
            location: row.location,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login: row.last_login,
        })
    }
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<CredentialRow> for UserCredentials {
    type Error = RepositoryError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        Ok(UserCredentials {
            user: row.user.try_into()?,
            password_hash: row.password_hash,
        })
    }
}

#[derive(Debug, FromRow)]
struct AgentRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    avatar: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    created_at: DateTime<Utc>,
    total_properties: i64,
}

impl From<AgentRow> for AgentSummary {
    fn from(row: AgentRow) -> Self {
        AgentSummary {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            avatar: row.avatar,
            bio: row.bio,
            location: row.location,
            created_at: row.created_at,
            total_properties: row.total_properties,
        }
    }
}

#[derive(Debug, FromRow)]
struct AgentProfileRow {
    #[sqlx(flatten)]
    agent: AgentRow,
    active_properties: i64,
}

/// Directory query: agents with their active listing count, busiest first.
fn agent_directory_query(
    location: Option<&str>,
    page: PageRequest,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT {AGENT_COLUMNS}, COUNT(p.id) AS total_properties FROM users u \
         LEFT JOIN properties p ON p.agent_id = u.id AND p.status = 'active' \
         WHERE u.role = 'agent'"
    ));
    if let Some(location) = location {
        query
            .push(" AND u.location ILIKE ")
            .push_bind(like_pattern(location));
    }
    query.push(" GROUP BY u.id ORDER BY total_properties DESC, u.created_at DESC, u.id DESC");
    query
        .push(" LIMIT ")
        .push_bind(i64::from(page.limit()))
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
    query
}

fn agent_count_query(location: Option<&str>) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("SELECT COUNT(*) FROM users u WHERE u.role = 'agent'");
    if let Some(location) = location {
        query
            .push(" AND u.location ILIKE ")
            .push_bind(like_pattern(location));
    }
    query
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users AS u (name, email, password_hash, phone, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(user.role.label())
        .fetch_one(self.pool())
        .await?;
        row.try_into()
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1"))
                .bind(id.0)
                .fetch_optional(self.pool())
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        row.map(UserCredentials::try_from).transpose()
    }

    async fn credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.id = $1"
        ))
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;
        row.map(UserCredentials::try_from).transpose()
    }

    async fn record_login(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id.0)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users AS u SET \
               name = COALESCE($2, name), \
               phone = COALESCE($3, phone), \
               bio = COALESCE($4, bio), \
               location = COALESCE($5, location), \
               avatar = COALESCE($6, avatar), \
               updated_at = NOW() \
             WHERE u.id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.bio)
        .bind(&update.location)
        .bind(&update.avatar)
        .fetch_optional(self.pool())
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn set_password(&self, id: UserId, password_hash: &str) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.0)
                .bind(password_hash)
                .execute(self.pool())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn store_reset_ticket(
        &self,
        id: UserId,
        ticket: &ResetTicket,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expiry = $3 WHERE id = $1",
        )
        .bind(id.0)
        .bind(&ticket.token)
        .bind(ticket.expires_at)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn user_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             WHERE u.reset_token = $1 AND u.reset_token_expiry > $2"
        ))
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn complete_reset(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, reset_token = NULL, \
             reset_token_expiry = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.0)
        .bind(password_hash)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn agents(
        &self,
        location: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AgentSummary>, RepositoryError> {
        let rows: Vec<AgentRow> = agent_directory_query(location, page)
            .build_query_as()
            .fetch_all(self.pool())
            .await?;
        let count: i64 = agent_count_query(location)
            .build_query_scalar()
            .fetch_one(self.pool())
            .await?;
        Ok(Page::new(
            rows.into_iter().map(AgentSummary::from).collect(),
            total(count),
        ))
    }

    async fn agent_profile(&self, id: UserId) -> Result<Option<AgentProfile>, RepositoryError> {
        let row: Option<AgentProfileRow> = sqlx::query_as(&format!(
            "SELECT {AGENT_COLUMNS}, COUNT(p.id) AS total_properties, \
               COUNT(p.id) FILTER (WHERE p.status = 'active') AS active_properties \
             FROM users u LEFT JOIN properties p ON p.agent_id = u.id \
             WHERE u.id = $1 AND u.role = 'agent' GROUP BY u.id"
        ))
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let recent: Vec<ListingRow> = sqlx::query_as(&format!(
            "SELECT {LISTING_COLUMNS} FROM properties p \
             WHERE p.agent_id = $1 AND p.status = 'active' \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $2"
        ))
        .bind(id.0)
        .bind(RECENT_AGENT_LISTINGS)
        .fetch_all(self.pool())
        .await?;
        let recent_properties = recent
            .into_iter()
            .map(|row| Listing::try_from(row).map(|listing| ListingSummary::from(&listing)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(AgentProfile {
            agent: row.agent.into(),
            active_properties: row.active_properties,
            recent_properties,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_filters_location_before_grouping() {
        let query = agent_directory_query(Some("lake"), PageRequest::new(2, 5));
        let sql = query.sql();
        assert!(sql.contains("WHERE u.role = 'agent' AND u.location ILIKE $1 GROUP BY u.id"));
        assert!(sql.ends_with("LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn count_query_without_location_has_no_binds() {
        let query = agent_count_query(None);
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM users u WHERE u.role = 'agent'"
        );
    }
}
