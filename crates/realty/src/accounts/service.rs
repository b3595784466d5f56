use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;

use super::domain::{
    AgentProfile, AgentSummary, NewUser, ProfileUpdate, ResetTicket, User, UserId,
};
use super::mailer::{ResetMailer, ResetNotice};
use super::password::PasswordHasher;
use super::session::Session;
use super::token::TokenAuthority;
use super::validation::{
    password_errors, validate_login, validate_registration, LoginForm, RegistrationForm,
    MIN_CHANGED_PASSWORD_LEN,
};
use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::inquiries::domain::InquiryDetail;
use crate::listings::domain::AgentListingStats;
use crate::pagination::{Page, PageRequest};
use crate::params::trimmed;
use crate::storage::{RepositoryError, Store};

pub const RESET_TOKEN_LEN: usize = 32;
const DASHBOARD_INQUIRIES: u32 = 5;

/// A signed session handed back after registration or login.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
}

/// Dashboard numbers; the shape depends on the caller's role.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DashboardStats {
    Agent {
        #[serde(flatten)]
        listings: AgentListingStats,
        #[serde(rename = "recentInquiries")]
        recent_inquiries: Vec<InquiryDetail>,
    },
    Buyer {
        #[serde(rename = "favoriteCount")]
        favorite_count: i64,
        #[serde(rename = "openInquiries")]
        open_inquiries: i64,
    },
}

/// Registration, sign-in, profile upkeep, and the public agent directory.
pub struct AccountService<S, M> {
    store: Arc<S>,
    mailer: Arc<M>,
    tokens: Arc<TokenAuthority>,
    hasher: PasswordHasher,
    reset_ttl: Duration,
}

impl<S, M> AccountService<S, M>
where
    S: Store,
    M: ResetMailer + 'static,
{
    pub fn new(
        store: Arc<S>,
        mailer: Arc<M>,
        tokens: Arc<TokenAuthority>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            tokens,
            hasher: PasswordHasher::new(config.bcrypt_cost),
            reset_ttl: config.reset_token_ttl,
        }
    }

    pub async fn register(&self, form: RegistrationForm) -> Result<AuthGrant, ApiError> {
        let registration = validate_registration(form).map_err(ApiError::Validation)?;
        let password_hash = self.hasher.hash(&registration.password).await?;
        let user = self
            .store
            .insert_user(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
                phone: registration.phone,
                role: registration.role,
            })
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    ApiError::Conflict("User already exists with this email".to_string())
                }
                other => other.into(),
            })?;
        tracing::info!(user_id = %user.id, role = user.role.label(), "registered user");
        let token = self.tokens.issue(&user)?;
        Ok(AuthGrant { token, user })
    }

    pub async fn login(&self, form: LoginForm) -> Result<AuthGrant, ApiError> {
        let (email, password) = validate_login(form).map_err(ApiError::Validation)?;
        let invalid = || ApiError::bad_request("Invalid credentials");
        let credentials = self
            .store
            .credentials_by_email(&email)
            .await?
            .ok_or_else(invalid)?;
        if !self
            .hasher
            .verify(&password, &credentials.password_hash)
            .await?
        {
            return Err(invalid());
        }
        let mut user = credentials.user;
        self.store.record_login(user.id).await?;
        user.last_login = Some(Utc::now());
        let token = self.tokens.issue(&user)?;
        Ok(AuthGrant { token, user })
    }

    pub async fn current_user(&self, session: &Session) -> Result<User, ApiError> {
        self.store
            .user_by_id(session.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Always succeeds for well-formed input so callers cannot probe which emails exist.
    pub async fn forgot_password(&self, email: Option<String>) -> Result<(), ApiError> {
        let email = trimmed(email)
            .map(|email| email.to_lowercase())
            .ok_or_else(|| ApiError::bad_request("Email is required"))?;
        let Some(credentials) = self.store.credentials_by_email(&email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };
        let ticket = ResetTicket {
            token: reset_token(),
            expires_at: Utc::now() + self.reset_ttl,
        };
        self.store
            .store_reset_ticket(credentials.user.id, &ticket)
            .await?;
        let notice = ResetNotice {
            email: credentials.user.email,
            name: credentials.user.name,
            token: ticket.token,
            expires_at: ticket.expires_at,
        };
        if let Err(err) = self.mailer.send_reset(notice).await {
            tracing::error!(
                error = %err,
                user_id = %credentials.user.id,
                "reset notice not delivered"
            );
        }
        Ok(())
    }

    pub async fn reset_password(
        &self,
        token: Option<String>,
        new_password: Option<String>,
    ) -> Result<(), ApiError> {
        let (Some(token), Some(new_password)) =
            (trimmed(token), new_password.filter(|value| !value.is_empty()))
        else {
            return Err(ApiError::bad_request(
                "Token and new password are required",
            ));
        };
        let errors = password_errors("newPassword", &new_password);
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }
        let user = self
            .store
            .user_by_reset_token(&token, Utc::now())
            .await?
            .ok_or_else(|| ApiError::bad_request("Invalid or expired reset token"))?;
        let password_hash = self.hasher.hash(&new_password).await?;
        self.store.complete_reset(user.id, &password_hash).await?;
        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(())
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        update: ProfileUpdate,
    ) -> Result<User, ApiError> {
        let update = ProfileUpdate {
            name: trimmed(update.name),
            phone: trimmed(update.phone),
            bio: trimmed(update.bio),
            location: trimmed(update.location),
            avatar: trimmed(update.avatar),
        };
        self.store
            .update_profile(session.user_id, &update)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn update_avatar(
        &self,
        session: &Session,
        avatar: Option<String>,
    ) -> Result<User, ApiError> {
        let avatar =
            trimmed(avatar).ok_or_else(|| ApiError::bad_request("Avatar URL is required"))?;
        let update = ProfileUpdate {
            avatar: Some(avatar),
            ..ProfileUpdate::default()
        };
        self.store
            .update_profile(session.user_id, &update)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn change_password(
        &self,
        session: &Session,
        current_password: Option<String>,
        new_password: Option<String>,
    ) -> Result<(), ApiError> {
        let (Some(current_password), Some(new_password)) = (
            current_password.filter(|value| !value.is_empty()),
            new_password.filter(|value| !value.is_empty()),
        ) else {
            return Err(ApiError::bad_request(
                "Current password and new password are required",
            ));
        };
        if new_password.chars().count() < MIN_CHANGED_PASSWORD_LEN {
            return Err(ApiError::bad_request(
                "New password must be at least 6 characters long",
            ));
        }
        let credentials = self
            .store
            .credentials_by_id(session.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        if !self
            .hasher
            .verify(&current_password, &credentials.password_hash)
            .await?
        {
            return Err(ApiError::bad_request("Current password is incorrect"));
        }
        let password_hash = self.hasher.hash(&new_password).await?;
        self.store
            .set_password(session.user_id, &password_hash)
            .await?;
        tracing::info!(user_id = %session.user_id, "password changed");
        Ok(())
    }

    pub async fn delete_account(
        &self,
        session: &Session,
        password: Option<String>,
    ) -> Result<(), ApiError> {
        let password = password
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::bad_request("Password is required to delete account"))?;
        let credentials = self
            .store
            .credentials_by_id(session.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        if !self
            .hasher
            .verify(&password, &credentials.password_hash)
            .await?
        {
            return Err(ApiError::bad_request("Incorrect password"));
        }
        self.store.delete_user(session.user_id).await?;
        tracing::info!(user_id = %session.user_id, "account deleted");
        Ok(())
    }

    pub async fn agents(
        &self,
        location: Option<String>,
        page: PageRequest,
    ) -> Result<Page<AgentSummary>, ApiError> {
        let location = trimmed(location);
        Ok(self.store.agents(location.as_deref(), page).await?)
    }

    pub async fn agent(&self, id: UserId) -> Result<AgentProfile, ApiError> {
        self.store
            .agent_profile(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Agent not found"))
    }

    pub async fn dashboard(&self, session: &Session) -> Result<DashboardStats, ApiError> {
        if session.role.is_agent() {
            let listings = self.store.agent_listing_stats(session.user_id).await?;
            let recent_inquiries = self
                .store
                .recent_agent_inquiries(session.user_id, DASHBOARD_INQUIRIES)
                .await?;
            Ok(DashboardStats::Agent {
                listings,
                recent_inquiries,
            })
        } else {
            Ok(DashboardStats::Buyer {
                favorite_count: self.store.favorite_count(session.user_id).await?,
                open_inquiries: self.store.open_inquiry_count(session.user_id).await?,
            })
        }
    }
}

/// Random alphanumeric reset token.
pub fn reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}
