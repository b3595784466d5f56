//! Identity, sessions, profiles, and the public agent directory.

pub mod domain;
pub mod mailer;
pub mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod token;
pub mod validation;


pub use domain::{AgentProfile, AgentSummary, Role, User, UserId};
pub use mailer::{LoggingMailer, MailerError, ResetMailer, ResetNotice};
pub use repository::UserRepository;
pub use router::account_router;
pub use service::{AccountService, AuthGrant, DashboardStats};
pub use session::Session;
pub use token::{Claims, TokenAuthority, TokenError};
