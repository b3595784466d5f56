use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Password reset delivery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetNotice {
    pub email: String,
    pub name: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Outbound hook for reset tokens (SMTP, a queue, or a log line in development).
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send_reset(&self, notice: ResetNotice) -> Result<(), MailerError>;
}

/// Writes reset notices to the log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMailer;

#[async_trait]
impl ResetMailer for LoggingMailer {
    async fn send_reset(&self, notice: ResetNotice) -> Result<(), MailerError> {
        tracing::info!(
            email = %notice.email,
            expires_at = %notice.expires_at,
            "password reset requested"
        );
        tracing::debug!(token = %notice.token, "password reset token");
        Ok(())
    }
}
