use async_trait::async_trait;

use super::domain::{Inquiry, InquiryDetail, InquiryFilter, InquiryId, NewInquiry, StatusChange};
use crate::accounts::domain::UserId;
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

#[async_trait]
pub trait InquiryRepository: Send + Sync {
    async fn insert_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, RepositoryError>;
    /// Detail includes the owning agent of the referenced listing, used for access checks.
    async fn inquiry(&self, id: InquiryId) -> Result<Option<InquiryDetail>, RepositoryError>;
    async fn user_inquiries(
        &self,
        user: UserId,
        filter: InquiryFilter,
        page: PageRequest,
    ) -> Result<Page<InquiryDetail>, RepositoryError>;
    /// Inquiries on the agent's listings plus general inquiries without a listing.
    async fn agent_inquiries(
        &self,
        agent: UserId,
        filter: InquiryFilter,
        page: PageRequest,
    ) -> Result<Page<InquiryDetail>, RepositoryError>;
    async fn update_inquiry_status(
        &self,
        id: InquiryId,
        change: &StatusChange,
    ) -> Result<Option<Inquiry>, RepositoryError>;
    async fn delete_inquiry(&self, id: InquiryId) -> Result<bool, RepositoryError>;
    /// Newest inquiries on listings owned by the agent.
    async fn recent_agent_inquiries(
        &self,
        agent: UserId,
        limit: u32,
    ) -> Result<Vec<InquiryDetail>, RepositoryError>;
    /// Inquiries sent by the user that are not closed yet.
    async fn open_inquiry_count(&self, user: UserId) -> Result<i64, RepositoryError>;
}
