use async_trait::async_trait;

use super::domain::{
    AgentListingStats, Listing, ListingFilter, ListingId, ListingPatch, ListingSort,
    ListingStatus, ListingWithAgent, NewListing,
};
use crate::accounts::domain::UserId;
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn insert_listing(
        &self,
        agent: UserId,
        listing: NewListing,
    ) -> Result<Listing, RepositoryError>;
    /// Reads a listing regardless of status.
    async fn listing(&self, id: ListingId) -> Result<Option<ListingWithAgent>, RepositoryError>;
    async fn record_view(&self, id: ListingId) -> Result<(), RepositoryError>;
    /// Active listings only; the total counts every match, not just the page.
    async fn search_listings(
        &self,
        filter: &ListingFilter,
        sort: ListingSort,
        page: PageRequest,
    ) -> Result<Page<ListingWithAgent>, RepositoryError>;
    /// Returns `None` when the listing does not exist or belongs to another agent.
    async fn update_listing(
        &self,
        id: ListingId,
        agent: UserId,
        patch: &ListingPatch,
    ) -> Result<Option<Listing>, RepositoryError>;
    async fn delete_listing(&self, id: ListingId, agent: UserId) -> Result<bool, RepositoryError>;
    async fn agent_listings(
        &self,
        agent: UserId,
        status: Option<ListingStatus>,
        page: PageRequest,
    ) -> Result<Page<Listing>, RepositoryError>;
    async fn keyword_search(
        &self,
        needle: &str,
        limit: u32,
    ) -> Result<Vec<ListingWithAgent>, RepositoryError>;
    async fn agent_listing_stats(&self, agent: UserId)
        -> Result<AgentListingStats, RepositoryError>;
}
