use async_trait::async_trait;

use super::domain::{Favorite, FavoriteExportRow, FavoriteId, FavoriteStats};
use crate::accounts::domain::UserId;
use crate::listings::domain::ListingId;
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Newest bookmark first.
    async fn favorites(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<Favorite>, RepositoryError>;
    /// Fails with [`RepositoryError::Conflict`] when the pair is already bookmarked.
    async fn add_favorite(
        &self,
        user: UserId,
        property: ListingId,
    ) -> Result<Favorite, RepositoryError>;
    async fn remove_favorite(
        &self,
        user: UserId,
        property: ListingId,
    ) -> Result<bool, RepositoryError>;
    async fn favorite_id(
        &self,
        user: UserId,
        property: ListingId,
    ) -> Result<Option<FavoriteId>, RepositoryError>;
    async fn favorited_among(
        &self,
        user: UserId,
        candidates: &[ListingId],
    ) -> Result<Vec<ListingId>, RepositoryError>;
    async fn favorite_stats(&self, user: UserId) -> Result<FavoriteStats, RepositoryError>;
    async fn clear_favorites(&self, user: UserId) -> Result<u64, RepositoryError>;
    async fn export_favorites(
        &self,
        user: UserId,
    ) -> Result<Vec<FavoriteExportRow>, RepositoryError>;
    async fn favorite_count(&self, user: UserId) -> Result<i64, RepositoryError>;
}
