use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{BulkCheckEntry, Favorite, FavoriteCheck, FavoriteExportRow, FavoriteStats};
use crate::accounts::session::Session;
use crate::error::ApiError;
use crate::listings::domain::ListingId;
use crate::pagination::{Page, PageRequest};
use crate::storage::{RepositoryError, Store};

pub const MAX_BULK_CHECK: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCheck {
    pub favorited_properties: Vec<ListingId>,
    pub results: Vec<BulkCheckEntry>,
}

/// Download payload for a user's saved listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteExport {
    pub export_date: DateTime<Utc>,
    pub total_count: usize,
    pub favorites: Vec<FavoriteExportRow>,
}

/// Bookmarks scoped to the signed-in user.
pub struct FavoriteService<S> {
    store: Arc<S>,
}

impl<S> FavoriteService<S>
where
    S: Store,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        session: &Session,
        page: PageRequest,
    ) -> Result<Page<Favorite>, ApiError> {
        Ok(self.store.favorites(session.user_id, page).await?)
    }

    pub async fn add(&self, session: &Session, property: ListingId) -> Result<Favorite, ApiError> {
        let property_missing = || ApiError::not_found("Property not found");
        if self.store.listing(property).await?.is_none() {
            return Err(property_missing());
        }
        match self.store.add_favorite(session.user_id, property).await {
            Ok(favorite) => {
                tracing::debug!(
                    user_id = %session.user_id,
                    listing_id = %property,
                    "favorite added"
                );
                Ok(favorite)
            }
            Err(RepositoryError::Conflict) => Err(ApiError::Conflict(
                "Property already in favorites".to_string(),
            )),
            Err(RepositoryError::NotFound) => Err(property_missing()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn remove(&self, session: &Session, property: ListingId) -> Result<(), ApiError> {
        if self.store.remove_favorite(session.user_id, property).await? {
            Ok(())
        } else {
            Err(ApiError::not_found("Favorite not found"))
        }
    }

    pub async fn check(
        &self,
        session: &Session,
        property: ListingId,
    ) -> Result<FavoriteCheck, ApiError> {
        let favorite_id = self.store.favorite_id(session.user_id, property).await?;
        Ok(FavoriteCheck {
            is_favorited: favorite_id.is_some(),
            favorite_id,
        })
    }

    /// Results follow the order of the requested ids.
    pub async fn bulk_check(
        &self,
        session: &Session,
        property_ids: Option<Vec<ListingId>>,
    ) -> Result<BulkCheck, ApiError> {
        let property_ids = property_ids
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| ApiError::bad_request("Property IDs array is required"))?;
        if property_ids.len() > MAX_BULK_CHECK {
            return Err(ApiError::bad_request("Maximum 100 property IDs allowed"));
        }
        let favorited_properties = self
            .store
            .favorited_among(session.user_id, &property_ids)
            .await?;
        let favorited: HashSet<ListingId> = favorited_properties.iter().copied().collect();
        let results = property_ids
            .into_iter()
            .map(|property_id| BulkCheckEntry {
                property_id,
                is_favorited: favorited.contains(&property_id),
            })
            .collect();
        Ok(BulkCheck {
            favorited_properties,
            results,
        })
    }

    pub async fn stats(&self, session: &Session) -> Result<FavoriteStats, ApiError> {
        Ok(self.store.favorite_stats(session.user_id).await?)
    }

    pub async fn clear(&self, session: &Session) -> Result<u64, ApiError> {
        let deleted = self.store.clear_favorites(session.user_id).await?;
        tracing::info!(user_id = %session.user_id, deleted, "favorites cleared");
        Ok(deleted)
    }

    pub async fn export(&self, session: &Session) -> Result<FavoriteExport, ApiError> {
        let favorites = self.store.export_favorites(session.user_id).await?;
        Ok(FavoriteExport {
            export_date: Utc::now(),
            total_count: favorites.len(),
            favorites,
        })
    }
}
