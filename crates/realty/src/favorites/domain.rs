use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::listings::domain::{ListingId, ListingWithAgent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteId(pub i64);

/// A bookmarked listing with the bookmark's own id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Favorite {
    pub favorite_id: FavoriteId,
    pub favorited_at: DateTime<Utc>,
    #[serde(flatten)]
    pub property: ListingWithAgent,
}

/// Bookmark existence check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCheck {
    pub is_favorited: bool,
    pub favorite_id: Option<FavoriteId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCheckEntry {
    pub property_id: ListingId,
    pub is_favorited: bool,
}

/// Aggregates over one user's favorites.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FavoriteTotals {
    pub total_favorites: i64,
    pub house_favorites: i64,
    pub apartment_favorites: i64,
    pub land_favorites: i64,
    pub commercial_favorites: i64,
    pub avg_price_favorited: f64,
    pub min_price_favorited: f64,
    pub max_price_favorited: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentFavorite {
    pub title: String,
    pub price: f64,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStats {
    pub stats: FavoriteTotals,
    pub top_locations: Vec<LocationCount>,
    pub recent_favorites: Vec<RecentFavorite>,
}

/// Flat row used for the favorites export download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteExportRow {
    pub title: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub listing_type: String,
    pub location: String,
    pub address: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,
    pub agent_name: Option<String>,
    pub agent_email: Option<String>,
    pub agent_phone: Option<String>,
    pub favorited_at: DateTime<Utc>,
}

impl From<&Favorite> for FavoriteExportRow {
    fn from(favorite: &Favorite) -> Self {
        let listing = &favorite.property.listing;
        let agent = &favorite.property.agent;
        Self {
            title: listing.title.clone(),
            price: listing.price,
            listing_type: listing.listing_type.label().to_string(),
            location: listing.location.clone(),
            address: listing.address.clone(),
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            area: listing.area,
            agent_name: agent.agent_name.clone(),
            agent_email: agent.agent_email.clone(),
            agent_phone: agent.agent_phone.clone(),
            favorited_at: favorite.favorited_at,
        }
    }
}
