use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::listings::{convert_all, ListingWithAgentRow, AGENT_CONTACT_COLUMNS, LISTING_COLUMNS};
use super::{total, PgStore};
use crate::accounts::domain::UserId;
use crate::favorites::domain::{
    Favorite, FavoriteExportRow, FavoriteId, FavoriteStats, FavoriteTotals, LocationCount,
    RecentFavorite,
};
use crate::favorites::repository::FavoriteRepository;
use crate::listings::domain::{ListingId, ListingWithAgent};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

const TOP_LOCATIONS: i64 = 5;
const RECENT_FAVORITES: i64 = 5;

#[derive(Debug, FromRow)]
struct FavoriteRow {
    favorite_id: i64,
    favorited_at: DateTime<Utc>,
    #[sqlx(flatten)]
    property: ListingWithAgentRow,
}

impl TryFrom<FavoriteRow> for Favorite {
    type Error = RepositoryError;

    fn try_from(row: FavoriteRow) -> Result<Self, Self::Error> {
        Ok(Favorite {
            favorite_id: FavoriteId(row.favorite_id),
            favorited_at: row.favorited_at,
            property: ListingWithAgent::try_from(row.property)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct TotalsRow {
    total_favorites: i64,
    house_favorites: i64,
    apartment_favorites: i64,
    land_favorites: i64,
    commercial_favorites: i64,
    avg_price_favorited: f64,
    min_price_favorited: f64,
    max_price_favorited: f64,
}

impl From<TotalsRow> for FavoriteTotals {
    fn from(row: TotalsRow) -> Self {
        FavoriteTotals {
            total_favorites: row.total_favorites,
            house_favorites: row.house_favorites,
            apartment_favorites: row.apartment_favorites,
            land_favorites: row.land_favorites,
            commercial_favorites: row.commercial_favorites,
            avg_price_favorited: row.avg_price_favorited,
            min_price_favorited: row.min_price_favorited,
            max_price_favorited: row.max_price_favorited,
        }
    }
}

#[derive(Debug, FromRow)]
struct LocationRow {
    location: String,
    count: i64,
}

#[derive(Debug, FromRow)]
struct RecentRow {
    title: String,
    price: f64,
    location: String,
    created_at: DateTime<Utc>,
}

fn favorites_select() -> String {
    format!(
        "SELECT f.id AS favorite_id, f.created_at AS favorited_at, {LISTING_COLUMNS}, \
           {AGENT_CONTACT_COLUMNS} \
         FROM favorites f \
         JOIN properties p ON p.id = f.property_id \
         LEFT JOIN users u ON u.id = p.agent_id"
    )
}

impl PgStore {
    async fn favorite_by_id(&self, id: i64) -> Result<Favorite, RepositoryError> {
        let row: FavoriteRow = sqlx::query_as(&format!("{} WHERE f.id = $1", favorites_select()))
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        row.try_into()
    }

    async fn all_favorites(&self, user: UserId) -> Result<Vec<Favorite>, RepositoryError> {
        let rows: Vec<FavoriteRow> = sqlx::query_as(&format!(
            "{} WHERE f.user_id = $1 ORDER BY f.created_at DESC, f.id DESC",
            favorites_select()
        ))
        .bind(user.0)
        .fetch_all(self.pool())
        .await?;
        convert_all(rows)
    }
}

#[async_trait]
impl FavoriteRepository for PgStore {
    async fn favorites(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<Favorite>, RepositoryError> {
        let rows: Vec<FavoriteRow> = sqlx::query_as(&format!(
            "{} WHERE f.user_id = $1 ORDER BY f.created_at DESC, f.id DESC LIMIT $2 OFFSET $3",
            favorites_select()
        ))
        .bind(user.0)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(self.pool())
        .await?;
        let count = self.favorite_count(user).await?;
        Ok(Page::new(convert_all(rows)?, total(count)))
    }

    async fn add_favorite(
        &self,
        user: UserId,
        property: ListingId,
    ) -> Result<Favorite, RepositoryError> {
        let inserted: Option<i64> = sqlx::query_scalar(
            "INSERT INTO favorites (user_id, property_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, property_id) DO NOTHING RETURNING id",
        )
        .bind(user.0)
        .bind(property.0)
        .fetch_optional(self.pool())
        .await?;
        let id = inserted.ok_or(RepositoryError::Conflict)?;
        self.favorite_by_id(id).await
    }

    async fn remove_favorite(
        &self,
        user: UserId,
        property: ListingId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND property_id = $2")
            .bind(user.0)
            .bind(property.0)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn favorite_id(
        &self,
        user: UserId,
        property: ListingId,
    ) -> Result<Option<FavoriteId>, RepositoryError> {
        let id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM favorites WHERE user_id = $1 AND property_id = $2",
        )
        .bind(user.0)
        .bind(property.0)
        .fetch_optional(self.pool())
        .await?;
        Ok(id.map(FavoriteId))
    }

    async fn favorited_among(
        &self,
        user: UserId,
        candidates: &[ListingId],
    ) -> Result<Vec<ListingId>, RepositoryError> {
        let ids: Vec<i64> = candidates.iter().map(|id| id.0).collect();
        let found: Vec<i64> = sqlx::query_scalar(
            "SELECT property_id FROM favorites WHERE user_id = $1 AND property_id = ANY($2)",
        )
        .bind(user.0)
        .bind(&ids)
        .fetch_all(self.pool())
        .await?;
        Ok(found.into_iter().map(ListingId).collect())
    }

    async fn favorite_stats(&self, user: UserId) -> Result<FavoriteStats, RepositoryError> {
        let totals: TotalsRow = sqlx::query_as(
            "SELECT COUNT(*) AS total_favorites, \
               COUNT(*) FILTER (WHERE p.property_type = 'house') AS house_favorites, \
               COUNT(*) FILTER (WHERE p.property_type = 'apartment') AS apartment_favorites, \
               COUNT(*) FILTER (WHERE p.property_type = 'land') AS land_favorites, \
               COUNT(*) FILTER (WHERE p.property_type = 'commercial') AS commercial_favorites, \
               COALESCE(AVG(p.price), 0) AS avg_price_favorited, \
               COALESCE(MIN(p.price), 0) AS min_price_favorited, \
               COALESCE(MAX(p.price), 0) AS max_price_favorited \
             FROM favorites f JOIN properties p ON p.id = f.property_id \
             WHERE f.user_id = $1",
        )
        .bind(user.0)
        .fetch_one(self.pool())
        .await?;

        let locations: Vec<LocationRow> = sqlx::query_as(
            "SELECT p.location, COUNT(*) AS count \
             FROM favorites f JOIN properties p ON p.id = f.property_id \
             WHERE f.user_id = $1 \
             GROUP BY p.location ORDER BY count DESC, p.location ASC LIMIT $2",
        )
        .bind(user.0)
        .bind(TOP_LOCATIONS)
        .fetch_all(self.pool())
        .await?;

        let recent: Vec<RecentRow> = sqlx::query_as(
            "SELECT p.title, p.price, p.location, f.created_at \
             FROM favorites f JOIN properties p ON p.id = f.property_id \
             WHERE f.user_id = $1 ORDER BY f.created_at DESC, f.id DESC LIMIT $2",
        )
        .bind(user.0)
        .bind(RECENT_FAVORITES)
        .fetch_all(self.pool())
        .await?;

        Ok(FavoriteStats {
            stats: totals.into(),
            top_locations: locations
                .into_iter()
                .map(|row| LocationCount {
                    location: row.location,
                    count: row.count,
                })
                .collect(),
            recent_favorites: recent
                .into_iter()
                .map(|row| RecentFavorite {
                    title: row.title,
                    price: row.price,
                    location: row.location,
                    created_at: row.created_at,
                })
                .collect(),
        })
    }

    async fn clear_favorites(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1")
            .bind(user.0)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn export_favorites(
        &self,
        user: UserId,
    ) -> Result<Vec<FavoriteExportRow>, RepositoryError> {
        let favorites = self.all_favorites(user).await?;
        Ok(favorites.iter().map(FavoriteExportRow::from).collect())
    }

    async fn favorite_count(&self, user: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
            .bind(user.0)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
