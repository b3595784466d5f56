use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder};

use super::{corrupt, like_pattern, total, PgStore};
use crate::accounts::domain::UserId;
use crate::listings::domain::{
    AgentContact, AgentListingStats, Listing, ListingFilter, ListingId, ListingPatch, ListingSort,
    ListingStatus, ListingWithAgent, NewListing,
};
use crate::listings::repository::ListingRepository;
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

pub(super) const LISTING_COLUMNS: &str = "p.id, p.title, p.description, p.property_type, \
     p.purpose, p.price, p.location, p.address, p.bedrooms, p.bathrooms, p.area, p.features, \
     p.images, p.status, p.views, p.agent_id, p.created_at, p.updated_at";

pub(super) const AGENT_CONTACT_COLUMNS: &str =
    "u.name AS agent_name, u.phone AS agent_phone, u.email AS agent_email";

#[derive(Debug, FromRow)]
pub(super) struct ListingRow {
    id: i64,
    title: String,
    description: Option<String>,
    property_type: String,
    purpose: String,
    price: f64,
    location: String,
    address: Option<String>,
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
    area: Option<f64>,
    features: Vec<String>,
    images: Vec<String>,
    status: String,
    views: i64,
    agent_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = RepositoryError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Listing {
            id: ListingId(row.id),
            title: row.title,
            description: row.description,
            listing_type: row.property_type.parse().map_err(corrupt)?,
            purpose: row.purpose.parse().map_err(corrupt)?,
            price: row.price,
            location: row.location,
            address: row.address,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            area: row.area,
            features: row.features,
            images: row.images,
            status: row.status.parse().map_err(corrupt)?,
            views: row.views,
            agent_id: UserId(row.agent_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ListingWithAgentRow {
    #[sqlx(flatten)]
    listing: ListingRow,
    agent_name: Option<String>,
    agent_phone: Option<String>,
    agent_email: Option<String>,
}

impl TryFrom<ListingWithAgentRow> for ListingWithAgent {
    type Error = RepositoryError;

    fn try_from(row: ListingWithAgentRow) -> Result<Self, Self::Error> {
        Ok(ListingWithAgent {
            listing: row.listing.try_into()?,
            agent: AgentContact {
                agent_name: row.agent_name,
                agent_phone: row.agent_phone,
                agent_email: row.agent_email,
            },
        })
    }
}

#[derive(Debug, FromRow)]
struct StatsRow {
    total_properties: i64,
    active_properties: i64,
    sold_properties: i64,
    total_views: i64,
}

pub(super) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, RepositoryError>
where
    T: TryFrom<R, Error = RepositoryError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Appends the public search predicate; the caller has already opened a `WHERE` clause.
fn push_filter(query: &mut QueryBuilder<'static, Postgres>, filter: &ListingFilter) {
    if let Some(listing_type) = filter.listing_type {
        query
            .push(" AND p.property_type = ")
            .push_bind(listing_type.label());
    }
    if let Some(purpose) = filter.purpose {
        query.push(" AND p.purpose = ").push_bind(purpose.label());
    }
    if let Some(min) = filter.min_price {
        query.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND p.price <= ").push_bind(max);
    }
    if let Some(location) = &filter.location {
        let pattern = like_pattern(location);
        query
            .push(" AND (p.location ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.address ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(bedrooms) = filter.bedrooms {
        query.push(" AND p.bedrooms >= ").push_bind(bedrooms);
    }
    if let Some(bathrooms) = filter.bathrooms {
        query.push(" AND p.bathrooms >= ").push_bind(bathrooms);
    }
}

fn push_page(query: &mut QueryBuilder<'static, Postgres>, page: PageRequest) {
    query
        .push(" LIMIT ")
        .push_bind(i64::from(page.limit()))
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
}

pub(super) fn search_query(
    filter: &ListingFilter,
    sort: ListingSort,
    page: PageRequest,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT {LISTING_COLUMNS}, {AGENT_CONTACT_COLUMNS} FROM properties p \
         LEFT JOIN users u ON u.id = p.agent_id WHERE p.status = 'active'"
    ));
    push_filter(&mut query, filter);
    // Column and direction come from closed enums, never from raw input.
    query.push(format!(
        " ORDER BY p.{} {}, p.id DESC",
        sort.key.label(),
        sort.order.sql()
    ));
    push_page(&mut query, page);
    query
}

pub(super) fn search_count_query(filter: &ListingFilter) -> QueryBuilder<'static, Postgres> {
    let mut query =
        QueryBuilder::new("SELECT COUNT(*) FROM properties p WHERE p.status = 'active'");
    push_filter(&mut query, filter);
    query
}

fn agent_listings_query(
    agent: UserId,
    status: Option<ListingStatus>,
    select: &str,
) -> QueryBuilder<'static, Postgres> {
    let mut query =
        QueryBuilder::new(format!("SELECT {select} FROM properties p WHERE p.agent_id = "));
    query.push_bind(agent.0);
    if let Some(status) = status {
        query.push(" AND p.status = ").push_bind(status.label());
    }
    query
}

#[async_trait]
impl ListingRepository for PgStore {
    async fn insert_listing(
        &self,
        agent: UserId,
        listing: NewListing,
    ) -> Result<Listing, RepositoryError> {
        let row: ListingRow = sqlx::query_as(&format!(
            "INSERT INTO properties AS p (title, description, property_type, purpose, price, \
               location, address, bedrooms, bathrooms, area, features, images, agent_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.listing_type.label())
        .bind(listing.purpose.label())
        .bind(listing.price)
        .bind(&listing.location)
        .bind(&listing.address)
        .bind(listing.bedrooms)
        .bind(listing.bathrooms)
        .bind(listing.area)
        .bind(&listing.features)
        .bind(&listing.images)
        .bind(agent.0)
        .fetch_one(self.pool())
        .await?;
        row.try_into()
    }

    async fn listing(&self, id: ListingId) -> Result<Option<ListingWithAgent>, RepositoryError> {
        let row: Option<ListingWithAgentRow> = sqlx::query_as(&format!(
            "SELECT {LISTING_COLUMNS}, {AGENT_CONTACT_COLUMNS} FROM properties p \
             LEFT JOIN users u ON u.id = p.agent_id WHERE p.id = $1"
        ))
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;
        row.map(ListingWithAgent::try_from).transpose()
    }

    async fn record_view(&self, id: ListingId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE properties SET views = views + 1 WHERE id = $1")
            .bind(id.0)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn search_listings(
        &self,
        filter: &ListingFilter,
        sort: ListingSort,
        page: PageRequest,
    ) -> Result<Page<ListingWithAgent>, RepositoryError> {
        let rows: Vec<ListingWithAgentRow> = search_query(filter, sort, page)
            .build_query_as()
            .fetch_all(self.pool())
            .await?;
        let count: i64 = search_count_query(filter)
            .build_query_scalar()
            .fetch_one(self.pool())
            .await?;
        Ok(Page::new(convert_all(rows)?, total(count)))
    }

    async fn update_listing(
        &self,
        id: ListingId,
        agent: UserId,
        patch: &ListingPatch,
    ) -> Result<Option<Listing>, RepositoryError> {
        let row: Option<ListingRow> = sqlx::query_as(&format!(
            "UPDATE properties AS p SET \
               title = COALESCE($3, title), \
               description = COALESCE($4, description), \
               property_type = COALESCE($5, property_type), \
               purpose = COALESCE($6, purpose), \
               price = COALESCE($7, price), \
               location = COALESCE($8, location), \
               address = COALESCE($9, address), \
               bedrooms = COALESCE($10, bedrooms), \
               bathrooms = COALESCE($11, bathrooms), \
               area = COALESCE($12, area), \
               features = COALESCE($13, features), \
               images = COALESCE($14, images), \
               status = COALESCE($15, status), \
               updated_at = NOW() \
             WHERE p.id = $1 AND p.agent_id = $2 RETURNING {LISTING_COLUMNS}"
        ))
        .bind(id.0)
        .bind(agent.0)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.listing_type.map(|value| value.label()))
        .bind(patch.purpose.map(|value| value.label()))
        .bind(patch.price)
        .bind(&patch.location)
        .bind(&patch.address)
        .bind(patch.bedrooms)
        .bind(patch.bathrooms)
        .bind(patch.area)
        .bind(&patch.features)
        .bind(&patch.images)
        .bind(patch.status.map(|value| value.label()))
        .fetch_optional(self.pool())
        .await?;
        row.map(Listing::try_from).transpose()
    }

    async fn delete_listing(&self, id: ListingId, agent: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1 AND agent_id = $2")
            .bind(id.0)
            .bind(agent.0)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn agent_listings(
        &self,
        agent: UserId,
        status: Option<ListingStatus>,
        page: PageRequest,
    ) -> Result<Page<Listing>, RepositoryError> {
        let mut query = agent_listings_query(agent, status, LISTING_COLUMNS);
        query.push(" ORDER BY p.created_at DESC, p.id DESC");
        push_page(&mut query, page);
        let rows: Vec<ListingRow> = query.build_query_as().fetch_all(self.pool()).await?;
        let count: i64 = agent_listings_query(agent, status, "COUNT(*)")
            .build_query_scalar()
            .fetch_one(self.pool())
            .await?;
        Ok(Page::new(convert_all(rows)?, total(count)))
    }

    async fn keyword_search(
        &self,
        needle: &str,
        limit: u32,
    ) -> Result<Vec<ListingWithAgent>, RepositoryError> {
        let rows: Vec<ListingWithAgentRow> = sqlx::query_as(&format!(
            "SELECT {LISTING_COLUMNS}, {AGENT_CONTACT_COLUMNS} FROM properties p \
             LEFT JOIN users u ON u.id = p.agent_id \
             WHERE p.status = 'active' AND (p.title ILIKE $1 OR p.description ILIKE $1 \
               OR p.location ILIKE $1 OR p.address ILIKE $1 OR p.property_type ILIKE $1) \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $2"
        ))
        .bind(like_pattern(needle))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await?;
        convert_all(rows)
    }

    async fn agent_listing_stats(
        &self,
        agent: UserId,
    ) -> Result<AgentListingStats, RepositoryError> {
        let row: StatsRow = sqlx::query_as(
            "SELECT COUNT(*) AS total_properties, \
               COUNT(*) FILTER (WHERE status = 'active') AS active_properties, \
               COUNT(*) FILTER (WHERE status = 'sold') AS sold_properties, \
               COALESCE(SUM(views), 0)::BIGINT AS total_views \
             FROM properties WHERE agent_id = $1",
        )
        .bind(agent.0)
        .fetch_one(self.pool())
        .await?;
        Ok(AgentListingStats {
            total_properties: row.total_properties,
            active_properties: row.active_properties,
            sold_properties: row.sold_properties,
            total_views: row.total_views,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::domain::{ListingType, Purpose, SortKey, SortOrder};

    #[test]
    fn search_binds_every_filter_in_order() {
        let filter = ListingFilter {
            listing_type: Some(ListingType::House),
            purpose: Some(Purpose::Buy),
            min_price: Some(100_000.0),
            location: Some("lake".to_string()),
            bedrooms: Some(3),
            ..ListingFilter::default()
        };
        let sort = ListingSort {
            key: SortKey::Price,
            order: SortOrder::Asc,
        };
        let query = search_query(&filter, sort, PageRequest::new(2, 20));
        let sql = query.sql();
        assert!(sql.contains(
            "WHERE p.status = 'active' AND p.property_type = $1 AND p.purpose = $2 \
             AND p.price >= $3 AND (p.location ILIKE $4 OR p.address ILIKE $5) \
             AND p.bedrooms >= $6"
        ));
        assert!(sql.ends_with("ORDER BY p.price ASC, p.id DESC LIMIT $7 OFFSET $8"));
    }

    #[test]
    fn count_query_shares_the_predicate() {
        let filter = ListingFilter {
            max_price: Some(2_000.0),
            bathrooms: Some(2),
            ..ListingFilter::default()
        };
        let query = search_count_query(&filter);
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM properties p WHERE p.status = 'active' \
             AND p.price <= $1 AND p.bathrooms >= $2"
        );
    }

    #[test]
    fn default_sort_is_newest_first() {
        let query = search_query(
            &ListingFilter::default(),
            ListingSort::default(),
            PageRequest::default(),
        );
        assert!(query.sql().ends_with(
            "WHERE p.status = 'active' ORDER BY p.created_at DESC, p.id DESC LIMIT $1 OFFSET $2"
        ));
    }

    #[test]
    fn agent_listing_status_is_optional() {
        let query = agent_listings_query(UserId(4), Some(ListingStatus::Sold), "COUNT(*)");
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM properties p WHERE p.agent_id = $1 AND p.status = $2"
        );
    }
}
