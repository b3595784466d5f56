use std::str::FromStr;
use std::sync::Arc;

use super::domain::{
    Listing, ListingDraft, ListingFilter, ListingId, ListingPatch, ListingSort, ListingStatus,
    ListingType, ListingUpdate, ListingWithAgent, NewListing, Purpose,
};
use crate::accounts::session::Session;
use crate::error::{ApiError, FieldError};
use crate::pagination::{Page, PageRequest};
use crate::params::trimmed;
use crate::storage::Store;

/// Upper bound on keyword search results.
pub const KEYWORD_SEARCH_LIMIT: u32 = 20;

const NOT_OWNED: &str = "Property not found or unauthorized";

/// Public browsing plus agent-side listing management.
pub struct ListingService<S> {
    store: Arc<S>,
}

impl<S> ListingService<S>
where
    S: Store,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn search(
        &self,
        filter: &ListingFilter,
        sort: ListingSort,
        page: PageRequest,
    ) -> Result<Page<ListingWithAgent>, ApiError> {
        Ok(self.store.search_listings(filter, sort, page).await?)
    }

    /// Reads a listing in any status and counts the view.
    pub async fn view(&self, id: ListingId) -> Result<ListingWithAgent, ApiError> {
        let listing = self
            .store
            .listing(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Property not found"))?;
        self.store.record_view(id).await?;
        Ok(listing)
    }

    pub async fn create(
        &self,
        session: &Session,
        draft: ListingDraft,
    ) -> Result<Listing, ApiError> {
        session.require_agent("Only agents can create properties")?;
        let listing = validate_draft(draft).map_err(ApiError::Validation)?;
        let listing = self.store.insert_listing(session.user_id, listing).await?;
        tracing::info!(
            listing_id = %listing.id,
            agent_id = %session.user_id,
            "listing created"
        );
        Ok(listing)
    }

    pub async fn update(
        &self,
        session: &Session,
        id: ListingId,
        update: ListingUpdate,
    ) -> Result<Listing, ApiError> {
        let patch = validate_update(update).map_err(ApiError::Validation)?;
        self.store
            .update_listing(id, session.user_id, &patch)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_OWNED))
    }

    pub async fn delete(&self, session: &Session, id: ListingId) -> Result<(), ApiError> {
        if !self.store.delete_listing(id, session.user_id).await? {
            return Err(ApiError::not_found(NOT_OWNED));
        }
        tracing::info!(listing_id = %id, agent_id = %session.user_id, "listing deleted");
        Ok(())
    }

    pub async fn agent_listings(
        &self,
        session: &Session,
        status: Option<ListingStatus>,
        page: PageRequest,
    ) -> Result<Page<Listing>, ApiError> {
        session.require_agent("Only agents can access this endpoint")?;
        Ok(self
            .store
            .agent_listings(session.user_id, status, page)
            .await?)
    }

    pub async fn keyword_search(
        &self,
        query: Option<String>,
    ) -> Result<Vec<ListingWithAgent>, ApiError> {
        let query =
            trimmed(query).ok_or_else(|| ApiError::bad_request("Search query is required"))?;
        Ok(self
            .store
            .keyword_search(&query, KEYWORD_SEARCH_LIMIT)
            .await?)
    }
}

/// Parses an enum label; a missing value is only an error when `required`.
fn parse_label<T: FromStr>(
    raw: Option<String>,
    required: bool,
    path: &'static str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match trimmed(raw).map(|raw| raw.parse::<T>()) {
        Some(Ok(value)) => Some(value),
        None if !required => None,
        _ => {
            errors.push(FieldError::body(path, message));
            None
        }
    }
}

const TYPE_MESSAGE: &str = "Type must be one of: house, apartment, land, commercial";
const PURPOSE_MESSAGE: &str = "Purpose must be buy or rent";
const STATUS_MESSAGE: &str = "Status must be one of: active, pending, sold, rented, inactive";

fn check_measurements(
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
    area: Option<f64>,
    errors: &mut Vec<FieldError>,
) {
    if bedrooms.is_some_and(|value| value < 0) {
        errors.push(FieldError::body("bedrooms", "Bedrooms cannot be negative"));
    }
    if bathrooms.is_some_and(|value| value < 0) {
        errors.push(FieldError::body("bathrooms", "Bathrooms cannot be negative"));
    }
    if area.is_some_and(|value| value < 0.0) {
        errors.push(FieldError::body("area", "Area cannot be negative"));
    }
}

pub fn validate_draft(draft: ListingDraft) -> Result<NewListing, Vec<FieldError>> {
    let mut errors = Vec::new();

    let title = trimmed(draft.title);
    if title.is_none() {
        errors.push(FieldError::body("title", "Title is required"));
    }
    let price = draft.price.filter(|price| price.is_finite() && *price > 0.0);
    if price.is_none() {
        errors.push(FieldError::body("price", "Price must be greater than 0"));
    }
    let listing_type: Option<ListingType> =
        parse_label(draft.listing_type, true, "type", TYPE_MESSAGE, &mut errors);
    let purpose: Option<Purpose> =
        parse_label(draft.purpose, true, "purpose", PURPOSE_MESSAGE, &mut errors);
    let location = trimmed(draft.location);
    if location.is_none() {
        errors.push(FieldError::body("location", "Location is required"));
    }
    check_measurements(draft.bedrooms, draft.bathrooms, draft.area, &mut errors);

    match (title, price, listing_type, purpose, location) {
        (Some(title), Some(price), Some(listing_type), Some(purpose), Some(location))
            if errors.is_empty() =>
        {
            Ok(NewListing {
                title,
                description: trimmed(draft.description),
                listing_type,
                purpose,
                price,
                location,
                address: trimmed(draft.address),
                bedrooms: draft.bedrooms,
                bathrooms: draft.bathrooms,
                area: draft.area,
                features: draft.features.unwrap_or_default(),
                images: draft.images.unwrap_or_default(),
            })
        }
        _ => Err(errors),
    }
}

pub fn validate_update(update: ListingUpdate) -> Result<ListingPatch, Vec<FieldError>> {
    let mut errors = Vec::new();

    if update
        .price
        .is_some_and(|price| !price.is_finite() || price <= 0.0)
    {
        errors.push(FieldError::body("price", "Price must be greater than 0"));
    }
    let listing_type = parse_label(update.listing_type, false, "type", TYPE_MESSAGE, &mut errors);
    let purpose = parse_label(update.purpose, false, "purpose", PURPOSE_MESSAGE, &mut errors);
    let status = parse_label(update.status, false, "status", STATUS_MESSAGE, &mut errors);
    check_measurements(update.bedrooms, update.bathrooms, update.area, &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(ListingPatch {
        title: trimmed(update.title),
        description: trimmed(update.description),
        listing_type,
        purpose,
        price: update.price,
        location: trimmed(update.location),
        address: trimmed(update.address),
        bedrooms: update.bedrooms,
        bathrooms: update.bathrooms,
        area: update.area,
        features: update.features,
        images: update.images,
        status,
    })
}
