use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::domain::UserId;
use crate::params::{empty_as_none, empty_or_all_as_none};

/// Identifier wrapper for property listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub i64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = value.trim().to_ascii_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.label() == normalized)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: value.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

text_enum! {
    /// Kind of property on offer.
    ListingType, "property type" {
        House => "house",
        Apartment => "apartment",
        Land => "land",
        Commercial => "commercial",
    }
}

text_enum! {
    /// Whether the listing is for sale or for rent.
    Purpose, "purpose" {
        Buy => "buy",
        Rent => "rent",
    }
}

text_enum! {
    /// Lifecycle of a listing. Only `Active` listings appear in public search.
    ListingStatus, "listing status" {
        Active => "active",
        Pending => "pending",
        Sold => "sold",
        Rented => "rented",
        Inactive => "inactive",
    }
}

/// A property record as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub purpose: Purpose,
    pub price: f64,
    pub location: String,
    pub address: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub status: ListingStatus,
    pub views: i64,
    pub agent_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact details of the owning agent, joined onto listing reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentContact {
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    pub agent_email: Option<String>,
}

/// Listing with its agent's contact columns flattened in, as the storefront renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingWithAgent {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(flatten)]
    pub agent: AgentContact,
}

/// Compact listing card used on agent pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSummary {
    pub id: ListingId,
    pub title: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub location: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Listing> for ListingSummary {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id,
            title: listing.title.clone(),
            price: listing.price,
            listing_type: listing.listing_type,
            location: listing.location.clone(),
            images: listing.images.clone(),
            created_at: listing.created_at,
        }
    }
}

/// Payload for creating a listing. Required fields are optional here so validation can report all gaps.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListingDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, rename = "type")]
    pub listing_type: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub bathrooms: Option<i32>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

/// Validated listing ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub description: Option<String>,
    pub listing_type: ListingType,
    pub purpose: Purpose,
    pub price: f64,
    pub location: String,
    pub address: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,
    pub features: Vec<String>,
    pub images: Vec<String>,
}

/// Raw update payload from the client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListingUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, rename = "type")]
    pub listing_type: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub bathrooms: Option<i32>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Validated partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub listing_type: Option<ListingType>,
    pub purpose: Option<Purpose>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,
    pub features: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub status: Option<ListingStatus>,
}

impl ListingPatch {
    pub fn apply(&self, listing: &mut Listing) {
        if let Some(title) = &self.title {
            listing.title = title.clone();
        }
        if let Some(description) = &self.description {
            listing.description = Some(description.clone());
        }
        if let Some(listing_type) = self.listing_type {
            listing.listing_type = listing_type;
        }
        if let Some(purpose) = self.purpose {
            listing.purpose = purpose;
        }
        if let Some(price) = self.price {
            listing.price = price;
        }
        if let Some(location) = &self.location {
            listing.location = location.clone();
        }
        if let Some(address) = &self.address {
            listing.address = Some(address.clone());
        }
        if let Some(bedrooms) = self.bedrooms {
            listing.bedrooms = Some(bedrooms);
        }
        if let Some(bathrooms) = self.bathrooms {
            listing.bathrooms = Some(bathrooms);
        }
        if let Some(area) = self.area {
            listing.area = Some(area);
        }
        if let Some(features) = &self.features {
            listing.features = features.clone();
        }
        if let Some(images) = &self.images {
            listing.images = images.clone();
        }
        if let Some(status) = self.status {
            listing.status = status;
        }
    }
}

/// Public search filters. Every field is optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilter {
    #[serde(default, rename = "type", deserialize_with = "empty_or_all_as_none")]
    pub listing_type: Option<ListingType>,
    #[serde(default, deserialize_with = "empty_or_all_as_none")]
    pub purpose: Option<Purpose>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub bedrooms: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub bathrooms: Option<i32>,
}

impl ListingFilter {
    /// In-memory evaluation of the same predicate the SQL query applies. Status is not checked here.
    pub fn matches(&self, listing: &Listing) -> bool {
        if self
            .listing_type
            .is_some_and(|wanted| wanted != listing.listing_type)
        {
            return false;
        }
        if self.purpose.is_some_and(|wanted| wanted != listing.purpose) {
            return false;
        }
        if self.min_price.is_some_and(|min| listing.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| listing.price > max) {
            return false;
        }
        if let Some(needle) = &self.location {
            let haystacks = [Some(listing.location.as_str()), listing.address.as_deref()];
            if !haystacks
                .into_iter()
                .flatten()
                .any(|haystack| contains_ignore_case(haystack, needle))
            {
                return false;
            }
        }
        if let Some(min) = self.bedrooms {
            if listing.bedrooms.map_or(true, |value| value < min) {
                return false;
            }
        }
        if let Some(min) = self.bathrooms {
            if listing.bathrooms.map_or(true, |value| value < min) {
                return false;
            }
        }
        true
    }
}

/// Case-insensitive substring test matching SQL `ILIKE '%needle%'`.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

text_enum! {
    /// Sortable listing columns.
    SortKey, "sort column" {
        CreatedAt => "created_at",
        Price => "price",
        Bedrooms => "bedrooms",
        Bathrooms => "bathrooms",
        Area => "area",
    }
}

text_enum! {
    SortOrder, "sort order" {
        Asc => "asc",
        Desc => "desc",
    }
}

impl SortOrder {
    pub const fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Resolved ordering. Unknown column or direction falls back to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Default for ListingSort {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl ListingSort {
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let key = sort_by.map(str::parse::<SortKey>);
        let order = sort_order.map(str::parse::<SortOrder>);
        match (key, order) {
            (None, None) => Self::default(),
            (Some(Ok(key)), None) => Self {
                key,
                order: SortOrder::Desc,
            },
            (None, Some(Ok(order))) => Self {
                key: SortKey::CreatedAt,
                order,
            },
            (Some(Ok(key)), Some(Ok(order))) => Self { key, order },
            _ => Self::default(),
        }
    }

    pub fn compare(&self, a: &Listing, b: &Listing) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        let ordering = match self.key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
            SortKey::Bedrooms => nulls_high(a.bedrooms, b.bedrooms),
            SortKey::Bathrooms => nulls_high(a.bathrooms, b.bathrooms),
            SortKey::Area => nulls_high(a.area, b.area),
        };
        let ordering = match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        ordering.then_with(|| b.id.cmp(&a.id))
    }
}

/// Postgres sorts NULL above every value; mirror that before the direction flip.
fn nulls_high<T: PartialOrd>(a: Option<T>, b: Option<T>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

/// Listing counters shown on an agent's dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgentListingStats {
    pub total_properties: i64,
    pub active_properties: i64,
    pub sold_properties: i64,
    pub total_views: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn listing(id: i64, price: f64, bedrooms: Option<i32>) -> Listing {
        Listing {
            id: ListingId(id),
            title: format!("Listing {id}"),
            description: None,
            listing_type: ListingType::House,
            purpose: Purpose::Buy,
            price,
            location: "Lakeside".to_string(),
            address: Some("12 Harbour Road".to_string()),
            bedrooms,
            bathrooms: Some(1),
            area: None,
            features: Vec::new(),
            images: Vec::new(),
            status: ListingStatus::Active,
            views: 0,
            agent_id: UserId(1),
            created_at: Utc.with_ymd_and_hms(2025, 1, id as u32, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 1, id as u32, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("House".parse::<ListingType>(), Ok(ListingType::House));
        assert_eq!("RENT".parse::<Purpose>(), Ok(Purpose::Rent));
        let err = "villa".parse::<ListingType>().expect_err("villa is not offered");
        assert_eq!(err.to_string(), "unknown property type 'villa'");
    }

    #[test]
    fn sort_falls_back_on_unknown_values() {
        assert_eq!(
            ListingSort::from_params(Some("price"), Some("ASC")),
            ListingSort {
                key: SortKey::Price,
                order: SortOrder::Asc
            }
        );
        assert_eq!(
            ListingSort::from_params(Some("title"), Some("asc")),
            ListingSort::default()
        );
        assert_eq!(
            ListingSort::from_params(Some("area"), Some("sideways")),
            ListingSort::default()
        );
    }

    #[test]
    fn filter_matches_location_against_address() {
        let filter = ListingFilter {
            location: Some("harbour".to_string()),
            ..ListingFilter::default()
        };
        assert!(filter.matches(&listing(1, 100.0, Some(2))));

        let filter = ListingFilter {
            location: Some("uptown".to_string()),
            ..ListingFilter::default()
        };
        assert!(!filter.matches(&listing(1, 100.0, Some(2))));
    }

    #[test]
    fn filter_uses_minimums_and_price_bounds() {
        let filter = ListingFilter {
            min_price: Some(150.0),
            max_price: Some(300.0),
            bedrooms: Some(2),
            ..ListingFilter::default()
        };
        assert!(filter.matches(&listing(1, 200.0, Some(3))));
        assert!(!filter.matches(&listing(2, 120.0, Some(3))));
        assert!(!filter.matches(&listing(3, 200.0, Some(1))));
        assert!(!filter.matches(&listing(4, 200.0, None)));
    }

    #[test]
    fn price_sort_orders_both_directions() {
        let cheap = listing(1, 100.0, None);
        let pricey = listing(2, 900.0, None);
        let asc = ListingSort {
            key: SortKey::Price,
            order: SortOrder::Asc,
        };
        assert_eq!(asc.compare(&cheap, &pricey), std::cmp::Ordering::Less);
        let desc = ListingSort {
            key: SortKey::Price,
            order: SortOrder::Desc,
        };
        assert_eq!(desc.compare(&cheap, &pricey), std::cmp::Ordering::Greater);
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let mut stored = listing(1, 100.0, Some(2));
        ListingPatch {
            price: Some(150.0),
            status: Some(ListingStatus::Sold),
            ..ListingPatch::default()
        }
        .apply(&mut stored);
        assert_eq!(stored.price, 150.0);
        assert_eq!(stored.status, ListingStatus::Sold);
        assert_eq!(stored.bedrooms, Some(2));
        assert_eq!(stored.title, "Listing 1");
    }
}
