use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::accounts::domain::{
    AgentProfile, AgentSummary, NewUser, ProfileUpdate, ResetTicket, Role, User, UserCredentials,
    UserId,
};
use crate::accounts::repository::UserRepository;
use crate::favorites::domain::{
    Favorite, FavoriteExportRow, FavoriteId, FavoriteStats, FavoriteTotals, LocationCount,
    RecentFavorite,
};
use crate::favorites::repository::FavoriteRepository;
use crate::inquiries::domain::{
    Inquiry, InquiryContext, InquiryDetail, InquiryFilter, InquiryId, InquiryStatus, NewInquiry,
    StatusChange, Viewer,
};
use crate::inquiries::repository::InquiryRepository;
use crate::listings::domain::{
    contains_ignore_case, AgentContact, AgentListingStats, Listing, ListingFilter, ListingId,
    ListingPatch, ListingSort, ListingStatus, ListingSummary, ListingType, ListingWithAgent,
    NewListing,
};
use crate::listings::repository::ListingRepository;
use crate::pagination::{Page, PageRequest};

const RECENT_AGENT_LISTINGS: usize = 5;
const TOP_LOCATIONS: usize = 5;
const RECENT_FAVORITES: usize = 5;

/// Process-local store implementing every repository trait. Relationships follow the
/// same cascade rules as the Postgres schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sequence: i64,
    users: BTreeMap<UserId, StoredUser>,
    listings: BTreeMap<ListingId, Listing>,
    favorites: BTreeMap<(UserId, ListingId), StoredFavorite>,
    inquiries: BTreeMap<InquiryId, Inquiry>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
    reset: Option<ResetTicket>,
}

#[derive(Debug, Clone)]
struct StoredFavorite {
    id: FavoriteId,
    user: UserId,
    property: ListingId,
    created_at: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn agent_contact(&self, agent: UserId) -> AgentContact {
        self.users
            .get(&agent)
            .map(|stored| AgentContact {
                agent_name: Some(stored.user.name.clone()),
                agent_phone: stored.user.phone.clone(),
                agent_email: Some(stored.user.email.clone()),
            })
            .unwrap_or_default()
    }

    fn with_agent(&self, listing: &Listing) -> ListingWithAgent {
        ListingWithAgent {
            listing: listing.clone(),
            agent: self.agent_contact(listing.agent_id),
        }
    }

    fn favorite(&self, stored: &StoredFavorite) -> Option<Favorite> {
        let listing = self.listings.get(&stored.property)?;
        Some(Favorite {
            favorite_id: stored.id,
            favorited_at: stored.created_at,
            property: self.with_agent(listing),
        })
    }

    /// Favorites of one user, newest bookmark first.
    fn favorites_of(&self, user: UserId) -> Vec<Favorite> {
        let mut owned: Vec<&StoredFavorite> = self
            .favorites
            .values()
            .filter(|favorite| favorite.user == user)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        owned
            .into_iter()
            .filter_map(|stored| self.favorite(stored))
            .collect()
    }

    fn listing_agent(&self, inquiry: &Inquiry) -> Option<UserId> {
        inquiry
            .property_id
            .and_then(|id| self.listings.get(&id))
            .map(|listing| listing.agent_id)
    }

    fn inquiry_detail(&self, inquiry: &Inquiry) -> InquiryDetail {
        let listing = inquiry.property_id.and_then(|id| self.listings.get(&id));
        let context = match listing {
            Some(listing) => {
                let agent = self.agent_contact(listing.agent_id);
                InquiryContext {
                    property_title: Some(listing.title.clone()),
                    property_price: Some(listing.price),
                    property_location: Some(listing.location.clone()),
                    property_images: Some(listing.images.clone()),
                    agent_name: agent.agent_name,
                    agent_email: agent.agent_email,
                    agent_phone: agent.agent_phone,
                    agent_id: Some(listing.agent_id),
                }
            }
            None => InquiryContext::default(),
        };
        InquiryDetail {
            inquiry: inquiry.clone(),
            context,
        }
    }

    /// Inquiries matching `keep`, newest first, paged.
    fn inquiry_page(
        &self,
        page: PageRequest,
        keep: impl Fn(&Inquiry) -> bool,
    ) -> Page<InquiryDetail> {
        let mut matching: Vec<&Inquiry> = self.inquiries.values().filter(|i| keep(i)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let details: Vec<InquiryDetail> = matching
            .into_iter()
            .map(|inquiry| self.inquiry_detail(inquiry))
            .collect();
        Page::new(page.slice(&details), details.len() as u64)
    }

    fn active_listing_count(&self, agent: UserId) -> i64 {
        self.listings
            .values()
            .filter(|listing| listing.agent_id == agent && listing.status == ListingStatus::Active)
            .count() as i64
    }

    fn agent_summary(&self, user: &User, total_properties: i64) -> AgentSummary {
        AgentSummary {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            avatar: user.avatar.clone(),
            bio: user.bio.clone(),
            location: user.location.clone(),
            created_at: user.created_at,
            total_properties,
        }
    }

    fn remove_listing(&mut self, id: ListingId) {
        self.listings.remove(&id);
        self.favorites.retain(|&(_, property), _| property != id);
        for inquiry in self.inquiries.values_mut() {
            if inquiry.property_id == Some(id) {
                inquiry.property_id = None;
            }
        }
    }
}

fn newest_first(a: &Listing, b: &Listing) -> std::cmp::Ordering {
    ListingSort::default().compare(a, b)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        if state
            .users
            .values()
            .any(|stored| stored.user.email == user.email)
        {
            return Err(RepositoryError::Conflict);
        }
        let id = UserId(state.next_id());
        let record = User {
            id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            avatar: None,
            bio: None,
            location: None,
            created_at: Utc::now(),
            updated_at: None,
            last_login: None,
        };
        state.users.insert(
            id,
            StoredUser {
                user: record.clone(),
                password_hash: user.password_hash,
                reset: None,
            },
        );
        Ok(record)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .users
            .values()
            .find(|stored| stored.user.email == email)
            .map(|stored| UserCredentials {
                user: stored.user.clone(),
                password_hash: stored.password_hash.clone(),
            }))
    }

    async fn credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.users.get(&id).map(|stored| UserCredentials {
            user: stored.user.clone(),
            password_hash: stored.password_hash.clone(),
        }))
    }

    async fn record_login(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let stored = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        stored.user.last_login = Some(Utc::now());
        Ok(())
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut state = self.lock()?;
        Ok(state.users.get_mut(&id).map(|stored| {
            update.apply(&mut stored.user);
            stored.user.updated_at = Some(Utc::now());
            stored.user.clone()
        }))
    }

    async fn set_password(&self, id: UserId, password_hash: &str) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        Ok(match state.users.get_mut(&id) {
            Some(stored) => {
                stored.password_hash = password_hash.to_string();
                stored.user.updated_at = Some(Utc::now());
                true
            }
            None => false,
        })
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<ListingId> = state
            .listings
            .values()
            .filter(|listing| listing.agent_id == id)
            .map(|listing| listing.id)
            .collect();
        for listing in owned {
            state.remove_listing(listing);
        }
        state.favorites.retain(|&(user, _), _| user != id);
        for inquiry in state.inquiries.values_mut() {
            if inquiry.user_id == Some(id) {
                inquiry.user_id = None;
            }
        }
        Ok(true)
    }

    async fn store_reset_ticket(
        &self,
        id: UserId,
        ticket: &ResetTicket,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let stored = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        stored.reset = Some(ticket.clone());
        Ok(())
    }

    async fn user_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .users
            .values()
            .find(|stored| {
                stored
                    .reset
                    .as_ref()
                    .is_some_and(|ticket| ticket.token == token && ticket.expires_at > now)
            })
            .map(|stored| stored.user.clone()))
    }

    async fn complete_reset(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let stored = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        stored.password_hash = password_hash.to_string();
        stored.reset = None;
        stored.user.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn agents(
        &self,
        location: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AgentSummary>, RepositoryError> {
        let state = self.lock()?;
        let mut agents: Vec<AgentSummary> = state
            .users
            .values()
            .map(|stored| &stored.user)
            .filter(|user| user.role == Role::Agent)
            .filter(|user| {
                location.map_or(true, |needle| {
                    user.location
                        .as_deref()
                        .is_some_and(|haystack| contains_ignore_case(haystack, needle))
                })
            })
            .map(|user| state.agent_summary(user, state.active_listing_count(user.id)))
            .collect();
        agents.sort_by(|a, b| {
            b.total_properties
                .cmp(&a.total_properties)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(Page::new(page.slice(&agents), agents.len() as u64))
    }

    async fn agent_profile(&self, id: UserId) -> Result<Option<AgentProfile>, RepositoryError> {
        let state = self.lock()?;
        let Some(user) = state
            .users
            .get(&id)
            .map(|stored| &stored.user)
            .filter(|user| user.role == Role::Agent)
        else {
            return Ok(None);
        };
        let mut owned: Vec<&Listing> = state
            .listings
            .values()
            .filter(|listing| listing.agent_id == id)
            .collect();
        let total = owned.len() as i64;
        owned.retain(|listing| listing.status == ListingStatus::Active);
        owned.sort_by(|a, b| newest_first(a, b));
        Ok(Some(AgentProfile {
            agent: state.agent_summary(user, total),
            active_properties: owned.len() as i64,
            recent_properties: owned
                .into_iter()
                .take(RECENT_AGENT_LISTINGS)
                .map(ListingSummary::from)
                .collect(),
        }))
    }
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn insert_listing(
        &self,
        agent: UserId,
        listing: NewListing,
    ) -> Result<Listing, RepositoryError> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&agent) {
            return Err(RepositoryError::NotFound);
        }
        let now = Utc::now();
        let record = Listing {
            id: ListingId(state.next_id()),
            title: listing.title,
            description: listing.description,
            listing_type: listing.listing_type,
            purpose: listing.purpose,
            price: listing.price,
            location: listing.location,
            address: listing.address,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            area: listing.area,
            features: listing.features,
            images: listing.images,
            status: ListingStatus::Active,
            views: 0,
            agent_id: agent,
            created_at: now,
            updated_at: now,
        };
        state.listings.insert(record.id, record.clone());
        Ok(record)
    }

    async fn listing(&self, id: ListingId) -> Result<Option<ListingWithAgent>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.listings.get(&id).map(|listing| state.with_agent(listing)))
    }

    async fn record_view(&self, id: ListingId) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if let Some(listing) = state.listings.get_mut(&id) {
            listing.views += 1;
        }
        Ok(())
    }

    async fn search_listings(
        &self,
        filter: &ListingFilter,
        sort: ListingSort,
        page: PageRequest,
    ) -> Result<Page<ListingWithAgent>, RepositoryError> {
        let state = self.lock()?;
        let mut matching: Vec<&Listing> = state
            .listings
            .values()
            .filter(|listing| listing.status == ListingStatus::Active && filter.matches(listing))
            .collect();
        matching.sort_by(|a, b| sort.compare(a, b));
        let total = matching.len() as u64;
        let window = page.slice(&matching);
        Ok(Page::new(
            window
                .into_iter()
                .map(|listing| state.with_agent(listing))
                .collect(),
            total,
        ))
    }

    async fn update_listing(
        &self,
        id: ListingId,
        agent: UserId,
        patch: &ListingPatch,
    ) -> Result<Option<Listing>, RepositoryError> {
        let mut state = self.lock()?;
        Ok(state
            .listings
            .get_mut(&id)
            .filter(|listing| listing.agent_id == agent)
            .map(|listing| {
                patch.apply(listing);
                listing.updated_at = Utc::now();
                listing.clone()
            }))
    }

    async fn delete_listing(&self, id: ListingId, agent: UserId) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let owned = state
            .listings
            .get(&id)
            .is_some_and(|listing| listing.agent_id == agent);
        if owned {
            state.remove_listing(id);
        }
        Ok(owned)
    }

    async fn agent_listings(
        &self,
        agent: UserId,
        status: Option<ListingStatus>,
        page: PageRequest,
    ) -> Result<Page<Listing>, RepositoryError> {
        let state = self.lock()?;
        let mut owned: Vec<Listing> = state
            .listings
            .values()
            .filter(|listing| listing.agent_id == agent)
            .filter(|listing| status.map_or(true, |wanted| listing.status == wanted))
            .cloned()
            .collect();
        owned.sort_by(newest_first);
        Ok(Page::new(page.slice(&owned), owned.len() as u64))
    }

    async fn keyword_search(
        &self,
        needle: &str,
        limit: u32,
    ) -> Result<Vec<ListingWithAgent>, RepositoryError> {
        let state = self.lock()?;
        let mut matching: Vec<&Listing> = state
            .listings
            .values()
            .filter(|listing| listing.status == ListingStatus::Active)
            .filter(|listing| {
                [
                    Some(listing.title.as_str()),
                    listing.description.as_deref(),
                    Some(listing.location.as_str()),
                    listing.address.as_deref(),
                    Some(listing.listing_type.label()),
                ]
                .into_iter()
                .flatten()
                .any(|haystack| contains_ignore_case(haystack, needle))
            })
            .collect();
        matching.sort_by(|a, b| newest_first(a, b));
        Ok(matching
            .into_iter()
            .take(limit as usize)
            .map(|listing| state.with_agent(listing))
            .collect())
    }

    async fn agent_listing_stats(
        &self,
        agent: UserId,
    ) -> Result<AgentListingStats, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .listings
            .values()
            .filter(|listing| listing.agent_id == agent)
            .fold(AgentListingStats::default(), |mut stats, listing| {
                stats.total_properties += 1;
                stats.total_views += listing.views;
                match listing.status {
                    ListingStatus::Active => stats.active_properties += 1,
                    ListingStatus::Sold => stats.sold_properties += 1,
                    _ => {}
                }
                stats
            }))
    }
}

#[async_trait]
impl FavoriteRepository for MemoryStore {
    async fn favorites(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<Favorite>, RepositoryError> {
        let state = self.lock()?;
        let all = state.favorites_of(user);
        Ok(Page::new(page.slice(&all), all.len() as u64))
    }

    async fn add_favorite(
        &self,
        user: UserId,
        property: ListingId,
    ) -> Result<Favorite, RepositoryError> {
        let mut state = self.lock()?;
        if !state.listings.contains_key(&property) || !state.users.contains_key(&user) {
            return Err(RepositoryError::NotFound);
        }
        if state.favorites.contains_key(&(user, property)) {
            return Err(RepositoryError::Conflict);
        }
        let stored = StoredFavorite {
            id: FavoriteId(state.next_id()),
            user,
            property,
            created_at: Utc::now(),
        };
        state.favorites.insert((user, property), stored.clone());
        state.favorite(&stored).ok_or(RepositoryError::NotFound)
    }

    async fn remove_favorite(
        &self,
        user: UserId,
        property: ListingId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        Ok(state.favorites.remove(&(user, property)).is_some())
    }

    async fn favorite_id(
        &self,
        user: UserId,
        property: ListingId,
    ) -> Result<Option<FavoriteId>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .favorites
            .get(&(user, property))
            .map(|favorite| favorite.id))
    }

    async fn favorited_among(
        &self,
        user: UserId,
        candidates: &[ListingId],
    ) -> Result<Vec<ListingId>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .favorites
            .range((user, ListingId(i64::MIN))..=(user, ListingId(i64::MAX)))
            .map(|(&(_, property), _)| property)
            .filter(|property| candidates.contains(property))
            .collect())
    }

    async fn favorite_stats(&self, user: UserId) -> Result<FavoriteStats, RepositoryError> {
        let state = self.lock()?;
        let favorites = state.favorites_of(user);
        let listings: Vec<&Listing> = favorites
            .iter()
            .map(|favorite| &favorite.property.listing)
            .collect();

        let count_of = |kind: ListingType| {
            listings
                .iter()
                .filter(|listing| listing.listing_type == kind)
                .count() as i64
        };
        let prices: Vec<f64> = listings.iter().map(|listing| listing.price).collect();
        let mut totals = FavoriteTotals {
            total_favorites: listings.len() as i64,
            house_favorites: count_of(ListingType::House),
            apartment_favorites: count_of(ListingType::Apartment),
            land_favorites: count_of(ListingType::Land),
            commercial_favorites: count_of(ListingType::Commercial),
            ..FavoriteTotals::default()
        };
        if !prices.is_empty() {
            totals.avg_price_favorited = prices.iter().sum::<f64>() / prices.len() as f64;
            totals.min_price_favorited = prices.iter().copied().fold(f64::INFINITY, f64::min);
            totals.max_price_favorited = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        }

        let mut by_location: BTreeMap<&str, i64> = BTreeMap::new();
        for listing in &listings {
            *by_location.entry(listing.location.as_str()).or_default() += 1;
        }
        let mut top_locations: Vec<LocationCount> = by_location
            .into_iter()
            .map(|(location, count)| LocationCount {
                location: location.to_string(),
                count,
            })
            .collect();
        top_locations.sort_by(|a, b| b.count.cmp(&a.count).then(a.location.cmp(&b.location)));
        top_locations.truncate(TOP_LOCATIONS);

        let recent_favorites = favorites
            .iter()
            .take(RECENT_FAVORITES)
            .map(|favorite| RecentFavorite {
                title: favorite.property.listing.title.clone(),
                price: favorite.property.listing.price,
                location: favorite.property.listing.location.clone(),
                created_at: favorite.favorited_at,
            })
            .collect();

        Ok(FavoriteStats {
            stats: totals,
            top_locations,
            recent_favorites,
        })
    }

    async fn clear_favorites(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut state = self.lock()?;
        let before = state.favorites.len();
        state.favorites.retain(|&(owner, _), _| owner != user);
        Ok((before - state.favorites.len()) as u64)
    }

    async fn export_favorites(
        &self,
        user: UserId,
    ) -> Result<Vec<FavoriteExportRow>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .favorites_of(user)
            .iter()
            .map(FavoriteExportRow::from)
            .collect())
    }

    async fn favorite_count(&self, user: UserId) -> Result<i64, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .favorites
            .keys()
            .filter(|&&(owner, _)| owner == user)
            .count() as i64)
    }
}

#[async_trait]
impl InquiryRepository for MemoryStore {
    async fn insert_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, RepositoryError> {
        let mut state = self.lock()?;
        if let Some(property) = inquiry.property_id {
            if !state.listings.contains_key(&property) {
                return Err(RepositoryError::NotFound);
            }
        }
        let record = Inquiry {
            id: InquiryId(state.next_id()),
            name: inquiry.name,
            email: inquiry.email,
            phone: inquiry.phone,
            subject: inquiry.subject,
            message: inquiry.message,
            property_id: inquiry.property_id,
            inquiry_type: inquiry.inquiry_type,
            user_id: inquiry.user_id,
            status: InquiryStatus::New,
            response: None,
            responded_at: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        state.inquiries.insert(record.id, record.clone());
        Ok(record)
    }

    async fn inquiry(&self, id: InquiryId) -> Result<Option<InquiryDetail>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .inquiries
            .get(&id)
            .map(|inquiry| state.inquiry_detail(inquiry)))
    }

    async fn user_inquiries(
        &self,
        user: UserId,
        filter: InquiryFilter,
        page: PageRequest,
    ) -> Result<Page<InquiryDetail>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.inquiry_page(page, |inquiry| {
            inquiry.user_id == Some(user) && filter.matches(inquiry)
        }))
    }

    async fn agent_inquiries(
        &self,
        agent: UserId,
        filter: InquiryFilter,
        page: PageRequest,
    ) -> Result<Page<InquiryDetail>, RepositoryError> {
        let state = self.lock()?;
        let viewer = Viewer {
            user_id: agent,
            role: Role::Agent,
        };
        Ok(state.inquiry_page(page, |inquiry| {
            viewer.in_agent_inbox(inquiry, state.listing_agent(inquiry)) && filter.matches(inquiry)
        }))
    }

    async fn update_inquiry_status(
        &self,
        id: InquiryId,
        change: &StatusChange,
    ) -> Result<Option<Inquiry>, RepositoryError> {
        let mut state = self.lock()?;
        Ok(state.inquiries.get_mut(&id).map(|inquiry| {
            change.apply(inquiry, Utc::now());
            inquiry.clone()
        }))
    }

    async fn delete_inquiry(&self, id: InquiryId) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        Ok(state.inquiries.remove(&id).is_some())
    }

    async fn recent_agent_inquiries(
        &self,
        agent: UserId,
        limit: u32,
    ) -> Result<Vec<InquiryDetail>, RepositoryError> {
        let state = self.lock()?;
        let page = PageRequest::new(1, limit);
        Ok(state
            .inquiry_page(page, |inquiry| state.listing_agent(inquiry) == Some(agent))
            .items)
    }

    async fn open_inquiry_count(&self, user: UserId) -> Result<i64, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .inquiries
            .values()
            .filter(|inquiry| {
                inquiry.user_id == Some(user) && inquiry.status != InquiryStatus::Closed
            })
            .count() as i64)
    }
}
