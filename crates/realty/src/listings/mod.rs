//! Property listings: public search, detail views, and agent-owned management.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Listing, ListingFilter, ListingId, ListingSort, ListingStatus, ListingType, ListingWithAgent,
    Purpose,
};
pub use repository::ListingRepository;
pub use router::listing_router;
pub use service::ListingService;
