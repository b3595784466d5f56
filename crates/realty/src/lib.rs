//! Backend for the realty storefront: accounts, listings, favorites, and contact inquiries.

pub mod accounts;
pub mod config;
pub mod error;
pub mod extract;
pub mod favorites;
pub mod inquiries;
pub mod listings;
pub mod pagination;
pub mod params;
pub mod routes;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use axum::{Extension, Router};

use crate::accounts::{account_router, AccountService, ResetMailer, TokenAuthority};
use crate::config::AuthConfig;
use crate::favorites::{favorite_router, FavoriteService};
use crate::inquiries::{inquiry_router, InquiryService};
use crate::listings::{listing_router, ListingService};
use crate::storage::Store;

/// Every `/api` route over one store. Session extraction reads the token authority
/// installed here as a request extension.
pub fn api_router<S, M>(store: Arc<S>, mailer: Arc<M>, auth: &AuthConfig) -> Router
where
    S: Store,
    M: ResetMailer + 'static,
{
    let tokens = Arc::new(TokenAuthority::from_config(auth));
    let accounts = AccountService::new(Arc::clone(&store), mailer, Arc::clone(&tokens), auth);
    let listings = ListingService::new(Arc::clone(&store));
    let favorites = FavoriteService::new(Arc::clone(&store));
    let inquiries = InquiryService::new(store);

    Router::new()
        .merge(routes::health_router())
        .merge(account_router(Arc::new(accounts)))
        .merge(listing_router(Arc::new(listings)))
        .merge(favorite_router(Arc::new(favorites)))
        .merge(inquiry_router(Arc::new(inquiries)))
        .layer(Extension(tokens))
}
