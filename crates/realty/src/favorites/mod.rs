//! Per-user bookmarks on listings.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{Favorite, FavoriteCheck, FavoriteId, FavoriteStats};
pub use repository::FavoriteRepository;
pub use router::favorite_router;
pub use service::{BulkCheck, FavoriteExport, FavoriteService};
