// Service exports
pub mod appwrite;
pub mod cache;
pub mod candidates;
pub mod postgres;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError, ListingQuery};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use candidates::{fetch_record_listings, AppwriteCandidates};
pub use postgres::{PostgresError, RecommendationStore};
