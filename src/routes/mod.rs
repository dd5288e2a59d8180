// Route exports
pub mod matching;
pub mod recommendations;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::core::MatchEngine;
use crate::models::{ErrorResponse, Listing, PreferenceVector};
use crate::services::{AppwriteClient, AppwriteError, CacheKey, CacheManager, RecommendationStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub appwrite: Arc<AppwriteClient>,
    pub cache: Arc<CacheManager>,
    pub store: Arc<RecommendationStore>,
    pub engine: MatchEngine,
    /// Size of the listing pool fetched per similarity request
    pub candidate_fetch_limit: usize,
}

impl AppState {
    /// Tenant preferences, served from cache when possible
    pub async fn load_preferences(&self, user_id: &str) -> Result<PreferenceVector, AppwriteError> {
        let key = CacheKey::preferences(user_id);
        if let Some(preferences) = self.cache.get_opt(&key).await {
            return Ok(preferences);
        }

        let preferences = self.appwrite.get_preferences(user_id).await?;
        if let Err(e) = self.cache.set(&key, &preferences).await {
            tracing::warn!("Failed to cache preferences for {}: {}", user_id, e);
        }
        Ok(preferences)
    }

    /// Listing snapshot, served from cache when possible
    pub async fn load_listing(&self, listing_id: &str) -> Result<Listing, AppwriteError> {
        let key = CacheKey::listing(listing_id);
        if let Some(listing) = self.cache.get_opt(&key).await {
            return Ok(listing);
        }

        let listing = self.appwrite.get_listing(listing_id).await?;
        if let Err(e) = self.cache.set(&key, &listing).await {
            tracing::warn!("Failed to cache listing {}: {}", listing_id, e);
        }
        Ok(listing)
    }
}

pub(crate) fn error_response(status_code: u16, error: &str, message: String) -> HttpResponse {
    let status = actix_web::http::StatusCode::from_u16(status_code)
        .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);

    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code,
    })
}

/// Map a data-access failure to an HTTP response
pub(crate) fn appwrite_error_response(error: &str, err: AppwriteError) -> HttpResponse {
    match err {
        AppwriteError::NotFound(message) => error_response(404, error, message),
        other => error_response(502, error, other.to_string()),
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matching::configure)
            .configure(recommendations::configure),
    );
}
