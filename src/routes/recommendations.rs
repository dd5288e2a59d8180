use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::RegenerationOutcome;
use crate::models::{
    AckResponse, FeedbackRequest, RecommendationRecord, RecommendationsQuery, RecommendationsResponse,
    ViewedRequest,
};
use crate::routes::{appwrite_error_response, error_response, AppState};
use crate::services::{fetch_record_listings, AppwriteCandidates, CacheKey};

/// Configure recommendation record routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/recommendations/{user_id}", web::get().to(get_recommendations))
        .route("/recommendations/{user_id}/viewed", web::post().to(mark_viewed))
        .route("/recommendations/{user_id}/feedback", web::post().to(record_feedback))
        .route("/preferences/{user_id}/invalidate", web::post().to(invalidate_preferences));
}

/// Recommendations for a tenant
///
/// GET /api/v1/recommendations/{userId}?limit=20&refresh=false
///
/// The stored record is regenerated when stale, empty, older than the
/// configured age or when `refresh=true`. Each strategy queries its own
/// candidates. Unavailable listings are filtered out on every read against
/// the current snapshots of the listed ids.
async fn get_recommendations(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RecommendationsQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return error_response(400, "Validation failed", errors.to_string());
    }

    let user_id = path.into_inner();
    let limit = query.limit as usize;
    let now = chrono::Utc::now();

    tracing::info!("Fetching recommendations for user: {}, limit: {}", user_id, limit);

    let record = match state.store.get_record(&user_id).await {
        Ok(Some(record)) => record,
        Ok(None) => RecommendationRecord::new(user_id.clone(), now),
        Err(e) => {
            tracing::error!("Failed to load recommendation record for {}: {}", user_id, e);
            return error_response(500, "Failed to load recommendations", e.to_string());
        }
    };

    let outcome = if state.engine.regeneration_reason(&record, query.refresh, now).is_some() {
        // `now` predates the preference read, so a concurrent invalidation
        // keeps the saved record stale.
        let preferences = match state.load_preferences(&user_id).await {
            Ok(preferences) => preferences,
            Err(e) => {
                tracing::error!("Failed to fetch preferences for {}: {}", user_id, e);
                return appwrite_error_response("Failed to fetch preferences", e);
            }
        };

        let limits = state.engine.settings().limits;
        let candidates = match AppwriteCandidates::fetch(&state.appwrite, &preferences, &limits, now).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!("Failed to query candidates for {}: {}", user_id, e);
                return appwrite_error_response("Failed to query candidates", e);
            }
        };

        let outcome = state
            .engine
            .regenerate_if_stale(record, &preferences, &candidates, query.refresh, now);

        if let Err(e) = state.store.save_record(&outcome.record).await {
            // The fresh list is still served; the next read regenerates again.
            tracing::warn!("Failed to persist recommendations for {}: {}", user_id, e);
        }
        outcome
    } else {
        RegenerationOutcome { record, regenerated: false }
    };

    let current = match fetch_record_listings(&state.appwrite, &outcome.record).await {
        Ok(current) => current,
        Err(e) => {
            tracing::error!("Failed to refresh listings for {}: {}", user_id, e);
            return appwrite_error_response("Failed to query listings", e);
        }
    };

    let recommendations = state.engine.serve(&outcome.record, &current, limit);

    tracing::info!(
        "Returning {} recommendations for user {} (regenerated: {})",
        recommendations.len(),
        user_id,
        outcome.regenerated
    );

    HttpResponse::Ok().json(RecommendationsResponse {
        user_id,
        recommendations,
        algorithm_version: outcome.record.algorithm_version,
        refreshed_at: outcome.record.refreshed_at,
        regenerated: outcome.regenerated,
    })
}

/// Mark a recommended listing as viewed
///
/// POST /api/v1/recommendations/{userId}/viewed
///
/// Request body:
/// ```json
/// { "listingId": "string" }
/// ```
async fn mark_viewed(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<ViewedRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(400, "Validation failed", errors.to_string());
    }

    let user_id = path.into_inner();

    match state.store.mark_viewed(&user_id, &req.listing_id).await {
        Ok(updated) => {
            tracing::debug!("Marked {} viewed for {} (updated: {})", req.listing_id, user_id, updated);
            HttpResponse::Ok().json(AckResponse { success: true, updated })
        }
        Err(e) => {
            tracing::error!("Failed to mark {} viewed for {}: {}", req.listing_id, user_id, e);
            error_response(500, "Failed to mark viewed", e.to_string())
        }
    }
}

/// Record helpful / not helpful feedback
///
/// POST /api/v1/recommendations/{userId}/feedback
///
/// Request body:
/// ```json
/// { "helpful": true }
/// ```
async fn record_feedback(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<FeedbackRequest>,
) -> impl Responder {
    let user_id = path.into_inner();

    match state.store.record_feedback(&user_id, req.helpful).await {
        Ok(()) => HttpResponse::Ok().json(AckResponse { success: true, updated: true }),
        Err(e) => {
            tracing::error!("Failed to record feedback for {}: {}", user_id, e);
            error_response(500, "Failed to record feedback", e.to_string())
        }
    }
}

/// Called by the marketplace after a tenant edits their preferences
///
/// POST /api/v1/preferences/{userId}/invalidate
async fn invalidate_preferences(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    if let Err(e) = state.cache.delete(&CacheKey::preferences(&user_id)).await {
        tracing::warn!("Failed to invalidate cached preferences for {}: {}", user_id, e);
    }

    match state.store.mark_stale(&user_id, chrono::Utc::now()).await {
        Ok(()) => HttpResponse::Ok().json(AckResponse { success: true, updated: true }),
        Err(e) => {
            tracing::error!("Failed to mark recommendations stale for {}: {}", user_id, e);
            error_response(500, "Failed to invalidate preferences", e.to_string())
        }
    }
}
