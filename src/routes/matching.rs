use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    BatchMatchRequest, MatchReason, BatchMatchResponse, FairnessAssessment, HealthResponse, MatchRequest, ScoredListing,
    SimilarListingsResponse, SimilarQuery,
};
use crate::routes::{appwrite_error_response, error_response, AppState};
use crate::services::{CacheKey, ListingQuery};

/// Configure scoring, fairness and similarity routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/match", web::post().to(compute_match))
        .route("/match/batch", web::post().to(compute_batch))
        .route("/listings/{listing_id}/fairness", web::get().to(price_fairness))
        .route("/listings/{listing_id}/similar", web::get().to(similar_listings));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_entries: state.cache.l1_size(),
        timestamp: chrono::Utc::now(),
    })
}

/// Score a listing against a preference vector
///
/// POST /api/v1/match
///
/// Request body:
/// ```json
/// {
///   "preferences": { "priceRange": { "min": 2000, "max": 4000 } },
///   "listing": { "listingId": "string", "price": 3000, ... }
/// }
/// ```
async fn compute_match(state: web::Data<AppState>, req: web::Json<MatchRequest>) -> impl Responder {
    let result = state.engine.compute_match(&req.preferences, &req.listing);

    tracing::debug!(
        "Scored listing {}: {} [{}]",
        req.listing.id,
        result.score,
        result.reasons.iter().map(MatchReason::as_str).collect::<Vec<_>>().join(", ")
    );

    HttpResponse::Ok().json(result)
}

/// Score many listings against one preference vector
///
/// POST /api/v1/match/batch
async fn compute_batch(state: web::Data<AppState>, req: web::Json<BatchMatchRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(400, "Validation failed", errors.to_string());
    }

    let now = chrono::Utc::now();
    let mut results: Vec<ScoredListing> = req
        .listings
        .iter()
        .map(|listing| ScoredListing {
            listing_id: listing.id.clone(),
            result: state.engine.compute_match_at(&req.preferences, listing, now),
        })
        .collect();

    results.sort_by(|a, b| b.result.score.cmp(&a.result.score));

    tracing::info!("Scored batch of {} listings", results.len());

    HttpResponse::Ok().json(BatchMatchResponse { results })
}

/// Price-fairness assessment for a listing
///
/// GET /api/v1/listings/{listingId}/fairness
async fn price_fairness(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let listing_id = path.into_inner();
    let cache_key = CacheKey::fairness(&listing_id);

    if let Some(cached) = state.cache.get_opt::<FairnessAssessment>(&cache_key).await {
        return HttpResponse::Ok().json(cached);
    }

    let listing = match state.load_listing(&listing_id).await {
        Ok(listing) => listing,
        Err(e) => {
            tracing::error!("Failed to fetch listing {}: {}", listing_id, e);
            return appwrite_error_response("Failed to fetch listing", e);
        }
    };

    let query = ListingQuery::comparables_for(&listing, state.engine.settings().comparable_limit + 1);
    let pool = match state.appwrite.query_listings(&query).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to query comparables for {}: {}", listing_id, e);
            return appwrite_error_response("Failed to query comparables", e);
        }
    };

    let assessment = state.engine.assess_price_fairness(&listing, &pool);

    tracing::info!(
        "Listing {} priced {} -> {} (percentile {})",
        listing_id,
        listing.price,
        assessment.label,
        assessment.percentile
    );

    if let Err(e) = state.cache.set(&cache_key, &assessment).await {
        tracing::warn!("Failed to cache fairness for {}: {}", listing_id, e);
    }

    HttpResponse::Ok().json(assessment)
}

/// Listings similar to a reference listing
///
/// GET /api/v1/listings/{listingId}/similar?limit=6
async fn similar_listings(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SimilarQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return error_response(400, "Validation failed", errors.to_string());
    }

    let listing_id = path.into_inner();
    let reference = match state.load_listing(&listing_id).await {
        Ok(listing) => listing,
        Err(e) => {
            tracing::error!("Failed to fetch listing {}: {}", listing_id, e);
            return appwrite_error_response("Failed to fetch listing", e);
        }
    };

    let pool_query = ListingQuery {
        min_price: Some(reference.price * 0.7),
        max_price: Some(reference.price * 1.3),
        ..ListingQuery::available(state.candidate_fetch_limit)
    };
    let pool = match state.appwrite.query_listings(&pool_query).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to query similar candidates for {}: {}", listing_id, e);
            return appwrite_error_response("Failed to query listings", e);
        }
    };

    let similar = state.engine.rank_similar(&reference, &pool, query.limit as usize);

    tracing::debug!("Found {} similar listings for {} (pool {})", similar.len(), listing_id, pool.len());

    HttpResponse::Ok().json(SimilarListingsResponse {
        listing_id,
        similar,
    })
}

#[cfg(test)]
mod tests {
    use crate::core::MatchEngine;
    use crate::models::{HealthResponse, MatchRequest};

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            cache_entries: 12,
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["cacheEntries"], 12);
    }

    #[test]
    fn test_match_request_wire_format() {
        let body = serde_json::json!({
            "preferences": {
                "priceRange": { "min": 2000, "max": 4000 },
                "preferredLocations": [{ "city": "Addis Ababa" }],
                "preferredRooms": { "min": 2, "max": 3 },
                "requiredAmenities": ["wifi", "parking"]
            },
            "listing": {
                "listingId": "l1",
                "price": 3000,
                "city": "Addis Ababa",
                "state": "Addis Ababa",
                "bedrooms": 2,
                "propertyType": "apartment",
                "amenities": ["wifi", "parking", "gym"],
                "isVerified": true,
                "averageRating": 4.5,
                "viewCount": 150,
                "isAvailable": true,
                "createdAt": "2024-05-01T00:00:00Z"
            }
        });

        let req: MatchRequest = serde_json::from_value(body).unwrap();
        let result = MatchEngine::default().compute_match(&req.preferences, &req.listing);

        assert!(result.score >= 90);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["reasons"].as_array().unwrap().contains(&serde_json::json!("owner_verified")));
    }
}
