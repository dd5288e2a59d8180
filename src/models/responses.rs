use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchScore, RecommendationEntry};

/// Response for the recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub recommendations: Vec<RecommendationEntry>,
    #[serde(rename = "algorithmVersion")]
    pub algorithm_version: String,
    #[serde(rename = "refreshedAt")]
    pub refreshed_at: chrono::DateTime<chrono::Utc>,
    pub regenerated: bool,
}

/// Score of one listing inside a batch response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredListing {
    #[serde(rename = "listingId")]
    pub listing_id: String,
    #[serde(flatten)]
    pub result: MatchScore,
}

/// Response for the batch match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMatchResponse {
    pub results: Vec<ScoredListing>,
}

/// Response for the similar-listings endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarListingsResponse {
    #[serde(rename = "listingId")]
    pub listing_id: String,
    pub similar: Vec<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Entries in the in-process cache tier
    #[serde(rename = "cacheEntries")]
    pub cache_entries: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Acknowledgement for record mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    pub updated: bool,
}
