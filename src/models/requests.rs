use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{Listing, PreferenceVector};

/// Request to score one listing against a preference vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub preferences: PreferenceVector,
    pub listing: Listing,
}

/// Request to score many listings against one preference vector
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchMatchRequest {
    pub preferences: PreferenceVector,
    #[validate(length(min = 1, max = 500))]
    pub listings: Vec<Listing>,
}

/// Query parameters for the recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendationsQuery {
    #[serde(default = "default_recommendation_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: u16,
    #[serde(default)]
    pub refresh: bool,
}

fn default_recommendation_limit() -> u16 {
    20
}

/// Query parameters for the similar-listings endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimilarQuery {
    #[serde(default = "default_similar_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: u16,
}

fn default_similar_limit() -> u16 {
    6
}

/// Request to mark a recommended listing as viewed
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ViewedRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "listing_id", rename = "listingId")]
    pub listing_id: String,
}

/// Helpful / not helpful feedback on a recommendation list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub helpful: bool,
}
