//! Rentmatch - matching, recommendation and price-fairness engine for a rental marketplace
//!
//! The engine scores listings against tenant preferences, blends three
//! retrieval strategies into one recommendation list, judges whether a price
//! is fair relative to comparable listings and ranks similar listings.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    assess_price_fairness, generate_recommendations, haversine_distance, mark_viewed, rank_similar, record_feedback,
    CandidateFetcher, EngineSettings, ListingPool, MatchEngine,
};
pub use crate::models::{
    FairnessAssessment, FairnessLabel, Listing, MatchReason, MatchScore, PreferenceVector, RecommendationEntry,
    RecommendationRecord, ScoringWeights,
};

/// Score a listing against tenant preferences with the default weights
pub fn compute_match(preferences: &PreferenceVector, listing: &Listing) -> MatchScore {
    crate::core::scoring::calculate_match_score(listing, preferences, &ScoringWeights::default(), chrono::Utc::now())
}
