// Core algorithm exports
pub mod distance;
pub mod engine;
pub mod fairness;
pub mod filters;
pub mod lifecycle;
pub mod recommend;
pub mod scoring;
pub mod similarity;

pub use distance::{distance_between, haversine_distance};
pub use engine::{EngineSettings, MatchEngine, RegenerationOutcome};
pub use fairness::{assess_price_fairness, select_comparables, PriceStats};
pub use filters::{is_comparable, is_similarity_candidate, matches_content_window, PriceWindow};
pub use lifecycle::{mark_stale, mark_viewed, record_feedback, regeneration_reason, RegenerationReason};
pub use recommend::{
    generate_recommendations, merge_recommendations, serve_recommendations, CandidateFetcher, ListingPool,
    RecommendationLimits,
};
pub use scoring::calculate_match_score;
pub use similarity::{rank_similar, similarity_score};
