// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    eq_ignore_case, Coordinates, FairnessAssessment, FairnessLabel, Listing, MatchReason, MatchScore,
    PreferenceVector, PreferredLocation, PriceComparison, PriceRange, RecommendationEntry,
    RecommendationRecord, RoomRange, ScoringWeights, SubScores,
};
pub use requests::{BatchMatchRequest, FeedbackRequest, MatchRequest, RecommendationsQuery, SimilarQuery, ViewedRequest};
pub use responses::{
    AckResponse, BatchMatchResponse, ErrorResponse, HealthResponse, RecommendationsResponse, ScoredListing,
    SimilarListingsResponse,
};
