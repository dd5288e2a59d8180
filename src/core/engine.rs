use chrono::{DateTime, Duration, Utc};

use crate::core::{
    fairness::{assess_price_fairness_with_limit, DEFAULT_COMPARABLE_LIMIT},
    lifecycle::{self, RegenerationReason, DEFAULT_MAX_AGE_HOURS},
    recommend::{self, CandidateFetcher, RecommendationLimits},
    scoring::calculate_match_score,
    similarity,
};
use crate::models::{
    FairnessAssessment, Listing, MatchScore, PreferenceVector, RecommendationEntry, RecommendationRecord,
    ScoringWeights,
};

/// Version tag stored on regenerated recommendation records
pub const DEFAULT_ALGORITHM_VERSION: &str = "hybrid-v1";

/// Tunables for the engine beyond the scoring weights
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub limits: RecommendationLimits,
    pub comparable_limit: usize,
    pub max_age: Duration,
    pub algorithm_version: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            limits: RecommendationLimits::default(),
            comparable_limit: DEFAULT_COMPARABLE_LIMIT,
            max_age: Duration::hours(DEFAULT_MAX_AGE_HOURS),
            algorithm_version: DEFAULT_ALGORITHM_VERSION.to_string(),
        }
    }
}

/// Outcome of [`MatchEngine::regenerate_if_stale`]
#[derive(Debug, Clone)]
pub struct RegenerationOutcome {
    pub record: RecommendationRecord,
    pub regenerated: bool,
}

/// Matching, ranking and fairness engine
///
/// # Operations
/// 1. Smart-match scoring of a listing against tenant preferences
/// 2. Price-fairness assessment against comparable listings
/// 3. Hybrid recommendations (content-based, trending, verified-boost)
/// 4. Similar-listing ranking
///
/// Every operation is a pure function of its inputs and the evaluation time.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    weights: ScoringWeights,
    settings: EngineSettings,
}

impl MatchEngine {
    pub fn new(weights: ScoringWeights, settings: EngineSettings) -> Self {
        Self { weights, settings }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
            settings: EngineSettings::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Score one listing against a preference vector
    pub fn compute_match(&self, preferences: &PreferenceVector, listing: &Listing) -> MatchScore {
        self.compute_match_at(preferences, listing, Utc::now())
    }

    pub fn compute_match_at(
        &self,
        preferences: &PreferenceVector,
        listing: &Listing,
        now: DateTime<Utc>,
    ) -> MatchScore {
        calculate_match_score(listing, preferences, &self.weights, now)
    }

    /// Judge a listing's price against its comparable set drawn from `pool`
    pub fn assess_price_fairness(&self, listing: &Listing, pool: &[Listing]) -> FairnessAssessment {
        assess_price_fairness_with_limit(listing, pool, self.settings.comparable_limit)
    }

    /// Build a fresh, merged recommendation list
    pub fn generate_recommendations<F: CandidateFetcher + ?Sized>(
        &self,
        preferences: &PreferenceVector,
        fetcher: &F,
        now: DateTime<Utc>,
    ) -> Vec<RecommendationEntry> {
        recommend::generate_recommendations(preferences, fetcher, &self.weights, &self.settings.limits, now)
    }

    /// Listing ids most similar to `reference`, best first
    pub fn rank_similar(&self, reference: &Listing, pool: &[Listing], limit: usize) -> Vec<String> {
        similarity::rank_similar(reference, pool, limit)
    }

    /// Why `record` has to be regenerated at `now`, if at all
    pub fn regeneration_reason(
        &self,
        record: &RecommendationRecord,
        force: bool,
        now: DateTime<Utc>,
    ) -> Option<RegenerationReason> {
        lifecycle::regeneration_reason(record, force, self.settings.max_age, now)
    }

    /// Regenerate the record if it is forced, stale, empty or expired
    ///
    /// Regeneration replaces the entry list, refresh time and algorithm
    /// version and clears the stale flag. Feedback counters are kept.
    pub fn regenerate_if_stale<F: CandidateFetcher + ?Sized>(
        &self,
        mut record: RecommendationRecord,
        preferences: &PreferenceVector,
        fetcher: &F,
        force: bool,
        now: DateTime<Utc>,
    ) -> RegenerationOutcome {
        let Some(reason) = self.regeneration_reason(&record, force, now) else {
            return RegenerationOutcome { record, regenerated: false };
        };

        let entries = self.generate_recommendations(preferences, fetcher, now);

        tracing::info!(
            "Regenerated {} recommendations for user {} ({})",
            entries.len(),
            record.user_id,
            reason.as_str()
        );

        record.entries = entries;
        record.refreshed_at = now;
        record.algorithm_version = self.settings.algorithm_version.clone();
        record.is_stale = false;

        RegenerationOutcome { record, regenerated: true }
    }

    pub fn mark_viewed(&self, record: RecommendationRecord, listing_id: &str) -> RecommendationRecord {
        lifecycle::mark_viewed(record, listing_id)
    }

    pub fn record_feedback(&self, record: RecommendationRecord, helpful: bool) -> RecommendationRecord {
        lifecycle::record_feedback(record, helpful)
    }

    /// Filter, sort and truncate a record's entries for one read
    pub fn serve<F: CandidateFetcher + ?Sized>(
        &self,
        record: &RecommendationRecord,
        fetcher: &F,
        limit: usize,
    ) -> Vec<RecommendationEntry> {
        recommend::serve_recommendations(&record.entries, fetcher, limit)
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
