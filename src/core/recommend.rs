use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::core::filters::{matches_content_window, PriceWindow};
use crate::core::scoring::calculate_match_score;
use crate::models::{Listing, MatchReason, PreferenceVector, RecommendationEntry, ScoringWeights};

/// Minimum rating for the verified-boost strategy
pub const VERIFIED_MIN_RATING: f64 = 4.0;

/// Limits applied by the recommendation strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationLimits {
    /// Candidates fetched for content-based scoring
    pub content_pool: usize,
    /// Best content-based matches kept
    pub content_top: usize,
    pub trending: usize,
    pub verified: usize,
    /// Size of the merged list
    pub merged: usize,
    /// How far back "recent" reaches for trending listings
    pub trending_window_days: i64,
}

impl Default for RecommendationLimits {
    fn default() -> Self {
        Self {
            content_pool: 100,
            content_top: 30,
            trending: 10,
            verified: 10,
            merged: 50,
            trending_window_days: 30,
        }
    }
}

/// Source of candidate listings for the recommendation strategies
///
/// Implementations hand back already-materialized snapshots; the engine
/// never performs I/O through this trait. "Available" means the listing's
/// availability flag is set.
pub trait CandidateFetcher {
    /// Available listings priced inside `window`
    fn available_in_price_window(&self, window: &PriceWindow, limit: usize) -> Vec<Listing>;

    /// Most-viewed available listings created since `since`, skipping `exclude`
    fn trending(&self, since: DateTime<Utc>, exclude: &HashSet<String>, limit: usize) -> Vec<Listing>;

    /// Best-rated verified available listings, skipping `exclude`
    fn verified_top_rated(&self, min_rating: f64, exclude: &HashSet<String>, limit: usize) -> Vec<Listing>;

    /// Whether a listing can currently be served
    fn is_available(&self, listing_id: &str) -> bool;
}

/// In-memory candidate source over a slice of listing snapshots
#[derive(Debug, Clone, Default)]
pub struct ListingPool {
    listings: Vec<Listing>,
    index: HashMap<String, usize>,
}

impl ListingPool {
    pub fn new(listings: Vec<Listing>) -> Self {
        let mut index = HashMap::with_capacity(listings.len());
        for (i, listing) in listings.iter().enumerate() {
            index.entry(listing.id.clone()).or_insert(i);
        }
        Self { listings, index }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn get(&self, listing_id: &str) -> Option<&Listing> {
        self.index.get(listing_id).map(|i| &self.listings[*i])
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl CandidateFetcher for ListingPool {
    fn available_in_price_window(&self, window: &PriceWindow, limit: usize) -> Vec<Listing> {
        self.listings
            .iter()
            .filter(|listing| matches_content_window(listing, window))
            .take(limit)
            .cloned()
            .collect()
    }

    fn trending(&self, since: DateTime<Utc>, exclude: &HashSet<String>, limit: usize) -> Vec<Listing> {
        let mut candidates: Vec<&Listing> = self
            .listings
            .iter()
            .filter(|listing| listing.is_available)
            .filter(|listing| listing.created_at >= since)
            .filter(|listing| !exclude.contains(&listing.id))
            .collect();

        candidates.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        candidates.into_iter().take(limit).cloned().collect()
    }

    fn verified_top_rated(&self, min_rating: f64, exclude: &HashSet<String>, limit: usize) -> Vec<Listing> {
        let mut candidates: Vec<&Listing> = self
            .listings
            .iter()
            .filter(|listing| listing.is_available)
            .filter(|listing| listing.is_verified && listing.average_rating >= min_rating)
            .filter(|listing| !exclude.contains(&listing.id))
            .collect();

        candidates.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
        candidates.into_iter().take(limit).cloned().collect()
    }

    fn is_available(&self, listing_id: &str) -> bool {
        self.get(listing_id).map_or(false, |listing| listing.is_available)
    }
}

/// Content-based strategy: score every candidate with the match scorer
pub fn content_based(
    preferences: &PreferenceVector,
    candidates: &[Listing],
    weights: &ScoringWeights,
    top: usize,
    now: DateTime<Utc>,
) -> Vec<RecommendationEntry> {
    let mut scored: Vec<RecommendationEntry> = candidates
        .iter()
        .map(|listing| {
            let result = calculate_match_score(listing, preferences, weights, now);
            RecommendationEntry::new(listing.id.clone(), result.score, result.reasons)
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(top);
    scored
}

/// Trending strategy: `50 + min(views / 10, 25)`
pub fn trending(candidates: &[Listing]) -> Vec<RecommendationEntry> {
    candidates
        .iter()
        .map(|listing| {
            let boost = (listing.view_count / 10).min(25) as u8;
            RecommendationEntry::new(
                listing.id.clone(),
                50 + boost,
                BTreeSet::from([MatchReason::Trending]),
            )
        })
        .collect()
}

/// Verified-boost strategy: `60 + rating * 5`
pub fn verified_boost(candidates: &[Listing]) -> Vec<RecommendationEntry> {
    candidates
        .iter()
        .map(|listing| {
            let score = (60.0 + listing.average_rating.clamp(0.0, 5.0) * 5.0).round() as u8;
            RecommendationEntry::new(
                listing.id.clone(),
                score,
                BTreeSet::from([MatchReason::OwnerVerified, MatchReason::HighlyRated]),
            )
        })
        .collect()
}

/// Merge strategy outputs into one deduplicated list
///
/// Lists are visited in the order given. A later entry for an id already seen
/// replaces it only with a strictly higher score, so on equal scores the first
/// one seen wins. The result is stably sorted by score and capped at `limit`.
pub fn merge_recommendations(lists: Vec<Vec<RecommendationEntry>>, limit: usize) -> Vec<RecommendationEntry> {
    let mut merged: Vec<RecommendationEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in lists.into_iter().flatten() {
        match positions.get(&entry.listing_id) {
            Some(&pos) => {
                if entry.score > merged[pos].score {
                    merged[pos] = entry;
                }
            }
            None => {
                positions.insert(entry.listing_id.clone(), merged.len());
                merged.push(entry);
            }
        }
    }

    merged.sort_by(|a, b| b.score.cmp(&a.score));
    merged.truncate(limit);
    merged
}

/// Run the three strategies and merge them into one recommendation list
pub fn generate_recommendations<F: CandidateFetcher + ?Sized>(
    preferences: &PreferenceVector,
    fetcher: &F,
    weights: &ScoringWeights,
    limits: &RecommendationLimits,
    now: DateTime<Utc>,
) -> Vec<RecommendationEntry> {
    let window = PriceWindow::for_preferences(preferences);
    let content_pool = fetcher.available_in_price_window(&window, limits.content_pool);
    let content = content_based(preferences, &content_pool, weights, limits.content_top, now);

    let mut selected: HashSet<String> = content.iter().map(|e| e.listing_id.clone()).collect();

    let since = now - Duration::days(limits.trending_window_days);
    let trending_pool = fetcher.trending(since, &selected, limits.trending);
    let popular = trending(&trending_pool);
    selected.extend(popular.iter().map(|e| e.listing_id.clone()));

    let verified_pool = fetcher.verified_top_rated(VERIFIED_MIN_RATING, &selected, limits.verified);
    let boosted = verified_boost(&verified_pool);

    tracing::debug!(
        "Strategy results: content={} (from {}), trending={}, verified={}",
        content.len(),
        content_pool.len(),
        popular.len(),
        boosted.len()
    );

    merge_recommendations(vec![content, popular, boosted], limits.merged)
}

/// Serve-time view of a recommendation list
///
/// Drops listings that are no longer available, sorts by score and truncates
/// to `limit`. Runs on every read, whether or not the list was regenerated.
pub fn serve_recommendations<F: CandidateFetcher + ?Sized>(
    entries: &[RecommendationEntry],
    fetcher: &F,
    limit: usize,
) -> Vec<RecommendationEntry> {
    let mut served: Vec<RecommendationEntry> = entries
        .iter()
        .filter(|entry| fetcher.is_available(&entry.listing_id))
        .cloned()
        .collect();

    served.sort_by(|a, b| b.score.cmp(&a.score));
    served.truncate(limit);
    served
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_listing(id: &str, price: f64, views: u64, verified: bool, rating: f64) -> Listing {
        Listing {
            id: id.to_string(),
            price,
            city: "Addis Ababa".to_string(),
            state: "Addis Ababa".to_string(),
            coordinates: None,
            bedrooms: 2,
            bathrooms: 1,
            property_type: "apartment".to_string(),
            amenities: vec!["wifi".to_string()],
            is_verified: verified,
            average_rating: rating,
            view_count: views,
            is_available: true,
            available_from: None,
            created_at: Utc::now(),
        }
    }

    fn entry(id: &str, score: u8) -> RecommendationEntry {
        RecommendationEntry::new(id, score, BTreeSet::new())
    }

    #[test]
    fn test_trending_score_is_capped() {
        let candidates = vec![
            create_listing("quiet", 1000.0, 42, false, 0.0),
            create_listing("busy", 1000.0, 10_000, false, 0.0),
        ];

        let entries = trending(&candidates);

        assert_eq!(entries[0].score, 54);
        assert_eq!(entries[1].score, 75);
        assert!(entries.iter().all(|e| e.reasons.contains(&MatchReason::Trending)));
    }

    #[test]
    fn test_verified_boost_score() {
        let entries = verified_boost(&[create_listing("v", 1000.0, 0, true, 4.5)]);

        assert_eq!(entries[0].score, 83);
        assert!(entries[0].reasons.contains(&MatchReason::OwnerVerified));
        assert!(entries[0].reasons.contains(&MatchReason::HighlyRated));
    }

    #[test]
    fn test_merge_keeps_max_score() {
        let merged = merge_recommendations(
            vec![
                vec![entry("a", 70), entry("b", 60)],
                vec![entry("a", 80), entry("c", 55)],
                vec![entry("b", 65), entry("c", 50)],
            ],
            50,
        );

        assert_eq!(merged.len(), 3);
        let scores: HashMap<&str, u8> = merged.iter().map(|e| (e.listing_id.as_str(), e.score)).collect();
        assert_eq!(scores["a"], 80);
        assert_eq!(scores["b"], 65);
        assert_eq!(scores["c"], 55);
        assert_eq!(merged[0].listing_id, "a");
    }

    #[test]
    fn test_merge_tie_first_seen_wins() {
        let mut first = entry("a", 70);
        first.reasons.insert(MatchReason::PriceMatch);
        let mut second = entry("a", 70);
        second.reasons.insert(MatchReason::Trending);

        let merged = merge_recommendations(vec![vec![first], vec![second]], 50);

        assert_eq!(merged.len(), 1);
        assert!(merged[0].reasons.contains(&MatchReason::PriceMatch));
        assert!(!merged[0].reasons.contains(&MatchReason::Trending));
    }

    #[test]
    fn test_merge_equal_scores_keep_retrieval_order() {
        let merged = merge_recommendations(vec![vec![entry("x", 60)], vec![entry("y", 60)], vec![entry("z", 90)]], 50);

        let ids: Vec<&str> = merged.iter().map(|e| e.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "x", "y"]);
    }

    #[test]
    fn test_merge_respects_limit() {
        let list: Vec<RecommendationEntry> = (0..80).map(|i| entry(&format!("l{}", i), (i % 100) as u8)).collect();

        assert_eq!(merge_recommendations(vec![list], 50).len(), 50);
    }

    #[test]
    fn test_pool_trending_excludes_selected_and_old() {
        let now = Utc::now();
        let mut old = create_listing("old", 1000.0, 5000, false, 0.0);
        old.created_at = now - Duration::days(60);
        let pool = ListingPool::new(vec![
            old,
            create_listing("picked", 1000.0, 4000, false, 0.0),
            create_listing("fresh", 1000.0, 300, false, 0.0),
            create_listing("fresher", 1000.0, 900, false, 0.0),
        ]);
        let exclude = HashSet::from(["picked".to_string()]);

        let result = pool.trending(now - Duration::days(30), &exclude, 10);

        let ids: Vec<&str> = result.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["fresher", "fresh"]);
    }

    #[test]
    fn test_generate_recommendations_dedupes() {
        let now = Utc::now();
        let pool = ListingPool::new(vec![
            create_listing("a", 3000.0, 500, true, 4.8),
            create_listing("b", 3100.0, 20, false, 3.0),
            create_listing("c", 9000.0, 800, true, 4.9),
        ]);
        let preferences = PreferenceVector {
            price_range: Some(crate::models::PriceRange { min: 2000.0, max: 4000.0 }),
            ..PreferenceVector::default()
        };

        let result = generate_recommendations(
            &preferences,
            &pool,
            &ScoringWeights::default(),
            &RecommendationLimits::default(),
            now,
        );

        let ids: HashSet<&str> = result.iter().map(|e| e.listing_id.as_str()).collect();
        assert_eq!(ids.len(), result.len());
        // "c" is outside the price window but still reaches the list via trending
        assert!(ids.contains("c"));
        assert!(result.iter().all(|e| e.score <= 100));
    }

    #[test]
    fn test_serve_filters_unavailable() {
        let mut gone = create_listing("gone", 1000.0, 0, false, 0.0);
        gone.is_available = false;
        let pool = ListingPool::new(vec![gone, create_listing("here", 1000.0, 0, false, 0.0)]);

        let served = serve_recommendations(
            &[entry("gone", 99), entry("here", 40), entry("unknown", 80)],
            &pool,
            10,
        );

        assert_eq!(served.len(), 1);
        assert_eq!(served[0].listing_id, "here");
    }
}
