use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::core::recommend::{CandidateFetcher, ListingPool, RecommendationLimits, VERIFIED_MIN_RATING};
use crate::core::PriceWindow;
use crate::models::{Listing, PreferenceVector, RecommendationRecord};
use crate::services::{AppwriteClient, AppwriteError, ListingQuery};

/// Recommendation candidates backed by Appwrite
///
/// Every strategy runs its own query with filtering, ordering and limits
/// pushed down to the listings collection. The trending and verified queries
/// over-fetch by the number of listings earlier strategies may have claimed,
/// so exclusion never leaves a strategy short.
#[derive(Debug, Clone, Default)]
pub struct AppwriteCandidates {
    content: ListingPool,
    trending: ListingPool,
    verified: ListingPool,
}

impl AppwriteCandidates {
    /// Run the three strategy queries concurrently
    pub async fn fetch(
        client: &AppwriteClient,
        preferences: &PreferenceVector,
        limits: &RecommendationLimits,
        now: DateTime<Utc>,
    ) -> Result<Self, AppwriteError> {
        let (content, trending, verified) = Self::queries(preferences, limits, now);

        let (content, trending, verified) = tokio::try_join!(
            client.query_listings(&content),
            client.query_listings(&trending),
            client.query_listings(&verified),
        )?;

        tracing::debug!(
            "Fetched candidates: content={}, trending={}, verified={}",
            content.len(),
            trending.len(),
            verified.len()
        );

        Ok(Self::from_pools(content, trending, verified))
    }

    /// Queries for the content, trending and verified strategies
    pub fn queries(
        preferences: &PreferenceVector,
        limits: &RecommendationLimits,
        now: DateTime<Utc>,
    ) -> (ListingQuery, ListingQuery, ListingQuery) {
        let window = PriceWindow::for_preferences(preferences);
        let since = now - Duration::days(limits.trending_window_days);

        (
            ListingQuery::in_price_window(&window, limits.content_pool),
            ListingQuery::trending_since(since, limits.trending + limits.content_top),
            ListingQuery::verified_top_rated(
                VERIFIED_MIN_RATING,
                limits.verified + limits.content_top + limits.trending,
            ),
        )
    }

    pub fn from_pools(content: Vec<Listing>, trending: Vec<Listing>, verified: Vec<Listing>) -> Self {
        Self {
            content: ListingPool::new(content),
            trending: ListingPool::new(trending),
            verified: ListingPool::new(verified),
        }
    }
}

impl CandidateFetcher for AppwriteCandidates {
    fn available_in_price_window(&self, window: &PriceWindow, limit: usize) -> Vec<Listing> {
        self.content.available_in_price_window(window, limit)
    }

    fn trending(&self, since: DateTime<Utc>, exclude: &HashSet<String>, limit: usize) -> Vec<Listing> {
        self.trending.trending(since, exclude, limit)
    }

    fn verified_top_rated(&self, min_rating: f64, exclude: &HashSet<String>, limit: usize) -> Vec<Listing> {
        self.verified.verified_top_rated(min_rating, exclude, limit)
    }

    fn is_available(&self, listing_id: &str) -> bool {
        [&self.content, &self.trending, &self.verified]
            .iter()
            .any(|pool| pool.is_available(listing_id))
    }
}

/// Current snapshots of every listing referenced by `record`
///
/// Listings missing from the result were deleted and are treated as
/// unavailable when serving.
pub async fn fetch_record_listings(
    client: &AppwriteClient,
    record: &RecommendationRecord,
) -> Result<ListingPool, AppwriteError> {
    let ids: Vec<String> = record.entries.iter().map(|e| e.listing_id.clone()).collect();
    if ids.is_empty() {
        return Ok(ListingPool::default());
    }

    let listings = client.query_listings(&ListingQuery::by_ids(&ids)).await?;
    Ok(ListingPool::new(listings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recommend::generate_recommendations;
    use crate::models::{PriceRange, ScoringWeights};

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
            amenities: vec![],
            is_verified: verified,
            average_rating: rating,
            view_count: views,
            is_available: true,
            available_from: None,
            created_at: Utc::now(),
        }
    }

    fn create_client(base_url: String) -> AppwriteClient {
        AppwriteClient::new(
            base_url,
            "test_key".to_string(),
            "test_project".to_string(),
            "test_db".to_string(),
            crate::services::AppwriteCollections {
                listings: "listings".to_string(),
                rental_preferences: "rental_preferences".to_string(),
            },
        )
        .expect("client")
    }

    #[test]
    fn test_strategy_queries_over_fetch_for_exclusion() {
        let limits = RecommendationLimits::default();
        let (content, trending, verified) =
            AppwriteCandidates::queries(&PreferenceVector::default(), &limits, Utc::now());

        assert_eq!(content.limit, 100);
        assert_eq!(trending.limit, 40);
        assert_eq!(trending.order_desc, Some("viewCount"));
        assert_eq!(verified.limit, 50);
        assert_eq!(verified.order_desc, Some("averageRating"));
    }

    #[test]
    fn test_most_viewed_listing_reaches_trending() {
        // The most-viewed listing is the first row of the trending query,
        // however many listings the marketplace holds.
        let mut busy = create_listing("l550", 1000.0, 10_000, false, 0.0);
        busy.created_at = Utc::now() - Duration::days(2);
        let content: Vec<Listing> = (0..100).map(|i| create_listing(&format!("l{}", i), 3000.0, 1, false, 0.0)).collect();

        let candidates = AppwriteCandidates::from_pools(content, vec![busy], vec![]);
        let preferences = PreferenceVector {
            price_range: Some(PriceRange { min: 2000.0, max: 4000.0 }),
            ..PreferenceVector::default()
        };

        let result = generate_recommendations(
            &preferences,
            &candidates,
            &ScoringWeights::default(),
            &RecommendationLimits::default(),
            Utc::now(),
        );

        let busy = result.iter().find(|e| e.listing_id == "l550").expect("trending entry");
        assert_eq!(busy.score, 75);
    }

    #[test]
    fn test_trending_backfills_after_exclusion() {
        let limits = RecommendationLimits { content_top: 2, trending: 2, ..RecommendationLimits::default() };
        let content = vec![
            create_listing("c1", 3000.0, 900, false, 0.0),
            create_listing("c2", 3000.0, 800, false, 0.0),
        ];
        // Trending query returned content_top + trending rows, content picks first
        let trending = vec![
            create_listing("c1", 3000.0, 900, false, 0.0),
            create_listing("c2", 3000.0, 800, false, 0.0),
            create_listing("t1", 1000.0, 700, false, 0.0),
            create_listing("t2", 1000.0, 600, false, 0.0),
        ];
        let candidates = AppwriteCandidates::from_pools(content, trending, vec![]);

        let result = generate_recommendations(
            &PreferenceVector::default(),
            &candidates,
            &ScoringWeights::default(),
            &limits,
            Utc::now(),
        );

        let ids: HashSet<&str> = result.iter().map(|e| e.listing_id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["c1", "c2", "t1", "t2"]));
    }

    #[tokio::test]
    async fn test_record_listings_fetched_by_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/databases/test_db/collections/listings/documents")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "total": 1,
                    "documents": [{
                        "listingId": "l550",
                        "price": 3000,
                        "city": "Addis Ababa",
                        "state": "Addis Ababa",
                        "bedrooms": 2,
                        "propertyType": "apartment",
                        "isAvailable": true,
                        "createdAt": "2024-05-01T00:00:00Z"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut record = RecommendationRecord::new("tenant_1", Utc::now());
        record.entries = vec![
            crate::models::RecommendationEntry::new("l550", 80, Default::default()),
            crate::models::RecommendationEntry::new("deleted", 90, Default::default()),
        ];

        let pool = fetch_record_listings(&create_client(server.url()), &record).await.unwrap();

        mock.assert_async().await;
        assert!(pool.is_available("l550"));
        assert!(!pool.is_available("deleted"));
    }

    #[tokio::test]
    async fn test_empty_record_skips_query() {
        let client = create_client("http://127.0.0.1:9".to_string());
        let record = RecommendationRecord::new("tenant_1", Utc::now());

        let pool = fetch_record_listings(&client, &record).await.unwrap();

        assert!(pool.is_empty());
    }
}
