// Integration tests for the rentmatch engine

use rentmatch::core::{ListingPool, MatchEngine};
use rentmatch::models::{
    FairnessLabel, Listing, MatchReason, PreferenceVector, PreferredLocation, PriceRange, RecommendationRecord,
    RoomRange,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn create_test_listing(id: &str, price: f64, days_old: i64) -> Listing {
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
        is_verified: false,
        average_rating: 3.0,
        view_count: 0,
        is_available: true,
        available_from: None,
        created_at: fixed_now() - Duration::days(days_old),
    }
}

fn create_test_preferences() -> PreferenceVector {
    PreferenceVector {
        price_range: Some(PriceRange { min: 2000.0, max: 4000.0 }),
        preferred_rooms: Some(RoomRange { min: 2, max: 3 }),
        preferred_locations: vec![PreferredLocation {
            city: Some("Addis Ababa".to_string()),
            state: None,
        }],
        required_amenities: vec!["wifi".to_string(), "parking".to_string()],
        ..Default::default()
    }
}

/// One listing per strategy plus one that must never be recommended
fn create_marketplace() -> Vec<Listing> {
    // Content-based: inside the widened price window and a perfect match
    let mut perfect = create_test_listing("perfect", 3000.0, 5);
    perfect.amenities = vec!["wifi".to_string(), "parking".to_string()];
    perfect.is_verified = true;
    perfect.average_rating = 4.5;
    perfect.view_count = 150;

    // Trending: too cheap for the window, recent and heavily viewed
    let mut popular = create_test_listing("popular", 1000.0, 3);
    popular.view_count = 400;

    // Verified-boost: too expensive for the window and too old to trend
    let mut verified = create_test_listing("verified", 9000.0, 90);
    verified.is_verified = true;
    verified.average_rating = 4.8;

    let mut rented = create_test_listing("rented", 3000.0, 1);
    rented.is_available = false;
    rented.view_count = 1000;

    vec![perfect, popular, verified, rented]
}

fn ids(entries: &[rentmatch::models::RecommendationEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.listing_id.as_str()).collect()
}

#[test]
fn test_integration_hybrid_recommendations() {
    let engine = MatchEngine::with_default_weights();
    let pool = ListingPool::new(create_marketplace());
    let now = fixed_now();

    let entries = engine.generate_recommendations(&create_test_preferences(), &pool, now);

    assert_eq!(ids(&entries), vec!["perfect", "verified", "popular"]);
    assert_eq!(entries[0].score, 100);
    assert_eq!(entries[1].score, 84);
    assert_eq!(entries[2].score, 75);
    assert!(entries[0].reasons.contains(&MatchReason::PriceMatch));
    assert!(entries[1].reasons.contains(&MatchReason::OwnerVerified));
    assert!(entries[2].reasons.contains(&MatchReason::Trending));
}

#[test]
fn test_integration_record_lifecycle() {
    let engine = MatchEngine::with_default_weights();
    let preferences = create_test_preferences();
    let pool = ListingPool::new(create_marketplace());
    let now = fixed_now();

    // First request: empty record is regenerated
    let outcome = engine.regenerate_if_stale(RecommendationRecord::new("tenant_1", now), &preferences, &pool, false, now);
    assert!(outcome.regenerated);
    assert_eq!(outcome.record.algorithm_version, "hybrid-v1");
    assert_eq!(outcome.record.entries.len(), 3);

    // Second request within the hour: served as is
    let later = now + Duration::hours(1);
    let outcome = engine.regenerate_if_stale(outcome.record, &preferences, &pool, false, later);
    assert!(!outcome.regenerated);
    assert_eq!(outcome.record.refreshed_at, now);

    let served = engine.serve(&outcome.record, &pool, 2);
    assert_eq!(ids(&served), vec!["perfect", "verified"]);

    // Interactions
    let record = engine.mark_viewed(outcome.record, "popular");
    let record = engine.mark_viewed(record, "unknown");
    let record = engine.record_feedback(record, true);
    let record = engine.record_feedback(record, false);
    let record = engine.record_feedback(record, true);

    assert!(record.entries.iter().any(|e| e.listing_id == "popular" && e.viewed));
    assert_eq!(record.entries.iter().filter(|e| e.viewed).count(), 1);
    assert_eq!(record.helpful_count, 2);
    assert_eq!(record.not_helpful_count, 1);

    // A day later the list expires; counters survive regeneration
    let next_day = now + Duration::hours(25);
    let outcome = engine.regenerate_if_stale(record, &preferences, &pool, false, next_day);
    assert!(outcome.regenerated);
    assert_eq!(outcome.record.refreshed_at, next_day);
    assert_eq!(outcome.record.helpful_count, 2);
    assert_eq!(outcome.record.not_helpful_count, 1);
    assert!(outcome.record.entries.iter().all(|e| !e.viewed));
}

#[test]
fn test_integration_forced_refresh_and_stale_flag() {
    let engine = MatchEngine::with_default_weights();
    let preferences = create_test_preferences();
    let pool = ListingPool::new(create_marketplace());
    let now = fixed_now();

    let fresh = engine
        .regenerate_if_stale(RecommendationRecord::new("tenant_1", now), &preferences, &pool, false, now)
        .record;

    let outcome = engine.regenerate_if_stale(fresh.clone(), &preferences, &pool, true, now);
    assert!(outcome.regenerated);

    let mut stale = fresh;
    stale.is_stale = true;
    let outcome = engine.regenerate_if_stale(stale, &preferences, &pool, false, now);
    assert!(outcome.regenerated);
    assert!(!outcome.record.is_stale);
}

#[test]
fn test_integration_serving_drops_unavailable_listings() {
    let engine = MatchEngine::with_default_weights();
    let now = fixed_now();
    let record = engine
        .regenerate_if_stale(
            RecommendationRecord::new("tenant_1", now),
            &create_test_preferences(),
            &ListingPool::new(create_marketplace()),
            false,
            now,
        )
        .record;

    // The verified listing was rented out after the list was built
    let mut listings = create_marketplace();
    for listing in listings.iter_mut().filter(|l| l.id == "verified") {
        listing.is_available = false;
    }
    let pool = ListingPool::new(listings);

    let served = engine.serve(&record, &pool, 20);
    assert_eq!(ids(&served), vec!["perfect", "popular"]);
}

#[test]
fn test_integration_fairness_ignores_non_comparables() {
    let engine = MatchEngine::with_default_weights();
    let target = create_test_listing("target", 3000.0, 1);

    let mut villa = create_test_listing("villa", 2000.0, 1);
    villa.property_type = "villa".to_string();
    let mut mansion = create_test_listing("mansion", 2000.0, 1);
    mansion.bedrooms = 6;
    let mut elsewhere = create_test_listing("elsewhere", 2000.0, 1);
    elsewhere.city = "Hawassa".to_string();
    elsewhere.state = "Sidama".to_string();

    let pool = vec![
        villa,
        mansion,
        elsewhere,
        create_test_listing("c1", 2800.0, 1),
        create_test_listing("c2", 3200.0, 1),
    ];
    let assessment = engine.assess_price_fairness(&target, &pool);
    assert_eq!(assessment.label, FairnessLabel::InsufficientData);

    let mut pool = pool;
    pool.push(create_test_listing("c3", 3000.0, 1));
    let assessment = engine.assess_price_fairness(&target, &pool);
    assert_eq!(assessment.label, FairnessLabel::FairPrice);
    assert_eq!(assessment.comparison.unwrap().sample_size, 3);
}

#[test]
fn test_integration_similar_listings() {
    let engine = MatchEngine::with_default_weights();
    let mut reference = create_test_listing("ref", 3000.0, 1);
    reference.amenities = vec!["wifi".to_string(), "parking".to_string()];

    let mut twin = create_test_listing("twin", 3000.0, 1);
    twin.amenities = vec!["wifi".to_string(), "parking".to_string()];
    let close = create_test_listing("close", 3300.0, 1);
    let pricey = create_test_listing("pricey", 4500.0, 1);
    let mut far = create_test_listing("far", 3000.0, 1);
    far.city = "Hawassa".to_string();
    far.state = "Sidama".to_string();

    let pool = vec![close, pricey, far, twin, reference.clone()];
    let similar = engine.rank_similar(&reference, &pool, 6);

    assert_eq!(similar, vec!["twin".to_string(), "close".to_string()]);
}
