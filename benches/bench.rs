// Criterion benchmarks for the rentmatch engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rentmatch::core::{distance::haversine_distance, ListingPool, MatchEngine};
use rentmatch::models::{Coordinates, Listing, PreferenceVector, PreferredLocation, PriceRange, RoomRange};
use chrono::{Duration, Utc};

const CITIES: [&str; 4] = ["Addis Ababa", "Adama", "Hawassa", "Bahir Dar"];

fn create_listing(id: usize) -> Listing {
    Listing {
        id: format!("listing_{}", id),
        price: 1500.0 + (id % 40) as f64 * 100.0,
        city: CITIES[id % CITIES.len()].to_string(),
        state: "Oromia".to_string(),
        coordinates: Some(Coordinates {
            lat: 9.03 + (id as f64 * 0.001) % 0.5,
            lng: 38.74 + (id as f64 * 0.001) % 0.5,
        }),
        bedrooms: 1 + (id % 4) as u32,
        bathrooms: 1,
        property_type: if id % 3 == 0 { "house" } else { "apartment" }.to_string(),
        amenities: vec!["wifi".to_string(), "parking".to_string()],
        is_verified: id % 5 == 0,
        average_rating: 3.0 + (id % 20) as f64 / 10.0,
        view_count: (id * 7 % 500) as u64,
        is_available: id % 11 != 0,
        available_from: None,
        created_at: Utc::now() - Duration::days((id % 60) as i64),
    }
}

fn create_preferences() -> PreferenceVector {
    PreferenceVector {
        price_range: Some(PriceRange { min: 2000.0, max: 4000.0 }),
        preferred_rooms: Some(RoomRange { min: 2, max: 3 }),
        preferred_locations: vec![PreferredLocation {
            city: Some("Addis Ababa".to_string()),
            state: None,
        }],
        required_amenities: vec!["wifi".to_string(), "parking".to_string(), "gym".to_string()],
        max_distance_km: Some(25.0),
        anchor: Some(Coordinates { lat: 9.03, lng: 38.74 }),
    }
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(9.03),
                black_box(38.74),
                black_box(8.54),
                black_box(39.27),
            )
        });
    });
}

fn bench_compute_match(c: &mut Criterion) {
    let engine = MatchEngine::with_default_weights();
    let preferences = create_preferences();
    let listing = create_listing(42);

    c.bench_function("compute_match", |b| {
        b.iter(|| engine.compute_match(black_box(&preferences), black_box(&listing)));
    });
}

fn bench_recommendations(c: &mut Criterion) {
    let engine = MatchEngine::with_default_weights();
    let preferences = create_preferences();
    let now = Utc::now();

    let mut group = c.benchmark_group("recommendations");

    for pool_size in [100, 500, 1000].iter() {
        let pool = ListingPool::new((0..*pool_size).map(create_listing).collect());

        group.bench_with_input(
            BenchmarkId::new("generate_recommendations", pool_size),
            pool_size,
            |b, _| {
                b.iter(|| engine.generate_recommendations(black_box(&preferences), black_box(&pool), now));
            },
        );
    }

    group.finish();
}

fn bench_price_fairness(c: &mut Criterion) {
    let engine = MatchEngine::with_default_weights();
    let listing = create_listing(0);
    let pool: Vec<Listing> = (1..200).map(create_listing).collect();

    c.bench_function("assess_price_fairness_200_pool", |b| {
        b.iter(|| engine.assess_price_fairness(black_box(&listing), black_box(&pool)));
    });
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_compute_match,
    bench_recommendations,
    bench_price_fairness
);

criterion_main!(benches);
