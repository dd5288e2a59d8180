use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::core::distance::distance_between;
use crate::models::{
    eq_ignore_case, Listing, MatchReason, MatchScore, PreferenceVector, PriceRange, RoomRange,
    ScoringWeights, SubScores,
};

/// Sub-score used whenever the tenant expressed no preference for a factor
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Sub-scores at or above this threshold earn their reason tag
const REASON_THRESHOLD: f64 = 80.0;

const HIGH_RATING: f64 = 4.0;
const TRENDING_VIEWS: u64 = 100;

/// Calculate the smart-match score (0-100) for a listing
///
/// Scoring formula:
/// score = (
///     price_score * 0.25 +       # Closer to the middle of the budget = higher
///     location_score * 0.25 +    # City/state match, distance to anchor
///     rooms_score * 0.20 +       # Within preferred bedroom range
///     amenities_score * 0.20 +   # Share of required amenities present
///     bonus_score * 0.10         # Verified, rated, available, popular
/// )
pub fn calculate_match_score(
    listing: &Listing,
    preferences: &PreferenceVector,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> MatchScore {
    let sub = calculate_sub_scores(listing, preferences, now);

    let weighted = (sub.price * weights.price
        + sub.location * weights.location
        + sub.rooms * weights.rooms
        + sub.amenities * weights.amenities
        + sub.bonus * weights.bonus)
        / 100.0;

    let score = weighted.round().clamp(0.0, 100.0) as u8;

    MatchScore {
        score,
        reasons: collect_reasons(listing, &sub, now),
    }
}

/// Compute every sub-score without weighting
pub fn calculate_sub_scores(
    listing: &Listing,
    preferences: &PreferenceVector,
    now: DateTime<Utc>,
) -> SubScores {
    SubScores {
        price: calculate_price_score(listing.price, preferences.price_range),
        location: calculate_location_score(listing, preferences),
        rooms: calculate_rooms_score(listing.bedrooms, preferences.preferred_rooms),
        amenities: calculate_amenities_score(&listing.amenities, &preferences.required_amenities),
        bonus: calculate_bonus_score(listing, now),
    }
}

/// Price score (0-100)
/// Inside the range scores 80-100, peaking at the midpoint. Being under budget
/// is penalized more mildly than being over it.
pub fn calculate_price_score(price: f64, range: Option<PriceRange>) -> f64 {
    let Some(range) = range.map(PriceRange::normalized) else {
        return NEUTRAL_SCORE;
    };

    if price >= range.min && price <= range.max {
        let half_width = (range.max - range.min) / 2.0;
        if half_width <= 0.0 {
            return 100.0;
        }
        let normalized_distance = ((price - range.midpoint()).abs() / half_width).min(1.0);
        return 80.0 + 20.0 * (1.0 - normalized_distance);
    }

    if price < range.min {
        let under_pct = (range.min - price) / range.min;
        return (70.0 - under_pct * 100.0).max(0.0);
    }

    if range.max <= 0.0 {
        return 0.0;
    }
    let over_pct = (price - range.max) / range.max;
    (60.0 - over_pct * 150.0).max(0.0)
}

/// Location score (0-100)
/// City match beats state match; proximity to the anchor can only raise a
/// score, while being beyond the maximum distance costs 30 points.
pub fn calculate_location_score(listing: &Listing, preferences: &PreferenceVector) -> f64 {
    let mut score = if preferences.preferred_locations.is_empty() {
        NEUTRAL_SCORE
    } else {
        preferences
            .preferred_locations
            .iter()
            .map(|location| {
                let city_match = location
                    .city
                    .as_deref()
                    .map_or(false, |city| listing.same_city(city));
                let state_match = location
                    .state
                    .as_deref()
                    .map_or(false, |state| listing.same_state(state));

                if city_match {
                    100.0
                } else if state_match {
                    70.0
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max)
    };

    if let (Some(anchor), Some(max_distance), Some(coordinates)) = (
        preferences.anchor.as_ref(),
        preferences.max_distance_km,
        listing.coordinates.as_ref(),
    ) {
        if max_distance > 0.0 {
            let distance_km = distance_between(anchor, coordinates);
            if distance_km <= max_distance {
                let proximity = 100.0 - 40.0 * (distance_km / max_distance);
                score = score.max(proximity);
            } else {
                score = (score - 30.0).max(0.0);
            }
        }
    }

    score
}

/// Rooms score (0-100)
/// Missing bedrooms cost 20 points each, surplus bedrooms 15.
pub fn calculate_rooms_score(bedrooms: u32, range: Option<RoomRange>) -> f64 {
    let Some(range) = range.map(RoomRange::normalized) else {
        return NEUTRAL_SCORE;
    };

    if bedrooms < range.min {
        let deficit = (range.min - bedrooms) as f64;
        (80.0 - 20.0 * deficit).max(0.0)
    } else if bedrooms > range.max {
        let excess = (bedrooms - range.max) as f64;
        (80.0 - 15.0 * excess).max(0.0)
    } else {
        100.0
    }
}

/// Amenities score (0-100): share of required amenities the listing offers
pub fn calculate_amenities_score(amenities: &[String], required: &[String]) -> f64 {
    let required = unique_amenities(required);
    if required.is_empty() {
        return NEUTRAL_SCORE;
    }
    if amenities.is_empty() {
        return 20.0;
    }

    let matched = required
        .iter()
        .filter(|wanted| amenities.iter().any(|have| eq_ignore_case(have, wanted)))
        .count();

    100.0 * matched as f64 / required.len() as f64
}

/// Bonus score (0-100) from flat increments
pub fn calculate_bonus_score(listing: &Listing, now: DateTime<Utc>) -> f64 {
    let mut bonus = 0.0;
    if listing.is_verified {
        bonus += 30.0;
    }
    if listing.average_rating >= HIGH_RATING {
        bonus += 30.0;
    }
    if listing.is_available_at(now) {
        bonus += 20.0;
    }
    if listing.view_count > TRENDING_VIEWS {
        bonus += 20.0;
    }
    f64::min(bonus, 100.0)
}

fn collect_reasons(listing: &Listing, sub: &SubScores, now: DateTime<Utc>) -> BTreeSet<MatchReason> {
    let mut reasons = BTreeSet::new();

    if sub.price >= REASON_THRESHOLD {
        reasons.insert(MatchReason::PriceMatch);
    }
    if sub.location >= REASON_THRESHOLD {
        reasons.insert(MatchReason::LocationMatch);
    }
    if sub.rooms >= REASON_THRESHOLD {
        reasons.insert(MatchReason::RoomsMatch);
    }
    if sub.amenities >= REASON_THRESHOLD {
        reasons.insert(MatchReason::AmenitiesMatch);
    }
    if listing.is_verified {
        reasons.insert(MatchReason::OwnerVerified);
    }
    if listing.average_rating >= HIGH_RATING {
        reasons.insert(MatchReason::HighlyRated);
    }
    if listing.is_available_at(now) {
        reasons.insert(MatchReason::QuickAvailability);
    }
    if listing.view_count > TRENDING_VIEWS {
        reasons.insert(MatchReason::Trending);
    }

    reasons
}

// Duplicate or blank identifiers in the requirement list must not skew the ratio.
fn unique_amenities(required: &[String]) -> Vec<&str> {
    let mut unique: Vec<&str> = Vec::with_capacity(required.len());
    for amenity in required.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
        if !unique.iter().any(|seen| eq_ignore_case(seen, amenity)) {
            unique.push(amenity);
        }
    }
    unique
}
