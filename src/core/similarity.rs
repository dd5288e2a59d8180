use crate::core::filters::is_similarity_candidate;
use crate::models::{eq_ignore_case, Listing};

/// Default number of similar listings returned
pub const DEFAULT_SIMILAR_LIMIT: usize = 6;

/// Additive similarity score of `candidate` relative to `reference`
///
/// score = 30 * same_city
///       + 10 * same_state
///       + 20 * (1 - |price diff| / reference price)
///       + 15 * same_bedrooms
///       + 25 * shared_amenities / max(reference amenities, 1)
pub fn similarity_score(reference: &Listing, candidate: &Listing) -> f64 {
    let mut score = 0.0;

    if candidate.same_city(&reference.city) {
        score += 30.0;
    }
    if candidate.same_state(&reference.state) {
        score += 10.0;
    }

    let price_diff = (candidate.price - reference.price).abs();
    if reference.price > 0.0 {
        score += 20.0 * (1.0 - price_diff / reference.price);
    } else if price_diff == 0.0 {
        score += 20.0;
    }

    if candidate.bedrooms == reference.bedrooms {
        score += 15.0;
    }

    let overlap = reference
        .amenities
        .iter()
        .filter(|amenity| candidate.amenities.iter().any(|other| eq_ignore_case(amenity, other)))
        .count();
    score += 25.0 * overlap as f64 / reference.amenities.len().max(1) as f64;

    score
}

/// Rank listings similar to `reference`, best first
///
/// Only listings in the same city or state priced within 30% of the
/// reference are considered. Equal scores keep pool order.
pub fn rank_similar(reference: &Listing, pool: &[Listing], limit: usize) -> Vec<String> {
    let mut scored: Vec<(&Listing, f64)> = pool
        .iter()
        .filter(|candidate| is_similarity_candidate(reference, candidate))
        .map(|candidate| (candidate, similarity_score(reference, candidate)))
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(limit)
        .map(|(listing, _)| listing.id.clone())
        .collect()
}
