use crate::models::{eq_ignore_case, Listing, PreferenceVector, PriceRange};

/// Loose price bounds used when fetching content-based candidates
///
/// The tenant's range is widened to `[0.7 * min, 1.3 * max]` so that narrow
/// budgets still produce a candidate pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceWindow {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub const PRICE_WINDOW_LOWER_FACTOR: f64 = 0.7;
pub const PRICE_WINDOW_UPPER_FACTOR: f64 = 1.3;

impl PriceWindow {
    pub fn unbounded() -> Self {
        Self { min: None, max: None }
    }

    /// Widen the preferred price range, or leave the window open if none is set
    pub fn for_preferences(preferences: &PreferenceVector) -> Self {
        match preferences.price_range.map(PriceRange::normalized) {
            Some(range) => Self {
                min: Some(range.min * PRICE_WINDOW_LOWER_FACTOR),
                max: Some(range.max * PRICE_WINDOW_UPPER_FACTOR),
            },
            None => Self::unbounded(),
        }
    }

    #[inline]
    pub fn contains(&self, price: f64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// Check if a listing is a content-based candidate
///
/// Stage 1 of the content-based strategy: flagged available and inside the
/// window. A future move-in date only costs the listing its availability bonus.
#[inline]
pub fn matches_content_window(listing: &Listing, window: &PriceWindow) -> bool {
    listing.is_available && window.contains(listing.price)
}

/// Check if a listing is a statistical peer of `target` for price fairness
///
/// Peers share the city or state, have a bedroom count within one of the
/// target's and the same property type.
#[inline]
pub fn is_comparable(target: &Listing, candidate: &Listing) -> bool {
    if candidate.id == target.id {
        return false;
    }

    let same_area = candidate.same_city(&target.city) || candidate.same_state(&target.state);
    if !same_area {
        return false;
    }

    if candidate.bedrooms.abs_diff(target.bedrooms) > 1 {
        return false;
    }

    eq_ignore_case(&candidate.property_type, &target.property_type)
}

/// Maximum relative price difference for "similar properties"
pub const SIMILAR_PRICE_TOLERANCE: f64 = 0.3;

/// Check if a listing belongs to the similarity candidate pool of `reference`
#[inline]
pub fn is_similarity_candidate(reference: &Listing, candidate: &Listing) -> bool {
    if candidate.id == reference.id {
        return false;
    }

    let same_area = candidate.same_city(&reference.city) || candidate.same_state(&reference.state);
    if !same_area {
        return false;
    }

    (candidate.price - reference.price).abs() <= reference.price.abs() * SIMILAR_PRICE_TOLERANCE
}
