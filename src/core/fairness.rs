use crate::core::filters::is_comparable;
use crate::models::{FairnessAssessment, FairnessLabel, Listing, PriceComparison};

/// Fewer comparables than this yields "Insufficient Data"
pub const MIN_COMPARABLES: usize = 3;

/// A same-city peer group of at least this size replaces the wider pool
pub const SAME_CITY_THRESHOLD: usize = 5;

/// Default cap on the comparable pool
pub const DEFAULT_COMPARABLE_LIMIT: usize = 50;

/// |z| above this marks a price as an outlier
const OUTLIER_Z_SCORE: f64 = 2.0;

/// Distribution statistics over comparable prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl PriceStats {
    /// Compute statistics over a non-empty price sample
    ///
    /// Uses the sample standard deviation (n - 1); a single price has a
    /// deviation of zero.
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        let mut sorted = prices.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        let std_dev = if count > 1 {
            let variance = sorted.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Some(Self {
            count,
            mean,
            median,
            min: sorted[0],
            max: sorted[count - 1],
            std_dev,
        })
    }

    /// Standard score of `price`, zero when all prices are identical
    pub fn z_score(&self, price: f64) -> f64 {
        if self.std_dev > 0.0 {
            (price - self.mean) / self.std_dev
        } else {
            0.0
        }
    }
}

/// Select the statistical peer group for `listing` from `pool`
///
/// Keeps at most `limit` peers in pool order; if five or more of those share
/// the listing's city, only the same-city peers are used.
pub fn select_comparables<'a>(listing: &Listing, pool: &'a [Listing], limit: usize) -> Vec<&'a Listing> {
    let candidates: Vec<&Listing> = pool
        .iter()
        .filter(|candidate| is_comparable(listing, candidate))
        .take(limit)
        .collect();

    let same_city: Vec<&Listing> = candidates
        .iter()
        .copied()
        .filter(|candidate| candidate.same_city(&listing.city))
        .collect();

    if same_city.len() >= SAME_CITY_THRESHOLD {
        same_city
    } else {
        candidates
    }
}

/// Tie-adjusted percentile rank of `price` within `prices` (0-100)
pub fn percentile_rank(price: f64, prices: &[f64]) -> f64 {
    if prices.is_empty() {
        return 50.0;
    }

    let below = prices.iter().filter(|p| **p < price).count() as f64;
    let equal = prices.iter().filter(|p| **p == price).count() as f64;

    100.0 * (below + 0.5 * equal) / prices.len() as f64
}

/// Map a percentile to its score and label
pub fn bucket_for_percentile(percentile: u8) -> (u8, FairnessLabel) {
    match percentile {
        0..=20 => (95, FairnessLabel::GreatDeal),
        21..=40 => (85, FairnessLabel::GoodValue),
        41..=60 => (75, FairnessLabel::FairPrice),
        61..=80 => (55, FairnessLabel::AboveAverage),
        81..=90 => (40, FairnessLabel::PremiumPrice),
        _ => (25, FairnessLabel::HighEnd),
    }
}

/// Assess whether a listing's price is fair relative to comparable listings
pub fn assess_price_fairness(listing: &Listing, pool: &[Listing]) -> FairnessAssessment {
    assess_price_fairness_with_limit(listing, pool, DEFAULT_COMPARABLE_LIMIT)
}

/// Same as [`assess_price_fairness`] with an explicit comparable-pool cap
pub fn assess_price_fairness_with_limit(
    listing: &Listing,
    pool: &[Listing],
    limit: usize,
) -> FairnessAssessment {
    let comparables = select_comparables(listing, pool, limit);
    let prices: Vec<f64> = comparables.iter().map(|c| c.price).collect();

    let stats = match PriceStats::from_prices(&prices) {
        Some(stats) if stats.count >= MIN_COMPARABLES => stats,
        _ => {
            tracing::debug!(
                "Listing {} has {} comparables, not enough for a fairness verdict",
                listing.id,
                prices.len()
            );
            return insufficient_data();
        }
    };

    let percentile = percentile_rank(listing.price, &prices).round().clamp(0.0, 100.0) as u8;
    let (mut score, mut label) = bucket_for_percentile(percentile);

    let z = stats.z_score(listing.price);
    if z.abs() > OUTLIER_Z_SCORE {
        if listing.price < stats.mean {
            score = score.min(90);
            label = FairnessLabel::UnusuallyLow;
        } else {
            score = score.saturating_sub(20).max(20);
            label = FairnessLabel::Overpriced;
        }
    }

    let difference = listing.price - stats.mean;
    let difference_pct = if stats.mean != 0.0 {
        difference / stats.mean * 100.0
    } else {
        0.0
    };

    FairnessAssessment {
        score,
        label,
        percentile,
        comparison: Some(PriceComparison {
            sample_size: stats.count,
            mean: stats.mean,
            median: stats.median,
            min: stats.min,
            max: stats.max,
            difference,
            difference_pct,
        }),
    }
}

fn insufficient_data() -> FairnessAssessment {
    FairnessAssessment {
        score: 50,
        label: FairnessLabel::InsufficientData,
        percentile: 50,
        comparison: None,
    }
}
