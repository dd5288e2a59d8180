use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Monthly price range a tenant is looking for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// Returns the range with `min <= max`
    pub fn normalized(self) -> Self {
        if self.min > self.max {
            Self { min: self.max, max: self.min }
        } else {
            self
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Preferred bedroom-count range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRange {
    pub min: u32,
    pub max: u32,
}

impl RoomRange {
    pub fn normalized(self) -> Self {
        if self.min > self.max {
            Self { min: self.max, max: self.min }
        } else {
            self
        }
    }
}

/// A city and/or state the tenant would like to live in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferredLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Structured tenant preferences. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceVector {
    #[serde(rename = "priceRange", default)]
    pub price_range: Option<PriceRange>,
    #[serde(rename = "preferredRooms", default)]
    pub preferred_rooms: Option<RoomRange>,
    #[serde(rename = "preferredLocations", default)]
    pub preferred_locations: Vec<PreferredLocation>,
    #[serde(rename = "requiredAmenities", default)]
    pub required_amenities: Vec<String>,
    #[serde(rename = "maxDistanceKm", default)]
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub anchor: Option<Coordinates>,
}

/// Read-only snapshot of a rental listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "listingId")]
    pub id: String,
    pub price: f64,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(rename = "propertyType")]
    pub property_type: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(rename = "isVerified", default)]
    pub is_verified: bool,
    #[serde(rename = "averageRating", default)]
    pub average_rating: f64,
    #[serde(rename = "viewCount", default)]
    pub view_count: u64,
    #[serde(rename = "isAvailable", default = "default_true")]
    pub is_available: bool,
    #[serde(rename = "availableFrom", default)]
    pub available_from: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Available right now: flagged available with no future move-in date
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        self.is_available && self.available_from.map_or(true, |from| from <= now)
    }

    pub fn same_city(&self, other_city: &str) -> bool {
        eq_ignore_case(&self.city, other_city)
    }

    pub fn same_state(&self, other_state: &str) -> bool {
        eq_ignore_case(&self.state, other_state)
    }
}

fn default_true() -> bool { true }

/// Case-insensitive, whitespace-trimmed comparison used for cities, states,
/// property types and amenity identifiers.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Explainability tags attached to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    PriceMatch,
    LocationMatch,
    RoomsMatch,
    AmenitiesMatch,
    OwnerVerified,
    HighlyRated,
    QuickAvailability,
    Trending,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::PriceMatch => "price_match",
            MatchReason::LocationMatch => "location_match",
            MatchReason::RoomsMatch => "rooms_match",
            MatchReason::AmenitiesMatch => "amenities_match",
            MatchReason::OwnerVerified => "owner_verified",
            MatchReason::HighlyRated => "highly_rated",
            MatchReason::QuickAvailability => "quick_availability",
            MatchReason::Trending => "trending",
        }
    }
}

/// Smart-match result for a single listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub score: u8,
    pub reasons: BTreeSet<MatchReason>,
}

/// Individual sub-scores (each 0-100) before weighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub price: f64,
    pub location: f64,
    pub rooms: f64,
    pub amenities: f64,
    pub bonus: f64,
}

/// Scoring weights, expressed as percentages that sum to 100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub price: f64,
    pub location: f64,
    pub rooms: f64,
    pub amenities: f64,
    pub bonus: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.price + self.location + self.rooms + self.amenities + self.bonus
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price: 25.0,
            location: 25.0,
            rooms: 20.0,
            amenities: 20.0,
            bonus: 10.0,
        }
    }
}

/// One recommended listing inside a user's record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    #[serde(rename = "listingId")]
    pub listing_id: String,
    pub score: u8,
    pub reasons: BTreeSet<MatchReason>,
    #[serde(default)]
    pub viewed: bool,
}

impl RecommendationEntry {
    pub fn new(listing_id: impl Into<String>, score: u8, reasons: BTreeSet<MatchReason>) -> Self {
        Self {
            listing_id: listing_id.into(),
            score,
            reasons,
            viewed: false,
        }
    }
}

/// Per-user cached recommendation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub entries: Vec<RecommendationEntry>,
    #[serde(rename = "algorithmVersion")]
    pub algorithm_version: String,
    #[serde(rename = "refreshedAt")]
    pub refreshed_at: DateTime<Utc>,
    #[serde(rename = "isStale")]
    pub is_stale: bool,
    #[serde(rename = "helpfulCount")]
    pub helpful_count: u32,
    #[serde(rename = "notHelpfulCount")]
    pub not_helpful_count: u32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl RecommendationRecord {
    /// Empty record, created lazily on a user's first request
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            entries: Vec::new(),
            algorithm_version: String::new(),
            refreshed_at: now,
            is_stale: false,
            helpful_count: 0,
            not_helpful_count: 0,
            created_at: now,
        }
    }
}

/// Price-fairness label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FairnessLabel {
    #[serde(rename = "Great Deal")]
    GreatDeal,
    #[serde(rename = "Good Value")]
    GoodValue,
    #[serde(rename = "Fair Price")]
    FairPrice,
    #[serde(rename = "Above Average")]
    AboveAverage,
    #[serde(rename = "Premium Price")]
    PremiumPrice,
    #[serde(rename = "High End")]
    HighEnd,
    #[serde(rename = "Unusually Low")]
    UnusuallyLow,
    #[serde(rename = "Overpriced")]
    Overpriced,
    #[serde(rename = "Insufficient Data")]
    InsufficientData,
}

impl FairnessLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FairnessLabel::GreatDeal => "Great Deal",
            FairnessLabel::GoodValue => "Good Value",
            FairnessLabel::FairPrice => "Fair Price",
            FairnessLabel::AboveAverage => "Above Average",
            FairnessLabel::PremiumPrice => "Premium Price",
            FairnessLabel::HighEnd => "High End",
            FairnessLabel::UnusuallyLow => "Unusually Low",
            FairnessLabel::Overpriced => "Overpriced",
            FairnessLabel::InsufficientData => "Insufficient Data",
        }
    }
}

impl std::fmt::Display for FairnessLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of the comparable set a fairness assessment was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    #[serde(rename = "sampleSize")]
    pub sample_size: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub difference: f64,
    #[serde(rename = "differencePct")]
    pub difference_pct: f64,
}

/// Result of a price-fairness assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessAssessment {
    pub score: u8,
    pub label: FairnessLabel,
    pub percentile: u8,
    pub comparison: Option<PriceComparison>,
}
