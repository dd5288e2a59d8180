use crate::core::PriceWindow;
use crate::models::{Listing, PreferenceVector};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Appwrite API client
///
/// Read-only access to the marketplace data:
/// - Fetching a tenant's rental preferences
/// - Fetching single listings
/// - Querying listing pools for the engine
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub listings: String,
    pub rental_preferences: String,
}

/// Filters pushed down to the listings collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub available_only: bool,
    pub listing_ids: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub property_type: Option<String>,
    pub min_bedrooms: Option<u32>,
    pub max_bedrooms: Option<u32>,
    pub created_since: Option<DateTime<Utc>>,
    pub verified_only: bool,
    pub min_rating: Option<f64>,
    /// Attribute to sort by, descending
    pub order_desc: Option<&'static str>,
    pub limit: usize,
}

impl ListingQuery {
    /// Candidate pool used for recommendations and similarity ranking
    pub fn available(limit: usize) -> Self {
        Self {
            available_only: true,
            limit,
            ..Self::default()
        }
    }

    /// Content-based candidates: available and inside the widened price window
    pub fn in_price_window(window: &PriceWindow, limit: usize) -> Self {
        Self {
            min_price: window.min,
            max_price: window.max,
            ..Self::available(limit)
        }
    }

    /// Most-viewed available listings created since `since`
    pub fn trending_since(since: DateTime<Utc>, limit: usize) -> Self {
        Self {
            created_since: Some(since),
            order_desc: Some("viewCount"),
            ..Self::available(limit)
        }
    }

    /// Best-rated verified available listings
    pub fn verified_top_rated(min_rating: f64, limit: usize) -> Self {
        Self {
            verified_only: true,
            min_rating: Some(min_rating),
            order_desc: Some("averageRating"),
            ..Self::available(limit)
        }
    }

    /// Current snapshots of the given listings, available or not
    pub fn by_ids(listing_ids: &[String]) -> Self {
        Self {
            listing_ids: listing_ids.to_vec(),
            limit: listing_ids.len(),
            ..Self::default()
        }
    }

    /// Peers of `listing` for price fairness: same property type, bedrooms
    /// within one, and the same state (city filtering happens in the engine)
    pub fn comparables_for(listing: &Listing, limit: usize) -> Self {
        Self {
            state: Some(listing.state.clone()),
            property_type: Some(listing.property_type.clone()),
            min_bedrooms: Some(listing.bedrooms.saturating_sub(1)),
            max_bedrooms: Some(listing.bedrooms + 1),
            limit,
            ..Self::default()
        }
    }

    /// Translate the filters into Appwrite query strings
    pub fn to_queries(&self) -> Vec<String> {
        let mut queries = Vec::new();

        if self.available_only {
            queries.push("equal(\"isAvailable\", true)".to_string());
        }
        if !self.listing_ids.is_empty() {
            let ids: Vec<String> = self.listing_ids.iter().map(|id| quote(id)).collect();
            queries.push(format!("equal(\"listingId\", [{}])", ids.join(", ")));
        }
        if let Some(min) = self.min_price {
            queries.push(format!("greaterThanEqual(\"price\", {})", min));
        }
        if let Some(max) = self.max_price {
            queries.push(format!("lessThanEqual(\"price\", {})", max));
        }
        if let Some(city) = &self.city {
            queries.push(format!("equal(\"city\", {})", quote(city)));
        }
        if let Some(state) = &self.state {
            queries.push(format!("equal(\"state\", {})", quote(state)));
        }
        if let Some(property_type) = &self.property_type {
            queries.push(format!("equal(\"propertyType\", {})", quote(property_type)));
        }
        if let Some(min) = self.min_bedrooms {
            queries.push(format!("greaterThanEqual(\"bedrooms\", {})", min));
        }
        if let Some(max) = self.max_bedrooms {
            queries.push(format!("lessThanEqual(\"bedrooms\", {})", max));
        }
        if let Some(since) = self.created_since {
            let since = since.to_rfc3339_opts(SecondsFormat::Millis, true);
            queries.push(format!("greaterThanEqual(\"createdAt\", {})", quote(&since)));
        }
        if self.verified_only {
            queries.push("equal(\"isVerified\", true)".to_string());
        }
        if let Some(rating) = self.min_rating {
            queries.push(format!("greaterThanEqual(\"averageRating\", {})", rating));
        }
        if let Some(attribute) = self.order_desc {
            queries.push(format!("orderDesc({})", quote(attribute)));
        }
        if self.limit > 0 {
            queries.push(format!("limit({})", self.limit));
        }

        queries
    }
}

// JSON string quoting keeps user-provided values from breaking the query syntax.
fn quote(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, AppwriteError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    async fn list_documents(&self, collection: &str, queries: &[String]) -> Result<Vec<Value>, AppwriteError> {
        let queries_json = serde_json::to_string(queries)
            .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to encode queries: {}", e)))?;
        let url = format!(
            "{}?query={}",
            self.documents_url(collection),
            urlencoding::encode(&queries_json)
        );

        tracing::debug!("Querying Appwrite collection {}: {:?}", collection, queries);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppwriteError::Unauthorized);
        }
        if !status.is_success() {
            return Err(AppwriteError::ApiError(format!(
                "Failed to query {}: {}",
                collection, status
            )));
        }

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

        Ok(documents.clone())
    }

    /// Fetch rental preferences for a given user ID
    ///
    /// A tenant with no stored preferences gets an empty vector, which the
    /// engine scores neutrally.
    pub async fn get_preferences(&self, user_id: &str) -> Result<PreferenceVector, AppwriteError> {
        let queries = vec![format!("equal(\"userId\", {})", quote(user_id)), "limit(1)".to_string()];
        let documents = self
            .list_documents(&self.collections.rental_preferences, &queries)
            .await?;

        let Some(doc) = documents.first() else {
            tracing::debug!("No stored preferences for user {}", user_id);
            return Ok(PreferenceVector::default());
        };

        let data = doc.get("data").unwrap_or(doc);

        serde_json::from_value(data.clone())
            .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse preferences: {}", e)))
    }

    /// Get a single listing by ID
    pub async fn get_listing(&self, listing_id: &str) -> Result<Listing, AppwriteError> {
        let queries = vec![
            format!("equal(\"listingId\", {})", quote(listing_id)),
            "limit(1)".to_string(),
        ];
        let documents = self.list_documents(&self.collections.listings, &queries).await?;

        let doc = documents
            .first()
            .ok_or_else(|| AppwriteError::NotFound(format!("Listing {} not found", listing_id)))?;

        let data = doc.get("data").unwrap_or(doc);

        serde_json::from_value(data.clone())
            .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse listing: {}", e)))
    }

    /// Query listings matching `query`
    ///
    /// Documents that fail to parse are skipped and logged.
    pub async fn query_listings(&self, query: &ListingQuery) -> Result<Vec<Listing>, AppwriteError> {
        let documents = self
            .list_documents(&self.collections.listings, &query.to_queries())
            .await?;
        let total = documents.len();

        let listings: Vec<Listing> = documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                match serde_json::from_value(data.clone()) {
                    Ok(listing) => Some(listing),
                    Err(e) => {
                        tracing::warn!("Skipping malformed listing document: {}", e);
                        None
                    }
                }
            })
            .collect();

        tracing::debug!("Queried {} listings ({} documents)", listings.len(), total);

        Ok(listings)
    }
}
