use serde::{Deserialize, Serialize};

/// The persisted venue row, keyed by the maps provider's place id.
///
/// `fs_venue_id` stays `None` until the venue-matching stage resolves it;
/// `happy_hour` and `category` are filled (or the whole row deleted) by
/// the menu stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub place_id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Opening-hours weekday lines, serialized as a JSON array string.
    pub hours: Option<String>,
    pub rating: Option<f64>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub price: Option<i32>,
    pub fs_venue_id: Option<String>,
    pub happy_hour: Option<String>,
    pub category: Option<String>,
}

/// Bounding box consumed by the grid-expansion stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridBounds {
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
}

/// Payload emitted when the venue-matching stage resolves a venue id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueMatch {
    pub fs_venue_id: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// A fully built menu-details request for the extraction stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuRequest {
    pub url: String,
    pub fs_venue_id: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Normalize provider text: absent or empty values are stored as NULL,
/// never as empty string, so "known to be empty" stays distinguishable
/// from "never populated".
pub fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
