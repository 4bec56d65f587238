//! Maps provider: radar place search and place details.

use serde::Deserialize;

use crate::types::{none_if_empty, VenueRecord};

/// Search radius per grid cell, in meters (about half a mile).
pub const RADAR_RADIUS_METERS: u32 = 805;

pub fn radar_search_url(lat: f64, lng: f64, api_key: &str) -> String {
    format!(
        "https://maps.googleapis.com/maps/api/place/radarsearch/json?location={},{}&radius={}&types=restaurant&key={}",
        lat, lng, RADAR_RADIUS_METERS, api_key
    )
}

pub fn place_details_url(place_id: &str, api_key: &str) -> String {
    format!(
        "https://maps.googleapis.com/maps/api/place/details/json?placeid={}&key={}",
        place_id, api_key
    )
}

#[derive(Debug, Deserialize)]
pub struct RadarSearchResponse {
    #[serde(default)]
    pub results: Vec<RadarResult>,
}

#[derive(Debug, Deserialize)]
pub struct RadarResult {
    pub place_id: Option<String>,
}

impl RadarSearchResponse {
    /// Place ids carried by the search results, skipping entries without one.
    pub fn place_ids(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter_map(|result| result.place_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaceDetailsResponse {
    pub result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceDetails {
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    pub formatted_address: Option<String>,
    pub website: Option<String>,
    pub formatted_phone_number: Option<String>,
    pub opening_hours: Option<OpeningHours>,
    pub rating: Option<f64>,
    pub geometry: Geometry,
    pub price_level: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: Location,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl PlaceDetails {
    /// Fold the details into the persisted record shape. Optional text
    /// fields normalize empty provider values to None.
    pub fn to_record(&self, fs_venue_id: Option<String>) -> VenueRecord {
        let hours = self
            .opening_hours
            .as_ref()
            .filter(|hours| !hours.weekday_text.is_empty())
            .and_then(|hours| serde_json::to_string(&hours.weekday_text).ok());

        VenueRecord {
            place_id: self.place_id.clone(),
            name: self.name.clone(),
            lat: self.geometry.location.lat,
            lng: self.geometry.location.lng,
            hours,
            rating: self.rating,
            phone_number: none_if_empty(self.formatted_phone_number.clone()),
            address: none_if_empty(self.formatted_address.clone()),
            website: none_if_empty(self.website.clone()),
            price: self.price_level,
            fs_venue_id: none_if_empty(fs_venue_id),
            happy_hour: None,
            category: None,
        }
    }
}
