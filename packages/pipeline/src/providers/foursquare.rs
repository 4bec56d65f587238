//! Venue provider: venue match by name+coordinates, and venue menus.

use serde::Deserialize;

use crate::types::none_if_empty;

/// API version pinned by every request to the venue provider.
pub const API_VERSION: &str = "20170109";

/// Sentinel recorded when the only happy-hour signal is an item name,
/// which carries no usable description text.
pub const HAPPY_HOUR_FALLBACK: &str = "Not Available";

/// Match a venue by name and coordinates. Credentials are appended by the
/// rate-limited client, not embedded here.
pub fn venue_search_url(lat: f64, lng: f64, name: &str) -> String {
    format!(
        "https://api.foursquare.com/v2/venues/search?intent=match&ll={},{}&query={}",
        lat,
        lng,
        urlencoding::encode(name)
    )
}

pub fn venue_menu_url(venue_id: &str) -> String {
    format!("https://api.foursquare.com/v2/venues/{}/menu", venue_id)
}

#[derive(Debug, Deserialize)]
pub struct VenueSearchResponse {
    #[serde(default)]
    pub response: VenueSearchBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct VenueSearchBody {
    #[serde(default)]
    pub venues: Vec<Venue>,
}

#[derive(Debug, Deserialize)]
pub struct Venue {
    pub id: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, rename = "hasMenu")]
    pub has_menu: bool,
}

#[derive(Debug, Deserialize)]
pub struct Category {
    #[serde(default, rename = "shortName")]
    pub short_name: String,
}

impl VenueSearchResponse {
    /// The best match, when the provider found one.
    pub fn first_venue(&self) -> Option<&Venue> {
        self.response.venues.first()
    }
}

impl Venue {
    pub fn category(&self) -> Option<String> {
        none_if_empty(self.categories.first().map(|c| c.short_name.clone()))
    }
}

#[derive(Debug, Deserialize)]
pub struct MenuResponse {
    #[serde(default)]
    pub response: MenuBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuBody {
    #[serde(default)]
    pub menu: MenuContainer,
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuContainer {
    #[serde(default)]
    pub menus: SectionList,
}

#[derive(Debug, Default, Deserialize)]
pub struct SectionList {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub items: Vec<MenuSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entries: EntryList,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryList {
    #[serde(default)]
    pub items: Vec<MenuEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuEntry {
    #[serde(default)]
    pub name: String,
}

impl MenuResponse {
    pub fn has_menu(&self) -> bool {
        let menus = &self.response.menu.menus;
        menus.count > 0 || !menus.items.is_empty()
    }

    /// Scan menu sections for a happy-hour mention.
    ///
    /// The first section whose name or description contains "happy"
    /// (case-insensitive, equal priority) wins and its description is the
    /// extracted text. Only when no section matches anywhere does an item
    /// name count, and then only as the [`HAPPY_HOUR_FALLBACK`] sentinel.
    pub fn happy_hour(&self) -> Option<String> {
        let sections = &self.response.menu.menus.items;

        for section in sections {
            if contains_happy(&section.name) || contains_happy(&section.description) {
                return Some(section.description.clone());
            }
        }

        for section in sections {
            if section
                .entries
                .items
                .iter()
                .any(|entry| contains_happy(&entry.name))
            {
                return Some(HAPPY_HOUR_FALLBACK.to_string());
            }
        }

        None
    }
}

fn contains_happy(text: &str) -> bool {
    text.to_lowercase().contains("happy")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_search_url_encodes_the_name() {
        let url = venue_search_url(44.98, -93.27, "Joe & Vinny's");
        assert!(url.contains("ll=44.98,-93.27"));
        assert!(url.contains("query=Joe%20%26%20Vinny%27s"));
        assert!(!url.contains("client_id"));
    }

    #[test]
    fn first_venue_and_category() {
        let response: VenueSearchResponse = serde_json::from_str(
            r#"{"response": {"venues": [
                {"id": "v1", "categories": [{"shortName": "Bar"}], "hasMenu": true},
                {"id": "v2", "categories": []}
            ]}}"#,
        )
        .unwrap();

        let venue = response.first_venue().unwrap();
        assert_eq!(venue.id, "v1");
        assert!(venue.has_menu);
        assert_eq!(venue.category().as_deref(), Some("Bar"));
    }

    #[test]
    fn empty_search_response_has_no_venue() {
        let response: VenueSearchResponse = serde_json::from_str(r#"{"response": {}}"#).unwrap();
        assert!(response.first_venue().is_none());
    }

    fn menu(json: &str) -> MenuResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn section_match_beats_item_match() {
        let response = menu(
            r#"{"response": {"menu": {"menus": {"count": 2, "items": [
                {"name": "Entrees", "description": "", "entries": {"items": [{"name": "Happy Camper Burger"}]}},
                {"name": "Drinks", "description": "happy hour 4-6pm", "entries": {"items": []}}
            ]}}}}"#,
        );

        assert_eq!(response.happy_hour().as_deref(), Some("happy hour 4-6pm"));
    }

    #[test]
    fn section_name_match_returns_its_description() {
        let response = menu(
            r#"{"response": {"menu": {"menus": {"count": 1, "items": [
                {"name": "Happy Hour", "description": "half-price apps weekdays", "entries": {"items": []}}
            ]}}}}"#,
        );

        assert_eq!(
            response.happy_hour().as_deref(),
            Some("half-price apps weekdays")
        );
    }

    #[test]
    fn first_matching_section_wins_in_encounter_order() {
        let response = menu(
            r#"{"response": {"menu": {"menus": {"count": 2, "items": [
                {"name": "Happy Hour", "description": "first", "entries": {"items": []}},
                {"name": "Also Happy", "description": "second", "entries": {"items": []}}
            ]}}}}"#,
        );

        assert_eq!(response.happy_hour().as_deref(), Some("first"));
    }

    #[test]
    fn item_only_match_yields_the_sentinel() {
        let response = menu(
            r#"{"response": {"menu": {"menus": {"count": 1, "items": [
                {"name": "Specials", "description": "daily deals", "entries": {"items": [{"name": "Happy Hour Special"}]}}
            ]}}}}"#,
        );

        assert_eq!(response.happy_hour().as_deref(), Some(HAPPY_HOUR_FALLBACK));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let response = menu(
            r#"{"response": {"menu": {"menus": {"count": 1, "items": [
                {"name": "HAPPY endings", "description": "dessert flights", "entries": {"items": []}}
            ]}}}}"#,
        );

        assert_eq!(response.happy_hour().as_deref(), Some("dessert flights"));
    }

    #[test]
    fn no_mention_anywhere_yields_none() {
        let response = menu(
            r#"{"response": {"menu": {"menus": {"count": 1, "items": [
                {"name": "Dinner", "description": "entrees and sides", "entries": {"items": [{"name": "Burger"}]}}
            ]}}}}"#,
        );

        assert_eq!(response.happy_hour(), None);
    }

    #[test]
    fn menu_presence() {
        assert!(!menu(r#"{"response": {}}"#).has_menu());
        assert!(!menu(r#"{"response": {"menu": {"menus": {"count": 0, "items": []}}}}"#).has_menu());
        assert!(menu(
            r#"{"response": {"menu": {"menus": {"count": 1, "items": [{"name": "Dinner"}]}}}}"#
        )
        .has_menu());
    }
}
