//! Stage wiring: queue names, poll cadence, and the five handlers.

mod grid_expand;
mod happy_hour;
mod menu_fetch;
mod place_match;
mod radar_fanout;

pub use grid_expand::GridExpandHandler;
pub use happy_hour::HappyHourExtractHandler;
pub use menu_fetch::MenuFetchHandler;
pub use place_match::PlaceMatchHandler;
pub use radar_fanout::RadarFanOutHandler;

use std::time::Duration;

pub const LAT_LNG_QUEUE: &str = "lat_lng_queue";
pub const RADAR_SEARCH_QUEUE: &str = "radar_search_queue";
pub const GOOGLE_PLACES_QUEUE: &str = "google_places_queue";
pub const FS_DETAILS_QUEUE: &str = "fs_details_queue";
pub const FS_MENU_DETAILS_QUEUE: &str = "fs_menu_details_queue";

/// The five pipeline stages, in data-flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GridExpand,
    RadarFanOut,
    PlaceMatch,
    MenuFetch,
    HappyHourExtract,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::GridExpand,
        Stage::RadarFanOut,
        Stage::PlaceMatch,
        Stage::MenuFetch,
        Stage::HappyHourExtract,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::GridExpand => "grid-expand",
            Stage::RadarFanOut => "radar-fanout",
            Stage::PlaceMatch => "place-match",
            Stage::MenuFetch => "menu-fetch",
            Stage::HappyHourExtract => "happy-hour-extract",
        }
    }

    pub fn inbound_queue(&self) -> &'static str {
        match self {
            Stage::GridExpand => LAT_LNG_QUEUE,
            Stage::RadarFanOut => RADAR_SEARCH_QUEUE,
            Stage::PlaceMatch => GOOGLE_PLACES_QUEUE,
            Stage::MenuFetch => FS_DETAILS_QUEUE,
            Stage::HappyHourExtract => FS_MENU_DETAILS_QUEUE,
        }
    }

    pub fn outbound_queue(&self) -> Option<&'static str> {
        match self {
            Stage::GridExpand => Some(RADAR_SEARCH_QUEUE),
            Stage::RadarFanOut => Some(GOOGLE_PLACES_QUEUE),
            Stage::PlaceMatch => Some(FS_DETAILS_QUEUE),
            Stage::MenuFetch => Some(FS_MENU_DETAILS_QUEUE),
            Stage::HappyHourExtract => None,
        }
    }

    /// Sleep between empty polls. Bounds messages arrive rarely, so the
    /// grid stage polls at a slower cadence than the fetch-heavy stages.
    pub fn poll_interval(&self) -> Duration {
        match self {
            Stage::GridExpand => Duration::from_secs(30),
            _ => Duration::from_secs(5),
        }
    }
}
