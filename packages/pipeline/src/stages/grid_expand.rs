//! Grid expansion: one bounding box in, one radar-search request per
//! grid cell out.

use async_trait::async_trait;
use tracing::info;

use super::RADAR_SEARCH_QUEUE;
use crate::error::PipelineError;
use crate::grid::grid_cells;
use crate::providers::google;
use crate::types::GridBounds;
use crate::worker::{OutboundMessage, StageHandler};

pub struct GridExpandHandler {
    google_api_key: String,
}

impl GridExpandHandler {
    pub fn new(google_api_key: impl Into<String>) -> Self {
        Self {
            google_api_key: google_api_key.into(),
        }
    }
}

#[async_trait]
impl StageHandler for GridExpandHandler {
    fn stage_name(&self) -> &'static str {
        "grid-expand"
    }

    async fn handle(&self, body: &str) -> Result<Vec<OutboundMessage>, PipelineError> {
        let bounds: GridBounds = serde_json::from_str(body)?;
        let cells = grid_cells(&bounds);
        info!(cells = cells.len(), "expanding bounds into a search grid");

        Ok(cells
            .into_iter()
            .map(|(lat, lng)| {
                OutboundMessage::new(
                    RADAR_SEARCH_QUEUE,
                    google::radar_search_url(lat, lng, &self.google_api_key),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_one_search_url_per_cell() {
        let handler = GridExpandHandler::new("test-key");
        let body = r#"{"start_lat": 0.0, "start_lng": 0.0, "end_lat": 0.01, "end_lng": 0.01}"#;

        let outbound = handler.handle(body).await.unwrap();

        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].queue, RADAR_SEARCH_QUEUE);
        assert!(outbound[0].body.contains("location=0,0"));
        assert!(outbound[0].body.contains("radius=805"));
        assert!(outbound[0].body.contains("key=test-key"));
    }

    #[tokio::test]
    async fn malformed_bounds_are_a_decode_error() {
        let handler = GridExpandHandler::new("test-key");

        let result = handler.handle("not json").await;

        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }
}
