//! Radar-search fan-out: fetch one search result page, emit one
//! place-details request per discovered place.

use async_trait::async_trait;
use tracing::info;

use super::GOOGLE_PLACES_QUEUE;
use crate::client::JsonClient;
use crate::error::PipelineError;
use crate::providers::google::{self, RadarSearchResponse};
use crate::worker::{OutboundMessage, StageHandler};

pub struct RadarFanOutHandler {
    client: JsonClient,
    google_api_key: String,
}

impl RadarFanOutHandler {
    pub fn new(client: JsonClient, google_api_key: impl Into<String>) -> Self {
        Self {
            client,
            google_api_key: google_api_key.into(),
        }
    }
}

#[async_trait]
impl StageHandler for RadarFanOutHandler {
    fn stage_name(&self) -> &'static str {
        "radar-fanout"
    }

    async fn handle(&self, body: &str) -> Result<Vec<OutboundMessage>, PipelineError> {
        let search: RadarSearchResponse = self.client.get_json(body.trim()).await?;

        let outbound: Vec<OutboundMessage> = search
            .place_ids()
            .map(|place_id| {
                OutboundMessage::new(
                    GOOGLE_PLACES_QUEUE,
                    google::place_details_url(place_id, &self.google_api_key),
                )
            })
            .collect();

        info!(places = outbound.len(), "radar search fanned out");
        Ok(outbound)
    }
}
