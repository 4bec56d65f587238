//! Menu → happy-hour extraction: the terminal stage. A mention updates
//! the record; silence deletes it.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::client::RateLimitedClient;
use crate::error::PipelineError;
use crate::providers::foursquare::MenuResponse;
use crate::store::VenueStore;
use crate::types::MenuRequest;
use crate::worker::{OutboundMessage, StageHandler};

pub struct HappyHourExtractHandler {
    foursquare: Arc<RateLimitedClient>,
    store: Arc<dyn VenueStore>,
}

impl HappyHourExtractHandler {
    pub fn new(foursquare: Arc<RateLimitedClient>, store: Arc<dyn VenueStore>) -> Self {
        Self { foursquare, store }
    }
}

#[async_trait]
impl StageHandler for HappyHourExtractHandler {
    fn stage_name(&self) -> &'static str {
        "happy-hour-extract"
    }

    async fn handle(&self, body: &str) -> Result<Vec<OutboundMessage>, PipelineError> {
        let request: MenuRequest = serde_json::from_str(body)?;
        let menu: MenuResponse = self.foursquare.get_json(&request.url).await?;

        match menu.happy_hour() {
            Some(text) => {
                self.store
                    .set_happy_hour(&request.fs_venue_id, &text, request.category.as_deref())
                    .await?;
                info!(fs_venue_id = %request.fs_venue_id, "happy hour recorded");
            }
            None => {
                self.store.delete_by_venue_id(&request.fs_venue_id).await?;
                info!(fs_venue_id = %request.fs_venue_id, "no happy hour mention; venue removed");
            }
        }
        Ok(Vec::new())
    }
}
