//! Venue → menu fetch: venues without a menu are removed; the rest move
//! on to happy-hour extraction.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::FS_MENU_DETAILS_QUEUE;
use crate::client::RateLimitedClient;
use crate::error::PipelineError;
use crate::providers::foursquare::{self, MenuResponse, VenueSearchResponse};
use crate::store::VenueStore;
use crate::types::{MenuRequest, VenueMatch};
use crate::worker::{OutboundMessage, StageHandler};

pub struct MenuFetchHandler {
    foursquare: Arc<RateLimitedClient>,
    store: Arc<dyn VenueStore>,
}

impl MenuFetchHandler {
    pub fn new(foursquare: Arc<RateLimitedClient>, store: Arc<dyn VenueStore>) -> Self {
        Self { foursquare, store }
    }

    async fn forward_or_delete(
        &self,
        fs_venue_id: &str,
        category: Option<String>,
        has_menu: bool,
    ) -> Result<Vec<OutboundMessage>, PipelineError> {
        if !has_menu {
            // No menu means happy-hour status can never be determined;
            // absence of the signal removes the record.
            self.store.delete_by_venue_id(fs_venue_id).await?;
            info!(fs_venue_id, "no menu; venue removed");
            return Ok(Vec::new());
        }

        let payload = serde_json::to_string(&MenuRequest {
            url: foursquare::venue_menu_url(fs_venue_id),
            fs_venue_id: fs_venue_id.to_string(),
            category,
        })?;
        Ok(vec![OutboundMessage::new(FS_MENU_DETAILS_QUEUE, payload)])
    }
}

#[async_trait]
impl StageHandler for MenuFetchHandler {
    fn stage_name(&self) -> &'static str {
        "menu-fetch"
    }

    /// Accepts the JSON `{fs_venue_id, category}` shape and, for messages
    /// produced by earlier revisions of the matching stage, a bare
    /// venue-search URL.
    async fn handle(&self, body: &str) -> Result<Vec<OutboundMessage>, PipelineError> {
        let trimmed = body.trim();

        if trimmed.starts_with('{') {
            let request: VenueMatch = serde_json::from_str(trimmed)?;
            let menu: MenuResponse = self
                .foursquare
                .get_json(&foursquare::venue_menu_url(&request.fs_venue_id))
                .await?;
            return self
                .forward_or_delete(&request.fs_venue_id, request.category, menu.has_menu())
                .await;
        }

        let search: VenueSearchResponse = self.foursquare.get_json(trimmed).await?;
        let Some(venue) = search.first_venue() else {
            info!("venue search returned nothing; no record to act on");
            return Ok(Vec::new());
        };
        self.forward_or_delete(&venue.id, venue.category(), venue.has_menu)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RateLimitPolicy;
    use crate::credentials::{Credential, CredentialRotator};
    use crate::http::{HttpFetch, HttpResponse};
    use crate::store::{MemoryVenueStore, VenueStore};
    use crate::types::VenueRecord;

    struct OneShotFetcher {
        body: String,
    }

    #[async_trait]
    impl HttpFetch for OneShotFetcher {
        async fn get(&self, _url: &str) -> Result<HttpResponse, PipelineError> {
            Ok(HttpResponse {
                status: 200,
                rate_limit_reset: None,
                body: self.body.clone(),
            })
        }
    }

    fn handler(response_body: &str, store: Arc<MemoryVenueStore>) -> MenuFetchHandler {
        let rotator = CredentialRotator::new(vec![Credential {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }]);
        MenuFetchHandler::new(
            Arc::new(RateLimitedClient::new(
                Arc::new(OneShotFetcher {
                    body: response_body.to_string(),
                }),
                rotator,
                RateLimitPolicy::RotateCredential,
                foursquare::API_VERSION,
            )),
            store,
        )
    }

    async fn seeded_store(fs_venue_id: &str) -> Arc<MemoryVenueStore> {
        let store = Arc::new(MemoryVenueStore::new());
        store
            .insert(&VenueRecord {
                place_id: "p1".to_string(),
                name: "Lakeside Tavern".to_string(),
                lat: 44.98,
                lng: -93.27,
                hours: None,
                rating: None,
                phone_number: None,
                address: None,
                website: None,
                price: None,
                fs_venue_id: Some(fs_venue_id.to_string()),
                happy_hour: None,
                category: None,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn venues_with_menus_move_to_extraction() {
        let store = seeded_store("v1").await;
        let handler = handler(
            r#"{"response": {"menu": {"menus": {"count": 1, "items": [{"name": "Dinner"}]}}}}"#,
            store.clone(),
        );

        let outbound = handler
            .handle(r#"{"fs_venue_id": "v1", "category": "Bar"}"#)
            .await
            .unwrap();

        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].queue, FS_MENU_DETAILS_QUEUE);
        let request: MenuRequest = serde_json::from_str(&outbound[0].body).unwrap();
        assert_eq!(request.fs_venue_id, "v1");
        assert_eq!(request.category.as_deref(), Some("Bar"));
        assert!(request.url.contains("/venues/v1/menu"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn venues_without_menus_are_deleted() {
        let store = seeded_store("v1").await;
        let handler = handler(r#"{"response": {"menu": {"menus": {"count": 0, "items": []}}}}"#, store.clone());

        let outbound = handler
            .handle(r#"{"fs_venue_id": "v1", "category": null}"#)
            .await
            .unwrap();

        assert!(outbound.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn legacy_bare_url_messages_still_work() {
        let store = seeded_store("v1").await;
        let handler = handler(
            r#"{"response": {"venues": [{"id": "v1", "categories": [{"shortName": "Pub"}], "hasMenu": true}]}}"#,
            store.clone(),
        );

        let outbound = handler
            .handle("https://api.foursquare.com/v2/venues/search?intent=match&ll=44.98,-93.27&query=tavern")
            .await
            .unwrap();

        assert_eq!(outbound.len(), 1);
        let request: MenuRequest = serde_json::from_str(&outbound[0].body).unwrap();
        assert_eq!(request.fs_venue_id, "v1");
        assert_eq!(request.category.as_deref(), Some("Pub"));
    }

    #[tokio::test]
    async fn legacy_message_without_menu_deletes_the_venue() {
        let store = seeded_store("v1").await;
        let handler = handler(
            r#"{"response": {"venues": [{"id": "v1", "categories": []}]}}"#,
            store.clone(),
        );

        let outbound = handler
            .handle("https://api.foursquare.com/v2/venues/search?intent=match&ll=44.98,-93.27&query=tavern")
            .await
            .unwrap();

        assert!(outbound.is_empty());
        assert!(store.is_empty());
    }
}
