//! Place details → venue match: persist the venue keyed by place id and
//! hand matched venues to the menu stages.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::FS_DETAILS_QUEUE;
use crate::client::{JsonClient, RateLimitedClient};
use crate::error::PipelineError;
use crate::providers::foursquare::{self, VenueSearchResponse};
use crate::providers::google::PlaceDetailsResponse;
use crate::store::{InsertOutcome, VenueStore};
use crate::types::VenueMatch;
use crate::worker::{OutboundMessage, StageHandler};

pub struct PlaceMatchHandler {
    google: JsonClient,
    foursquare: Arc<RateLimitedClient>,
    store: Arc<dyn VenueStore>,
}

impl PlaceMatchHandler {
    pub fn new(
        google: JsonClient,
        foursquare: Arc<RateLimitedClient>,
        store: Arc<dyn VenueStore>,
    ) -> Self {
        Self {
            google,
            foursquare,
            store,
        }
    }
}

#[async_trait]
impl StageHandler for PlaceMatchHandler {
    fn stage_name(&self) -> &'static str {
        "place-match"
    }

    async fn handle(&self, body: &str) -> Result<Vec<OutboundMessage>, PipelineError> {
        let details: PlaceDetailsResponse = self.google.get_json(body.trim()).await?;
        let Some(place) = details.result else {
            return Err(PipelineError::Payload(
                "place details response carried no result".to_string(),
            ));
        };

        let search_url = foursquare::venue_search_url(
            place.geometry.location.lat,
            place.geometry.location.lng,
            &place.name,
        );
        let search: VenueSearchResponse = self.foursquare.get_json(&search_url).await?;
        let matched = search.first_venue();

        let record = place.to_record(matched.map(|venue| venue.id.clone()));
        match self.store.insert(&record).await? {
            InsertOutcome::Inserted => {
                info!(place_id = %record.place_id, name = %record.name, "venue recorded");
            }
            InsertOutcome::DuplicateIgnored => {
                // Overlapping grid cells rediscover places; not an error.
                info!(place_id = %record.place_id, "venue already recorded, insert skipped");
            }
        }

        Ok(match matched {
            Some(venue) => {
                let payload = serde_json::to_string(&VenueMatch {
                    fs_venue_id: venue.id.clone(),
                    category: venue.category(),
                })?;
                vec![OutboundMessage::new(FS_DETAILS_QUEUE, payload)]
            }
            None => {
                info!(place_id = %record.place_id, "no venue match; menu stages skipped");
                Vec::new()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RateLimitPolicy;
    use crate::credentials::{Credential, CredentialRotator};
    use crate::http::{HttpFetch, HttpResponse};
    use crate::store::MemoryVenueStore;

    /// Serves canned bodies keyed by URL prefix.
    struct RoutedFetcher {
        routes: Vec<(String, String)>,
    }

    #[async_trait]
    impl HttpFetch for RoutedFetcher {
        async fn get(&self, url: &str) -> Result<HttpResponse, PipelineError> {
            let body = self
                .routes
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix.as_str()))
                .map(|(_, body)| body.clone())
                .unwrap_or_else(|| panic!("unrouted url: {url}"));
            Ok(HttpResponse {
                status: 200,
                rate_limit_reset: None,
                body,
            })
        }
    }

    const DETAILS_BODY: &str = r#"{"result": {
        "place_id": "p1",
        "name": "Lakeside Tavern",
        "geometry": {"location": {"lat": 44.98, "lng": -93.27}}
    }}"#;

    fn handler(routes: Vec<(&str, &str)>, store: Arc<MemoryVenueStore>) -> PlaceMatchHandler {
        let fetcher = Arc::new(RoutedFetcher {
            routes: routes
                .into_iter()
                .map(|(p, b)| (p.to_string(), b.to_string()))
                .collect(),
        });
        let rotator = CredentialRotator::new(vec![Credential {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }]);
        PlaceMatchHandler::new(
            JsonClient::new(fetcher.clone()),
            Arc::new(RateLimitedClient::new(
                fetcher,
                rotator,
                RateLimitPolicy::RotateCredential,
                foursquare::API_VERSION,
            )),
            store,
        )
    }

    #[tokio::test]
    async fn matched_venues_are_stored_and_forwarded() {
        let store = Arc::new(MemoryVenueStore::new());
        let handler = handler(
            vec![
                ("https://maps.googleapis.com/", DETAILS_BODY),
                (
                    "https://api.foursquare.com/",
                    r#"{"response": {"venues": [{"id": "v1", "categories": [{"shortName": "Bar"}]}]}}"#,
                ),
            ],
            store.clone(),
        );

        let outbound = handler
            .handle("https://maps.googleapis.com/maps/api/place/details/json?placeid=p1&key=k")
            .await
            .unwrap();

        let record = store.get("p1").unwrap();
        assert_eq!(record.fs_venue_id.as_deref(), Some("v1"));

        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].queue, FS_DETAILS_QUEUE);
        let payload: VenueMatch = serde_json::from_str(&outbound[0].body).unwrap();
        assert_eq!(payload.fs_venue_id, "v1");
        assert_eq!(payload.category.as_deref(), Some("Bar"));
    }

    #[tokio::test]
    async fn unmatched_venues_are_stored_without_forwarding() {
        let store = Arc::new(MemoryVenueStore::new());
        let handler = handler(
            vec![
                ("https://maps.googleapis.com/", DETAILS_BODY),
                ("https://api.foursquare.com/", r#"{"response": {"venues": []}}"#),
            ],
            store.clone(),
        );

        let outbound = handler
            .handle("https://maps.googleapis.com/maps/api/place/details/json?placeid=p1&key=k")
            .await
            .unwrap();

        assert!(outbound.is_empty());
        let record = store.get("p1").unwrap();
        assert_eq!(record.fs_venue_id, None);
    }

    #[tokio::test]
    async fn redelivery_converges_to_one_row() {
        let store = Arc::new(MemoryVenueStore::new());
        let handler = handler(
            vec![
                ("https://maps.googleapis.com/", DETAILS_BODY),
                (
                    "https://api.foursquare.com/",
                    r#"{"response": {"venues": [{"id": "v1", "categories": []}]}}"#,
                ),
            ],
            store.clone(),
        );
        let url = "https://maps.googleapis.com/maps/api/place/details/json?placeid=p1&key=k";

        let first = handler.handle(url).await.unwrap();
        let second = handler.handle(url).await.unwrap();

        assert_eq!(store.len(), 1);
        // Redelivery re-emits the same downstream message; downstream
        // idempotence absorbs it.
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_result_is_a_fatal_payload_error() {
        let store = Arc::new(MemoryVenueStore::new());
        let handler = handler(
            vec![("https://maps.googleapis.com/", r#"{"status": "NOT_FOUND"}"#)],
            store.clone(),
        );

        let result = handler
            .handle("https://maps.googleapis.com/maps/api/place/details/json?placeid=p1&key=k")
            .await;

        assert!(matches!(result, Err(PipelineError::Payload(_))));
        assert!(store.is_empty());
    }
}
