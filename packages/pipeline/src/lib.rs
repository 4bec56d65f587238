pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod grid;
pub mod http;
pub mod providers;
pub mod queue;
pub mod stages;
pub mod store;
pub mod types;
pub mod worker;

// Re-exports for clean API
pub use client::{JsonClient, RateLimitPolicy, RateLimitedClient};
pub use config::Config;
pub use credentials::{Credential, CredentialRotator};
pub use error::{FailureKind, PipelineError};
pub use http::{HttpFetch, HttpResponse, ReqwestFetcher};
pub use queue::{DeleteConfirmation, Delivery, JetStreamBroker, MemoryBroker, MessageBroker};
pub use stages::Stage;
pub use store::{InsertOutcome, MemoryVenueStore, PostgresVenueStore, VenueStore};
pub use types::{GridBounds, MenuRequest, VenueMatch, VenueRecord};
pub use worker::{OutboundMessage, StageHandler, Worker};
