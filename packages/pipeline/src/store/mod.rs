//! Venue persistence.
//!
//! Three idempotent operations keyed by the natural keys: insert by place
//! id (conflicts leave the existing row untouched), update and delete by
//! venue id (no-ops when absent). Idempotence here is what makes
//! at-least-once delivery safe.

mod memory;
mod postgres;

pub use memory::MemoryVenueStore;
pub use postgres::PostgresVenueStore;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::types::VenueRecord;

/// Result of an insert attempt against the natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with this place id already exists; nothing was written.
    /// Expected under overlapping grid cells and message redelivery.
    DuplicateIgnored,
}

#[async_trait]
pub trait VenueStore: Send + Sync {
    async fn insert(&self, record: &VenueRecord) -> Result<InsertOutcome, PipelineError>;

    /// Update happy-hour fields by venue id; no-op when the venue is absent.
    async fn set_happy_hour(
        &self,
        fs_venue_id: &str,
        happy_hour: &str,
        category: Option<&str>,
    ) -> Result<(), PipelineError>;

    /// Delete by venue id; no-op when absent.
    async fn delete_by_venue_id(&self, fs_venue_id: &str) -> Result<(), PipelineError>;
}
