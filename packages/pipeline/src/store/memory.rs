//! In-memory store for tests. Mirrors the relational semantics: unique
//! place id, venue-id keyed updates and deletes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{InsertOutcome, VenueStore};
use crate::error::PipelineError;
use crate::types::VenueRecord;

#[derive(Debug, Default)]
pub struct MemoryVenueStore {
    rows: Mutex<HashMap<String, VenueRecord>>,
}

impl MemoryVenueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, place_id: &str) -> Option<VenueRecord> {
        self.lock().get(place_id).cloned()
    }

    pub fn find_by_venue_id(&self, fs_venue_id: &str) -> Option<VenueRecord> {
        self.lock()
            .values()
            .find(|record| record.fs_venue_id.as_deref() == Some(fs_venue_id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, VenueRecord>> {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl VenueStore for MemoryVenueStore {
    async fn insert(&self, record: &VenueRecord) -> Result<InsertOutcome, PipelineError> {
        let mut rows = self.lock();
        if rows.contains_key(&record.place_id) {
            return Ok(InsertOutcome::DuplicateIgnored);
        }
        rows.insert(record.place_id.clone(), record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn set_happy_hour(
        &self,
        fs_venue_id: &str,
        happy_hour: &str,
        category: Option<&str>,
    ) -> Result<(), PipelineError> {
        let mut rows = self.lock();
        for record in rows.values_mut() {
            if record.fs_venue_id.as_deref() == Some(fs_venue_id) {
                record.happy_hour = Some(happy_hour.to_string());
                record.category = category.map(|c| c.to_string());
            }
        }
        Ok(())
    }

    async fn delete_by_venue_id(&self, fs_venue_id: &str) -> Result<(), PipelineError> {
        self.lock()
            .retain(|_, record| record.fs_venue_id.as_deref() != Some(fs_venue_id));
        Ok(())
    }
}
