use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{InsertOutcome, VenueStore};
use crate::error::PipelineError;
use crate::types::VenueRecord;

pub struct PostgresVenueStore {
    pool: PgPool,
}

impl PostgresVenueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VenueStore for PostgresVenueStore {
    async fn insert(&self, record: &VenueRecord) -> Result<InsertOutcome, PipelineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO venues (
                place_id, name, lat, lng, hours, rating, phone_number,
                address, website, price, fs_venue_id, happy_hour, category
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (place_id) DO NOTHING
            "#,
        )
        .bind(&record.place_id)
        .bind(&record.name)
        .bind(record.lat)
        .bind(record.lng)
        .bind(&record.hours)
        .bind(record.rating)
        .bind(&record.phone_number)
        .bind(&record.address)
        .bind(&record.website)
        .bind(record.price)
        .bind(&record.fs_venue_id)
        .bind(&record.happy_hour)
        .bind(&record.category)
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() == 0 {
            InsertOutcome::DuplicateIgnored
        } else {
            InsertOutcome::Inserted
        })
    }

    async fn set_happy_hour(
        &self,
        fs_venue_id: &str,
        happy_hour: &str,
        category: Option<&str>,
    ) -> Result<(), PipelineError> {
        let result = sqlx::query(
            r#"
            UPDATE venues
            SET happy_hour = $2, category = $3
            WHERE fs_venue_id = $1
            "#,
        )
        .bind(fs_venue_id)
        .bind(happy_hour)
        .bind(category)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(fs_venue_id, "happy-hour update matched no venue");
        }
        Ok(())
    }

    async fn delete_by_venue_id(&self, fs_venue_id: &str) -> Result<(), PipelineError> {
        let result = sqlx::query("DELETE FROM venues WHERE fs_venue_id = $1")
            .bind(fs_venue_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!(fs_venue_id, "delete matched no venue");
        }
        Ok(())
    }
}
