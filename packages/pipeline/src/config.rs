use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::credentials::Credential;

/// Worker configuration loaded from environment variables.
///
/// Secrets are read once at process start; workers hold them for their
/// whole lifetime and never refresh them.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub nats_url: String,
    pub google_api_key: String,
    /// Venue-provider credential pairs, in rotation order. The primary
    /// pair is required; a secondary pair is added when present so
    /// requests spread across both quota buckets.
    pub foursquare_credentials: Vec<Credential>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut foursquare_credentials = vec![Credential {
            client_id: env::var("FOURSQUARE_CLIENT_ID")
                .context("FOURSQUARE_CLIENT_ID must be set")?,
            client_secret: env::var("FOURSQUARE_CLIENT_SECRET")
                .context("FOURSQUARE_CLIENT_SECRET must be set")?,
        }];

        if let (Ok(client_id), Ok(client_secret)) = (
            env::var("SECONDARY_FOURSQUARE_CLIENT_ID"),
            env::var("SECONDARY_FOURSQUARE_CLIENT_SECRET"),
        ) {
            foursquare_credentials.push(Credential {
                client_id,
                client_secret,
            });
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            nats_url: env::var("NATS_URL")
                .unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            google_api_key: env::var("GOOGLE_API_KEY").context("GOOGLE_API_KEY must be set")?,
            foursquare_credentials,
        })
    }
}
