//! Pipeline worker entry point.
//!
//! `worker run <stage>` starts one stage worker process; run several (and
//! several instances of the fetch-heavy stages) for throughput. `worker
//! seed` publishes a bounding box to boot the pipeline for a city.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipeline::client::{JsonClient, RateLimitPolicy, RateLimitedClient};
use pipeline::providers::foursquare;
use pipeline::stages::{
    GridExpandHandler, HappyHourExtractHandler, MenuFetchHandler, PlaceMatchHandler,
    RadarFanOutHandler, LAT_LNG_QUEUE,
};
use pipeline::worker::StageHandler;
use pipeline::{
    Config, CredentialRotator, GridBounds, HttpFetch, JetStreamBroker, MessageBroker,
    PostgresVenueStore, ReqwestFetcher, Stage, VenueStore, Worker,
};

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Happy-hour venue discovery pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one stage worker until terminated
    Run {
        /// Pipeline stage to run
        #[arg(value_enum)]
        stage: StageArg,
    },

    /// Publish a bounding box to the grid-expansion queue
    Seed {
        #[arg(long)]
        start_lat: f64,
        #[arg(long)]
        start_lng: f64,
        #[arg(long)]
        end_lat: f64,
        #[arg(long)]
        end_lng: f64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StageArg {
    GridExpand,
    RadarFanout,
    PlaceMatch,
    MenuFetch,
    HappyHourExtract,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::GridExpand => Stage::GridExpand,
            StageArg::RadarFanout => Stage::RadarFanOut,
            StageArg::PlaceMatch => Stage::PlaceMatch,
            StageArg::MenuFetch => Stage::MenuFetch,
            StageArg::HappyHourExtract => Stage::HappyHourExtract,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before the log filter reads RUST_LOG.
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pipeline=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Run { stage } => run_stage(config, stage.into()).await,
        Commands::Seed {
            start_lat,
            start_lng,
            end_lat,
            end_lng,
        } => {
            seed(
                config,
                GridBounds {
                    start_lat,
                    start_lng,
                    end_lat,
                    end_lng,
                },
            )
            .await
        }
    }
}

async fn run_stage(config: Config, stage: Stage) -> Result<()> {
    tracing::info!(stage = stage.name(), "starting pipeline worker");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let broker = JetStreamBroker::connect(&config.nats_url)
        .await
        .context("Failed to connect to message broker")?;
    broker.provision(stage.inbound_queue()).await?;
    if let Some(outbound) = stage.outbound_queue() {
        broker.provision(outbound).await?;
    }

    let store = Arc::new(PostgresVenueStore::new(pool));
    let fetcher = Arc::new(ReqwestFetcher::new());
    let handler = build_handler(stage, &config, fetcher, store);

    let worker = Worker::new(
        Arc::new(broker),
        handler,
        stage.inbound_queue(),
        stage.poll_interval(),
    );
    // Only an unrecoverable failure ends the loop; the supervisor
    // restarts the process and the broker redelivers the message.
    worker.run().await?;
    Ok(())
}

fn build_handler(
    stage: Stage,
    config: &Config,
    fetcher: Arc<dyn HttpFetch>,
    store: Arc<dyn VenueStore>,
) -> Arc<dyn StageHandler> {
    let rotator = CredentialRotator::new(config.foursquare_credentials.clone());
    let foursquare_client = Arc::new(RateLimitedClient::new(
        fetcher.clone(),
        rotator,
        RateLimitPolicy::RotateCredential,
        foursquare::API_VERSION,
    ));

    match stage {
        Stage::GridExpand => Arc::new(GridExpandHandler::new(config.google_api_key.as_str())),
        Stage::RadarFanOut => Arc::new(RadarFanOutHandler::new(
            JsonClient::new(fetcher),
            config.google_api_key.as_str(),
        )),
        Stage::PlaceMatch => Arc::new(PlaceMatchHandler::new(
            JsonClient::new(fetcher),
            foursquare_client,
            store,
        )),
        Stage::MenuFetch => Arc::new(MenuFetchHandler::new(foursquare_client, store)),
        Stage::HappyHourExtract => {
            Arc::new(HappyHourExtractHandler::new(foursquare_client, store))
        }
    }
}

async fn seed(config: Config, bounds: GridBounds) -> Result<()> {
    let broker = JetStreamBroker::connect(&config.nats_url)
        .await
        .context("Failed to connect to message broker")?;
    broker.provision(LAT_LNG_QUEUE).await?;

    let body = serde_json::to_string(&bounds)?;
    broker.send(LAT_LNG_QUEUE, &body).await?;
    tracing::info!(%body, "bounds queued for grid expansion");
    Ok(())
}
