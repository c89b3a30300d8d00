use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use medicine_tracker::{
    api::{self, AppState},
    cache::LookupCache,
    cli::Cli,
    config::Config,
    db,
    error::AppError,
    expiry::ExpirySweeper,
    logging::init_logging,
    lookup::{MedicineResolver, OpenFdaMedicineProvider, ProviderChain, RegionalMedicineProvider},
    metrics::AppMetrics,
    repository::MedicineRepository,
    scheduler,
    services::{openfda::OpenFdaClient, regional::RegionalRegistryClient},
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    if let Err(err) = run(Cli::parse()).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env().map_err(AppError::Config)?.apply_cli(&cli);
    tracing::info!("Service starting with config: {:?}", config);

    let pool = db::create_pool(&config.database_url)
        .await
        .map_err(|err| AppError::Database(err.to_string()))?;
    let repository = Arc::new(MedicineRepository::new(pool));
    let metrics = Arc::new(AppMetrics::new().map_err(|err| AppError::Parse(err.to_string()))?);
    let sweeper = ExpirySweeper::new(repository.clone());

    if cli.sweep_once {
        let today = Local::now().date_naive();
        let report = scheduler::sweep_once(&sweeper, &metrics, today)
            .await
            .map_err(|err| AppError::Database(err.to_string()))?;
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| AppError::Parse(err.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    let providers = &config.providers;
    let regional = RegionalRegistryClient::new(providers.regional_url.clone(), providers.timeout())
        .map_err(|err| AppError::Network(err.to_string()))?;
    let openfda = OpenFdaClient::new(
        providers.openfda_url.clone(),
        providers.openfda_api_key.clone(),
        providers.timeout(),
    )
    .map_err(|err| AppError::Network(err.to_string()))?;

    let chain = ProviderChain::new(providers.timeout())
        .with_provider(Arc::new(RegionalMedicineProvider::new(
            regional,
            providers.regional_country.clone(),
        )))
        .with_provider(Arc::new(OpenFdaMedicineProvider::new(openfda)));
    tracing::info!("Lookup providers: {:?}", chain.provider_names());

    let cache = Arc::new(Mutex::new(LookupCache::new(config.lookup_cache_ttl())));
    let resolver =
        MedicineResolver::new(repository.clone(), cache, chain).with_metrics(metrics.clone());

    if config.sweep_interval_seconds > 0 {
        tokio::spawn(scheduler::run_expiry_sweeps(
            sweeper.clone(),
            metrics.clone(),
            config.sweep_interval_seconds,
        ));
    } else {
        tracing::info!("Periodic expiry sweeps disabled");
    }

    let state = Arc::new(AppState {
        repository,
        resolver,
        sweeper,
        metrics,
    });
    let app = api::router(state).layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Network(format!("Failed to bind {}: {}", addr, err)))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received. Stopping HTTP server.");
        })
        .await
        .map_err(|err| AppError::Network(err.to_string()))?;

    tracing::info!("Server stopped cleanly");
    Ok(())
}
