// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, stores and engine, then start the HTTP server

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;

use nomnom_roulette::config::{init_db_pool, Config, StoreBackend};
use nomnom_roulette::db::{
    FavoritesStore, MemoryFavoritesStore, MemoryProfileStore, PgFavoritesStore, PgProfileStore,
    ProfileStore, QuotaStore,
};
use nomnom_roulette::handlers;
use nomnom_roulette::services::{
    CacheMedium, Clock, FavoritesReconciler, FileMedium, LocationMemory, MemoryMedium,
    OverpassClient, PlaceProvider, ProfileService, RouletteService, SelectionEngine, SystemClock,
    TtlCache, GENERIC_TTL, PLACES_TTL,
};

type Stores = (Arc<dyn ProfileStore>, Arc<dyn QuotaStore>, Arc<dyn FavoritesStore>);

async fn build_stores(config: &Config, backend: StoreBackend) -> anyhow::Result<Stores> {
    match backend {
        StoreBackend::Postgres => {
            let pool = init_db_pool(config)
                .await
                .context("failed to connect to database")?;
            let profiles = Arc::new(PgProfileStore::new(pool.clone()));
            let quota: Arc<dyn QuotaStore> = profiles.clone();
            let profiles: Arc<dyn ProfileStore> = profiles;
            let favorites: Arc<dyn FavoritesStore> = Arc::new(PgFavoritesStore::new(pool));
            Ok((profiles, quota, favorites))
        }
        StoreBackend::Memory => {
            let profiles = Arc::new(MemoryProfileStore::new());
            let quota: Arc<dyn QuotaStore> = profiles.clone();
            let profiles: Arc<dyn ProfileStore> = profiles;
            let favorites: Arc<dyn FavoritesStore> = Arc::new(MemoryFavoritesStore::new());
            Ok((profiles, quota, favorites))
        }
    }
}

fn build_medium(config: &Config) -> anyhow::Result<Arc<dyn CacheMedium>> {
    match &config.cache_dir {
        Some(dir) => {
            log::info!("Using file cache medium at {}", dir);
            let medium = FileMedium::new(dir).with_context(|| format!("cannot open cache dir {}", dir))?;
            Ok(Arc::new(medium))
        }
        None => {
            log::info!("Using in-memory cache medium");
            Ok(Arc::new(MemoryMedium::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration (also reads .env)
    let config = Config::from_env();

    // 2. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        anyhow::bail!("Configuration error: {}", e);
    }
    let backend = config.backend().map_err(anyhow::Error::msg)?;

    log::info!("Starting nomnom-roulette...");
    log::info!("Environment: {}", config.environment);
    log::info!("Store backend: {:?}", backend);

    // 3. Stores and cache medium
    let (profile_store, quota_store, favorites_store) = build_stores(&config, backend).await?;
    let medium = build_medium(&config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 4. Engine
    let overpass = OverpassClient::new(
        config.overpass_url.clone(),
        config.food_amenities.clone(),
        config.overpass_timeout_secs,
        config.overpass_requests_per_minute,
    );
    log::info!(
        "Overpass: {} (timeout {}s, {} req/min, amenities {:?})",
        config.overpass_url,
        config.overpass_timeout_secs,
        config.overpass_requests_per_minute,
        config.food_amenities
    );

    let service = web::Data::new(RouletteService::new(
        PlaceProvider::new(
            Arc::new(overpass),
            TtlCache::new(medium.clone(), clock.clone(), PLACES_TTL),
        ),
        ProfileService::new(
            profile_store,
            TtlCache::new(medium.clone(), clock.clone(), GENERIC_TTL),
        ),
        SelectionEngine::new(quota_store, clock.clone(), config.daily_spin_limit),
        FavoritesReconciler::new(favorites_store, clock.clone(), GENERIC_TTL),
        LocationMemory::new(medium),
        clock,
    ));

    // 5. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    log::info!("Listening on {}", server_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            .configure(handlers::health_config)
            .configure(handlers::restaurants_config)
            .configure(handlers::preferences_config)
            .configure(handlers::roulette_config)
            .configure(handlers::favorites_config)
    })
    .bind(&server_addr)
    .with_context(|| format!("cannot bind {}", server_addr))?
    .run()
    .await?;

    Ok(())
}
