mod cli;

use crate::cli::{CacheBackendArg, LogFormatArg, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use snip_cache::{LayeredCache, MokaUrlCache, NoopCache, RedisUrlCache};
use snip_core::{UrlCache, UrlStore};
use snip_gateway::{App, AppState};
use snip_generator::RandomGenerator;
use snip_shortener::{ClickPolicy, ShortenerConfig, ShortenerService};
use snip_storage::{InMemoryStore, MySqlStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Upper bound on how long an entry copied from Redis lives in the local layer.
const LOCAL_BACKFILL_TTL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format)?;

    info!(
        listen_addr = %config.listen_addr,
        public_base_url = %config.public_base_url,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        code_length = config.code_length,
        "starting snip gateway"
    );

    let store = build_store(&config).await?;
    let cache = build_cache(&config).await?;
    let generator = RandomGenerator::new(config.code_length)
        .with_context(|| format!("invalid code length {}", config.code_length))?;

    let click_policy = if config.count_cache_hits {
        ClickPolicy::EveryResolution
    } else {
        ClickPolicy::StoreReadsOnly
    };
    let shortener = ShortenerService::from_shared(store, cache, Arc::new(generator)).with_config(
        ShortenerConfig::builder()
            .max_attempts(config.max_attempts)
            .cache_ttl(Duration::from_secs(config.cache_ttl_secs))
            .click_policy(click_policy)
            .build(),
    );

    let state = AppState::new(Arc::new(shortener), config.public_base_url);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

fn init_tracing(format: LogFormatArg) -> anyhow::Result<()> {
    LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormatArg::Pretty => {
            tracing::subscriber::set_global_default(
                registry.with(tracing_subscriber::fmt::layer()),
            )?;
        }
        LogFormatArg::Json => {
            tracing::subscriber::set_global_default(
                registry.with(tracing_subscriber::fmt::layer().json()),
            )?;
        }
    }
    Ok(())
}

async fn build_store(config: &CLI) -> anyhow::Result<Arc<dyn UrlStore>> {
    match config.storage {
        StorageBackendArg::InMemory => Ok(Arc::new(InMemoryStore::new())),
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlStore::connect(dsn)
                .await
                .context("failed to connect to MySQL")?;
            store
                .ensure_schema()
                .await
                .context("failed to create the short_urls table")?;
            Ok(Arc::new(store))
        }
    }
}

async fn build_cache(config: &CLI) -> anyhow::Result<Arc<dyn UrlCache>> {
    let cache: Arc<dyn UrlCache> = match config.cache {
        CacheBackendArg::None => Arc::new(NoopCache),
        CacheBackendArg::Moka => Arc::new(MokaUrlCache::with_capacity(config.cache_capacity)),
        CacheBackendArg::Redis => Arc::new(connect_redis(config).await?),
        CacheBackendArg::Layered => {
            let backfill_ttl = LOCAL_BACKFILL_TTL.min(Duration::from_secs(config.cache_ttl_secs));
            Arc::new(LayeredCache::new(
                MokaUrlCache::with_capacity(config.cache_capacity),
                connect_redis(config).await?,
                backfill_ttl,
            ))
        }
    };
    Ok(cache)
}

async fn connect_redis(config: &CLI) -> anyhow::Result<RedisUrlCache> {
    let url = config
        .redis_url
        .as_deref()
        .context("redis url is required for the redis and layered caches")?;
    RedisUrlCache::connect(url)
        .await
        .context("failed to connect to Redis")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received ctrl-c, shutting down"),
        Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c"),
    }
}
