use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use push_server::config::Config;
use push_server::feed::FeedHandler;
use push_server::push::{HttpPushGateway, PushEngine};
use push_server::stops::{AliasLoader, StopAliases};
use push_server::store::{
    InMemorySubscriptionStore, LIVE_JOURNEY_TTL, LiveJourneyStore, SubscriptionStore,
};
use push_server::web::{AppState, create_router};

/// How often expired live journeys are evicted.
const LIVE_EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();

    // Stop aliases: load once at startup, then refresh in the background.
    let aliases = StopAliases::empty();
    if let Some(source) = config.alias_source.clone() {
        let loader = AliasLoader::new(source).expect("failed to create alias loader");
        match loader.refresh_into(&aliases).await {
            Ok(count) => info!(aliases = count, "loaded stop aliases"),
            Err(e) => warn!(error = %e, "failed to load stop aliases, starting without"),
        }

        let aliases_refresh = aliases.clone();
        let refresh_interval = config.alias_refresh;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresh_interval);
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                match loader.refresh_into(&aliases_refresh).await {
                    Ok(count) => info!(aliases = count, "refreshed stop aliases"),
                    Err(e) => warn!(error = %e, "failed to refresh stop aliases"),
                }
            }
        });
    } else {
        warn!("no stop-alias source configured, matching without alias resolution");
    }

    let store: Arc<dyn SubscriptionStore> = Arc::new(InMemorySubscriptionStore::new());
    let live = Arc::new(LiveJourneyStore::new());

    // Evict live journeys a fixed time after their last arrival.
    let live_eviction = Arc::clone(&live);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIVE_EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = live_eviction.evict_older_than(Utc::now() - LIVE_JOURNEY_TTL);
            if evicted > 0 {
                info!(evicted, "evicted expired live journeys");
            }
        }
    });

    let gateway = HttpPushGateway::new(config.push.timeout).expect("failed to create push client");
    let engine = Arc::new(PushEngine::new(
        Arc::new(gateway),
        Arc::clone(&store),
        &config.push,
    ));

    let handler = Arc::new(FeedHandler::new(
        Arc::clone(&store),
        Arc::clone(&live),
        aliases,
        Arc::clone(&engine),
        config.extract,
    ));

    let state = AppState::new(handler, store, live, engine);
    let app = create_router(state);

    info!(addr = %config.bind_addr, "transit push server listening");
    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr = %config.bind_addr, "failed to bind");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server exited");
        std::process::exit(1);
    }
}
