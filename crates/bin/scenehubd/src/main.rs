//! # scenehubd — scenehub daemon
//!
//! Composition root that wires all adapters together and starts the
//! controller.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file + env vars) and initialise tracing
//! - Initialise the `SQLite` connection pool and run migrations
//! - Construct the engine components (state store, event bus, scheduler,
//!   executor) and inject them explicitly — no process-wide globals
//! - Preload device states from the HAL and register active scene
//!   schedules
//! - Bridge bus topics into the SSE broadcast channel and wire external
//!   device-state changes back into scene triggering
//! - Build the axum router, bind a TCP port, and serve
//! - Handle graceful shutdown (SIGINT): stop the scheduler, clear the
//!   state cache
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::broadcast;

use scenehub_adapter_hal_http::HalHttpClient;
use scenehub_adapter_http_axum::router;
use scenehub_adapter_http_axum::state::AppState;
use scenehub_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteDeviceRepository, SqliteSceneRepository,
};
use scenehub_app::event_bus::EventBus;
use scenehub_app::executor::SceneExecutor;
use scenehub_app::ports::HalClient;
use scenehub_app::scheduler::SceneScheduler;
use scenehub_app::services::device_service::DeviceService;
use scenehub_app::services::scene_service::SceneService;
use scenehub_app::state_store::StateStore;
use scenehub_domain::device::DeviceState;
use scenehub_domain::event::{Event, EventType};
use scenehub_domain::id::DeviceId;

use config::Config;

/// Topics forwarded verbatim to SSE clients.
const STREAMED_TOPICS: [EventType; 9] = [
    EventType::DeviceStateChanged,
    EventType::DeviceAdded,
    EventType::DeviceRemoved,
    EventType::SceneTriggered,
    EventType::SceneCompleted,
    EventType::SceneFailed,
    EventType::SceneAdded,
    EventType::SceneUpdated,
    EventType::SceneRemoved,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = DatabaseConfig {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();
    let device_repo = Arc::new(SqliteDeviceRepository::new(pool.clone()));
    let scene_repo = Arc::new(SqliteSceneRepository::new(pool));

    // Engine components
    let timezone = config.timezone()?;
    let store = Arc::new(StateStore::new());
    let bus = Arc::new(EventBus::new());
    let scheduler = Arc::new(SceneScheduler::new(timezone));
    let hal = Arc::new(HalHttpClient::new(scenehub_adapter_hal_http::Config {
        base_url: config.hal.url.clone(),
        timeout: std::time::Duration::from_secs(config.hal.timeout_seconds),
    })?);
    let executor = Arc::new(SceneExecutor::new(
        Arc::clone(&hal),
        Arc::clone(&store),
        timezone,
    ));

    // Services
    let scene_service = Arc::new(SceneService::new(
        scene_repo,
        Arc::clone(&hal),
        Arc::clone(&store),
        executor,
        Arc::clone(&scheduler),
        Arc::clone(&bus),
    ));
    let device_service = Arc::new(DeviceService::new(
        device_repo,
        Arc::clone(&hal),
        Arc::clone(&store),
        Arc::clone(&bus),
    ));

    if hal.health_check().await {
        tracing::info!(url = %config.hal.url, "HAL reachable");
    } else {
        tracing::warn!(url = %config.hal.url, "HAL unreachable at startup; device states will load lazily");
    }

    // The state cache starts empty on every boot; repopulate it from the
    // HAL before any scene can be evaluated.
    let loaded = device_service.preload_states().await?;
    let registered = scene_service.register_active_scenes().await?;
    tracing::info!(devices = loaded, scenes = registered, "startup preload complete");

    // Bridge bus topics into the broadcast channel feeding SSE clients.
    let (events, _) = broadcast::channel(256);
    for topic in STREAMED_TOPICS {
        let tx = events.clone();
        bus.subscribe(topic, move |event: Event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event);
                Ok(())
            }
        });
    }

    // External device-state changes re-evaluate device_state triggers.
    // Refreshes announced by scene runs themselves are skipped so a scene
    // cannot re-trigger through its own actions.
    {
        let service = Arc::clone(&scene_service);
        bus.subscribe(EventType::DeviceStateChanged, move |event: Event| {
            let service = Arc::clone(&service);
            async move {
                if event.data.get("source").and_then(|v| v.as_str()) == Some("scene") {
                    return Ok(());
                }
                let Some(device_id) = event
                    .data
                    .get("device_id")
                    .and_then(|v| v.as_str())
                    .map(DeviceId::new)
                else {
                    return Ok(());
                };
                let Some(raw_state) = event.data.get("state").cloned() else {
                    return Ok(());
                };
                let Ok(state) = serde_json::from_value::<DeviceState>(raw_state) else {
                    return Ok(());
                };
                if let Err(err) = service.handle_state_change(&device_id, &state).await {
                    tracing::warn!(%device_id, error = %err, "device-state trigger dispatch failed");
                }
                Ok(())
            }
        });
    }

    scheduler.start();

    // HTTP
    let state = AppState::new(
        scene_service,
        device_service,
        Arc::clone(&store),
        Arc::clone(&scheduler),
        hal,
        events,
    );
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "scenehubd listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    store.clear();
    tracing::info!("scenehubd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
