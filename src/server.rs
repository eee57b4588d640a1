/// Server setup and initialization
///
/// Wires together all components: database pool, catalog seed + registry,
/// reasoning client, plan generator, execution engine, service, and HTTP
/// routes. Provides the main application factory function for creating the
/// Axum app.

use crate::{
    api::{connectors::create_connector_routes, workflows::create_workflow_routes, AppState},
    catalog::{registry::CatalogRegistry, storage::CatalogStorage},
    config::Config,
    planner::{client::AnthropicClient, generator::{PlanGenerator, PlanGeneratorConfig}},
    runtime::{engine::{EngineConfig, ExecutionEngine}, executors::ExecutorRegistry},
    workflow::{service::WorkflowService, storage::WorkflowStorage},
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
///
/// Initializes the database schema, seeds the built-in connector catalog,
/// compiles the catalog registry, and wires the planning and execution
/// pipeline into the HTTP router.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("Connecting to database: {}", config.database.url);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Initializing catalog storage and seed data");
    let catalog_storage = CatalogStorage::new(pool.clone());
    catalog_storage.init_schema().await?;
    catalog_storage.seed_builtin().await?;

    tracing::info!("Initializing workflow storage");
    let workflow_storage = WorkflowStorage::new(pool);
    workflow_storage.init_schema().await?;

    tracing::info!("Compiling catalog registry");
    let catalog = Arc::new(CatalogRegistry::load(&catalog_storage).await?);

    tracing::info!("Initializing plan generator (model: {})", config.planner.model);
    let client = Arc::new(AnthropicClient::with_base_url(
        config.planner.api_key.clone(),
        config.planner.base_url.clone(),
    ));
    let generator = PlanGenerator::new(
        client,
        PlanGeneratorConfig {
            model: config.planner.model.clone(),
            ..PlanGeneratorConfig::default()
        },
    );

    tracing::info!("Initializing execution engine");
    let engine = ExecutionEngine::new(
        Arc::clone(&catalog),
        ExecutorRegistry::builtin(),
        EngineConfig::default(),
    );

    let service = Arc::new(WorkflowService::new(
        catalog,
        generator,
        workflow_storage,
        engine,
    ));

    let app_state = AppState {
        service,
        catalog_storage,
    };

    tracing::info!("Creating HTTP router");
    let app = Router::new()
        .route("/healthz", get(health_check))
        .merge(create_workflow_routes().with_state(app_state.clone()))
        .merge(create_connector_routes().with_state(app_state));

    tracing::info!("Application initialized successfully");
    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Planweave server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
