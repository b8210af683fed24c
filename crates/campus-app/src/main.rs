use std::sync::Arc;

use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use campus_app::app::api::routes;
use campus_app::config::ConfigHandler;
use campus_app::db_handler::DbProviderHandler;
use campus_core::config::load_config;
use campus_db::db::DbProvider;
use campus_db::db::connection::create_pool;
use campus_db::db::migrations::run_pending_migrations;
use campus_service::auth::bootstrap::ensure_bootstrap_admin;
use campus_service::auth::casbin::{CasbinEnforcerHandler, init_casbin};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(filter_layer).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true),
    );
    tracing::subscriber::set_global_default(subscriber)?;
    // diesel and casbin log through `log`
    tracing_log::LogTracer::init()?;

    tracing::info!("Starting campus server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    if config.database.run_migrations {
        run_pending_migrations(&config.database.url).await?;
    } else {
        tracing::info!("Skipping migrations");
    }

    {
        let mut conn = pool.get_connection().await?;
        if let Some(admin) = ensure_bootstrap_admin(&mut conn, &config).await? {
            tracing::info!(user_id = %admin.id, "Bootstrap administrator created");
        }
    }

    let enforcer = init_casbin().await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(DbProviderHandler { provider: pool })
        .hoop(ConfigHandler {
            settings: Arc::new(config),
        })
        .hoop(CasbinEnforcerHandler {
            enforcer: Arc::new(enforcer),
        })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
