use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use convoyage_backend::config::environment::EnvironmentConfig;
use convoyage_backend::database::DatabaseConnection;
use convoyage_backend::middleware::auth::auth_middleware;
use convoyage_backend::middleware::cors::{cors_middleware, cors_middleware_with_origins};
use convoyage_backend::routes;
use convoyage_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 Convoyage Backend - Reservas y operaciones de convoyage");
    info!("==========================================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::new_default().await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let pool = db_connection.pool().clone();

    // Crear router de la API
    let app_state = AppState::new(pool, config.clone());

    let cors = if config.is_production() && !config.cors_origins.is_empty() {
        cors_middleware_with_origins(config.cors_origins.clone())
    } else {
        cors_middleware()
    };

    let protected = Router::new()
        .nest("/api/mission", routes::mission_routes::create_mission_router())
        .nest(
            "/api/notification",
            routes::notification_routes::create_notification_router(),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .merge(protected)
        .layer(cors)
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🚗 Endpoints - Mission:");
    info!("   POST /api/mission - Crear misión (cliente o admin)");
    info!("   GET  /api/mission - Listar misiones según rol");
    info!("   GET  /api/mission/:id - Obtener misión");
    info!("   POST /api/mission/:id/transition - Solicitar transición de estado");
    info!("   POST /api/mission/:id/assign - Asignar chófer (admin)");
    info!("   POST /api/mission/:id/recalculate - Recalcular términos (admin)");
    info!("   GET  /api/mission/:id/attachments - Listar adjuntos");
    info!("   POST /api/mission/:id/attachments - Registrar adjunto");
    info!("🔔 Endpoints - Notification:");
    info!("   GET  /api/notification - Listar notificaciones del usuario");
    info!("   POST /api/notification/:id/read - Marcar como leída");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check del servicio
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "service": "convoyage-backend",
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
