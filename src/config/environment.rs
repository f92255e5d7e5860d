//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de
//! configuración.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub mapbox_token: Option<String>,
    /// Timeout del proveedor de distancias, en segundos
    pub distance_timeout_secs: u64,
    /// Política de reintentos del canal de notificaciones
    pub notify_max_attempts: u32,
    pub notify_backoff_ms: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
            mapbox_token: env::var("MAPBOX_TOKEN").ok(),
            distance_timeout_secs: env::var("DISTANCE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("DISTANCE_TIMEOUT_SECS must be a valid number"),
            notify_max_attempts: env::var("NOTIFY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("NOTIFY_MAX_ATTEMPTS must be a valid number"),
            notify_backoff_ms: env::var("NOTIFY_BACKOFF_MS")
                .unwrap_or_else(|_| "200".to_string())
                .parse()
                .expect("NOTIFY_BACKOFF_MS must be a valid number"),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
