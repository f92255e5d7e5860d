//! Resolución de distancias
//!
//! Este módulo resuelve la distancia por carretera entre dos direcciones a
//! través del proveedor cartográfico externo (Mapbox): geocodifica ambas
//! direcciones y pide la ruta conducible entre los puntos resueltos.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::utils::errors::{AppError, AppResult};

/// Contrato del proveedor de distancias. Función pura desde el punto de
/// vista del llamador: dirección origen + dirección destino → km.
#[async_trait]
pub trait DistanceResolver: Send + Sync {
    /// Distancia conducible en kilómetros enteros (techo, nunca truncado:
    /// el precio se sesga de forma conservadora).
    async fn resolve_km(&self, origin: &str, destination: &str) -> AppResult<Decimal>;
}

#[derive(Debug, Deserialize)]
struct MapboxGeocodingResponse {
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    geometry: MapboxGeometry,
}

#[derive(Debug, Deserialize)]
struct MapboxGeometry {
    coordinates: Vec<f64>, // [longitude, latitude]
}

#[derive(Debug, Deserialize)]
struct MapboxDirectionsResponse {
    code: String,
    #[serde(default)]
    routes: Vec<MapboxRoute>,
}

#[derive(Debug, Deserialize)]
struct MapboxRoute {
    distance: f64, // metros
}

/// Implementación sobre las APIs de Mapbox (Geocoding v6 + Directions v5)
pub struct MapboxDistanceService {
    mapbox_token: String,
    client: reqwest::Client,
}

impl MapboxDistanceService {
    pub fn new(mapbox_token: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            mapbox_token,
            client,
        }
    }

    async fn geocode(&self, address: &str) -> AppResult<(f64, f64)> {
        let encoded_address = urlencoding::encode(address);
        let url = format!(
            "https://api.mapbox.com/search/geocode/v6/forward?q={}&access_token={}&limit=1",
            encoded_address, self.mapbox_token
        );

        log::debug!("🗺️ Geocoding address: {}", address);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "ConvoyageBackend/1.0")
            .send()
            .await
            .map_err(|e| classify_transport_error(e, "geocoding"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::GeocodeFailed(format!(
                "Geocoding provider returned status {}",
                status
            )));
        }

        let body: MapboxGeocodingResponse = response
            .json()
            .await
            .map_err(|e| AppError::GeocodeFailed(format!("Invalid geocoding response: {}", e)))?;

        match body.features.first() {
            Some(feature) if feature.geometry.coordinates.len() >= 2 => {
                let longitude = feature.geometry.coordinates[0];
                let latitude = feature.geometry.coordinates[1];
                Ok((longitude, latitude))
            }
            _ => Err(AppError::GeocodeFailed(format!(
                "No coordinates found for address '{}'",
                address
            ))),
        }
    }

    async fn driving_distance_meters(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> AppResult<f64> {
        let url = format!(
            "https://api.mapbox.com/directions/v5/mapbox/driving/{},{};{},{}?access_token={}&overview=false",
            origin.0, origin.1, destination.0, destination.1, self.mapbox_token
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "ConvoyageBackend/1.0")
            .send()
            .await
            .map_err(|e| classify_transport_error(e, "directions"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::RouteUnavailable(format!(
                "Directions provider returned status {}",
                status
            )));
        }

        let body: MapboxDirectionsResponse = response
            .json()
            .await
            .map_err(|e| AppError::RouteUnavailable(format!("Invalid directions response: {}", e)))?;

        if body.code != "Ok" {
            return Err(AppError::RouteUnavailable(format!(
                "Directions provider answered '{}'",
                body.code
            )));
        }

        match body.routes.first() {
            Some(route) => Ok(route.distance),
            None => Err(AppError::RouteUnavailable(
                "No drivable route between the resolved points".to_string(),
            )),
        }
    }
}

#[async_trait]
impl DistanceResolver for MapboxDistanceService {
    async fn resolve_km(&self, origin: &str, destination: &str) -> AppResult<Decimal> {
        let origin_coords = self.geocode(origin).await?;
        let destination_coords = self.geocode(destination).await?;

        let meters = self
            .driving_distance_meters(origin_coords, destination_coords)
            .await?;

        let km = km_ceil(meters).ok_or_else(|| {
            AppError::Internal(format!("Distance out of range: {} meters", meters))
        })?;

        log::info!(
            "📏 Distance resolved: '{}' -> '{}' = {} km",
            origin,
            destination,
            km
        );

        Ok(km)
    }
}

/// Metros → kilómetros enteros por techo
fn km_ceil(meters: f64) -> Option<Decimal> {
    if !meters.is_finite() || meters < 0.0 {
        return None;
    }
    Decimal::from_f64_retain(meters / 1000.0).map(|d| d.ceil())
}

/// Un timeout se trata como ruta no disponible; cualquier otro fallo de
/// transporte se atribuye a la fase que lo produjo.
fn classify_transport_error(error: reqwest::Error, phase: &str) -> AppError {
    if error.is_timeout() {
        AppError::RouteUnavailable(format!("Distance provider timed out during {}", phase))
    } else if phase == "geocoding" {
        AppError::GeocodeFailed(format!("Transport error during geocoding: {}", error))
    } else {
        AppError::RouteUnavailable(format!("Transport error during directions: {}", error))
    }
}
