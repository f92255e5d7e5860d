//! Motor de precios
//!
//! Dada una categoría de vehículo y una distancia en kilómetros, devuelve el
//! presupuesto (importe sin IVA e importe con IVA) a partir de una tabla de
//! tarifas por categoría. Determinista: mismas entradas, mismas salidas.

use std::collections::HashMap;

use lazy_static::lazy_static;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::utils::errors::{AppError, AppResult};

/// Tarifa de una categoría: fija (independiente de la distancia) o por
/// kilómetro con precio mínimo opcional.
#[derive(Debug, Clone, PartialEq)]
pub enum Rate {
    Flat(Decimal),
    PerKm {
        rate: Decimal,
        floor: Option<Decimal>,
    },
}

/// Términos comerciales calculados para una misión
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price_excl_tax: Decimal,
    pub price_incl_tax: Decimal,
}

lazy_static! {
    /// IVA fijo del 20%, no configurable por misión
    static ref TAX_RATE: Decimal = Decimal::new(20, 2);

    /// Tarifario por defecto
    static ref DEFAULT_RATES: HashMap<String, Rate> = {
        let mut rates = HashMap::new();
        rates.insert(
            "citadine".to_string(),
            Rate::PerKm { rate: Decimal::new(95, 2), floor: Some(Decimal::new(120, 0)) },
        );
        rates.insert(
            "standard-sedan".to_string(),
            Rate::PerKm { rate: Decimal::new(85, 2), floor: Some(Decimal::new(150, 0)) },
        );
        rates.insert(
            "suv".to_string(),
            Rate::PerKm { rate: Decimal::new(110, 2), floor: Some(Decimal::new(180, 0)) },
        );
        rates.insert(
            "utilitaire".to_string(),
            Rate::PerKm { rate: Decimal::new(125, 2), floor: Some(Decimal::new(200, 0)) },
        );
        // Transporte en remolque: precio cerrado sea cual sea la distancia
        rates.insert("remorque".to_string(), Rate::Flat(Decimal::new(390, 0)));
        rates
    };
}

/// Motor de precios con tabla de tarifas por categoría
pub struct PricingService {
    rates: HashMap<String, Rate>,
    tax_rate: Decimal,
}

impl PricingService {
    pub fn new(rates: HashMap<String, Rate>, tax_rate: Decimal) -> Self {
        Self { rates, tax_rate }
    }

    pub fn with_default_rates() -> Self {
        Self::new(DEFAULT_RATES.clone(), *TAX_RATE)
    }

    /// Calcula el presupuesto de una categoría para una distancia en km.
    ///
    /// El redondeo (half-up, 2 decimales) se aplica una única vez por salida,
    /// siempre sobre el valor intermedio sin redondear: el IVA nunca se
    /// calcula sobre un importe ya redondeado.
    pub fn quote(&self, vehicle_category: &str, distance_km: Decimal) -> AppResult<Quote> {
        let rate = self
            .rates
            .get(vehicle_category)
            .ok_or_else(|| AppError::UnknownCategory(vehicle_category.to_string()))?;

        let base = match rate {
            Rate::Flat(fee) => *fee,
            Rate::PerKm { rate, floor } => {
                let raw = *rate * distance_km;
                match floor {
                    Some(floor) if raw < *floor => *floor,
                    _ => raw,
                }
            }
        };

        let price_excl_tax = round_money(base);
        let price_incl_tax = round_money(base * (Decimal::ONE + self.tax_rate));

        Ok(Quote {
            price_excl_tax,
            price_incl_tax,
        })
    }
}

/// Redondeo monetario: 2 decimales exactos, mitades hacia arriba
fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PricingService {
        PricingService::with_default_rates()
    }

    #[test]
    fn test_per_km_quote_with_floor_not_binding() {
        // 340 km a 0.85 €/km, mínimo 150 € → 289.00 sin IVA, 346.80 con IVA
        let quote = service()
            .quote("standard-sedan", Decimal::from(340))
            .unwrap();

        assert_eq!(quote.price_excl_tax, Decimal::new(28900, 2));
        assert_eq!(quote.price_incl_tax, Decimal::new(34680, 2));
    }

    #[test]
    fn test_floor_binds_on_short_distances() {
        // 50 km a 0.85 €/km = 42.50, por debajo del mínimo de 150
        let quote = service().quote("standard-sedan", Decimal::from(50)).unwrap();

        assert_eq!(quote.price_excl_tax, Decimal::new(15000, 2));
        assert_eq!(quote.price_incl_tax, Decimal::new(18000, 2));
    }

    #[test]
    fn test_flat_rate_ignores_distance() {
        let short = service().quote("remorque", Decimal::from(10)).unwrap();
        let long = service().quote("remorque", Decimal::from(900)).unwrap();

        assert_eq!(short, long);
        assert_eq!(short.price_excl_tax, Decimal::new(39000, 2));
    }

    #[test]
    fn test_unknown_category() {
        let result = service().quote("helicoptere", Decimal::from(100));
        assert!(matches!(result, Err(AppError::UnknownCategory(c)) if c == "helicoptere"));
    }

    #[test]
    fn test_quote_is_deterministic() {
        let a = service().quote("suv", Decimal::from(275)).unwrap();
        let b = service().quote("suv", Decimal::from(275)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rounding_half_up_on_unrounded_base() {
        // 0.125 €/km sin mínimo: 5 km → base 0.625.
        // Sin IVA: 0.63 (half-up). Con IVA: 0.625 * 1.2 = 0.75 exacto; si se
        // aplicara el IVA sobre el importe ya redondeado saldría 0.76.
        let mut rates = HashMap::new();
        rates.insert(
            "test".to_string(),
            Rate::PerKm { rate: Decimal::new(125, 3), floor: None },
        );
        let service = PricingService::new(rates, Decimal::new(20, 2));

        let quote = service.quote("test", Decimal::from(5)).unwrap();
        assert_eq!(quote.price_excl_tax, Decimal::new(63, 2));
        assert_eq!(quote.price_incl_tax, Decimal::new(75, 2));
    }

    #[test]
    fn test_incl_tax_never_below_excl_tax() {
        let service = service();
        for category in ["citadine", "standard-sedan", "suv", "utilitaire", "remorque"] {
            for km in [0i64, 1, 17, 150, 340, 1200] {
                let quote = service.quote(category, Decimal::from(km)).unwrap();
                assert!(
                    quote.price_incl_tax >= quote.price_excl_tax,
                    "{} a {} km",
                    category,
                    km
                );
                assert_eq!(quote.price_excl_tax.scale(), 2);
                assert_eq!(quote.price_incl_tax.scale(), 2);
            }
        }
    }
}
