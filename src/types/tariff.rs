//! Transport tariff types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::defaults::MAX_DISTANCE_KM_LIMIT;
use crate::error::TariffError;

/// A known (distance, tariff-per-km) pair used to fit the pricing curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationPoint {
    pub distance_km: f64,
    pub tariff_per_km: f64,
}

impl CalibrationPoint {
    pub fn new(distance_km: f64, tariff_per_km: f64) -> Self {
        Self { distance_km, tariff_per_km }
    }
}

/// Coefficients of `tariff(km) = a + b / (km + c)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperbolaParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl HyperbolaParameters {
    /// Evaluate the curve. Returns `None` when `km + c` is not positive.
    pub fn evaluate(&self, km: f64) -> Option<f64> {
        let denominator = km + self.c;
        if denominator <= 0.0 {
            return None;
        }
        let value = self.a + self.b / denominator;
        value.is_finite().then_some(value)
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }
}

/// Bounds and pricing knobs for one generation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub hyper_min_km: i32,
    pub hyper_max_km: i32,
    pub volume_coeff: f64,
    pub margin_percent: f64,
    pub max_distance_km: i32,
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), TariffError> {
        require_positive_int("hyperMinKm", self.hyper_min_km)?;
        require_positive_int("hyperMaxKm", self.hyper_max_km)?;
        require_max_distance(self.max_distance_km)?;
        require_positive("volumeCoeff", self.volume_coeff)?;
        require_margin(self.margin_percent)?;

        if self.hyper_min_km >= self.hyper_max_km {
            return Err(TariffError::invalid(
                "hyperMinKm",
                format!(
                    "must be less than hyperMaxKm ({} >= {})",
                    self.hyper_min_km, self.hyper_max_km
                ),
            ));
        }
        if self.hyper_max_km > self.max_distance_km {
            return Err(TariffError::invalid(
                "hyperMaxKm",
                format!(
                    "must not exceed maxDistanceKm ({} > {})",
                    self.hyper_max_km, self.max_distance_km
                ),
            ));
        }
        Ok(())
    }
}

/// One row of the per-distance tariff table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TariffRow {
    pub distance_km: i32,
    pub base_tariff_t: f64,
    pub base_tariff_tkm: f64,
    pub base_tariff_m3: f64,
    pub base_tariff_m3km: f64,
    pub outgoing_tariff_t: f64,
    pub outgoing_tariff_tkm: f64,
    pub outgoing_tariff_m3: f64,
    pub outgoing_tariff_m3km: f64,
    pub margin_t: f64,
    pub margin_tkm: f64,
    pub margin_m3: f64,
    pub margin_m3km: f64,
    pub volume_coeff: f64,
    pub margin_percent: f64,
}

/// Singleton record of the calibration that produced the current table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TariffConfigSnapshot {
    pub point1_km: f64,
    pub point1_tariff: f64,
    pub point2_km: f64,
    pub point2_tariff: f64,
    pub point3_km: f64,
    pub point3_tariff: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub hyper_min_km: i32,
    pub hyper_max_km: i32,
    pub volume_coeff: f64,
    pub margin_percent: f64,
    pub max_distance_km: i32,
    pub updated_at: DateTime<Utc>,
}

impl TariffConfigSnapshot {
    pub fn new(
        points: &[CalibrationPoint; 3],
        params: HyperbolaParameters,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            point1_km: points[0].distance_km,
            point1_tariff: points[0].tariff_per_km,
            point2_km: points[1].distance_km,
            point2_tariff: points[1].tariff_per_km,
            point3_km: points[2].distance_km,
            point3_tariff: points[2].tariff_per_km,
            a: params.a,
            b: params.b,
            c: params.c,
            hyper_min_km: config.hyper_min_km,
            hyper_max_km: config.hyper_max_km,
            volume_coeff: config.volume_coeff,
            margin_percent: config.margin_percent,
            max_distance_km: config.max_distance_km,
            updated_at: Utc::now(),
        }
    }

    #[cfg(test)]
    pub fn parameters(&self) -> HyperbolaParameters {
        HyperbolaParameters { a: self.a, b: self.b, c: self.c }
    }
}

// ============================================================================
// Request / response payloads
// ============================================================================

/// Request to fit the hyperbolic curve and regenerate the table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateHyperbolicRequest {
    pub point1_km: f64,
    pub point1_tariff: f64,
    pub point2_km: f64,
    pub point2_tariff: f64,
    pub point3_km: f64,
    pub point3_tariff: f64,
    pub hyper_min_km: i32,
    pub hyper_max_km: i32,
    pub volume_coeff: f64,
    pub margin_percent: f64,
    pub max_distance_km: i32,
}

impl GenerateHyperbolicRequest {
    pub fn calibration_points(&self) -> [CalibrationPoint; 3] {
        [
            CalibrationPoint::new(self.point1_km, self.point1_tariff),
            CalibrationPoint::new(self.point2_km, self.point2_tariff),
            CalibrationPoint::new(self.point3_km, self.point3_tariff),
        ]
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            hyper_min_km: self.hyper_min_km,
            hyper_max_km: self.hyper_max_km,
            volume_coeff: self.volume_coeff,
            margin_percent: self.margin_percent,
            max_distance_km: self.max_distance_km,
        }
    }

    /// Reject malformed input before any computation begins
    pub fn validate(&self) -> Result<(), TariffError> {
        require_positive("point1Km", self.point1_km)?;
        require_positive("point1Tariff", self.point1_tariff)?;
        require_positive("point2Km", self.point2_km)?;
        require_positive("point2Tariff", self.point2_tariff)?;
        require_positive("point3Km", self.point3_km)?;
        require_positive("point3Tariff", self.point3_tariff)?;
        self.generation_config().validate()
    }
}

/// Request to regenerate the table from a straight line between two points
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLinearRequest {
    pub start_km: f64,
    pub start_tariff: f64,
    pub end_km: f64,
    pub end_tariff: f64,
    pub volume_coeff: f64,
    pub margin_percent: f64,
    pub max_distance_km: i32,
}

impl GenerateLinearRequest {
    pub fn validate(&self) -> Result<(), TariffError> {
        require_positive("startKm", self.start_km)?;
        require_positive("startTariff", self.start_tariff)?;
        require_positive("endKm", self.end_km)?;
        require_positive("endTariff", self.end_tariff)?;
        require_positive("volumeCoeff", self.volume_coeff)?;
        require_margin(self.margin_percent)?;
        require_max_distance(self.max_distance_km)?;

        if self.start_km >= self.end_km {
            return Err(TariffError::invalid(
                "startKm",
                format!("must be less than endKm ({} >= {})", self.start_km, self.end_km),
            ));
        }
        if self.end_km > f64::from(self.max_distance_km) {
            return Err(TariffError::invalid(
                "endKm",
                format!(
                    "must not exceed maxDistanceKm ({} > {})",
                    self.end_km, self.max_distance_km
                ),
            ));
        }
        Ok(())
    }
}

/// Reply to a hyperbolic generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateHyperbolicResponse {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// `newton` or `fallback`
    pub strategy: String,
    /// Absolute error at the third calibration point
    pub residual: f64,
    pub rows_written: usize,
}

/// Reply to a linear generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLinearResponse {
    pub rows_written: usize,
}

/// Lookup of the stored rate for one distance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLookupRequest {
    pub distance_km: f64,
}

/// Range listing of stored rates (inclusive bounds)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRatesRequest {
    pub from_km: Option<i32>,
    pub to_km: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateListResponse {
    pub items: Vec<TariffRow>,
    pub total: i64,
}

// ============================================================================
// Field validation helpers
// ============================================================================

fn require_positive(field: &str, value: f64) -> Result<(), TariffError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TariffError::invalid(field, format!("must be a positive number, got {value}")));
    }
    Ok(())
}

fn require_positive_int(field: &str, value: i32) -> Result<(), TariffError> {
    if value <= 0 {
        return Err(TariffError::invalid(field, format!("must be a positive integer, got {value}")));
    }
    Ok(())
}

fn require_margin(value: f64) -> Result<(), TariffError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(TariffError::invalid(
            "marginPercent",
            format!("must be between 0 and 100, got {value}"),
        ));
    }
    Ok(())
}

fn require_max_distance(value: i32) -> Result<(), TariffError> {
    require_positive_int("maxDistanceKm", value)?;
    if value > MAX_DISTANCE_KM_LIMIT {
        return Err(TariffError::invalid(
            "maxDistanceKm",
            format!("must not exceed {MAX_DISTANCE_KM_LIMIT}, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> GenerateHyperbolicRequest {
        GenerateHyperbolicRequest {
            point1_km: 1.0,
            point1_tariff: 50.0,
            point2_km: 20.0,
            point2_tariff: 35.0,
            point3_km: 50.0,
            point3_tariff: 25.0,
            hyper_min_km: 1,
            hyper_max_km: 100,
            volume_coeff: 1.4,
            margin_percent: 0.0,
            max_distance_km: 500,
        }
    }

    #[test]
    fn test_hyperbolic_request_deserialize() {
        let json = r#"{
            "point1Km": 1, "point1Tariff": 50,
            "point2Km": 20, "point2Tariff": 35,
            "point3Km": 50, "point3Tariff": 25,
            "hyperMinKm": 1, "hyperMaxKm": 100,
            "volumeCoeff": 1.4, "marginPercent": 15,
            "maxDistanceKm": 500
        }"#;

        let request: GenerateHyperbolicRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.point2_km, 20.0);
        assert_eq!(request.hyper_max_km, 100);
        assert_eq!(request.margin_percent, 15.0);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_hyperbolic_request_rejects_fractional_window() {
        let json = r#"{
            "point1Km": 1, "point1Tariff": 50,
            "point2Km": 20, "point2Tariff": 35,
            "point3Km": 50, "point3Tariff": 25,
            "hyperMinKm": 1.5, "hyperMaxKm": 100,
            "volumeCoeff": 1.4, "marginPercent": 15,
            "maxDistanceKm": 500
        }"#;

        assert!(serde_json::from_str::<GenerateHyperbolicRequest>(json).is_err());
    }

    #[test]
    fn test_calibration_points_keep_order() {
        let points = sample_request().calibration_points();
        assert_eq!(points[0], CalibrationPoint::new(1.0, 50.0));
        assert_eq!(points[2], CalibrationPoint::new(50.0, 25.0));
    }

    #[test]
    fn test_validate_rejects_non_positive_point() {
        let mut request = sample_request();
        request.point2_tariff = 0.0;

        match request.validate() {
            Err(TariffError::InvalidInput { field, .. }) => assert_eq!(field, "point2Tariff"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut request = sample_request();
        request.point1_km = f64::NAN;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut request = sample_request();
        request.hyper_min_km = 100;
        request.hyper_max_km = 100;

        match request.validate() {
            Err(TariffError::InvalidInput { field, .. }) => assert_eq!(field, "hyperMinKm"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_window_past_max_distance() {
        let mut request = sample_request();
        request.max_distance_km = 50;

        match request.validate() {
            Err(TariffError::InvalidInput { field, .. }) => assert_eq!(field, "hyperMaxKm"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_margin_bounds() {
        let mut request = sample_request();
        request.margin_percent = 100.0;
        assert!(request.validate().is_ok());

        request.margin_percent = 100.5;
        assert!(request.validate().is_err());

        request.margin_percent = -1.0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_max_distance_limit() {
        let mut request = sample_request();
        request.max_distance_km = MAX_DISTANCE_KM_LIMIT + 1;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_linear_request_validation() {
        let request = GenerateLinearRequest {
            start_km: 10.0,
            start_tariff: 40.0,
            end_km: 200.0,
            end_tariff: 20.0,
            volume_coeff: 1.4,
            margin_percent: 10.0,
            max_distance_km: 300,
        };
        assert!(request.validate().is_ok());

        let inverted = GenerateLinearRequest { start_km: 200.0, end_km: 10.0, ..request.clone() };
        assert!(inverted.validate().is_err());

        let too_far = GenerateLinearRequest { end_km: 301.0, ..request };
        assert!(too_far.validate().is_err());
    }

    #[test]
    fn test_evaluate_rejects_non_positive_denominator() {
        let params = HyperbolaParameters { a: 10.0, b: 100.0, c: -5.0 };
        assert!(params.evaluate(5.0).is_none());
        assert!(params.evaluate(3.0).is_none());
        assert_eq!(params.evaluate(15.0), Some(20.0));
    }

    #[test]
    fn test_tariff_row_serialize() {
        let row = TariffRow {
            distance_km: 7,
            base_tariff_t: 70.0,
            base_tariff_tkm: 10.0,
            base_tariff_m3: 98.0,
            base_tariff_m3km: 14.0,
            outgoing_tariff_t: 63.0,
            outgoing_tariff_tkm: 9.0,
            outgoing_tariff_m3: 88.2,
            outgoing_tariff_m3km: 12.6,
            margin_t: 7.0,
            margin_tkm: 1.0,
            margin_m3: 9.8,
            margin_m3km: 1.4,
            volume_coeff: 1.4,
            margin_percent: 10.0,
        };

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"distanceKm\":7"));
        assert!(json.contains("\"baseTariffM3km\":14.0"));
        assert!(json.contains("\"outgoingTariffT\":63.0"));
    }
}
