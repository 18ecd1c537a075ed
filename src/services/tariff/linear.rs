//! Linear tariff generator
//!
//! Straight line between a start and end (km, tariff) pair, held flat
//! beyond both endpoints.

use crate::types::{GenerateLinearRequest, TariffRow};

use super::materializer::materialize_with;

/// Per-km rate at `distance_km` on the line
pub fn linear_rate(request: &GenerateLinearRequest, distance_km: i32) -> f64 {
    let km = f64::from(distance_km);
    if km <= request.start_km {
        return request.start_tariff;
    }
    if km >= request.end_km {
        return request.end_tariff;
    }

    let t = (km - request.start_km) / (request.end_km - request.start_km);
    request.start_tariff + (request.end_tariff - request.start_tariff) * t
}

pub fn materialize_linear(request: &GenerateLinearRequest) -> Vec<TariffRow> {
    materialize_with(
        request.max_distance_km,
        request.volume_coeff,
        request.margin_percent,
        |km| linear_rate(request, km),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateLinearRequest {
        GenerateLinearRequest {
            start_km: 10.0,
            start_tariff: 40.0,
            end_km: 110.0,
            end_tariff: 20.0,
            volume_coeff: 1.5,
            margin_percent: 10.0,
            max_distance_km: 200,
        }
    }

    #[test]
    fn test_linear_rate_flat_outside_endpoints() {
        let req = request();
        assert_eq!(linear_rate(&req, 1), 40.0);
        assert_eq!(linear_rate(&req, 10), 40.0);
        assert_eq!(linear_rate(&req, 110), 20.0);
        assert_eq!(linear_rate(&req, 200), 20.0);
    }

    #[test]
    fn test_linear_rate_interpolates() {
        let req = request();
        assert!((linear_rate(&req, 60) - 30.0).abs() < 1e-12);
        assert!((linear_rate(&req, 35) - 35.0).abs() < 1e-12);
    }

    #[test]
    fn test_materialize_linear() {
        let rows = materialize_linear(&request());

        assert_eq!(rows.len(), 200);
        let mid = &rows[59];
        assert_eq!(mid.distance_km, 60);
        assert!((mid.base_tariff_t - 1800.0).abs() < 1e-9);
        assert!((mid.base_tariff_m3km - 45.0).abs() < 1e-9);
        assert!((mid.outgoing_tariff_t - 1620.0).abs() < 1e-9);
    }
}
