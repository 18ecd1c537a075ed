//! Tariff table materializer
//!
//! Expands a rate curve into one `TariffRow` per whole kilometre.

use crate::types::{GenerationConfig, HyperbolaParameters, TariffRow};

use super::margin::build_row;

/// Per-km rate from the hyperbola, held flat outside the application window.
///
/// The distance is clamped before evaluation. Rates that come out negative or
/// undefined (pole at `km + c <= 0`) fall back to the rate at `hyper_max_km`,
/// and to zero if that is unusable too.
pub fn hyperbolic_rate(params: &HyperbolaParameters, config: &GenerationConfig, distance_km: i32) -> f64 {
    let effective_km = distance_km.clamp(config.hyper_min_km, config.hyper_max_km);

    match params.evaluate(f64::from(effective_km)) {
        Some(rate) if rate >= 0.0 => rate,
        _ => boundary_rate(params, config),
    }
}

fn boundary_rate(params: &HyperbolaParameters, config: &GenerationConfig) -> f64 {
    params
        .evaluate(f64::from(config.hyper_max_km))
        .filter(|rate| *rate >= 0.0)
        .unwrap_or(0.0)
}

/// Materialize rows `1..=max_distance_km` from an arbitrary per-km rate function
pub fn materialize_with<F>(max_distance_km: i32, volume_coeff: f64, margin_percent: f64, rate: F) -> Vec<TariffRow>
where
    F: Fn(i32) -> f64,
{
    (1..=max_distance_km)
        .map(|km| build_row(km, rate(km), volume_coeff, margin_percent))
        .collect()
}

/// Materialize the full table for a solved hyperbola
pub fn materialize_hyperbolic(params: &HyperbolaParameters, config: &GenerationConfig) -> Vec<TariffRow> {
    materialize_with(
        config.max_distance_km,
        config.volume_coeff,
        config.margin_percent,
        |km| hyperbolic_rate(params, config, km),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tariff::hyperbola::solve;
    use crate::types::CalibrationPoint;

    fn reference_config() -> GenerationConfig {
        GenerationConfig {
            hyper_min_km: 1,
            hyper_max_km: 100,
            volume_coeff: 1.4,
            margin_percent: 0.0,
            max_distance_km: 500,
        }
    }

    fn reference_params() -> HyperbolaParameters {
        let points = [
            CalibrationPoint::new(1.0, 50.0),
            CalibrationPoint::new(20.0, 35.0),
            CalibrationPoint::new(50.0, 25.0),
        ];
        solve(&points).params().unwrap()
    }

    #[test]
    fn test_reference_table() {
        let params = reference_params();
        let config = reference_config();

        let rows = materialize_hyperbolic(&params, &config);

        assert_eq!(rows.len(), 500);
        assert!((rows[0].base_tariff_tkm - 50.0).abs() < 1e-6);

        let at_100 = rows[99].base_tariff_tkm;
        assert_eq!(rows[499].distance_km, 500);
        assert_eq!(rows[499].base_tariff_tkm, at_100);

        for row in &rows {
            assert!((row.base_tariff_m3km - row.base_tariff_tkm * 1.4).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rows_are_complete_and_distinct() {
        let rows = materialize_hyperbolic(&reference_params(), &reference_config());

        let distances: Vec<i32> = rows.iter().map(|r| r.distance_km).collect();
        let expected: Vec<i32> = (1..=500).collect();
        assert_eq!(distances, expected);
    }

    #[test]
    fn test_rate_clamped_below_window() {
        let params = reference_params();
        let config = GenerationConfig { hyper_min_km: 10, ..reference_config() };

        let at_min = hyperbolic_rate(&params, &config, 10);
        for km in 1..10 {
            assert_eq!(hyperbolic_rate(&params, &config, km), at_min);
        }
        assert_ne!(hyperbolic_rate(&params, &config, 11), at_min);
    }

    #[test]
    fn test_rate_clamped_above_window() {
        let params = reference_params();
        let config = reference_config();

        let at_max = hyperbolic_rate(&params, &config, 100);
        for km in [101, 250, 500] {
            assert_eq!(hyperbolic_rate(&params, &config, km), at_max);
        }
    }

    #[test]
    fn test_negative_rate_replaced_by_boundary() {
        // Crosses zero at km = 10: a + b / (km + c) = -10 + 100 / km
        let params = HyperbolaParameters { a: -10.0, b: 100.0, c: 0.0 };
        let config = GenerationConfig {
            hyper_min_km: 1,
            hyper_max_km: 5,
            volume_coeff: 1.0,
            margin_percent: 0.0,
            max_distance_km: 20,
        };
        assert_eq!(hyperbolic_rate(&params, &config, 3), -10.0 + 100.0 / 3.0);

        let wide = GenerationConfig { hyper_max_km: 20, ..config };
        let rate = hyperbolic_rate(&params, &wide, 15);
        // Value at hyper_max_km = 20 is also negative, so the floor applies
        assert_eq!(rate, 0.0);

        let rows = materialize_hyperbolic(&params, &wide);
        for row in &rows {
            assert!(row.base_tariff_tkm >= 0.0);
            assert!(row.base_tariff_t >= 0.0);
            assert!(row.outgoing_tariff_m3 >= 0.0);
        }
    }

    #[test]
    fn test_pole_in_window_uses_boundary() {
        // km + c <= 0 for km <= 3
        let params = HyperbolaParameters { a: 5.0, b: 50.0, c: -3.0 };
        let config = GenerationConfig {
            hyper_min_km: 1,
            hyper_max_km: 10,
            volume_coeff: 1.0,
            margin_percent: 0.0,
            max_distance_km: 12,
        };

        let boundary = params.evaluate(10.0).unwrap();
        assert_eq!(hyperbolic_rate(&params, &config, 2), boundary);
        assert_eq!(hyperbolic_rate(&params, &config, 3), boundary);
        assert_eq!(hyperbolic_rate(&params, &config, 5), 5.0 + 50.0 / 2.0);
    }

    #[test]
    fn test_margin_applied_to_every_row() {
        let config = GenerationConfig { margin_percent: 20.0, ..reference_config() };
        let rows = materialize_hyperbolic(&reference_params(), &config);

        for row in &rows {
            assert!((row.outgoing_tariff_t - row.base_tariff_t * 0.8).abs() < 1e-9);
            assert!((row.base_tariff_t - row.outgoing_tariff_t - row.margin_t).abs() < 1e-9);
            assert_eq!(row.margin_percent, 20.0);
        }
    }
}
