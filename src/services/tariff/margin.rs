//! Margin and unit conversion helpers

use crate::types::TariffRow;

/// Multiplier that turns a base price into the outgoing (customer) price
pub fn margin_multiplier(margin_percent: f64) -> f64 {
    1.0 - margin_percent / 100.0
}

/// Base price with the margin applied: `(outgoing, margin)`
pub fn apply_margin(base: f64, multiplier: f64) -> (f64, f64) {
    let outgoing = base * multiplier;
    (outgoing, base - outgoing)
}

/// Build a full row from the per-km rate at `distance_km`.
///
/// `rate_per_km` is the per-ton per-km tariff; totals are for hauling one
/// ton (or one m³) the whole distance.
pub fn build_row(distance_km: i32, rate_per_km: f64, volume_coeff: f64, margin_percent: f64) -> TariffRow {
    let km = f64::from(distance_km);

    let base_tariff_tkm = rate_per_km;
    let base_tariff_t = rate_per_km * km;
    let base_tariff_m3km = rate_per_km * volume_coeff;
    let base_tariff_m3 = base_tariff_t * volume_coeff;

    let multiplier = margin_multiplier(margin_percent);
    let (outgoing_tariff_t, margin_t) = apply_margin(base_tariff_t, multiplier);
    let (outgoing_tariff_tkm, margin_tkm) = apply_margin(base_tariff_tkm, multiplier);
    let (outgoing_tariff_m3, margin_m3) = apply_margin(base_tariff_m3, multiplier);
    let (outgoing_tariff_m3km, margin_m3km) = apply_margin(base_tariff_m3km, multiplier);

    TariffRow {
        distance_km,
        base_tariff_t,
        base_tariff_tkm,
        base_tariff_m3,
        base_tariff_m3km,
        outgoing_tariff_t,
        outgoing_tariff_tkm,
        outgoing_tariff_m3,
        outgoing_tariff_m3km,
        margin_t,
        margin_tkm,
        margin_m3,
        margin_m3km,
        volume_coeff,
        margin_percent,
    }
}
