//! Transport tariff generation
//!
//! Validates a request, fits the rate curve, materializes the per-km table
//! and hands it to the store as one atomic replacement. A failed solve
//! writes nothing.

pub mod hyperbola;
pub mod linear;
pub mod margin;
pub mod materializer;
pub mod store;

pub use hyperbola::SolveOutcome;
pub use store::{MemoryTariffStore, PgTariffStore, TariffStore};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::TariffError;
use crate::types::{
    GenerateHyperbolicRequest, GenerateHyperbolicResponse, GenerateLinearRequest,
    GenerateLinearResponse, TariffConfigSnapshot, TariffRow,
};

pub struct TariffService {
    store: Arc<dyn TariffStore>,
}

impl TariffService {
    pub fn new(store: Arc<dyn TariffStore>) -> Self {
        Self { store }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Fit the hyperbola and replace the table and snapshot
    pub async fn generate_hyperbolic(
        &self,
        request: &GenerateHyperbolicRequest,
    ) -> Result<GenerateHyperbolicResponse, TariffError> {
        request.validate()?;

        let points = request.calibration_points();
        let config = request.generation_config();

        let outcome = hyperbola::solve(&points);
        let (params, residual) = match outcome {
            SolveOutcome::Converged { params, residual }
            | SolveOutcome::FallbackUsed { params, residual } => (params, residual),
            SolveOutcome::Failed => return Err(TariffError::NoSolution),
        };

        // km + c must stay positive across the whole application window
        if f64::from(config.hyper_min_km) + params.c <= 0.0 {
            warn!(
                "Rejecting hyperbola with pole at {} km inside the window starting at {} km",
                -params.c, config.hyper_min_km
            );
            return Err(TariffError::NoSolution);
        }

        let rows = materializer::materialize_hyperbolic(&params, &config);
        debug!("Materialized {} hyperbolic tariff rows", rows.len());

        let snapshot = TariffConfigSnapshot::new(&points, params, &config);
        let rows_written = self.store.replace_table(&rows, Some(&snapshot)).await?;

        info!(
            "Generated hyperbolic tariffs ({}): a={:.6}, b={:.6}, c={:.6}, rows={}",
            outcome.strategy(),
            params.a,
            params.b,
            params.c,
            rows_written
        );

        Ok(GenerateHyperbolicResponse {
            a: params.a,
            b: params.b,
            c: params.c,
            strategy: outcome.strategy().to_string(),
            residual,
            rows_written,
        })
    }

    /// Replace the table from a straight line; the snapshot is left alone
    pub async fn generate_linear(
        &self,
        request: &GenerateLinearRequest,
    ) -> Result<GenerateLinearResponse, TariffError> {
        request.validate()?;

        let rows = linear::materialize_linear(request);
        let rows_written = self.store.replace_table(&rows, None).await?;

        info!(
            "Generated linear tariffs: {} km @ {} -> {} km @ {}, rows={}",
            request.start_km, request.start_tariff, request.end_km, request.end_tariff, rows_written
        );

        Ok(GenerateLinearResponse { rows_written })
    }

    pub async fn config_snapshot(&self) -> Result<Option<TariffConfigSnapshot>, TariffError> {
        Ok(self.store.get_snapshot().await?)
    }

    /// Stored rate for a (possibly fractional) distance, rounded up to the
    /// next whole kilometre
    pub async fn rate_for_distance(&self, distance_km: f64) -> Result<Option<TariffRow>, TariffError> {
        let key = distance_key(distance_km)?;
        Ok(self.store.get_row(key).await?)
    }

    pub async fn list_rates(
        &self,
        from_km: Option<i32>,
        to_km: Option<i32>,
    ) -> Result<Vec<TariffRow>, TariffError> {
        let from_km = from_km.unwrap_or(1).max(1);
        let to_km = to_km.unwrap_or(i32::MAX);
        Ok(self.store.list_rows(from_km, to_km).await?)
    }
}

/// Table key for a distance: ceiling, at least 1
fn distance_key(distance_km: f64) -> Result<i32, TariffError> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(TariffError::invalid(
            "distanceKm",
            format!("must be a non-negative number, got {distance_km}"),
        ));
    }
    let key = distance_km.ceil().max(1.0);
    if key > f64::from(i32::MAX) {
        return Err(TariffError::invalid("distanceKm", "is out of range"));
    }
    Ok(key as i32)
}
