//! Hyperbola solver
//!
//! Fits `tariff(km) = a + b / (km + c)` through three calibration points.
//!
//! For a fixed `c` the curve is linear in `a` and `b`, so points 1 and 2
//! determine them in closed form. That leaves a scalar residual at point 3,
//! `f(c) = t3 - (a + b / (km3 + c))`, which is driven to zero with
//! Newton-Raphson. If Newton does not converge, a bounded linear scan over
//! `c` picks the best candidate.

use tracing::{debug, warn};

use crate::types::{CalibrationPoint, HyperbolaParameters};

/// Residual below which a candidate is treated as an exact fit
pub const CONVERGENCE_TOLERANCE: f64 = 1e-10;

/// Best-effort scan results are accepted below this residual
pub const ACCEPTANCE_THRESHOLD: f64 = 1.0;

pub const MAX_NEWTON_ITERATIONS: u32 = 100;

/// Nudge applied to `c` when a candidate is infeasible or ill-conditioned
const C_NUDGE: f64 = 0.1;

/// Spacing and upper bound of the fallback scan over `c`
const SCAN_STEP: f64 = 0.1;
const SCAN_UPPER_BOUND: f64 = 1000.0;

/// Below this `|1/(km1+c) - 1/(km2+c)|` the two-point sub-solve is unstable
const MIN_INVERSE_GAP: f64 = 1e-12;

/// Below this `|f'(c)|` a Newton step would blow up
const MIN_DERIVATIVE: f64 = 1e-14;

/// Outcome of a solve, distinguishing exact fits from best-effort ones
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveOutcome {
    /// Newton drove the residual at point 3 below `CONVERGENCE_TOLERANCE`
    Converged {
        params: HyperbolaParameters,
        residual: f64,
    },
    /// Newton failed; the scan found a candidate under `ACCEPTANCE_THRESHOLD`.
    /// An exact grid hit still lands here.
    FallbackUsed {
        params: HyperbolaParameters,
        residual: f64,
    },
    Failed,
}

impl SolveOutcome {
    pub fn params(&self) -> Option<HyperbolaParameters> {
        match self {
            Self::Converged { params, .. } | Self::FallbackUsed { params, .. } => Some(*params),
            Self::Failed => None,
        }
    }

    pub fn residual(&self) -> Option<f64> {
        match self {
            Self::Converged { residual, .. } | Self::FallbackUsed { residual, .. } => Some(*residual),
            Self::Failed => None,
        }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Converged { .. } => "newton",
            Self::FallbackUsed { .. } => "fallback",
            Self::Failed => "failed",
        }
    }
}

/// Result of the Newton phase alone
#[derive(Debug, Clone, Copy)]
pub struct NewtonRun {
    /// Last feasible iterate, if any was reached
    pub params: Option<HyperbolaParameters>,
    /// Absolute residual at point 3 for `params`
    pub residual: f64,
    pub converged: bool,
    pub iterations: u32,
}

/// One evaluation of the closed-form sub-solve at a given `c`
#[derive(Debug, Clone, Copy)]
struct Candidate {
    params: HyperbolaParameters,
    /// Signed residual at point 3
    residual: f64,
    /// Inverse distances `1/(km_i + c)`
    inv: [f64; 3],
}

/// Solve for the hyperbola through three calibration points
pub fn solve(points: &[CalibrationPoint; 3]) -> SolveOutcome {
    let newton = newton_solve(points);
    if newton.converged {
        if let Some(params) = newton.params {
            debug!(
                "Hyperbola converged after {} Newton iterations: a={}, b={}, c={}, residual={:e}",
                newton.iterations, params.a, params.b, params.c, newton.residual
            );
            return SolveOutcome::Converged {
                params,
                residual: newton.residual,
            };
        }
    }

    debug!(
        "Newton did not converge after {} iterations, scanning c",
        newton.iterations
    );
    let outcome = scan_solve(points);
    match &outcome {
        SolveOutcome::FallbackUsed { params, residual } => warn!(
            "Hyperbola fit used fallback scan: a={}, b={}, c={}, residual={}",
            params.a, params.b, params.c, residual
        ),
        SolveOutcome::Failed => warn!("No hyperbola found for calibration points {:?}", points),
        SolveOutcome::Converged { .. } => {}
    }
    outcome
}

/// Newton-Raphson on `c`, starting at 0.
///
/// Infeasible or ill-conditioned iterates are nudged upward by a fixed step
/// instead of being evaluated. Pure: all state lives in the loop.
pub fn newton_solve(points: &[CalibrationPoint; 3]) -> NewtonRun {
    let mut c = 0.0;
    let mut last = None;
    let mut last_residual = f64::INFINITY;

    for iteration in 0..MAX_NEWTON_ITERATIONS {
        let Some(candidate) = evaluate_candidate(points, c) else {
            c += C_NUDGE;
            continue;
        };
        last = Some(candidate.params);
        last_residual = candidate.residual.abs();

        if last_residual < CONVERGENCE_TOLERANCE {
            return NewtonRun {
                params: Some(candidate.params),
                residual: last_residual,
                converged: true,
                iterations: iteration + 1,
            };
        }

        // d/dc of the point-3 residual, with a and b following c through the
        // point 1-2 sub-solve
        let [u1, u2, u3] = candidate.inv;
        let derivative = candidate.params.b * (u1 - u3) * (u2 - u3);
        if !derivative.is_finite() || derivative.abs() < MIN_DERIVATIVE {
            c += C_NUDGE;
            continue;
        }

        let next = c - candidate.residual / derivative;
        c = if next.is_finite() { next } else { c + C_NUDGE };
    }

    NewtonRun {
        params: last,
        residual: last_residual,
        converged: false,
        iterations: MAX_NEWTON_ITERATIONS,
    }
}

/// Linear scan of `c` over `[-min(km) + step, SCAN_UPPER_BOUND)`.
///
/// Stops at the first exact grid hit. Every result is reported as
/// `FallbackUsed` so callers can tell which phase produced it.
pub fn scan_solve(points: &[CalibrationPoint; 3]) -> SolveOutcome {
    let min_km = points
        .iter()
        .map(|p| p.distance_km)
        .fold(f64::INFINITY, f64::min);
    let start = -min_km + SCAN_STEP;

    let mut best: Option<(HyperbolaParameters, f64)> = None;
    let mut step = 0u32;
    loop {
        // Multiply instead of accumulating to keep the grid free of drift
        let c = start + f64::from(step) * SCAN_STEP;
        if c >= SCAN_UPPER_BOUND {
            break;
        }
        step += 1;

        let Some(candidate) = evaluate_candidate(points, c) else {
            continue;
        };
        let residual = candidate.residual.abs();
        if residual < CONVERGENCE_TOLERANCE {
            return SolveOutcome::FallbackUsed {
                params: candidate.params,
                residual,
            };
        }
        if best.map_or(true, |(_, r)| residual < r) {
            best = Some((candidate.params, residual));
        }
    }

    match best {
        Some((params, residual)) if residual < ACCEPTANCE_THRESHOLD => {
            SolveOutcome::FallbackUsed { params, residual }
        }
        _ => SolveOutcome::Failed,
    }
}

/// Closed-form `(a, b)` from points 1 and 2 at a fixed `c`, plus the
/// residual at point 3. `None` if `c` is infeasible or the sub-solve is
/// ill-conditioned.
fn evaluate_candidate(points: &[CalibrationPoint; 3], c: f64) -> Option<Candidate> {
    if !c.is_finite() || points.iter().any(|p| p.distance_km + c <= 0.0) {
        return None;
    }

    let inv = [
        1.0 / (points[0].distance_km + c),
        1.0 / (points[1].distance_km + c),
        1.0 / (points[2].distance_km + c),
    ];
    let gap = inv[0] - inv[1];
    if gap.abs() < MIN_INVERSE_GAP {
        return None;
    }

    let b = (points[0].tariff_per_km - points[1].tariff_per_km) / gap;
    let a = points[0].tariff_per_km - b * inv[0];
    let residual = points[2].tariff_per_km - (a + b * inv[2]);

    let params = HyperbolaParameters { a, b, c };
    if !params.is_finite() || !residual.is_finite() {
        return None;
    }

    Some(Candidate { params, residual, inv })
}
