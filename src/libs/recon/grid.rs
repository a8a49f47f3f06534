//! Cost triples for sweeping the solver's event costs.

use serde::Serialize;

/// Relative duplication, transfer and loss costs summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostPoint {
    pub dupli: f64,
    pub transfer: f64,
    pub loss: f64,
}

impl CostPoint {
    /// File-name suffix identifying the point, e.g. `-0.1000_0.2000_0.7000`.
    pub fn suffix(&self) -> String {
        format!("-{:.4}_{:.4}_{:.4}", self.dupli, self.transfer, self.loss)
    }
}

// `start, start + step, ...` while below `stop`
fn arange(start: f64, stop: f64, step: f64) -> impl Iterator<Item = f64> {
    let n = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..n).map(move |i| start + i as f64 * step)
}

/// All points with `d` in `[d_step, 1)` and `t` in `[t_step, 1 - d)`.
///
/// The upper bound of `t` stops `0.01 * t_step` short so that the loss cost
/// never rounds down to zero.
///
/// ```
/// use evorecon::libs::recon::grid::grid_points;
///
/// let points = grid_points(0.1, 0.1);
/// assert_eq!(points.len(), 36);
/// assert_eq!(points[0].suffix(), "-0.1000_0.1000_0.8000");
/// ```
pub fn grid_points(d_step: f64, t_step: f64) -> Vec<CostPoint> {
    if d_step.is_nan() || t_step.is_nan() || d_step <= 0.0 || t_step <= 0.0 {
        return Vec::new();
    }

    let mut points = Vec::new();
    for dupli in arange(d_step, 1.0, d_step) {
        let t_max = 1.0 - dupli;
        for transfer in arange(t_step, t_max - 0.01 * t_step, t_step) {
            points.push(CostPoint {
                dupli,
                transfer,
                loss: 1.0 - transfer - dupli,
            });
        }
    }
    points
}
