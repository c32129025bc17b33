//! Radiation damping via convolution of the radiation impulse response with
//! the velocity history (the memory term of the Cummins equation).

use faer::Col;
use rayon::prelude::*;

use crate::database::HydroDb;
use crate::history::VelocityHistory;

/// Computes the 6N radiation damping force by trapezoidal quadrature of
/// `sum_col RIRF(b, i, col, s) * v(s, col)` over the IRF time base.
///
/// Row `6b + i` is the force on body `b`, dof `i`; the inner column sum runs
/// over all 6N system velocity dofs, so inter-body radiation coupling is
/// included whenever the database carries it. Rows are independent and are
/// evaluated in parallel; each row's arithmetic is identical to the serial
/// loop. The orchestrator subtracts the returned vector (the force opposes
/// motion).
pub fn convolve(db: &HydroDb, hist: &VelocityHistory) -> Col<f64> {
    let n_dofs = db.n_dofs();
    let n_steps = db.rirf_len();
    let time = db.rirf_time();

    let rows: Vec<f64> = (0..n_dofs)
        .into_par_iter()
        .map(|row| {
            let b = row / 6;
            let i = row % 6;
            let mut acc = 0.;
            let mut s_prev = 0.;
            for s in 0..n_steps {
                let mut sum = 0.;
                for col in 0..n_dofs {
                    sum += db.rirf_scaled(b, i, col, s) * hist.at(s, col);
                }
                if s > 0 {
                    acc += 0.5 * (s_prev + sum) * (time[s] - time[s - 1]);
                }
                s_prev = sum;
            }
            acc
        })
        .collect();

    Col::from_fn(n_dofs, |i| rows[i])
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
