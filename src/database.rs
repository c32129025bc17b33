//! Hydrodynamic coefficient store.
//!
//! [`HydroDb`] holds the global simulation parameters and one
//! [`BodyCoefficients`] per body, parsed from a BEMIO database. Coefficients
//! are stored exactly as read; density/gravity scaling is applied by the
//! accessors so the raw data can be round-tripped and re-resampled at will.

use std::path::Path;

use faer::Mat;
use itertools::Itertools;
use ndarray::Array3;
use num_complex::Complex64;

use crate::bemio::BemioFile;
use crate::error::{HydroError, Result};
use crate::interp::{lerp, CubicSpline};

/// Excitation impulse response on its native time base.
pub struct ExcitationIrf {
    /// `[6, n_dir, n_time]`
    pub data: Array3<f64>,
    pub time: Vec<f64>,
}

/// Excitation impulse response resampled to the simulation time step.
pub struct ResampledIrf {
    pub dt: f64,
    /// `[6, n_dir, n_time]`
    pub data: Array3<f64>,
    pub time: Vec<f64>,
}

/// Hydrodynamic coefficients for one body, immutable after load.
pub struct BodyCoefficients {
    /// Body number as stored in the file (1-based).
    pub body_number: usize,
    /// Displaced volume at equilibrium [m^3].
    pub disp_vol: f64,
    /// Center of gravity [m].
    pub cg: [f64; 3],
    /// Center of buoyancy [m].
    pub cb: [f64; 3],
    /// Linear hydrostatic stiffness, 6x6, unscaled (rho*g applied on access).
    pub stiffness: Mat<f64>,
    /// Infinite-frequency added mass, 6x6 or 6x6N, unscaled (rho on access).
    pub added_mass_inf: Mat<f64>,
    /// Radiation IRF `[6, 6N, n_time]`, unscaled (rho on access).
    pub rirf: Array3<f64>,
    /// Radiation IRF time base, uniform spacing.
    pub rirf_time: Vec<f64>,
    /// Excitation magnitude `[6, n_dir, n_freq]`, unscaled (rho*g on access).
    pub ex_mag: Array3<f64>,
    /// Excitation phase `[6, n_dir, n_freq]` [rad].
    pub ex_phase: Array3<f64>,
    /// Excitation real part `[6, n_dir, n_freq]`, unscaled.
    pub ex_re: Array3<f64>,
    /// Excitation imaginary part `[6, n_dir, n_freq]`, unscaled.
    pub ex_im: Array3<f64>,
    /// Excitation impulse response, when present in the database.
    pub ex_irf: Option<ExcitationIrf>,
    /// Lazily-filled resampled excitation IRF.
    pub ex_irf_resampled: Option<ResampledIrf>,
    /// Frequency-domain radiation damping `B(w)` `[6, 6N, n_freq]`, optional.
    pub radiation_damping: Option<Array3<f64>>,
}

/// Process-lifetime coefficient database shared read-only by the engine,
/// the wave models, and the added-mass contributor.
pub struct HydroDb {
    /// Water density [kg/m^3].
    pub rho: f64,
    /// Gravitational acceleration [m/s^2].
    pub g: f64,
    /// Frequency grid shared across bodies [rad/s], strictly increasing.
    pub freq: Vec<f64>,
    pub bodies: Vec<BodyCoefficients>,
}

impl HydroDb {
    /// Opens a BEMIO database and materializes every `bodyN` group.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = BemioFile::open(path)?;

        let rho = file.scalar("simulation_parameters/rho")?;
        let g = file.scalar("simulation_parameters/g")?;
        let freq = file.vector("simulation_parameters/w")?;

        let n_bodies = (1..)
            .take_while(|n| file.exists(&format!("body{n}")))
            .count();
        if n_bodies == 0 {
            return Err(HydroError::MissingCoefficient {
                path: "body1".into(),
            });
        }

        let bodies = (1..=n_bodies)
            .map(|n| Self::read_body(&file, n))
            .collect::<Result<Vec<_>>>()?;

        let db = Self {
            rho,
            g,
            freq,
            bodies,
        };
        db.validate()?;

        log::info!(
            "loaded hydrodynamic database: {} bodies, {} frequencies, rirf length {}",
            db.n_bodies(),
            db.freq.len(),
            db.rirf_len()
        );

        Ok(db)
    }

    fn read_body(file: &BemioFile, n: usize) -> Result<BodyCoefficients> {
        let prop = |name: &str| format!("body{n}/properties/{name}");
        let coeff = |name: &str| format!("body{n}/hydro_coeffs/{name}");

        let ex_irf_path = coeff("excitation/impulse_response_fun/f");
        let ex_irf = if file.exists(&ex_irf_path) {
            Some(ExcitationIrf {
                data: file.array3(&ex_irf_path)?,
                time: file.vector(&coeff("excitation/impulse_response_fun/t"))?,
            })
        } else {
            None
        };

        let bw_path = coeff("radiation_damping/all");
        let radiation_damping = if file.exists(&bw_path) {
            Some(file.array3(&bw_path)?)
        } else {
            None
        };

        Ok(BodyCoefficients {
            body_number: file.scalar(&prop("body_number"))? as usize,
            disp_vol: file.scalar(&prop("disp_vol"))?,
            cg: file.vector3(&prop("cg"))?,
            cb: file.vector3(&prop("cb"))?,
            stiffness: file.matrix(&coeff("linear_restoring_stiffness"))?,
            added_mass_inf: file.matrix(&coeff("added_mass/inf_freq"))?,
            rirf: file.array3(&coeff("radiation_damping/impulse_response_fun/K"))?,
            rirf_time: file.vector(&coeff("radiation_damping/impulse_response_fun/t"))?,
            ex_mag: file.array3(&coeff("excitation/mag"))?,
            ex_phase: file.array3(&coeff("excitation/phase"))?,
            ex_re: file.array3(&coeff("excitation/re"))?,
            ex_im: file.array3(&coeff("excitation/im"))?,
            ex_irf,
            ex_irf_resampled: None,
            radiation_damping,
        })
    }

    /// Checks the structural invariants the per-step accessors rely on.
    pub fn validate(&self) -> Result<()> {
        if !self.freq.windows(2).all(|w| w[1] > w[0]) {
            return Err(HydroError::ShapeMismatch {
                name: "frequency grid (not strictly increasing)",
                expected: self.freq.len(),
                actual: 0,
            });
        }
        let n_dofs = 6 * self.bodies.len();
        for (b, body) in self.bodies.iter().enumerate() {
            if body.body_number != b + 1 {
                return Err(HydroError::ShapeMismatch {
                    name: "body_number",
                    expected: b + 1,
                    actual: body.body_number,
                });
            }
            let (d0, d1, d2) = body.rirf.dim();
            if d0 != 6 || d1 != n_dofs {
                return Err(HydroError::ShapeMismatch {
                    name: "rirf columns (must span all body dofs)",
                    expected: n_dofs,
                    actual: d1,
                });
            }
            if body.rirf_time.len() != d2 {
                return Err(HydroError::ShapeMismatch {
                    name: "rirf time base",
                    expected: d2,
                    actual: body.rirf_time.len(),
                });
            }
            if d2 < 2 || body.rirf_time[1] - body.rirf_time[0] <= 0. {
                return Err(HydroError::ShapeMismatch {
                    name: "rirf time step (must be positive)",
                    expected: 2,
                    actual: d2,
                });
            }
            if body.stiffness.nrows() != 6 || body.stiffness.ncols() != 6 {
                return Err(HydroError::ShapeMismatch {
                    name: "linear restoring stiffness",
                    expected: 6,
                    actual: body.stiffness.nrows(),
                });
            }
            let ncols = body.added_mass_inf.ncols();
            if body.added_mass_inf.nrows() != 6 || (ncols != 6 && ncols != n_dofs) {
                return Err(HydroError::ShapeMismatch {
                    name: "infinite-frequency added mass",
                    expected: 6,
                    actual: ncols,
                });
            }
            if body.ex_mag.dim().2 != self.freq.len() {
                return Err(HydroError::ShapeMismatch {
                    name: "excitation magnitude frequency axis",
                    expected: self.freq.len(),
                    actual: body.ex_mag.dim().2,
                });
            }
        }
        Ok(())
    }

    pub fn n_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Total degrees of freedom of the system (6 per body).
    pub fn n_dofs(&self) -> usize {
        6 * self.bodies.len()
    }

    /// Number of radiation IRF time samples (shared across bodies).
    pub fn rirf_len(&self) -> usize {
        self.bodies[0].rirf.dim().2
    }

    /// Radiation IRF time base used for the convolution quadrature.
    pub fn rirf_time(&self) -> &[f64] {
        &self.bodies[0].rirf_time
    }

    //--------------------------------------------------------------------------
    // Scaled accessors
    //--------------------------------------------------------------------------

    /// `K(b)[i,j] * rho * g`
    #[inline]
    pub fn stiffness_scaled(&self, b: usize, i: usize, j: usize) -> f64 {
        self.bodies[b].stiffness[(i, j)] * self.rho * self.g
    }

    /// `RIRF(b)[i, col, s] * rho`, `col` spanning all 6N velocity dofs.
    #[inline]
    pub fn rirf_scaled(&self, b: usize, i: usize, col: usize, s: usize) -> f64 {
        self.bodies[b].rirf[[i, col, s]] * self.rho
    }

    /// Infinite-frequency added mass block for one body, scaled by rho.
    pub fn added_mass_block(&self, b: usize) -> Mat<f64> {
        let a = &self.bodies[b].added_mass_inf;
        Mat::from_fn(a.nrows(), a.ncols(), |i, j| a[(i, j)] * self.rho)
    }

    /// `ExMag(b)[i, dir, k] * rho * g`
    #[inline]
    pub fn ex_mag_scaled(&self, b: usize, i: usize, dir: usize, k: usize) -> f64 {
        self.bodies[b].ex_mag[[i, dir, k]] * self.rho * self.g
    }

    #[inline]
    pub fn ex_phase(&self, b: usize, i: usize, dir: usize, k: usize) -> f64 {
        self.bodies[b].ex_phase[[i, dir, k]]
    }

    /// Complex excitation response `re + i*im` at grid point `k`, scaled by
    /// rho*g. Time-domain excitation interpolates the tabulated magnitude
    /// and phase instead; the complex form backs the polar cross-check.
    pub fn excitation_response(&self, b: usize, i: usize, dir: usize, k: usize) -> Complex64 {
        let body = &self.bodies[b];
        Complex64::new(body.ex_re[[i, dir, k]], body.ex_im[[i, dir, k]]) * self.rho * self.g
    }

    /// Excitation magnitude and phase recovered from the complex response,
    /// `(norm, atan2(im, re))`. The recovered phase is wrapped to
    /// `(-pi, pi]`, unlike the tabulated one, which databases may store
    /// unwrapped.
    pub fn excitation_polar(&self, b: usize, i: usize, dir: usize, k: usize) -> (f64, f64) {
        let resp = self.excitation_response(b, i, dir, k);
        (resp.norm(), resp.im.atan2(resp.re))
    }

    /// Frequency-domain radiation damping `B(w)[i, col, k] * rho`, for
    /// databases that carry the optional damping tensor. `col` spans all 6N
    /// velocity dofs, like the radiation IRF.
    pub fn radiation_damping_scaled(
        &self,
        b: usize,
        i: usize,
        col: usize,
        k: usize,
    ) -> Option<f64> {
        self.bodies[b]
            .radiation_damping
            .as_ref()
            .map(|bw| bw[[i, col, k]] * self.rho)
    }

    //--------------------------------------------------------------------------
    // Frequency interpolation
    //--------------------------------------------------------------------------

    pub fn omega_max(&self) -> f64 {
        *self.freq.last().unwrap()
    }

    /// Frequency grid spacing implied by the BEMIO layout, `w_max / n_freq`.
    pub fn omega_delta(&self) -> f64 {
        self.omega_max() / self.freq.len() as f64
    }

    /// Maps a continuous frequency to `(k0, alpha)` for linear interpolation
    /// between grid points `k0` and `k0 + 1`.
    fn freq_fraction(&self, omega: f64) -> Result<(usize, f64)> {
        let n = self.freq.len();
        let index = omega / self.omega_delta() - 1.;
        if !(0.0..=(n - 1) as f64).contains(&index) {
            return Err(HydroError::FreqOutOfRange {
                omega,
                max: self.omega_max(),
            });
        }
        let k0 = (index.floor() as usize).min(n - 2);
        Ok((k0, index - k0 as f64))
    }

    /// Excitation magnitude at `omega`, linearly interpolated and scaled.
    pub fn ex_mag_interp(&self, b: usize, i: usize, dir: usize, omega: f64) -> Result<f64> {
        let (k0, alpha) = self.freq_fraction(omega)?;
        Ok(lerp(
            self.ex_mag_scaled(b, i, dir, k0),
            self.ex_mag_scaled(b, i, dir, k0 + 1),
            alpha,
        ))
    }

    /// Excitation phase at `omega`, linearly interpolated. The database
    /// stores unwrapped phases; no unwrapping happens here.
    pub fn ex_phase_interp(&self, b: usize, i: usize, dir: usize, omega: f64) -> Result<f64> {
        let (k0, alpha) = self.freq_fraction(omega)?;
        Ok(lerp(
            self.ex_phase(b, i, dir, k0),
            self.ex_phase(b, i, dir, k0 + 1),
            alpha,
        ))
    }

    //--------------------------------------------------------------------------
    // Excitation IRF resampling
    //--------------------------------------------------------------------------

    /// Resamples every body's excitation IRF onto `[t_min, t_min+dt, ...]`
    /// by cubic spline. Always computed from the native samples, so calling
    /// again with the same `dt` leaves the data bit-identical.
    pub fn resample_excitation_irf(&mut self, dt: f64) -> Result<()> {
        for b in 0..self.bodies.len() {
            if let Some(rs) = &self.bodies[b].ex_irf_resampled {
                if rs.dt == dt {
                    continue;
                }
            }

            let body = &self.bodies[b];
            let irf = body
                .ex_irf
                .as_ref()
                .ok_or_else(|| HydroError::MissingCoefficient {
                    path: format!(
                        "body{}/hydro_coeffs/excitation/impulse_response_fun/f",
                        body.body_number
                    ),
                })?;

            let (n_rows, n_dir, _) = irf.data.dim();
            let t_min = irf.time[0];
            let t_max = *irf.time.last().unwrap();
            let n_time = ((t_max - t_min) / dt + 1e-9).floor() as usize + 1;
            let time = (0..n_time).map(|j| t_min + j as f64 * dt).collect_vec();

            let mut data = Array3::<f64>::zeros((n_rows, n_dir, n_time));
            for i in 0..n_rows {
                for d in 0..n_dir {
                    let y = irf.data.slice(ndarray::s![i, d, ..]).to_vec();
                    let spline = CubicSpline::new(&irf.time, &y);
                    for (j, &t) in time.iter().enumerate() {
                        data[[i, d, j]] = spline.eval(t);
                    }
                }
            }

            log::debug!(
                "resampled excitation irf for body {}: {} samples at dt {}",
                body.body_number,
                n_time,
                dt
            );
            self.bodies[b].ex_irf_resampled = Some(ResampledIrf { dt, data, time });
        }
        Ok(())
    }

    /// Resampled excitation IRF for one body; errors until
    /// [`Self::resample_excitation_irf`] has run.
    pub fn excitation_irf_resampled(&self, b: usize) -> Result<&ResampledIrf> {
        self.bodies[b]
            .ex_irf_resampled
            .as_ref()
            .ok_or(HydroError::NotInitialized(
                "excitation impulse response not resampled to the simulation step",
            ))
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use approx::assert_relative_eq;
    use ndarray::Array3;

    use super::*;

    /// Single-body database with analytically-known entries.
    fn test_db() -> HydroDb {
        let n_freq = 10;
        let omega_max = 5.;
        // BEMIO grid convention: w_k = (k+1) * w_max / n_freq
        let freq = (0..n_freq)
            .map(|k| (k + 1) as f64 * omega_max / n_freq as f64)
            .collect_vec();

        let n_time = 21;
        let rirf_time = (0..n_time).map(|s| s as f64 * 0.1).collect_vec();

        // Excitation magnitude proportional to grid index, phase linear in
        // it, with the complex form stored consistently
        let mut ex_mag = Array3::zeros((6, 1, n_freq));
        let mut ex_phase = Array3::zeros((6, 1, n_freq));
        let mut ex_re = Array3::zeros((6, 1, n_freq));
        let mut ex_im = Array3::zeros((6, 1, n_freq));
        for i in 0..6 {
            for k in 0..n_freq {
                let mag = (i + 1) as f64 * (k + 1) as f64;
                let phase = 0.1 * k as f64;
                ex_mag[[i, 0, k]] = mag;
                ex_phase[[i, 0, k]] = phase;
                ex_re[[i, 0, k]] = mag * phase.cos();
                ex_im[[i, 0, k]] = mag * phase.sin();
            }
        }

        // Excitation IRF: smooth decaying pulse, native dt 0.1
        let ex_time = (0..41).map(|j| j as f64 * 0.1).collect_vec();
        let mut ex_irf = Array3::zeros((6, 1, ex_time.len()));
        for i in 0..6 {
            for (j, &t) in ex_time.iter().enumerate() {
                ex_irf[[i, 0, j]] = (-(t - 2.) * (t - 2.)).exp() * (i + 1) as f64;
            }
        }

        HydroDb {
            rho: 1000.,
            g: 9.81,
            freq,
            bodies: vec![BodyCoefficients {
                body_number: 1,
                disp_vol: 2.,
                cg: [0., 0., -1.],
                cb: [0., 0., -0.5],
                stiffness: Mat::from_fn(6, 6, |i, j| if i == j { (i + 1) as f64 } else { 0. }),
                added_mass_inf: Mat::from_fn(6, 6, |i, j| if i == j { 10. } else { 0. }),
                rirf: Array3::zeros((6, 6, n_time)),
                rirf_time,
                ex_mag,
                ex_phase,
                ex_re,
                ex_im,
                ex_irf: Some(ExcitationIrf {
                    data: ex_irf,
                    time: ex_time,
                }),
                ex_irf_resampled: None,
                radiation_damping: None,
            }],
        }
    }

    #[test]
    fn test_validate() {
        assert!(test_db().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_rirf_columns() {
        let mut db = test_db();
        db.bodies[0].rirf = Array3::zeros((6, 12, 21));
        assert!(matches!(
            db.validate(),
            Err(HydroError::ShapeMismatch { actual: 12, .. })
        ));
    }

    #[test]
    fn test_scaled_accessors() {
        let db = test_db();
        assert_eq!(db.stiffness_scaled(0, 2, 2), 3. * 1000. * 9.81);
        assert_eq!(db.ex_mag_scaled(0, 2, 0, 4), 3. * 5. * 1000. * 9.81);
        let a = db.added_mass_block(0);
        assert_eq!(a[(0, 0)], 10. * 1000.);
        assert_eq!(a[(0, 1)], 0.);
    }

    #[test]
    fn test_freq_interp_exact_at_grid_point() {
        let db = test_db();
        // w_k = (k+1) * dw maps exactly to index k
        for k in 0..db.freq.len() {
            let omega = db.freq[k];
            let mag = db.ex_mag_interp(0, 0, 0, omega).unwrap();
            assert_eq!(mag, db.ex_mag_scaled(0, 0, 0, k));
            let phase = db.ex_phase_interp(0, 0, 0, omega).unwrap();
            assert_eq!(phase, db.ex_phase(0, 0, 0, k));
        }
    }

    #[test]
    fn test_freq_interp_midpoint() {
        let db = test_db();
        let dw = db.omega_delta();
        // Halfway between grid points 2 and 3
        let mag = db.ex_mag_interp(0, 0, 0, 3.5 * dw).unwrap();
        let expected = 0.5 * (db.ex_mag_scaled(0, 0, 0, 2) + db.ex_mag_scaled(0, 0, 0, 3));
        assert_relative_eq!(mag, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_excitation_polar_recovers_mag_and_phase() {
        // re/im stored consistently with the tabulated polar form: atan2
        // recovery must reproduce it (phases here stay inside (-pi, pi])
        let db = test_db();
        for i in 0..6 {
            for k in 0..db.freq.len() {
                let (mag, phase) = db.excitation_polar(0, i, 0, k);
                assert_relative_eq!(mag, db.ex_mag_scaled(0, i, 0, k), max_relative = 1e-12);
                assert_relative_eq!(phase, db.ex_phase(0, i, 0, k), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_radiation_damping_absent_reads_none() {
        let db = test_db();
        assert!(db.radiation_damping_scaled(0, 0, 0, 0).is_none());
    }

    #[test]
    fn test_radiation_damping_matches_rirf_transform() {
        // B(w) and the radiation IRF are a cosine-transform pair. With
        // K(tau) = exp(-tau) the damping is 1/(1 + w^2); the stored tensor
        // must agree with the transform of the stored kernel.
        let mut db = test_db();
        let n_time = 301;
        let dt = 0.05;
        let time = (0..n_time).map(|s| s as f64 * dt).collect_vec();

        let mut rirf = Array3::zeros((6, 6, n_time));
        for (s, &tau) in time.iter().enumerate() {
            rirf[[2, 2, s]] = (-tau).exp();
        }
        let mut bw = Array3::zeros((6, 6, db.freq.len()));
        for (k, &w) in db.freq.iter().enumerate() {
            bw[[2, 2, k]] = 1. / (1. + w * w);
        }
        db.bodies[0].rirf = rirf;
        db.bodies[0].rirf_time = time.clone();
        db.bodies[0].radiation_damping = Some(bw);

        for k in 0..db.freq.len() {
            let w = db.freq[k];
            let mut transform = 0.;
            for s in 1..n_time {
                let f0 = db.rirf_scaled(0, 2, 2, s - 1) * (w * time[s - 1]).cos();
                let f1 = db.rirf_scaled(0, 2, 2, s) * (w * time[s]).cos();
                transform += 0.5 * (f0 + f1) * dt;
            }
            let stored = db.radiation_damping_scaled(0, 2, 2, k).unwrap();
            assert_relative_eq!(transform, stored, max_relative = 1e-2);
        }
    }

    #[test]
    fn test_freq_out_of_range() {
        let db = test_db();
        assert!(matches!(
            db.ex_mag_interp(0, 0, 0, 100.),
            Err(HydroError::FreqOutOfRange { .. })
        ));
        assert!(matches!(
            db.ex_mag_interp(0, 0, 0, 0.),
            Err(HydroError::FreqOutOfRange { .. })
        ));
    }

    #[test]
    fn test_resample_hits_native_samples() {
        let mut db = test_db();
        db.resample_excitation_irf(0.1).unwrap();
        let rs = db.excitation_irf_resampled(0).unwrap();
        let irf = db.bodies[0].ex_irf.as_ref().unwrap();
        // Same dt as the native base: spline passes through every knot
        assert_eq!(rs.time.len(), irf.time.len());
        for j in 0..rs.time.len() {
            assert_relative_eq!(rs.data[[2, 0, j]], irf.data[[2, 0, j]], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_resample_idempotent() {
        let mut db = test_db();
        db.resample_excitation_irf(0.05).unwrap();
        let first: Vec<f64> = {
            let rs = db.excitation_irf_resampled(0).unwrap();
            rs.data.iter().copied().collect()
        };
        db.resample_excitation_irf(0.05).unwrap();
        let second: Vec<f64> = {
            let rs = db.excitation_irf_resampled(0).unwrap();
            rs.data.iter().copied().collect()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_resample_missing_irf() {
        let mut db = test_db();
        db.bodies[0].ex_irf = None;
        assert!(matches!(
            db.resample_excitation_irf(0.05),
            Err(HydroError::MissingCoefficient { .. })
        ));
    }

    #[test]
    fn test_resampled_access_before_resample() {
        let db = test_db();
        assert!(matches!(
            db.excitation_irf_resampled(0),
            Err(HydroError::NotInitialized(_))
        ));
    }
}
