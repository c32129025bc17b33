//! Wave excitation models.
//!
//! Three variants: still water (no excitation), a regular monochromatic wave
//! evaluated in closed form from the excitation coefficients, and an
//! irregular Pierson-Moskowitz sea state built from a seeded spectrum sample
//! and convolved with the excitation impulse response.

use std::f64::consts::TAU;

use faer::Col;
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use crate::database::HydroDb;
use crate::error::{HydroError, Result};

/// Default spectrum discretization `(f_min, f_max, n_freq)` in Hz.
pub const DEFAULT_SPECTRUM_RANGE: (f64, f64, usize) = (0.001, 1.0, 1000);

/// Pierson-Moskowitz spectral density [m^2/Hz] for significant wave height
/// `hs` [m] and peak period `tp` [s]; peaks at `f = 1/tp`.
pub fn pierson_moskowitz(f: f64, hs: f64, tp: f64) -> f64 {
    let tp4 = tp.powi(4);
    1.25 / tp4 * (hs / 2.).powi(2) * f.powi(-5) * (-1.25 / (tp4 * f.powi(4))).exp()
}

/// Wave excitation model, selected once at engine construction.
pub enum WaveModel {
    /// Still water: zero excitation.
    Still,
    Regular(RegularWave),
    Irregular(IrregularWave),
}

impl WaveModel {
    /// Evaluates the 6N excitation force at time `t`.
    pub fn excitation(&self, db: &HydroDb, t: f64) -> Result<Col<f64>> {
        match self {
            WaveModel::Still => Ok(Col::zeros(db.n_dofs())),
            WaveModel::Regular(wave) => Ok(wave.excitation(t)),
            WaveModel::Irregular(wave) => wave.excitation(db, t),
        }
    }
}

//------------------------------------------------------------------------------
// Regular wave
//------------------------------------------------------------------------------

/// Monochromatic wave of amplitude `a` [m] at frequency `omega` [rad/s].
///
/// The per-dof excitation magnitude and phase are interpolated from the
/// coefficient grid once at construction (wave heading 0); evaluation is
/// memoryless.
pub struct RegularWave {
    pub amplitude: f64,
    pub omega: f64,
    /// Interpolated excitation magnitude per system dof, scaled.
    pub mag: Col<f64>,
    /// Interpolated excitation phase per system dof [rad].
    pub phase: Col<f64>,
}

impl RegularWave {
    pub fn new(db: &HydroDb, amplitude: f64, omega: f64) -> Result<Self> {
        let n_dofs = db.n_dofs();
        let mut mag = Col::<f64>::zeros(n_dofs);
        let mut phase = Col::<f64>::zeros(n_dofs);
        for b in 0..db.n_bodies() {
            for i in 0..6 {
                mag[6 * b + i] = db.ex_mag_interp(b, i, 0, omega)?;
                phase[6 * b + i] = db.ex_phase_interp(b, i, 0, omega)?;
            }
        }
        Ok(Self {
            amplitude,
            omega,
            mag,
            phase,
        })
    }

    pub fn excitation(&self, t: f64) -> Col<f64> {
        Col::from_fn(self.mag.nrows(), |i| {
            self.amplitude * self.mag[i] * (self.omega * t + self.phase[i]).cos()
        })
    }
}

//------------------------------------------------------------------------------
// Irregular wave
//------------------------------------------------------------------------------

/// Inputs for an irregular sea state.
#[derive(Debug, Clone)]
pub struct IrregularWaveParams {
    /// Significant wave height [m].
    pub hs: f64,
    /// Peak period [s].
    pub tp: f64,
    /// Seed for the phase draws; equal seeds reproduce the realization.
    pub seed: u64,
    /// Linear ramp duration [s]; zero disables the ramp.
    pub ramp_duration: f64,
    /// Simulation duration covered by the elevation grid [s].
    pub duration: f64,
    /// Simulation time step [s].
    pub dt: f64,
    /// Spectrum range `(f_min, f_max, n_freq)` in Hz.
    pub spectrum: (f64, f64, usize),
}

/// Irregular sea state sampled from a Pierson-Moskowitz spectrum.
///
/// Construction resamples the excitation IRF to the simulation step, draws
/// the component phases once from a seeded PRNG, and precomputes the
/// free-surface elevation over the whole run. Per-step evaluation convolves
/// the resampled IRF with the elevation record.
pub struct IrregularWave {
    pub params: IrregularWaveParams,
    /// Spectrum frequencies [Hz].
    pub freq_hz: Vec<f64>,
    /// Spectral density at each frequency [m^2/Hz].
    pub spectrum: Vec<f64>,
    /// Component amplitudes `sqrt(2 S df)` [m].
    pub amplitude: Vec<f64>,
    /// Component phases [rad], drawn once.
    pub phase: Vec<f64>,
    /// Free-surface elevation on the simulation grid, ramp applied.
    pub eta: Vec<f64>,
}

impl IrregularWave {
    pub fn new(db: &mut HydroDb, params: IrregularWaveParams) -> Result<Self> {
        // Excitation IRF resampling is deferred to here so still and regular
        // runs never pay for it.
        db.resample_excitation_irf(params.dt)?;

        let (f_min, f_max, n_freq) = params.spectrum;
        let df = (f_max - f_min) / (n_freq - 1) as f64;
        let freq_hz = (0..n_freq).map(|k| f_min + k as f64 * df).collect_vec();

        let spectrum = freq_hz
            .iter()
            .map(|&f| pierson_moskowitz(f, params.hs, params.tp))
            .collect_vec();
        let amplitude = spectrum.iter().map(|&s| (2. * s * df).sqrt()).collect_vec();

        let mut rng = ChaChaRng::seed_from_u64(params.seed);
        let phase = (0..n_freq).map(|_| rng.gen_range(0.0..TAU)).collect_vec();

        let n_eta = (params.duration / params.dt).floor() as usize + 1;
        let eta = (0..n_eta)
            .map(|n| {
                let t = n as f64 * params.dt;
                let elevation: f64 = itertools::izip!(&freq_hz, &amplitude, &phase)
                    .map(|(&f, &a, &p)| a * (TAU * f * t + p).cos())
                    .sum();
                elevation * ramp(t, params.ramp_duration)
            })
            .collect_vec();

        log::debug!(
            "irregular wave: hs {} m, tp {} s, seed {}, {} elevation samples",
            params.hs,
            params.tp,
            params.seed,
            eta.len()
        );

        Ok(Self {
            params,
            freq_hz,
            spectrum,
            amplitude,
            phase,
            eta,
        })
    }

    /// Last time covered by the precomputed elevation grid [s].
    pub fn horizon(&self) -> f64 {
        (self.eta.len() - 1) as f64 * self.params.dt
    }

    pub fn excitation(&self, db: &HydroDb, t: f64) -> Result<Col<f64>> {
        if t > self.horizon() {
            return Err(HydroError::TimeBeyondHorizon {
                time: t,
                horizon: self.horizon(),
            });
        }

        let mut force = Col::<f64>::zeros(db.n_dofs());
        for b in 0..db.n_bodies() {
            let irf = db.excitation_irf_resampled(b)?;
            if irf.dt != self.params.dt {
                return Err(HydroError::NotInitialized(
                    "excitation impulse response resampled to a different time step",
                ));
            }
            for d in 0..6 {
                force[6 * b + d] = self.convolve_elevation(&irf.data, &irf.time, d, t);
            }
        }
        Ok(force)
    }

    /// Convolves the resampled excitation IRF (heading 0) with the elevation
    /// record. The strict guards and the `eta[n - 1]` offset reproduce the
    /// reference discretization sample for sample.
    fn convolve_elevation(
        &self,
        irf: &ndarray::Array3<f64>,
        irf_time: &[f64],
        dof: usize,
        t: f64,
    ) -> f64 {
        let dt = self.params.dt;
        let horizon = self.eta.len() as f64 * dt;
        let mut f_ex = 0.;
        for (j, &tau) in irf_time.iter().enumerate() {
            let t_tau = t - tau;
            if t_tau > 0. && t_tau < horizon {
                let n = (t_tau / dt).floor() as usize;
                if n >= 1 {
                    f_ex += irf[[dof, 0, j]] * self.eta[n - 1] * dt;
                }
            }
        }
        f_ex
    }
}

/// Linear start-up ramp: 0 at t = 0 rising to 1 at `t_ramp`.
fn ramp(t: f64, t_ramp: f64) -> f64 {
    if t_ramp > 0. {
        (t / t_ramp).min(1.)
    } else {
        1.
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
