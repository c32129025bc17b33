//! Run configuration for the force engine.
//!
//! Hosts describe the wave environment in a small YAML document; the
//! spectrum discretization falls back to the standard range when omitted.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{HydroError, Result};
use crate::waves::{IrregularWaveParams, DEFAULT_SPECTRUM_RANGE};

pub fn read_config_from_file(path: impl AsRef<Path>) -> Result<HydroConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| HydroError::FileIo {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    parse_config(&text)
}

pub fn parse_config(text: &str) -> Result<HydroConfig> {
    serde_yaml::from_str(text).map_err(|e| HydroError::FileIo {
        path: PathBuf::from("<config>"),
        source: e.into(),
    })
}

#[derive(Debug, Deserialize)]
pub struct HydroConfig {
    /// Path of the BEMIO coefficient database.
    pub database: PathBuf,
    pub wave: WaveConfig,
    #[serde(default)]
    pub convolution: ConvolutionRule,
}

/// Quadrature rule for the radiation convolution. Only the trapezoidal rule
/// is supported; it is exact on the non-uniform IRF time bases some BEM
/// pre-processors emit.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConvolutionRule {
    #[default]
    Trapezoidal,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum WaveConfig {
    Still,
    Regular {
        /// Wave amplitude [m].
        amplitude: f64,
        /// Wave frequency [rad/s].
        omega: f64,
    },
    Irregular(IrregularConfig),
}

#[derive(Debug, Deserialize)]
pub struct IrregularConfig {
    /// Significant wave height [m].
    pub hs: f64,
    /// Peak period [s].
    pub tp: f64,
    pub seed: u64,
    /// Start-up ramp duration [s].
    pub ramp_duration: f64,
    /// Simulation duration [s].
    pub duration: f64,
    /// Simulation time step [s].
    pub dt: f64,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
}

#[derive(Debug, Deserialize)]
pub struct SpectrumConfig {
    #[serde(default = "SpectrumConfig::default_f_min")]
    pub f_min: f64,
    #[serde(default = "SpectrumConfig::default_f_max")]
    pub f_max: f64,
    #[serde(default = "SpectrumConfig::default_n_freq")]
    pub n_freq: usize,
}

impl SpectrumConfig {
    fn default_f_min() -> f64 {
        DEFAULT_SPECTRUM_RANGE.0
    }
    fn default_f_max() -> f64 {
        DEFAULT_SPECTRUM_RANGE.1
    }
    fn default_n_freq() -> usize {
        DEFAULT_SPECTRUM_RANGE.2
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            f_min: Self::default_f_min(),
            f_max: Self::default_f_max(),
            n_freq: Self::default_n_freq(),
        }
    }
}

impl IrregularConfig {
    /// Converts the parsed document into wave-model inputs.
    pub fn params(&self) -> IrregularWaveParams {
        IrregularWaveParams {
            hs: self.hs,
            tp: self.tp,
            seed: self.seed,
            ramp_duration: self.ramp_duration,
            duration: self.duration,
            dt: self.dt,
            spectrum: (self.spectrum.f_min, self.spectrum.f_max, self.spectrum.n_freq),
        }
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
