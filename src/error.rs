//! Error types for the hydrodynamic force engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a coefficient database or evaluating forces.
///
/// Construction-time failures (file access, missing datasets, bad shapes)
/// propagate to the caller and are fatal. Per-step failures indicate an
/// indexing bug in the host coupling and are reported as errors rather than
/// silently mapped to zero force.
#[derive(Debug, Error)]
pub enum HydroError {
    /// A required dataset is absent from the coefficient database.
    #[error("missing coefficient dataset: {path}")]
    MissingCoefficient {
        /// Dataset path within the database file.
        path: String,
    },

    /// A dataset or argument has the wrong dimensions.
    #[error("shape mismatch for {name}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Name of the offending dataset or argument.
        name: &'static str,
        /// Expected extent.
        expected: usize,
        /// Actual extent.
        actual: usize,
    },

    /// Requested wave frequency lies outside the database frequency grid.
    #[error("frequency {omega} rad/s outside excitation grid (max {max} rad/s)")]
    FreqOutOfRange {
        /// Requested frequency [rad/s].
        omega: f64,
        /// Largest frequency in the grid [rad/s].
        max: f64,
    },

    /// Velocity-history step index outside `[0, len)`.
    #[error("history step {step} outside 0..{len}")]
    StepOutOfRange {
        /// Requested step.
        step: usize,
        /// Number of stored steps.
        len: usize,
    },

    /// Body index outside the set of bodies the engine was built with.
    #[error("body {body} outside 1..={count}")]
    BodyOutOfRange {
        /// Requested body number (1-based).
        body: usize,
        /// Number of bodies.
        count: usize,
    },

    /// Degree-of-freedom index outside `[0, 6)`.
    #[error("dof {dof} outside 0..6")]
    DofOutOfRange {
        /// Requested dof.
        dof: usize,
    },

    /// A component was queried before its inputs were prepared.
    #[error("not initialized: {0}")]
    NotInitialized(&'static str),

    /// Requested time lies past the precomputed free-surface elevation grid.
    #[error("time {time} s beyond precomputed wave horizon {horizon} s")]
    TimeBeyondHorizon {
        /// Requested time [s].
        time: f64,
        /// Last precomputed time [s].
        horizon: f64,
    },

    /// A database or configuration file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    FileIo {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying reader error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, HydroError>;

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
