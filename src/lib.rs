//! Time-domain hydrodynamic loads on floating rigid bodies.
//!
//! The engine reads a BEMIO-format coefficient database and supplies a host
//! multibody solver with, per body, six world-frame force components
//! (hydrostatic restoring and buoyancy, radiation-damping convolution, wave
//! excitation) plus an infinite-frequency added-mass contribution for the
//! host's implicit integrator. The host owns the bodies, the integrator,
//! and the time loop; this crate owns the hydrodynamics.

pub mod added_mass;
pub mod bemio;
pub mod body;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod history;
pub mod hydrostatics;
pub mod interp;
pub mod radiation;
pub mod util;
pub mod waves;

pub use added_mass::AddedMassLoad;
pub use body::{body_handle, BodyHandle, RigidBodyState};
pub use database::HydroDb;
pub use engine::{install, BodyLoads, ForceComponent, HydroForces};
pub use error::{HydroError, Result};
pub use waves::{IrregularWave, IrregularWaveParams, RegularWave, WaveModel};
