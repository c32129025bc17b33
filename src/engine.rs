//! Force orchestrator coupling the hydrodynamic components to the host
//! solver.
//!
//! The host queries individual scalar force components; the engine computes
//! the full 6N force vector once per simulation time and serves every
//! component of that step from the cache. Installation hands the host six
//! scalar-of-time callables per body, split into force dofs `{0, 1, 2}` and
//! torque dofs `{3, 4, 5}`, all world frame.

use std::cell::RefCell;
use std::rc::Rc;

use faer::{col, unzipped, zipped, Col};
use itertools::Itertools;

use crate::body::BodyHandle;
use crate::database::HydroDb;
use crate::error::{HydroError, Result};
use crate::history::VelocityHistory;
use crate::hydrostatics;
use crate::radiation;
use crate::util::quat_as_euler_angles;
use crate::waves::WaveModel;

/// Per-step force cache. `prev_time` starts at the -1 sentinel so the first
/// query always computes.
struct ForceCache {
    prev_time: f64,
    total: Col<f64>,
}

pub struct HydroForces {
    db: Rc<HydroDb>,
    bodies: Vec<BodyHandle>,
    gravity: [f64; 3],
    wave: WaveModel,
    /// System equilibrium: translation at cg, rotation zero, per body.
    equilibrium: Col<f64>,
    history: VelocityHistory,
    cache: ForceCache,
    computes: usize,
}

impl HydroForces {
    pub fn new(
        db: Rc<HydroDb>,
        bodies: Vec<BodyHandle>,
        gravity: [f64; 3],
        wave: WaveModel,
    ) -> Result<Self> {
        if bodies.len() != db.n_bodies() {
            return Err(HydroError::ShapeMismatch {
                name: "bodies (one engine handle per database entry)",
                expected: db.n_bodies(),
                actual: bodies.len(),
            });
        }

        let n_dofs = db.n_dofs();
        let mut equilibrium = Col::<f64>::zeros(n_dofs);
        for (b, body) in db.bodies.iter().enumerate() {
            for i in 0..3 {
                equilibrium[6 * b + i] = body.cg[i];
            }
        }

        let history = VelocityHistory::new(db.rirf_len(), n_dofs);

        Ok(Self {
            db,
            bodies,
            gravity,
            wave,
            equilibrium,
            history,
            cache: ForceCache {
                prev_time: -1.,
                total: Col::zeros(n_dofs),
            },
            computes: 0,
        })
    }

    pub fn n_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Number of full force evaluations so far; queries at a cached time do
    /// not increment it.
    pub fn compute_count(&self) -> usize {
        self.computes
    }

    /// Force component for `body` (1-based, matching the database body
    /// numbering) and dof `i` at time `t`.
    pub fn force_component(&mut self, t: f64, body: usize, dof: usize) -> Result<f64> {
        if body < 1 || body > self.bodies.len() {
            return Err(HydroError::BodyOutOfRange {
                body,
                count: self.bodies.len(),
            });
        }
        if dof >= 6 {
            return Err(HydroError::DofOutOfRange { dof });
        }
        if t != self.cache.prev_time {
            self.compute_total(t)?;
        }
        Ok(self.cache.total[6 * (body - 1) + dof])
    }

    /// Full 6N force vector at time `t`, through the same cache.
    pub fn system_force(&mut self, t: f64) -> Result<Col<f64>> {
        if t != self.cache.prev_time {
            self.compute_total(t)?;
        }
        Ok(self.cache.total.clone())
    }

    fn compute_total(&mut self, t: f64) -> Result<()> {
        // Record current velocities before the radiation convolution reads
        // the history
        let velocities = self
            .bodies
            .iter()
            .flat_map(|handle| {
                let state = handle.borrow();
                [
                    state.velocity[0],
                    state.velocity[1],
                    state.velocity[2],
                    state.angular_velocity[0],
                    state.angular_velocity[1],
                    state.angular_velocity[2],
                ]
            })
            .collect_vec();
        self.history.push_all(&velocities)?;

        // Displacement from equilibrium, rotations as Euler-123 angles
        let mut displacement = Col::<f64>::zeros(self.db.n_dofs());
        let mut euler = Col::<f64>::zeros(3);
        for (b, handle) in self.bodies.iter().enumerate() {
            let state = handle.borrow();
            let q = col![
                state.quaternion[0],
                state.quaternion[1],
                state.quaternion[2],
                state.quaternion[3],
            ];
            quat_as_euler_angles(q.as_ref(), euler.as_mut());
            for i in 0..3 {
                displacement[6 * b + i] = state.position[i] - self.equilibrium[6 * b + i];
                displacement[6 * b + 3 + i] = euler[i] - self.equilibrium[6 * b + 3 + i];
            }
        }

        let f_hydrostatic = hydrostatics::compute(&self.db, displacement.as_ref(), self.gravity);
        let f_radiation = radiation::convolve(&self.db, &self.history);
        let f_excitation = self.wave.excitation(&self.db, t)?;

        // Radiation damping opposes motion; excitation mode only changes how
        // f_excitation was produced
        zipped!(
            &mut self.cache.total,
            &f_hydrostatic,
            &f_radiation,
            &f_excitation
        )
        .for_each(|unzipped!(total, fh, fr, fe)| *total = *fh - *fr + *fe);

        // Commit the cache time only once the whole vector is valid
        self.cache.prev_time = t;
        self.computes += 1;

        Ok(())
    }
}

//------------------------------------------------------------------------------
// Host-facing component callables
//------------------------------------------------------------------------------

/// Scalar-of-time callable bound to one `(body, dof)` pair.
///
/// Clones re-bind to the same engine, so the host may copy these freely when
/// wiring its load slots.
#[derive(Clone)]
pub struct ForceComponent {
    forces: Rc<RefCell<HydroForces>>,
    /// Body number (1-based).
    pub body: usize,
    /// Degree of freedom in `[0, 6)`.
    pub dof: usize,
}

impl ForceComponent {
    pub fn eval(&self, t: f64) -> Result<f64> {
        self.forces.borrow_mut().force_component(t, self.body, self.dof)
    }
}

/// The six callables for one body, split the way hosts apply them.
pub struct BodyLoads {
    /// World-frame force components x, y, z.
    pub force: [ForceComponent; 3],
    /// World-frame torque components about x, y, z.
    pub torque: [ForceComponent; 3],
}

/// Builds the per-body component callables for a shared engine.
pub fn install(forces: &Rc<RefCell<HydroForces>>) -> Vec<BodyLoads> {
    let component = |body: usize, dof: usize| ForceComponent {
        forces: forces.clone(),
        body,
        dof,
    };
    (1..=forces.borrow().n_bodies())
        .map(|b| BodyLoads {
            force: [component(b, 0), component(b, 1), component(b, 2)],
            torque: [component(b, 3), component(b, 4), component(b, 5)],
        })
        .collect_vec()
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
