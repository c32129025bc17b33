//! Host-side rigid-body state consumed by the force engine.
//!
//! Bodies are owned and integrated by the host solver; the engine keeps
//! shared handles and reads pose and velocity each step. The engine never
//! writes through a handle.

use std::cell::RefCell;
use std::rc::Rc;

/// World-frame kinematic state of one rigid body.
#[derive(Debug, Clone)]
pub struct RigidBodyState {
    /// Position of the body reference [m].
    pub position: [f64; 3],
    /// Orientation as a `[w, i, j, k]` quaternion.
    pub quaternion: [f64; 4],
    /// Linear velocity [m/s].
    pub velocity: [f64; 3],
    /// Angular velocity [rad/s].
    pub angular_velocity: [f64; 3],
}

impl RigidBodyState {
    /// Body at rest at `position` with identity orientation.
    pub fn at_rest(position: [f64; 3]) -> Self {
        Self {
            position,
            quaternion: [1., 0., 0., 0.],
            velocity: [0.; 3],
            angular_velocity: [0.; 3],
        }
    }
}

/// Shared handle the host updates and the engine reads.
pub type BodyHandle = Rc<RefCell<RigidBodyState>>;

/// Wraps a state in a shareable handle.
pub fn body_handle(state: RigidBodyState) -> BodyHandle {
    Rc::new(RefCell::new(state))
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
