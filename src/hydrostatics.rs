//! Linear hydrostatic restoring and buoyancy loads.

use faer::{col, Col, ColRef};

use crate::database::HydroDb;
use crate::util::cross;

/// Computes the 6N hydrostatic force for the system.
///
/// `displacement` is the system offset from equilibrium: per body, three
/// translations followed by three Euler-123 rotations. `gravity` is the
/// host's gravity vector. The restoring part is `-rho*g*K * dx` per body;
/// buoyancy acts at the center of buoyancy, producing a `(cb - cg)` cross
/// torque about the body reference.
pub fn compute(db: &HydroDb, displacement: ColRef<f64>, gravity: [f64; 3]) -> Col<f64> {
    let mut force = Col::<f64>::zeros(db.n_dofs());

    for b in 0..db.n_bodies() {
        let b_offset = 6 * b;

        // Linear restoring force
        for i in 0..6 {
            for j in 0..6 {
                force[b_offset + i] -= db.stiffness_scaled(b, i, j) * displacement[b_offset + j];
            }
        }

        // Buoyancy force opposes gravity
        let body = &db.bodies[b];
        let f_buoy = col![
            -db.rho * body.disp_vol * gravity[0],
            -db.rho * body.disp_vol * gravity[1],
            -db.rho * body.disp_vol * gravity[2],
        ];
        let arm = col![
            body.cb[0] - body.cg[0],
            body.cb[1] - body.cg[1],
            body.cb[2] - body.cg[2],
        ];
        let mut tau = Col::<f64>::zeros(3);
        cross(arm.as_ref(), f_buoy.as_ref(), tau.as_mut());

        for i in 0..3 {
            force[b_offset + i] += f_buoy[i];
            force[b_offset + 3 + i] += tau[i];
        }
    }

    force
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
