//! Infinite-frequency added-mass contribution for the host's implicit
//! integrator.
//!
//! The added mass enters the equations of motion purely inertially: it adds
//! to the acceleration Jacobian and to `M*w` residual products, never to
//! stiffness or damping. The matrix is constant for the life of the
//! database and may be shared by reference with the host.

use faer::linalg::matmul::matmul;
use faer::{Col, ColMut, ColRef, Mat, MatRef, Parallelism};

use crate::database::HydroDb;

/// Jacobian blocks a host load contributes, `dQ/dx`, `dQ/dv`, `dQ/dacc`.
pub struct LoadJacobian {
    pub dq_dx: Mat<f64>,
    pub dq_dv: Mat<f64>,
    pub dq_dacc: Mat<f64>,
}

/// Block 6Nx6N infinite-frequency added-mass matrix, scaled by rho.
pub struct AddedMassLoad {
    mass: Mat<f64>,
}

impl AddedMassLoad {
    /// Stacks each body's scaled added-mass block on the diagonal. A body
    /// whose dataset spans all 6N columns carries cross-body coupling and
    /// occupies its full rows instead.
    pub fn new(db: &HydroDb) -> Self {
        let n_dofs = db.n_dofs();
        let mut mass = Mat::<f64>::zeros(n_dofs, n_dofs);
        for b in 0..db.n_bodies() {
            let block = db.added_mass_block(b);
            let col_offset = if block.ncols() == n_dofs { 0 } else { 6 * b };
            for i in 0..6 {
                for j in 0..block.ncols() {
                    mass[(6 * b + i, col_offset + j)] = block[(i, j)];
                }
            }
        }
        Self { mass }
    }

    pub fn mass_matrix(&self) -> MatRef<f64> {
        self.mass.as_ref()
    }

    /// Jacobian contribution: no position or velocity coupling, the full
    /// added mass on the acceleration block. The state arguments are part of
    /// the host contract but do not enter a constant inertial load.
    pub fn jacobian(&self, _state_x: ColRef<f64>, _state_w: ColRef<f64>) -> LoadJacobian {
        let n = self.mass.nrows();
        LoadJacobian {
            dq_dx: Mat::zeros(n, n),
            dq_dv: Mat::zeros(n, n),
            dq_dacc: self.mass.clone(),
        }
    }

    /// Accumulates `r += c * M * w` for the host's residual assembly.
    pub fn residual_mv(&self, mut r: ColMut<f64>, w: ColRef<f64>, c: f64) {
        matmul(
            r.as_mut().as_2d_mut(),
            self.mass.as_ref(),
            w.as_2d(),
            Some(1.),
            c,
            Parallelism::None,
        );
    }

    /// Convenience product `M * w`.
    pub fn mv(&self, w: ColRef<f64>) -> Col<f64> {
        let mut r = Col::<f64>::zeros(self.mass.nrows());
        self.residual_mv(r.as_mut(), w, 1.);
        r
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use faer::assert_matrix_eq;
    use itertools::Itertools;
    use ndarray::Array3;

    use crate::database::BodyCoefficients;

    use super::*;

    fn body_with_added_mass(n: usize, added_mass_inf: Mat<f64>) -> BodyCoefficients {
        BodyCoefficients {
            body_number: n,
            disp_vol: 1.,
            cg: [0.; 3],
            cb: [0.; 3],
            stiffness: Mat::zeros(6, 6),
            added_mass_inf,
            rirf: Array3::zeros((6, 12, 2)),
            rirf_time: vec![0., 0.1],
            ex_mag: Array3::zeros((6, 1, 2)),
            ex_phase: Array3::zeros((6, 1, 2)),
            ex_re: Array3::zeros((6, 1, 2)),
            ex_im: Array3::zeros((6, 1, 2)),
            ex_irf: None,
            ex_irf_resampled: None,
            radiation_damping: None,
        }
    }

    fn two_body_db() -> HydroDb {
        let a = Mat::from_fn(6, 6, |i, j| (i * 6 + j + 1) as f64);
        let b = Mat::from_fn(6, 6, |i, j| if i == j { 2.5 } else { 0. });
        HydroDb {
            rho: 1000.,
            g: 9.81,
            freq: vec![1., 2.],
            bodies: vec![body_with_added_mass(1, a), body_with_added_mass(2, b)],
        }
    }

    #[test]
    fn test_block_diagonal_assembly() {
        let db = two_body_db();
        let load = AddedMassLoad::new(&db);
        let m = load.mass_matrix();

        for i in 0..6 {
            for j in 0..6 {
                assert_eq!(m[(i, j)], db.bodies[0].added_mass_inf[(i, j)] * db.rho);
                assert_eq!(m[(6 + i, 6 + j)], db.bodies[1].added_mass_inf[(i, j)] * db.rho);
                // Off-diagonal body coupling blocks stay zero
                assert_eq!(m[(i, 6 + j)], 0.);
                assert_eq!(m[(6 + i, j)], 0.);
            }
        }
    }

    #[test]
    fn test_cross_body_columns_keep_natural_locations() {
        let mut db = two_body_db();
        let mut wide = Mat::<f64>::zeros(6, 12);
        wide[(0, 0)] = 1.;
        wide[(0, 7)] = 0.25;
        db.bodies[0].added_mass_inf = wide;

        let load = AddedMassLoad::new(&db);
        let m = load.mass_matrix();
        assert_eq!(m[(0, 0)], 1. * db.rho);
        assert_eq!(m[(0, 7)], 0.25 * db.rho);
    }

    #[test]
    fn test_mv_returns_matrix_columns() {
        let db = two_body_db();
        let load = AddedMassLoad::new(&db);
        let m = load.mass_matrix();

        for k in 0..12 {
            let e_k = Col::<f64>::from_fn(12, |i| if i == k { 1. } else { 0. });
            let col = load.mv(e_k.as_ref());
            for i in 0..12 {
                assert_eq!(col[i], m[(i, k)]);
            }
        }
    }

    #[test]
    fn test_residual_accumulates_scaled_product() {
        let db = two_body_db();
        let load = AddedMassLoad::new(&db);

        let w = Col::<f64>::from_fn(12, |i| (i as f64 + 1.) * 0.1);
        let mut r = Col::<f64>::from_fn(12, |i| i as f64);
        let r0 = r.clone();
        load.residual_mv(r.as_mut(), w.as_ref(), 2.);

        let mw = load.mv(w.as_ref());
        let expected = Col::<f64>::from_fn(12, |i| r0[i] + 2. * mw[i]);
        assert_matrix_eq!(r.as_2d(), expected.as_2d(), comp = float);
    }

    #[test]
    fn test_jacobian_blocks() {
        let db = two_body_db();
        let load = AddedMassLoad::new(&db);
        let x = Col::<f64>::zeros(12);
        let jac = load.jacobian(x.as_ref(), x.as_ref());

        assert_eq!(jac.dq_dx.norm_l2(), 0.);
        assert_eq!(jac.dq_dv.norm_l2(), 0.);
        let diff = (0..12)
            .cartesian_product(0..12)
            .map(|(i, j)| (jac.dq_dacc[(i, j)] - load.mass_matrix()[(i, j)]).abs())
            .fold(0., f64::max);
        assert_eq!(diff, 0.);
    }
}
