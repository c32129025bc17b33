//! Low-level reader for BEMIO-format hydrodynamic databases.
//!
//! A BEMIO file is a plain HDF5 store: global datasets under
//! `simulation_parameters/` and one group per body (`body1`, `body2`, ...)
//! holding properties and hydrodynamic coefficients. This module only moves
//! bytes into typed arrays; interpretation and scaling live in
//! [`crate::database`].

use std::path::{Path, PathBuf};

use faer::Mat;
use ndarray::Array3;

use crate::error::{HydroError, Result};

pub struct BemioFile {
    file: hdf5::File,
    path: PathBuf,
}

impl BemioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = hdf5::File::open(&path).map_err(|source| HydroError::FileIo {
            path: path.clone(),
            source: source.into(),
        })?;
        Ok(Self { file, path })
    }

    /// File path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a dataset or group exists at `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.file.link_exists(name)
    }

    fn dataset(&self, name: &str) -> Result<hdf5::Dataset> {
        if !self.file.link_exists(name) {
            return Err(HydroError::MissingCoefficient { path: name.into() });
        }
        self.file.dataset(name).map_err(|source| HydroError::FileIo {
            path: self.path.clone(),
            source: source.into(),
        })
    }

    fn read_raw(&self, name: &str) -> Result<(Vec<usize>, Vec<f64>)> {
        let ds = self.dataset(name)?;
        let shape = ds.shape();
        let data = ds.read_raw::<f64>().map_err(|source| HydroError::FileIo {
            path: self.path.clone(),
            source: source.into(),
        })?;
        Ok((shape, data))
    }

    /// Reads a scalar stored as rank-0, `(1,)` or `(1,1)`.
    pub fn scalar(&self, name: &str) -> Result<f64> {
        let (shape, data) = self.read_raw(name)?;
        if data.len() != 1 {
            return Err(HydroError::ShapeMismatch {
                name: "scalar dataset",
                expected: 1,
                actual: shape.iter().product(),
            });
        }
        Ok(data[0])
    }

    /// Reads a 1-D vector; `(n,1)` and `(1,n)` layouts are flattened.
    pub fn vector(&self, name: &str) -> Result<Vec<f64>> {
        let (shape, data) = self.read_raw(name)?;
        let squeezed = shape.iter().filter(|&&d| d > 1).count();
        if squeezed > 1 {
            return Err(HydroError::ShapeMismatch {
                name: "vector dataset",
                expected: 1,
                actual: shape.len(),
            });
        }
        Ok(data)
    }

    /// Reads a length-3 vector.
    pub fn vector3(&self, name: &str) -> Result<[f64; 3]> {
        let v = self.vector(name)?;
        if v.len() != 3 {
            return Err(HydroError::ShapeMismatch {
                name: "length-3 vector",
                expected: 3,
                actual: v.len(),
            });
        }
        Ok([v[0], v[1], v[2]])
    }

    /// Reads a rank-2 dataset into a dense matrix (row-major in the file).
    pub fn matrix(&self, name: &str) -> Result<Mat<f64>> {
        let (shape, data) = self.read_raw(name)?;
        if shape.len() != 2 {
            return Err(HydroError::ShapeMismatch {
                name: "rank-2 dataset",
                expected: 2,
                actual: shape.len(),
            });
        }
        let (nrows, ncols) = (shape[0], shape[1]);
        Ok(Mat::from_fn(nrows, ncols, |i, j| data[i * ncols + j]))
    }

    /// Reads a rank-3 dataset preserving the file's `[i, j, k]` storage order.
    pub fn array3(&self, name: &str) -> Result<Array3<f64>> {
        let (shape, data) = self.read_raw(name)?;
        if shape.len() != 3 {
            return Err(HydroError::ShapeMismatch {
                name: "rank-3 dataset",
                expected: 3,
                actual: shape.len(),
            });
        }
        Array3::from_shape_vec((shape[0], shape[1], shape[2]), data).map_err(|_| {
            HydroError::ShapeMismatch {
                name: "rank-3 dataset",
                expected: shape.iter().product(),
                actual: 0,
            }
        })
    }
}
