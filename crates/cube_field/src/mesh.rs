//! Structured 3D grids of sample points.
//!
//! This module defines [`GridAxis`] and [`GridMesh`]. A mesh stores only the lattice
//! parameters (origin, three step vectors and point counts), so its memory footprint is
//! constant in the number of points; points are produced on demand by [`GridMesh::points`].
//!
//! Points are ordered the way values are stored in cube files: the third axis varies
//! fastest and the first axis slowest.
use std::fmt;

use glam::DVec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Off-diagonal step components with a magnitude below this are treated as zero.
pub const ALIGNMENT_TOLERANCE: f64 = 1e-10;

const AXIS_LABELS: [char; 3] = ['x', 'y', 'z'];

/// One lattice direction: a step vector and the number of points placed along it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridAxis {
    /// Displacement between consecutive points along this axis.
    pub vector: DVec3,
    /// Number of points along this axis.
    pub point_count: usize,
}

impl GridAxis {
    pub fn new(vector: impl Into<mint::Vector3<f64>>, point_count: usize) -> Self {
        Self {
            vector: DVec3::from(vector.into()),
            point_count,
        }
    }

    /// Builds the axis at position `axis_index` (0 = x) from a point count as read from text.
    ///
    /// The count must be a non-negative integer. A negative count on the x axis is how
    /// Gaussian flags coordinates in angstroms, which is reported separately.
    pub fn from_raw(axis_index: usize, point_count: f64, vector: DVec3) -> Result<Self> {
        let label = AXIS_LABELS.get(axis_index).copied().unwrap_or('?');

        if !point_count.is_finite() || point_count.fract() != 0.0 {
            return Err(Error::Grid(format!(
                "number of points in direction {} is not an integer: {}",
                label, point_count
            )));
        }
        if point_count >= usize::MAX as f64 {
            return Err(Error::Grid(format!(
                "number of points in direction {} is too large: {}",
                label, point_count
            )));
        }
        if point_count < 0.0 {
            if axis_index == 0 {
                return Err(Error::Grid(
                    "Gaussian requested distance in angstroms, which is not currently supported"
                        .into(),
                ));
            }
            return Err(Error::Grid(format!(
                "negative number of points in direction {}: {}",
                label, point_count
            )));
        }

        Ok(Self {
            vector,
            point_count: point_count as usize,
        })
    }

    /// Whether the step vector only has a component along coordinate axis `axis_index`.
    pub fn is_aligned_to(&self, axis_index: usize) -> bool {
        (0..3)
            .filter(|&component| component != axis_index)
            .all(|component| self.vector[component].abs() < ALIGNMENT_TOLERANCE)
    }
}

/// A structured grid of points defined by an origin and three axes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GridMesh {
    origin: DVec3,
    axes: [GridAxis; 3],
}

impl GridMesh {
    /// Creates a mesh. Axes that are not aligned with their coordinate axis are accepted,
    /// but operations that need per-axis spacing will refuse to run on such a mesh.
    pub fn new(origin: impl Into<mint::Vector3<f64>>, axes: [GridAxis; 3]) -> Self {
        let mesh = Self {
            origin: DVec3::from(origin.into()),
            axes,
        };

        let mut aligned = true;
        for (index, axis) in mesh.axes.iter().enumerate() {
            if !axis.is_aligned_to(index) {
                info!(
                    "Grid axis {} is not aligned to its coordinate axis: the step vector is {}.",
                    AXIS_LABELS[index], axis.vector
                );
                aligned = false;
            }
        }
        if !aligned {
            warn!("The grid is not aligned with the coordinate system.");
        }

        mesh
    }

    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    #[inline]
    pub fn axes(&self) -> &[GridAxis; 3] {
        &self.axes
    }

    /// Point counts along the three axes.
    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        [
            self.axes[0].point_count,
            self.axes[1].point_count,
            self.axes[2].point_count,
        ]
    }

    /// Total number of points, computed without visiting them.
    ///
    /// Saturates at `usize::MAX`; use [`GridMesh::try_len`] when the counts come from input.
    #[inline]
    pub fn len(&self) -> usize {
        self.try_len().unwrap_or(usize::MAX)
    }

    /// Total number of points, or `None` if it does not fit in a `usize`.
    pub fn try_len(&self) -> Option<usize> {
        self.shape()
            .iter()
            .try_fold(1usize, |total, &count| total.checked_mul(count))
    }

    /// Like [`GridMesh::try_len`], reporting overflow as a grid error.
    pub fn checked_len(&self) -> Result<usize> {
        self.try_len().ok_or_else(|| {
            Error::Grid(format!(
                "the point counts {:?} give more points than can be addressed",
                self.shape()
            ))
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every axis only steps along its own coordinate direction.
    pub fn is_aligned(&self) -> bool {
        self.axes
            .iter()
            .enumerate()
            .all(|(index, axis)| axis.is_aligned_to(index))
    }

    /// Point spacing along x, y and z. Fails for meshes that are not coordinate-aligned.
    pub fn aligned_spacing(&self) -> Result<DVec3> {
        if !self.is_aligned() {
            return Err(Error::NotAligned(format!(
                "axis vectors are {}, {}, {}",
                self.axes[0].vector, self.axes[1].vector, self.axes[2].vector
            )));
        }
        Ok(DVec3::new(
            self.axes[0].vector.x.abs(),
            self.axes[1].vector.y.abs(),
            self.axes[2].vector.z.abs(),
        ))
    }

    /// Flat index of lattice node `(i, j, k)` in iteration order.
    #[inline]
    pub fn index_of(&self, i: usize, j: usize, k: usize) -> usize {
        let [_, ny, nz] = self.shape();
        (i * ny + j) * nz + k
    }

    /// Lattice node `(i, j, k)` of a flat index. The inverse of [`GridMesh::index_of`].
    #[inline]
    pub fn unravel(&self, index: usize) -> (usize, usize, usize) {
        let [_, ny, nz] = self.shape();
        let k = index % nz;
        let rest = index / nz;
        (rest / ny, rest % ny, k)
    }

    /// Coordinates of lattice node `(i, j, k)`.
    #[inline]
    pub fn point_at(&self, i: usize, j: usize, k: usize) -> DVec3 {
        self.origin
            + i as f64 * self.axes[0].vector
            + j as f64 * self.axes[1].vector
            + k as f64 * self.axes[2].vector
    }

    /// Iterates over all points in cube-file order. The iterator can be recreated at will.
    pub fn points(&self) -> GridPoints<'_> {
        GridPoints {
            mesh: self,
            next: 0,
            len: self.len(),
        }
    }
}

impl fmt::Display for GridMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [nx, ny, nz] = self.shape();
        write!(f, "{}x{}x{} grid at {}", nx, ny, nz, self.origin)
    }
}

/// Iterator over the points of a [`GridMesh`].
#[derive(Clone, Debug)]
pub struct GridPoints<'a> {
    mesh: &'a GridMesh,
    next: usize,
    len: usize,
}

impl Iterator for GridPoints<'_> {
    type Item = DVec3;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let (i, j, k) = self.mesh.unravel(self.next);
        self.next += 1;
        Some(self.mesh.point_at(i, j, k))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridPoints<'_> {}
