//! Euclidean Distance Transform (EDT) of density isosurfaces.
//!
//! Thresholds a density field at an isovalue and computes, for every grid point outside the
//! isosurface, the distance to the nearest point on or inside it. Points on or inside the
//! isosurface get zero.
//!
//! This implementation is based on the Felzenszwalb-Huttenlocher algorithm,
//! which computes exact Euclidean distances using a separable approach with
//! one 1D pass per axis. Parabolas are placed at physical coordinates, so grids with
//! different spacing along each axis are handled exactly.
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::{Field, FieldKind};

/// Settings for the isosurface distance transform.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsosurfaceConfig {
    /// Density value defining the isosurface. Points with a lower density are outside.
    pub isovalue: f64,
}

impl Default for IsosurfaceConfig {
    fn default() -> Self {
        Self { isovalue: 0.001 }
    }
}

impl IsosurfaceConfig {
    pub fn new(isovalue: f64) -> Self {
        Self { isovalue }
    }

    /// Sets the isovalue.
    pub fn with_isovalue(mut self, isovalue: f64) -> Self {
        self.isovalue = isovalue;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.isovalue.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "isovalue must be finite, got {}",
                self.isovalue
            )));
        }
        Ok(())
    }

    /// Runs [`distance_transform`] with this configuration.
    pub fn distance_transform(&self, field: &Field<f64>) -> Result<Field<f64>> {
        self.validate()?;

        if field.kind() != Some(FieldKind::ElectronDensity) {
            warn!(
                "Distance transform should only be applied to electron density fields, \
                 attempted on field type: '{}'.",
                field
                    .kind()
                    .map_or_else(|| "untyped".to_owned(), |kind| kind.to_string())
            );
        }

        let mesh = field.mesh();
        let spacing = mesh.aligned_spacing()?;
        let shape = mesh.shape();
        for axis in 0..3 {
            if shape[axis] > 1 && spacing[axis] <= 0.0 {
                return Err(Error::Grid(format!(
                    "axis {} has {} points but zero spacing",
                    axis, shape[axis]
                )));
            }
        }

        // Squared distances: zero on and inside the isosurface, unknown outside.
        let mut distances: Vec<f64> = field
            .values()
            .iter()
            .map(|&value| {
                if value < self.isovalue {
                    f64::INFINITY
                } else {
                    0.0
                }
            })
            .collect();

        if !distances.is_empty() && distances.iter().all(|d| d.is_infinite()) {
            warn!(
                "No grid point reaches the isovalue {}; all distances are infinite.",
                self.isovalue
            );
        } else {
            edt_squared(&mut distances, shape, spacing.to_array());
            for value in &mut distances {
                *value = value.sqrt();
            }
        }

        Field::new(
            mesh.clone(),
            distances,
            Some(FieldKind::DensityIsosurfaceDistance),
        )
    }
}

/// Distance from every grid point to the nearest point with `value >= isovalue`.
///
/// The mesh must be aligned with the coordinate system. A field not tagged as electron
/// density is processed anyway, with a warning.
pub fn distance_transform(field: &Field<f64>, isovalue: f64) -> Result<Field<f64>> {
    IsosurfaceConfig::new(isovalue).distance_transform(field)
}

/// Reusable buffers for the 1D transform.
#[derive(Default)]
struct Envelope {
    /// Sample indices of the parabolas in the lower envelope.
    v: Vec<usize>,
    /// Left boundary of each parabola's region.
    z: Vec<f64>,
}

/// Computes the squared 1D distance transform of `f` sampled every `spacing` units.
///
/// Infinite samples contribute no parabola. If every sample is infinite, so is the output.
fn edt_1d(f: &[f64], spacing: f64, output: &mut [f64], envelope: &mut Envelope) {
    debug_assert_eq!(
        f.len(),
        output.len(),
        "Input and output must have same length"
    );

    let Envelope { v, z } = envelope;
    v.clear();
    z.clear();

    // Compute lower envelope
    for (q, &fq) in f.iter().enumerate() {
        if !fq.is_finite() {
            continue;
        }
        loop {
            let Some(&r) = v.last() else {
                v.push(q);
                z.push(f64::NEG_INFINITY);
                break;
            };
            let s = intersection(q, r, f, spacing);
            let k = v.len() - 1;
            if k > 0 && s <= z[k] {
                v.pop();
                z.pop();
            } else {
                v.push(q);
                z.push(s);
                break;
            }
        }
    }

    if v.is_empty() {
        output.fill(f64::INFINITY);
        return;
    }

    // Fill output with minimum values
    let mut k = 0;
    for (q, dq) in output.iter_mut().enumerate() {
        let x = q as f64 * spacing;
        while k + 1 < v.len() && z[k + 1] < x {
            k += 1;
        }
        let dx = x - v[k] as f64 * spacing;
        *dq = dx * dx + f[v[k]];
    }
}

/// Coordinate at which the parabolas rooted at samples `i` and `j` intersect.
fn intersection(i: usize, j: usize, f: &[f64], spacing: f64) -> f64 {
    debug_assert!(i < f.len() && j < f.len(), "Indices must be within bounds");

    if i == j {
        // Same parabola - no intersection
        return f64::INFINITY;
    }

    let xi = i as f64 * spacing;
    let xj = j as f64 * spacing;
    let numerator = (f[i] + xi * xi) - (f[j] + xj * xj);
    let denominator = 2.0 * (xi - xj);

    if denominator.abs() < f64::EPSILON {
        return f64::INFINITY;
    }

    numerator / denominator
}

/// In-place squared 3D distance transform over a grid stored third-axis-fastest.
fn edt_squared(data: &mut [f64], shape: [usize; 3], spacing: [f64; 3]) {
    debug_assert_eq!(data.len(), shape.iter().product::<usize>());

    let strides = [shape[1] * shape[2], shape[2], 1];
    let mut envelope = Envelope::default();

    for axis in [2, 1, 0] {
        let n = shape[axis];
        if n == 0 {
            return;
        }
        let (a, b) = match axis {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };

        let mut line = vec![0.0; n];
        let mut transformed = vec![0.0; n];
        for ia in 0..shape[a] {
            for ib in 0..shape[b] {
                let start = ia * strides[a] + ib * strides[b];
                for (t, slot) in line.iter_mut().enumerate() {
                    *slot = data[start + t * strides[axis]];
                }
                edt_1d(&line, spacing[axis], &mut transformed, &mut envelope);
                for (t, value) in transformed.iter().enumerate() {
                    data[start + t * strides[axis]] = *value;
                }
            }
        }
    }
}
