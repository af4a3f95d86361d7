//! Values attached to every point of a mesh.
//!
//! A [`Field`] pairs a shared [`GridMesh`] with one value per mesh point, in the order of
//! [`GridMesh::points`], and an optional [`FieldKind`] describing what the values mean.
//! Fields are never modified in place; arithmetic returns new fields.
use std::fmt;
use std::ops::{Add, Neg};
use std::sync::Arc;

use glam::DVec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mesh::GridMesh;

/// Number of leading title characters that identify the field type of a cube file.
pub const CUBE_TITLE_PREFIX_LEN: usize = 18;

/// Known cube titles, matched exactly against the first [`CUBE_TITLE_PREFIX_LEN`] characters.
const CUBE_TITLES: [(&str, FieldKind); 2] = [
    (" Electrostatic pot", FieldKind::ElectrostaticPotential),
    (" Electron density ", FieldKind::ElectronDensity),
];

/// The physical meaning of a field's values.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FieldKind {
    /// Electrostatic potential from a quantum-chemical calculation.
    ElectrostaticPotential,
    /// Electron density from a quantum-chemical calculation.
    ElectronDensity,
    /// Potential reproduced from atomic point charges.
    PointChargePotential,
    /// Label of the atom closest to each point.
    NearestAtomLabel,
    /// Distance to the atom closest to each point.
    NearestAtomDistance,
    /// Distance from each point to the nearest point inside a density isosurface.
    DensityIsosurfaceDistance,
}

impl FieldKind {
    /// Short identifier, also used in generated cube headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::ElectrostaticPotential => "esp",
            FieldKind::ElectronDensity => "ed",
            FieldKind::PointChargePotential => "rep_esp",
            FieldKind::NearestAtomLabel => "closest_atom",
            FieldKind::NearestAtomDistance => "closest_atom_dist",
            FieldKind::DensityIsosurfaceDistance => "ed_dist",
        }
    }

    /// Resolves the field kind of a cube file from its title line.
    ///
    /// Only the first [`CUBE_TITLE_PREFIX_LEN`] characters are compared, including the
    /// leading space that Gaussian writes.
    pub fn from_cube_title(title: &str) -> Result<Self> {
        let prefix = match title.char_indices().nth(CUBE_TITLE_PREFIX_LEN) {
            Some((end, _)) => &title[..end],
            None => title,
        };
        CUBE_TITLES
            .iter()
            .find(|(known, _)| *known == prefix)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| Error::UnknownCubeTitle {
                title: title.to_owned(),
            })
    }

    /// Title line Gaussian writes for this kind, if the kind can come from a cube file.
    pub fn cube_title(&self) -> Option<&'static str> {
        match self {
            FieldKind::ElectrostaticPotential => {
                Some(" Electrostatic potential from Total SCF Density")
            }
            FieldKind::ElectronDensity => Some(" Electron density from Total SCF Density"),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values of type `V` at every point of a mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<V> {
    mesh: Arc<GridMesh>,
    values: Vec<V>,
    kind: Option<FieldKind>,
}

impl<V> Field<V> {
    /// Creates a field, failing unless there is exactly one value per mesh point.
    pub fn new(mesh: Arc<GridMesh>, values: Vec<V>, kind: Option<FieldKind>) -> Result<Self> {
        if values.len() != mesh.len() {
            return Err(Error::LengthMismatch {
                points: mesh.len(),
                values: values.len(),
            });
        }
        Ok(Self { mesh, values, kind })
    }

    pub fn mesh(&self) -> &Arc<GridMesh> {
        &self.mesh
    }

    /// Values in the order of [`GridMesh::points`].
    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn into_values(self) -> Vec<V> {
        self.values
    }

    pub fn kind(&self) -> Option<FieldKind> {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the same field with a different kind tag.
    pub fn with_kind(mut self, kind: Option<FieldKind>) -> Self {
        self.kind = kind;
        self
    }

    /// Pairs every mesh point with its value.
    pub fn iter_points(&self) -> impl Iterator<Item = (DVec3, &V)> + '_ {
        self.mesh.points().zip(self.values.iter())
    }

    /// Value at lattice node `(i, j, k)`.
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<&V> {
        let [nx, ny, nz] = self.mesh.shape();
        if i >= nx || j >= ny || k >= nz {
            return None;
        }
        self.values.get(self.mesh.index_of(i, j, k))
    }

    /// Builds an untagged field on the same mesh by transforming every value.
    pub fn map<U>(&self, f: impl FnMut(&V) -> U) -> Field<U> {
        Field {
            mesh: Arc::clone(&self.mesh),
            values: self.values.iter().map(f).collect(),
            kind: None,
        }
    }

    /// Whether both fields are defined on the same points.
    pub fn shares_mesh_with<U>(&self, other: &Field<U>) -> bool {
        Arc::ptr_eq(&self.mesh, &other.mesh) || *self.mesh == *other.mesh
    }

    fn zip_with<U, W>(&self, other: &Field<U>, f: impl Fn(&V, &U) -> W) -> Result<Field<W>> {
        if !self.shares_mesh_with(other) {
            return Err(Error::MeshMismatch);
        }
        Ok(Field {
            mesh: Arc::clone(&self.mesh),
            values: self
                .values
                .iter()
                .zip(other.values.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
            kind: None,
        })
    }
}

impl<V> Field<V>
where
    V: Copy + Add<Output = V> + Neg<Output = V>,
{
    /// Elementwise sum. The result carries no kind tag.
    pub fn try_add(&self, other: &Field<V>) -> Result<Field<V>> {
        self.zip_with(other, |a, b| *a + *b)
    }

    /// Elementwise negation. The result carries no kind tag.
    pub fn negate(&self) -> Field<V> {
        self.map(|v| -*v)
    }

    /// Elementwise difference, computed as the sum with the negated field.
    pub fn try_sub(&self, other: &Field<V>) -> Result<Field<V>> {
        self.try_add(&other.negate())
    }
}

impl<V> Neg for &Field<V>
where
    V: Copy + Add<Output = V> + Neg<Output = V>,
{
    type Output = Field<V>;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Field<f64> {
    /// Root mean square of the values. Zero for an empty field.
    pub fn rms(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|v| v * v).sum();
        (sum / self.values.len() as f64).sqrt()
    }

    /// Root mean square of the pointwise difference to `reference`.
    pub fn rms_difference(&self, reference: &Field<f64>) -> Result<f64> {
        Ok(self.zip_with(reference, |a, b| a - b)?.rms())
    }

    /// Smallest and largest finite value, if any.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GridAxis;

    fn mesh(nz: usize) -> Arc<GridMesh> {
        Arc::new(GridMesh::new(
            DVec3::ZERO,
            [
                GridAxis::new(DVec3::X, 1),
                GridAxis::new(DVec3::Y, 2),
                GridAxis::new(DVec3::Z, nz),
            ],
        ))
    }

    #[test]
    fn construction_requires_one_value_per_point() {
        let err = Field::new(mesh(2), vec![1.0; 3], None).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                points: 4,
                values: 3
            }
        ));
        assert!(Field::new(mesh(2), vec![1.0; 4], None).is_ok());
    }

    #[test]
    fn add_then_subtract_restores_values() {
        let a: Field<f64> = Field::new(mesh(2), vec![1.0, -2.5, 3.25, 0.1], None).unwrap();
        let b = Field::new(mesh(2), vec![0.3, 0.7, -1.1, 1e-3], None).unwrap();
        let c = a.try_add(&b).unwrap().try_sub(&b).unwrap();
        for (x, y) in a.values().iter().zip(c.values()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn arithmetic_requires_identical_meshes() {
        let a = Field::new(mesh(2), vec![1.0; 4], None).unwrap();
        let b = Field::new(mesh(3), vec![1.0; 6], None).unwrap();
        assert!(matches!(a.try_add(&b), Err(Error::MeshMismatch)));
        assert!(matches!(a.try_sub(&b), Err(Error::MeshMismatch)));
    }

    #[test]
    fn structurally_equal_meshes_are_compatible() {
        let a = Field::new(mesh(2), vec![1.0; 4], None).unwrap();
        let b = Field::new(mesh(2), vec![2.0; 4], None).unwrap();
        assert!(!Arc::ptr_eq(a.mesh(), b.mesh()));
        assert_eq!(a.try_add(&b).unwrap().values(), &[3.0; 4]);
    }

    #[test]
    fn arithmetic_drops_kind_tag() {
        let a = Field::new(mesh(1), vec![1.0, 2.0], Some(FieldKind::ElectrostaticPotential))
            .unwrap();
        let diff = a.try_sub(&a).unwrap();
        assert_eq!(diff.kind(), None);
        assert_eq!((-&a).kind(), None);
        assert_eq!((-&a).values(), &[-1.0, -2.0]);

        let retagged = diff.with_kind(Some(FieldKind::ElectrostaticPotential));
        assert_eq!(retagged.kind(), Some(FieldKind::ElectrostaticPotential));
    }

    #[test]
    fn integer_fields_support_arithmetic() {
        let a = Field::new(mesh(1), vec![3_i64, 4], None).unwrap();
        assert_eq!(a.try_sub(&a).unwrap().values(), &[0, 0]);
    }

    #[test]
    fn get_uses_lattice_indices() {
        let field = Field::new(mesh(2), vec![0.0, 1.0, 2.0, 3.0], None).unwrap();
        assert_eq!(field.get(0, 1, 0), Some(&2.0));
        assert_eq!(field.get(0, 2, 0), None);
    }

    #[test]
    fn rms_difference_compares_fields() {
        let a = Field::new(mesh(1), vec![1.0, 1.0], None).unwrap();
        let b = Field::new(mesh(1), vec![0.0, 2.0], None).unwrap();
        assert!((a.rms() - 1.0).abs() < 1e-12);
        assert!((a.rms_difference(&b).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn finite_range_skips_infinities() {
        let a = Field::new(mesh(1), vec![f64::INFINITY, -2.0], None).unwrap();
        assert_eq!(a.finite_range(), Some((-2.0, -2.0)));
    }

    #[test]
    fn cube_titles_match_exact_prefix() {
        assert_eq!(
            FieldKind::from_cube_title(" Electrostatic potential from Total SCF Density")
                .unwrap(),
            FieldKind::ElectrostaticPotential
        );
        assert_eq!(
            FieldKind::from_cube_title(" Electron density from Total SCF Density").unwrap(),
            FieldKind::ElectronDensity
        );
        assert!(matches!(
            FieldKind::from_cube_title(" Unknown field type"),
            Err(Error::UnknownCubeTitle { .. })
        ));
        // Missing leading space.
        assert!(FieldKind::from_cube_title("Electrostatic potential").is_err());
        assert!(FieldKind::from_cube_title("").is_err());
    }

    #[test]
    fn known_kinds_round_trip_through_titles() {
        for kind in [FieldKind::ElectrostaticPotential, FieldKind::ElectronDensity] {
            let title = kind.cube_title().unwrap();
            assert_eq!(FieldKind::from_cube_title(title).unwrap(), kind);
        }
        assert_eq!(FieldKind::NearestAtomLabel.cube_title(), None);
    }
}
