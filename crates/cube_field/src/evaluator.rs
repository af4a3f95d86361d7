//! Evaluation of physical models at every point of a mesh.
//!
//! A [`FieldModel`] selects what to compute; [`FieldEvaluator`] resolves the model against a
//! [`Molecule`], visits every mesh point once in [`GridMesh::points`] order and collects the
//! results into fields. The cost is proportional to points times atoms; there is no spatial
//! acceleration.
//!
//! With the `rayon` feature the sweep over points runs in parallel. Output order is the same.
use std::sync::Arc;

use glam::DVec3;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::field::{Field, FieldKind};
use crate::mesh::GridMesh;
use crate::molecule::Molecule;

/// A function of position evaluated independently at every mesh point.
pub trait PointModel: Sync {
    /// Values produced for one point.
    type Output: Send;

    fn evaluate_at(&self, point: DVec3) -> Self::Output;
}

/// Potential of a set of point charges: `Σ qᵢ / |p − rᵢ|`.
#[derive(Clone, Debug)]
pub struct PointChargePotential {
    charges: Vec<(DVec3, f64)>,
}

impl PointChargePotential {
    /// Collects the charges of type `charge_type`. Every atom must carry one.
    pub fn new(molecule: &Molecule, charge_type: &str) -> Result<Self> {
        let charges = molecule
            .iter()
            .map(|atom| Ok((atom.coords(), atom.require_charge(charge_type)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { charges })
    }
}

impl PointModel for PointChargePotential {
    type Output = f64;

    #[inline]
    fn evaluate_at(&self, point: DVec3) -> f64 {
        self.charges
            .iter()
            .map(|&(position, charge)| charge / point.distance(position))
            .sum()
    }
}

/// Label of and distance to the closest atom. Ties go to the atom that comes first.
#[derive(Clone, Debug)]
pub struct NearestAtom {
    atoms: Vec<(usize, DVec3)>,
}

impl NearestAtom {
    pub fn new(molecule: &Molecule) -> Result<Self> {
        if molecule.is_empty() {
            return Err(Error::EmptyMolecule);
        }
        Ok(Self {
            atoms: molecule
                .iter()
                .map(|atom| (atom.label(), atom.coords()))
                .collect(),
        })
    }
}

impl PointModel for NearestAtom {
    type Output = (usize, f64);

    #[inline]
    fn evaluate_at(&self, point: DVec3) -> (usize, f64) {
        let mut nearest = (self.atoms[0].0, f64::INFINITY);
        for &(label, position) in &self.atoms {
            let distance = point.distance(position);
            if distance < nearest.1 {
                nearest = (label, distance);
            }
        }
        nearest
    }
}

const POINT_CHARGE_POTENTIAL_KINDS: [FieldKind; 1] = [FieldKind::PointChargePotential];
const NEAREST_ATOM_KINDS: [FieldKind; 2] =
    [FieldKind::NearestAtomLabel, FieldKind::NearestAtomDistance];

/// The models a [`FieldEvaluator`] can compute.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldModel {
    /// Potential of the atoms' charges of the given type.
    PointChargePotential { charge_type: String },
    /// Closest atom label and distance.
    NearestAtom,
}

impl FieldModel {
    pub fn point_charge_potential(charge_type: impl Into<String>) -> Self {
        FieldModel::PointChargePotential {
            charge_type: charge_type.into(),
        }
    }

    /// Kinds of the fields this model produces, in output order.
    pub fn output_kinds(&self) -> &'static [FieldKind] {
        match self {
            FieldModel::PointChargePotential { .. } => &POINT_CHARGE_POTENTIAL_KINDS,
            FieldModel::NearestAtom => &NEAREST_ATOM_KINDS,
        }
    }
}

/// Fields produced by evaluating a [`FieldModel`].
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum EvaluatedFields {
    PointChargePotential(Field<f64>),
    NearestAtom {
        label: Field<usize>,
        distance: Field<f64>,
    },
}

impl EvaluatedFields {
    /// Kinds of the contained fields, in output order.
    pub fn kinds(&self) -> &'static [FieldKind] {
        match self {
            EvaluatedFields::PointChargePotential(_) => &POINT_CHARGE_POTENTIAL_KINDS,
            EvaluatedFields::NearestAtom { .. } => &NEAREST_ATOM_KINDS,
        }
    }

    /// The scalar fields, in output order. Label fields are not included.
    pub fn scalar_fields(&self) -> Vec<&Field<f64>> {
        match self {
            EvaluatedFields::PointChargePotential(potential) => vec![potential],
            EvaluatedFields::NearestAtom { distance, .. } => vec![distance],
        }
    }
}

/// Evaluates models of a molecule over meshes.
#[derive(Clone, Copy, Debug)]
pub struct FieldEvaluator<'a> {
    molecule: &'a Molecule,
}

impl<'a> FieldEvaluator<'a> {
    pub fn new(molecule: &'a Molecule) -> Self {
        Self { molecule }
    }

    pub fn molecule(&self) -> &'a Molecule {
        self.molecule
    }

    /// Evaluates `model` at every point of `mesh`.
    pub fn evaluate(&self, mesh: &Arc<GridMesh>, model: &FieldModel) -> Result<EvaluatedFields> {
        match model {
            FieldModel::PointChargePotential { charge_type } => Ok(
                EvaluatedFields::PointChargePotential(
                    self.point_charge_potential(mesh, charge_type)?,
                ),
            ),
            FieldModel::NearestAtom => {
                let (label, distance) = self.nearest_atom(mesh)?;
                Ok(EvaluatedFields::NearestAtom { label, distance })
            }
        }
    }

    /// Potential of the charges of type `charge_type` at every mesh point.
    ///
    /// Fails if any atom lacks that charge type. Points that coincide with an atom get a
    /// non-finite value.
    pub fn point_charge_potential(
        &self,
        mesh: &Arc<GridMesh>,
        charge_type: &str,
    ) -> Result<Field<f64>> {
        let model = PointChargePotential::new(self.molecule, charge_type)?;
        let values = self.sweep(mesh, &model);
        Field::new(
            Arc::clone(mesh),
            values,
            Some(FieldKind::PointChargePotential),
        )
    }

    /// Label of and distance to the closest atom at every mesh point, as two aligned fields.
    pub fn nearest_atom(&self, mesh: &Arc<GridMesh>) -> Result<(Field<usize>, Field<f64>)> {
        let model = NearestAtom::new(self.molecule)?;
        let (labels, distances): (Vec<_>, Vec<_>) = self.sweep(mesh, &model).into_iter().unzip();
        Ok((
            Field::new(Arc::clone(mesh), labels, Some(FieldKind::NearestAtomLabel))?,
            Field::new(
                Arc::clone(mesh),
                distances,
                Some(FieldKind::NearestAtomDistance),
            )?,
        ))
    }

    /// Evaluates any [`PointModel`] at every mesh point, in mesh order.
    pub fn sweep<M: PointModel>(&self, mesh: &GridMesh, model: &M) -> Vec<M::Output> {
        debug!(
            "Evaluating model at {} points for {} atoms.",
            mesh.len(),
            self.molecule.len()
        );
        sweep_points(mesh, model)
    }
}

#[cfg(not(feature = "rayon"))]
fn sweep_points<M: PointModel>(mesh: &GridMesh, model: &M) -> Vec<M::Output> {
    mesh.points().map(|point| model.evaluate_at(point)).collect()
}

#[cfg(feature = "rayon")]
fn sweep_points<M: PointModel>(mesh: &GridMesh, model: &M) -> Vec<M::Output> {
    (0..mesh.len())
        .into_par_iter()
        .map(|index| {
            let (i, j, k) = mesh.unravel(index);
            model.evaluate_at(mesh.point_at(i, j, k))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GridAxis;

    /// 3x3x3 unit grid whose centre node (1, 1, 1) sits at the coordinate origin.
    fn centred_mesh() -> Arc<GridMesh> {
        Arc::new(GridMesh::new(
            [-1.0, -1.0, -1.0],
            [
                GridAxis::new(DVec3::X, 3),
                GridAxis::new(DVec3::Y, 3),
                GridAxis::new(DVec3::Z, 3),
            ],
        ))
    }

    fn single_charge(charge: f64) -> Molecule {
        let mut molecule = Molecule::new();
        molecule.push(1, DVec3::ZERO).set_charge("q", charge);
        molecule
    }

    #[test]
    fn unit_charge_gives_unit_potential_one_step_away() {
        let molecule = single_charge(1.0);
        let mesh = centred_mesh();
        let potential = FieldEvaluator::new(&molecule)
            .point_charge_potential(&mesh, "q")
            .expect("potential");

        assert_eq!(potential.kind(), Some(FieldKind::PointChargePotential));
        assert_eq!(potential.get(1, 1, 2), Some(&1.0));
        assert_eq!(potential.get(2, 1, 1), Some(&1.0));
        assert_eq!(potential.get(1, 0, 1), Some(&1.0));
        assert!((potential.get(0, 0, 0).unwrap() - 1.0 / 3.0_f64.sqrt()).abs() < 1e-12);
        assert!(!potential.get(1, 1, 1).unwrap().is_finite());
    }

    #[test]
    fn potential_sums_over_atoms() {
        let mut molecule = Molecule::new();
        molecule.push(1, [-1.0, 0.0, 0.0]).set_charge("q", 0.5);
        molecule.push(1, [1.0, 0.0, 0.0]).set_charge("q", -0.25);
        let mesh = centred_mesh();
        let potential = FieldEvaluator::new(&molecule)
            .point_charge_potential(&mesh, "q")
            .unwrap();
        // Node (1, 1, 1) is the origin, one unit from each atom.
        assert!((potential.get(1, 1, 1).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn missing_charge_type_aborts() {
        let mut molecule = single_charge(1.0);
        molecule.push(8, [2.0, 0.0, 0.0]);
        let err = FieldEvaluator::new(&molecule)
            .point_charge_potential(&centred_mesh(), "q")
            .unwrap_err();
        assert!(matches!(err, Error::MissingCharge { label: 2, .. }));
    }

    #[test]
    fn nearest_atom_with_one_atom_is_plain_distance() {
        let molecule = Molecule::new().with_atom(6, [0.3, -0.2, 0.1]);
        let mesh = centred_mesh();
        let (labels, distances) = FieldEvaluator::new(&molecule)
            .nearest_atom(&mesh)
            .unwrap();

        assert!(labels.values().iter().all(|&label| label == 1));
        for (point, distance) in distances.iter_points() {
            assert_eq!(*distance, point.distance(DVec3::new(0.3, -0.2, 0.1)));
        }
        assert_eq!(labels.kind(), Some(FieldKind::NearestAtomLabel));
        assert_eq!(distances.kind(), Some(FieldKind::NearestAtomDistance));
    }

    #[test]
    fn nearest_atom_ties_keep_first_atom() {
        let molecule = Molecule::new()
            .with_atom(1, [0.0, 0.0, -1.0])
            .with_atom(1, [0.0, 0.0, 1.0]);
        let mesh = centred_mesh();
        let (labels, distances) = FieldEvaluator::new(&molecule)
            .nearest_atom(&mesh)
            .unwrap();

        // Every point of the z = 0 plane is equidistant from both atoms.
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(labels.get(i, j, 1), Some(&1));
            }
        }
        assert_eq!(labels.get(1, 1, 2), Some(&2));
        assert_eq!(distances.get(1, 1, 1), Some(&1.0));
    }

    #[test]
    fn nearest_atom_requires_atoms() {
        let err = FieldEvaluator::new(&Molecule::new())
            .nearest_atom(&centred_mesh())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyMolecule));
    }

    #[test]
    fn evaluate_dispatches_on_model() {
        let molecule = single_charge(2.0);
        let mesh = centred_mesh();
        let evaluator = FieldEvaluator::new(&molecule);

        let model = FieldModel::point_charge_potential("q");
        let fields = evaluator.evaluate(&mesh, &model).unwrap();
        assert_eq!(fields.kinds(), model.output_kinds());
        assert!(matches!(fields, EvaluatedFields::PointChargePotential(ref f) if f.len() == 27));

        let fields = evaluator.evaluate(&mesh, &FieldModel::NearestAtom).unwrap();
        assert_eq!(
            fields.kinds(),
            &[FieldKind::NearestAtomLabel, FieldKind::NearestAtomDistance]
        );
        assert_eq!(fields.scalar_fields().len(), 1);
    }

    #[test]
    fn output_fields_share_the_input_mesh() {
        let molecule = single_charge(1.0);
        let mesh = centred_mesh();
        let (labels, distances) = FieldEvaluator::new(&molecule)
            .nearest_atom(&mesh)
            .unwrap();
        assert!(Arc::ptr_eq(labels.mesh(), &mesh));
        assert!(labels.shares_mesh_with(&distances));
    }

    struct SumOfCoordinates;

    impl PointModel for SumOfCoordinates {
        type Output = f64;

        fn evaluate_at(&self, point: DVec3) -> f64 {
            point.x * 100.0 + point.y * 10.0 + point.z
        }
    }

    #[test]
    fn sweep_follows_mesh_order() {
        let molecule = Molecule::new();
        let mesh = centred_mesh();
        let values = FieldEvaluator::new(&molecule).sweep(&mesh, &SumOfCoordinates);
        let expected: Vec<_> = mesh
            .points()
            .map(|p| p.x * 100.0 + p.y * 10.0 + p.z)
            .collect();
        assert_eq!(values, expected);
        assert_eq!(values[0], -111.0);
        assert_eq!(values[1], -110.0);
    }
}
