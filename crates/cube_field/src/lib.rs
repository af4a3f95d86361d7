#![forbid(unsafe_code)]
//! cube_field: Scalar fields on 3D grids around molecules, with Gaussian cube file I/O.
//!
//! Modules:
//! - mesh: regular 3D grids defined by an origin and three step vectors
//! - field: values attached to a shared mesh, tagged with their physical meaning
//! - molecule: atoms with coordinates and named charge sets
//! - charges: fitted charges and multipole moments
//! - cube: reading and writing cube files
//! - evaluator: point-charge potential and nearest-atom fields evaluated over a mesh
//! - edt: distance to a density isosurface
pub mod charges;
pub mod cube;
pub mod edt;
pub mod error;
pub mod evaluator;
pub mod field;
pub mod mesh;
pub mod molecule;

/// Convenient re-exports for common types. Import with `use cube_field::prelude::*;`.
pub mod prelude {
    pub use crate::charges::{ChargeFitter, Dipole, Quadrupole};
    pub use crate::cube::{CubeFile, CubeWriteOptions, CUBE_CHARGE_TYPE};
    pub use crate::edt::{distance_transform, IsosurfaceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::evaluator::{
        EvaluatedFields, FieldEvaluator, FieldModel, NearestAtom, PointChargePotential,
        PointModel,
    };
    pub use crate::field::{Field, FieldKind};
    pub use crate::mesh::{GridAxis, GridMesh};
    pub use crate::molecule::{Atom, Molecule};
}
