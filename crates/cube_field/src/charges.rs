//! Partial charges and the multipole moments derived from them.
//!
//! Charge fitting itself (RESP, CHELPG, ...) happens outside this crate; [`ChargeFitter`] is the
//! seam through which such a routine plugs in.
use glam::DVec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::field::Field;
use crate::molecule::Molecule;

/// Dipole moment components (bohr times elementary charge).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dipole {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Dipole {
    pub fn magnitude(&self) -> f64 {
        DVec3::new(self.x, self.y, self.z).length()
    }
}

/// Cartesian quadrupole moment components (bohr² times elementary charge).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Quadrupole {
    pub xx: f64,
    pub yy: f64,
    pub zz: f64,
    pub xy: f64,
    pub xz: f64,
    pub yz: f64,
}

impl Quadrupole {
    /// Removes the isotropic part so that `xx + yy + zz == 0`.
    pub fn traceless(&self) -> Self {
        let mean = (self.xx + self.yy + self.zz) / 3.0;
        Self {
            xx: self.xx - mean,
            yy: self.yy - mean,
            zz: self.zz - mean,
            ..*self
        }
    }
}

/// An external routine that derives one charge per atom from potential samples.
pub trait ChargeFitter {
    /// Returns charges in molecule order.
    fn fit(&self, potential: &Field<f64>, molecule: &Molecule) -> Result<Vec<f64>>;
}

impl<F> ChargeFitter for F
where
    F: Fn(&Field<f64>, &Molecule) -> Result<Vec<f64>>,
{
    fn fit(&self, potential: &Field<f64>, molecule: &Molecule) -> Result<Vec<f64>> {
        self(potential, molecule)
    }
}

impl Molecule {
    /// Runs `fitter` on `potential` and stores the result under `charge_type`.
    pub fn fit_charges(
        &mut self,
        fitter: &dyn ChargeFitter,
        potential: &Field<f64>,
        charge_type: &str,
    ) -> Result<()> {
        let charges = fitter.fit(potential, self)?;
        debug!(
            "Fitted {} charges of type '{}' to {} potential samples.",
            charges.len(),
            charge_type,
            potential.len()
        );
        self.assign_charges(charge_type, &charges)
    }

    pub fn total_charge(&self, charge_type: &str) -> Result<f64> {
        Ok(self.charges(charge_type)?.iter().sum())
    }

    /// Point-charge dipole `Σ qᵢ rᵢ` about the coordinate origin.
    pub fn dipole_moment(&self, charge_type: &str) -> Result<Dipole> {
        let mut moment = DVec3::ZERO;
        for atom in self {
            moment += atom.require_charge(charge_type)? * atom.coords();
        }
        Ok(Dipole {
            x: moment.x,
            y: moment.y,
            z: moment.z,
        })
    }

    /// Point-charge second moment `Σ qᵢ rᵢ rᵢᵀ` about the coordinate origin.
    pub fn quadrupole_moment(&self, charge_type: &str) -> Result<Quadrupole> {
        let mut q = Quadrupole::default();
        for atom in self {
            let charge = atom.require_charge(charge_type)?;
            let r = atom.coords();
            q.xx += charge * r.x * r.x;
            q.yy += charge * r.y * r.y;
            q.zz += charge * r.z * r.z;
            q.xy += charge * r.x * r.y;
            q.xz += charge * r.x * r.z;
            q.yz += charge * r.y * r.z;
        }
        Ok(q)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::DVec3;

    use super::*;
    use crate::error::Error;
    use crate::mesh::{GridAxis, GridMesh};

    fn dimer() -> Molecule {
        let mut molecule = Molecule::new()
            .with_atom(11, [1.0, 0.0, 0.0])
            .with_atom(17, [-1.0, 0.0, 0.0]);
        molecule.assign_charges("q", &[0.5, -0.5]).unwrap();
        molecule
    }

    fn potential() -> Field<f64> {
        let mesh = GridMesh::new(
            DVec3::ZERO,
            [
                GridAxis::new(DVec3::X, 2),
                GridAxis::new(DVec3::Y, 1),
                GridAxis::new(DVec3::Z, 1),
            ],
        );
        Field::new(Arc::new(mesh), vec![0.1, -0.1], None).unwrap()
    }

    #[test]
    fn dipole_of_ion_pair() {
        let dipole = dimer().dipole_moment("q").unwrap();
        assert_eq!(dipole, Dipole { x: 1.0, y: 0.0, z: 0.0 });
        assert_eq!(dipole.magnitude(), 1.0);
    }

    #[test]
    fn total_charge_sums_in_order() {
        assert_eq!(dimer().total_charge("q").unwrap(), 0.0);
        assert!(dimer().total_charge("missing").is_err());
    }

    #[test]
    fn traceless_quadrupole_has_zero_trace() {
        let q = dimer().quadrupole_moment("q").unwrap().traceless();
        assert!((q.xx + q.yy + q.zz).abs() < 1e-12);
    }

    #[test]
    fn fit_charges_stores_fitter_output() {
        let mut molecule = dimer();
        let fitter =
            |_: &Field<f64>, m: &Molecule| -> Result<Vec<f64>> { Ok(vec![0.25; m.len()]) };
        molecule
            .fit_charges(&fitter, &potential(), "resp")
            .expect("fit charges");
        assert_eq!(molecule.charges("resp").unwrap(), vec![0.25, 0.25]);
    }

    #[test]
    fn fit_charges_rejects_wrong_count() {
        let mut molecule = dimer();
        let fitter = |_: &Field<f64>, _: &Molecule| -> Result<Vec<f64>> { Ok(vec![1.0]) };
        let err = molecule
            .fit_charges(&fitter, &potential(), "resp")
            .unwrap_err();
        assert!(matches!(err, Error::ChargeCount { .. }));
    }
}
