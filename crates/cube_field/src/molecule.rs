//! Atoms and molecules as read from cube files.
//!
//! A [`Molecule`] is an ordered list of [`Atom`]s. The order is significant: the atom at
//! index 0 carries label 1, and labels are what the nearest-atom model reports.
use std::collections::HashMap;
use std::fmt;

use glam::DVec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cube::number::signed_fixed;
use crate::error::{Error, Result};

/// Element symbols and names indexed by `atomic_number - 1`.
const PERIODIC_TABLE: [(&str, &str); 18] = [
    ("H", "Hydrogen"),
    ("He", "Helium"),
    ("Li", "Lithium"),
    ("Be", "Beryllium"),
    ("B", "Boron"),
    ("C", "Carbon"),
    ("N", "Nitrogen"),
    ("O", "Oxygen"),
    ("F", "Fluorine"),
    ("Ne", "Neon"),
    ("Na", "Sodium"),
    ("Mg", "Magnesium"),
    ("Al", "Aluminum"),
    ("Si", "Silicon"),
    ("P", "Phosphorus"),
    ("S", "Sulfur"),
    ("Cl", "Chlorine"),
    ("Ar", "Argon"),
];

fn table_entry(atomic_number: u32) -> Option<&'static (&'static str, &'static str)> {
    let index = usize::try_from(atomic_number).ok()?.checked_sub(1)?;
    PERIODIC_TABLE.get(index)
}

/// Returns the element symbol for an atomic number, if it is in the table.
pub fn element_symbol(atomic_number: u32) -> Option<&'static str> {
    table_entry(atomic_number).map(|(symbol, _)| *symbol)
}

/// Returns the full element name for an atomic number, if it is in the table.
pub fn element_name(atomic_number: u32) -> Option<&'static str> {
    table_entry(atomic_number).map(|(_, name)| *name)
}

/// A single atom with coordinates and any number of named partial charges.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    label: usize,
    atomic_number: u32,
    identity: String,
    coords: DVec3,
    charges: HashMap<String, f64>,
}

impl Atom {
    /// Creates an atom. Atomic numbers missing from the periodic table are accepted and the
    /// atomic number itself becomes the identity.
    pub fn new(label: usize, atomic_number: u32, coords: impl Into<mint::Vector3<f64>>) -> Self {
        let identity = match element_symbol(atomic_number) {
            Some(symbol) => symbol.to_owned(),
            None => {
                warn!(
                    "Element of atomic number {} not implemented. Setting its identity to atomic number.",
                    atomic_number
                );
                atomic_number.to_string()
            }
        };

        Self {
            label,
            atomic_number,
            identity,
            coords: DVec3::from(coords.into()),
            charges: HashMap::new(),
        }
    }

    /// 1-based position of the atom in its molecule.
    #[inline]
    pub fn label(&self) -> usize {
        self.label
    }

    #[inline]
    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    /// Element symbol, or the atomic number as text for elements outside the table.
    #[inline]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[inline]
    pub fn coords(&self) -> DVec3 {
        self.coords
    }

    /// Sets (or replaces) the charge stored under `charge_type`.
    pub fn set_charge(&mut self, charge_type: impl Into<String>, value: f64) {
        self.charges.insert(charge_type.into(), value);
    }

    pub fn charge(&self, charge_type: &str) -> Option<f64> {
        self.charges.get(charge_type).copied()
    }

    /// Like [`Atom::charge`], but a missing charge type is an error.
    pub fn require_charge(&self, charge_type: &str) -> Result<f64> {
        self.charge(charge_type).ok_or_else(|| Error::MissingCharge {
            charge_type: charge_type.to_owned(),
            label: self.label,
        })
    }

    /// Names of all charge types stored on this atom, in no particular order.
    pub fn charge_types(&self) -> impl Iterator<Item = &str> {
        self.charges.keys().map(String::as_str)
    }

    /// Renders the atom followed by the selected charge, e.g. `Atom  1:  C , charge: -0.4072`.
    pub fn display_with_charge(&self, charge_type: &str) -> Result<String> {
        let charge = self.require_charge(charge_type)?;
        Ok(format!("{}, charge: {}", self, signed_fixed(charge, 4)))
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom {:2}:  {:2}", self.label, self.identity)
    }
}

/// Ordered collection of atoms.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            atoms: Vec::with_capacity(capacity),
        }
    }

    /// Appends an atom, labelling it with its 1-based position.
    pub fn push(
        &mut self,
        atomic_number: u32,
        coords: impl Into<mint::Vector3<f64>>,
    ) -> &mut Atom {
        let label = self.atoms.len() + 1;
        self.atoms.push(Atom::new(label, atomic_number, coords));
        let last = self.atoms.len() - 1;
        &mut self.atoms[last]
    }

    /// Builder-style variant of [`Molecule::push`].
    pub fn with_atom(mut self, atomic_number: u32, coords: impl Into<mint::Vector3<f64>>) -> Self {
        self.push(atomic_number, coords);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    /// Looks up an atom by its 1-based label.
    pub fn by_label(&self, label: usize) -> Option<&Atom> {
        label.checked_sub(1).and_then(|i| self.atoms.get(i))
    }

    pub fn by_label_mut(&mut self, label: usize) -> Option<&mut Atom> {
        label.checked_sub(1).and_then(|i| self.atoms.get_mut(i))
    }

    /// Stores one charge per atom under `charge_type`, in molecule order.
    pub fn assign_charges(&mut self, charge_type: &str, charges: &[f64]) -> Result<()> {
        if charges.len() != self.atoms.len() {
            return Err(Error::ChargeCount {
                expected: self.atoms.len(),
                actual: charges.len(),
            });
        }
        for (atom, &charge) in self.atoms.iter_mut().zip(charges) {
            atom.set_charge(charge_type, charge);
        }
        Ok(())
    }

    /// Collects the charges of the given type in molecule order.
    pub fn charges(&self, charge_type: &str) -> Result<Vec<f64>> {
        self.atoms
            .iter()
            .map(|atom| atom.require_charge(charge_type))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Molecule {
    type Item = &'a Atom;
    type IntoIter = std::slice::Iter<'a, Atom>;

    fn into_iter(self) -> Self::IntoIter {
        self.atoms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> Molecule {
        Molecule::new()
            .with_atom(8, [0.0, 0.0, 0.0])
            .with_atom(1, [1.43, 1.11, 0.0])
            .with_atom(1, [-1.43, 1.11, 0.0])
    }

    #[test]
    fn labels_follow_insertion_order() {
        let molecule = water();
        let labels: Vec<_> = molecule.iter().map(Atom::label).collect();
        assert_eq!(labels, vec![1, 2, 3]);
        assert_eq!(molecule.by_label(1).map(Atom::identity), Some("O"));
        assert!(molecule.by_label(0).is_none());
        assert!(molecule.by_label(4).is_none());
    }

    #[test]
    fn unknown_atomic_number_falls_back_to_number() {
        let atom = Atom::new(1, 92, [0.0, 0.0, 0.0]);
        assert_eq!(atom.identity(), "92");
        let atom = Atom::new(1, 0, [0.0, 0.0, 0.0]);
        assert_eq!(atom.identity(), "0");
    }

    #[test]
    fn element_lookup_covers_table_bounds() {
        assert_eq!(element_symbol(1), Some("H"));
        assert_eq!(element_symbol(18), Some("Ar"));
        assert_eq!(element_symbol(19), None);
        assert_eq!(element_name(6), Some("Carbon"));
    }

    #[test]
    fn display_matches_listing_format() {
        let atom = Atom::new(3, 6, [0.0, 0.0, 0.0]);
        assert_eq!(atom.to_string(), "Atom  3:  C ");
    }

    #[test]
    fn display_with_charge_requires_charge() {
        let mut atom = Atom::new(1, 6, [0.0, 0.0, 0.0]);
        assert!(matches!(
            atom.display_with_charge("mk"),
            Err(Error::MissingCharge { label: 1, .. })
        ));
        atom.set_charge("mk", -0.407205);
        assert_eq!(
            atom.display_with_charge("mk").unwrap(),
            "Atom  1:  C , charge: -0.4072"
        );
        atom.set_charge("mk", 0.1019);
        assert_eq!(
            atom.display_with_charge("mk").unwrap(),
            "Atom  1:  C , charge:  0.1019"
        );
    }

    #[test]
    fn assign_charges_checks_count() {
        let mut molecule = water();
        assert!(matches!(
            molecule.assign_charges("q", &[1.0, 2.0]),
            Err(Error::ChargeCount {
                expected: 3,
                actual: 2
            })
        ));

        molecule.assign_charges("q", &[-0.8, 0.4, 0.4]).unwrap();
        assert_eq!(molecule.charges("q").unwrap(), vec![-0.8, 0.4, 0.4]);
        assert!(molecule.charges("other").is_err());
    }

    #[test]
    fn coords_accept_glam_vectors() {
        let mut molecule = Molecule::new();
        molecule.push(1, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(molecule.atoms()[0].coords(), DVec3::new(1.0, 2.0, 3.0));
    }
}
