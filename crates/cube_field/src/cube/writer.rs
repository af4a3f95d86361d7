//! Writer for the Gaussian cube text format.
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::info;

use super::number::{signed_fixed, signed_scientific};
use crate::error::{Error, Result};
use crate::field::Field;
use crate::molecule::Molecule;

/// Values per line before wrapping, independent of the grid shape.
const VALUES_PER_LINE: usize = 6;

const DEFAULT_COMMENT: &str = " Cube file generated by cube_field.";

/// Options for writing a field as a cube file.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CubeWriteOptions {
    /// Charge type written in the atom charge column. The atomic number is written when unset.
    pub charge_type: Option<String>,
    /// First header line. Defaults to a generated-by note.
    pub comment: Option<String>,
    /// Second header line. Defaults to the Gaussian title for the field kind when it has one.
    pub title: Option<String>,
}

impl CubeWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the charge type written for each atom.
    pub fn with_charge_type(mut self, charge_type: impl Into<String>) -> Self {
        self.charge_type = Some(charge_type.into());
        self
    }

    /// Sets the first header line.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the second header line.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Validates the options, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        for line in [&self.comment, &self.title].into_iter().flatten() {
            if line.contains(['\n', '\r']) {
                return Err(Error::InvalidConfig(format!(
                    "cube header lines must not contain line breaks: {:?}",
                    line
                )));
            }
        }
        if matches!(&self.charge_type, Some(name) if name.is_empty()) {
            return Err(Error::InvalidConfig("charge_type must not be empty".into()));
        }
        Ok(())
    }
}

fn default_title(field: &Field<f64>) -> String {
    match field.kind() {
        Some(kind) => match kind.cube_title() {
            Some(title) => title.to_owned(),
            None => format!(" Cube file for field of type {}.", kind),
        },
        None => " Cube file for field of untyped values.".to_owned(),
    }
}

fn write_vector_line<W: Write>(writer: &mut W, count: usize, v: [f64; 3]) -> Result<()> {
    write!(
        writer,
        " {:4}   {}   {}   {}",
        count,
        signed_fixed(v[0], 6),
        signed_fixed(v[1], 6),
        signed_fixed(v[2], 6)
    )?;
    Ok(())
}

/// Writes `field` and `molecule` in cube format.
///
/// Values are wrapped after every six values and additionally at the end of every run along
/// the third axis, matching the layout Gaussian's `cubegen` produces.
pub fn write<W: Write>(
    mut writer: W,
    field: &Field<f64>,
    molecule: &Molecule,
    options: &CubeWriteOptions,
) -> Result<()> {
    options.validate()?;
    if let Some(charge_type) = &options.charge_type {
        // Fail before emitting anything.
        molecule.charges(charge_type)?;
    }

    let mesh = field.mesh();
    let comment = options.comment.as_deref().unwrap_or(DEFAULT_COMMENT);
    let title = match &options.title {
        Some(title) => title.clone(),
        None => default_title(field),
    };
    writeln!(writer, "{}", comment)?;
    writeln!(writer, "{}", title)?;

    write_vector_line(&mut writer, molecule.len(), mesh.origin().to_array())?;
    writeln!(writer, "    1")?;
    for axis in mesh.axes() {
        write_vector_line(&mut writer, axis.point_count, axis.vector.to_array())?;
        writeln!(writer)?;
    }

    for atom in molecule {
        let charge = match &options.charge_type {
            Some(charge_type) => atom.require_charge(charge_type)?,
            None => f64::from(atom.atomic_number()),
        };
        let coords = atom.coords();
        writeln!(
            writer,
            " {:4}   {}   {}   {}   {}",
            atom.atomic_number(),
            signed_fixed(charge, 6),
            signed_fixed(coords.x, 6),
            signed_fixed(coords.y, 6),
            signed_fixed(coords.z, 6)
        )?;
    }

    let run_length = mesh.shape()[2];
    let mut i = 1;
    for &value in field.values() {
        write!(writer, " {}", signed_scientific(value, 5))?;
        if i % VALUES_PER_LINE == 0 {
            writeln!(writer)?;
        }
        if i % run_length == 0 {
            writeln!(writer)?;
            i = 1;
        } else {
            i += 1;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Writes a cube file to `path`, which must not exist yet.
///
/// The file is rendered in memory first; an existing file is reported as
/// [`Error::AlreadyExists`] and left untouched.
pub fn write_path(
    path: impl AsRef<Path>,
    field: &Field<f64>,
    molecule: &Molecule,
    options: &CubeWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let mut buffer = Vec::new();
    write(&mut buffer, field, molecule, options)?;
    write_buffer(path, &buffer)?;
    info!("Wrote {} values to '{}'.", field.len(), path.display());
    Ok(())
}

pub(super) fn write_buffer(path: &Path, buffer: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|err| match err.kind() {
            ErrorKind::AlreadyExists => Error::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => Error::Io(err),
        })?;
    file.write_all(buffer)?;
    Ok(())
}
