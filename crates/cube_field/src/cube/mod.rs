//! Reading and writing Gaussian cube files.
//!
//! A cube file holds two free-text header lines, the grid definition, a list of atoms and
//! one value per grid point. The format has no field-type column: the second header line
//! (the title) is the only hint at what the values mean, see
//! [`FieldKind::from_cube_title`](crate::field::FieldKind::from_cube_title).
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::field::{Field, FieldKind};
use crate::molecule::Molecule;

pub(crate) mod number;
pub mod reader;
pub mod writer;

pub use reader::CUBE_CHARGE_TYPE;
pub use writer::{write, write_path, CubeWriteOptions};

/// Contents of a cube file.
#[derive(Clone, Debug, PartialEq)]
pub struct CubeFile {
    /// First header line, verbatim.
    pub comment: String,
    /// Second header line, verbatim. Identifies the field kind.
    pub title: String,
    /// Atoms in file order. The charge column is stored as charge type [`CUBE_CHARGE_TYPE`].
    pub molecule: Molecule,
    /// Field kind resolved from the title line.
    pub kind: FieldKind,
    /// The volumetric data, tagged with `kind`.
    pub field: Field<f64>,
}

impl CubeFile {
    /// Parses a cube file from a reader.
    pub fn read<R: std::io::BufRead>(reader: R) -> Result<Self> {
        reader::read(reader)
    }

    /// Opens and parses the cube file at `path`.
    pub fn read_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let cube = reader::read(BufReader::new(File::open(path)?))?;
        info!(
            "Loaded '{}': {} atoms, {} values.",
            path.display(),
            cube.molecule.len(),
            cube.field.len()
        );
        Ok(cube)
    }

    /// Options that reproduce this file's header lines.
    pub fn header_options(&self) -> CubeWriteOptions {
        CubeWriteOptions::new()
            .with_comment(self.comment.clone())
            .with_title(self.title.clone())
    }

    /// Writes another field over the same atoms, keeping this file's header lines.
    pub fn write_field<W: std::io::Write>(
        &self,
        writer: W,
        field: &Field<f64>,
        charge_type: Option<&str>,
    ) -> Result<()> {
        let mut options = self.header_options();
        options.charge_type = charge_type.map(str::to_owned);
        write(writer, field, &self.molecule, &options)
    }

    /// Writes this cube back out, with the charge column taken from the file itself.
    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()> {
        self.write_field(writer, &self.field, Some(CUBE_CHARGE_TYPE))
    }

    /// Writes this cube to a new file at `path`.
    pub fn write_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        writer::write_buffer(path, &buffer)?;
        info!("Wrote '{}'.", path.display());
        Ok(())
    }
}
