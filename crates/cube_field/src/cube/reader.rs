//! Parser for the Gaussian cube text format.
use std::io::BufRead;

use glam::DVec3;
use tracing::debug;

use super::CubeFile;
use crate::error::{Error, Result};
use crate::field::{Field, FieldKind};
use crate::mesh::{GridAxis, GridMesh};
use crate::molecule::Molecule;

/// Charge type under which the per-atom charge column of a cube file is stored.
pub const CUBE_CHARGE_TYPE: &str = "cube";

/// Upper bound on buffer space reserved from header counts before any data is seen.
const MAX_PREALLOCATION: usize = 1 << 20;

struct Lines<R> {
    inner: std::io::Lines<R>,
    number: usize,
}

impl<R: BufRead> Lines<R> {
    fn next_line(&mut self, what: &str) -> Result<String> {
        self.number += 1;
        match self.inner.next() {
            Some(line) => Ok(line?),
            None => Err(Error::format(
                self.number,
                format!("unexpected end of file while reading {}", what),
            )),
        }
    }

    fn next_fields(&mut self, what: &str, count: usize) -> Result<Vec<String>> {
        let line = self.next_line(what)?;
        let fields: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
        if fields.len() != count {
            return Err(Error::format(
                self.number,
                format!(
                    "expected {} fields in {}, found {}: '{}'",
                    count,
                    what,
                    fields.len(),
                    line
                ),
            ));
        }
        Ok(fields)
    }
}

fn parse_f64(token: &str, line: usize, what: &str) -> Result<f64> {
    token
        .parse()
        .map_err(|_| Error::format(line, format!("invalid {}: '{}'", what, token)))
}

fn parse_vector(tokens: &[String], line: usize, what: &str) -> Result<DVec3> {
    Ok(DVec3::new(
        parse_f64(&tokens[0], line, what)?,
        parse_f64(&tokens[1], line, what)?,
        parse_f64(&tokens[2], line, what)?,
    ))
}

/// Reads a cube file. The field kind is taken from the title (second) line.
pub fn read<R: BufRead>(reader: R) -> Result<CubeFile> {
    let mut lines = Lines {
        inner: reader.lines(),
        number: 0,
    };

    let comment = lines.next_line("the comment line")?;
    let title = lines.next_line("the title line")?;
    let kind = FieldKind::from_cube_title(&title)?;

    let header = lines.next_fields("the atom count and origin line", 5)?;
    let atom_count: i64 = header[0].parse().map_err(|_| {
        Error::format(
            lines.number,
            format!("invalid atom count: '{}'", header[0]),
        )
    })?;
    if atom_count < 0 {
        return Err(Error::format(
            lines.number,
            "negative atom count (orbital cubes) is not supported",
        ));
    }
    let origin = parse_vector(&header[1..4], lines.number, "origin coordinate")?;
    let nval = parse_f64(&header[4], lines.number, "NVal")?;
    if nval != 1.0 {
        return Err(Error::format(
            lines.number,
            format!("NVal must be 1, found {}", nval),
        ));
    }

    let mut axes = [GridAxis::new(DVec3::ZERO, 0); 3];
    for (index, axis) in axes.iter_mut().enumerate() {
        let fields = lines.next_fields("an axis line", 4)?;
        let count = parse_f64(&fields[0], lines.number, "point count")?;
        let vector = parse_vector(&fields[1..4], lines.number, "axis step")?;
        *axis = GridAxis::from_raw(index, count, vector)?;
    }
    let mesh = GridMesh::new(origin, axes);
    let point_count = mesh.checked_len()?;

    let atom_count = usize::try_from(atom_count).unwrap_or(usize::MAX);
    let mut molecule = Molecule::with_capacity(atom_count.min(MAX_PREALLOCATION));
    for _ in 0..atom_count {
        let fields = lines.next_fields("an atom line", 5)?;
        let atomic_number: u32 = fields[0].parse().map_err(|_| {
            Error::format(
                lines.number,
                format!("invalid atomic number: '{}'", fields[0]),
            )
        })?;
        let charge = parse_f64(&fields[1], lines.number, "atom charge")?;
        let coords = parse_vector(&fields[2..5], lines.number, "atom coordinate")?;
        molecule
            .push(atomic_number, coords)
            .set_charge(CUBE_CHARGE_TYPE, charge);
    }

    let mut values = Vec::with_capacity(point_count.min(MAX_PREALLOCATION));
    loop {
        lines.number += 1;
        let line = match lines.inner.next() {
            Some(line) => line?,
            None => break,
        };
        for token in line.split_whitespace() {
            values.push(parse_f64(token, lines.number, "field value")?);
        }
    }

    if values.len() != point_count {
        return Err(Error::Grid(format!(
            "the number of values in the cube ({}) is not equal to the product of the \
             point counts given in the header: {:?}",
            values.len(),
            mesh.shape()
        )));
    }

    debug!(
        "Read {} cube with {} atoms on a {}.",
        kind,
        molecule.len(),
        mesh
    );

    let field = Field::new(std::sync::Arc::new(mesh), values, Some(kind))?;
    Ok(CubeFile {
        comment,
        title,
        molecule,
        kind,
        field,
    })
}
