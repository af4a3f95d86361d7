//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! malformed cube files and grids, field/mesh mismatches, missing charges,
//! unsupported grid geometry, IO, and generic errors.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("grid error: {0}")]
    Grid(String),

    #[error("malformed cube file: {details} (at line {line})")]
    Format { line: usize, details: String },

    #[error("cube title '{title}' is not associated with a known field type")]
    UnknownCubeTitle { title: String },

    #[error("refusing to overwrite existing file '{}'", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("field has {values} values but its mesh has {points} points")]
    LengthMismatch { points: usize, values: usize },

    #[error("cannot combine fields defined on different meshes")]
    MeshMismatch,

    #[error("operation requires a grid aligned with the coordinate system: {0}")]
    NotAligned(String),

    #[error("atom {label} has no charge of type '{charge_type}'")]
    MissingCharge { charge_type: String, label: usize },

    #[error("expected {expected} charges (one per atom), got {actual}")]
    ChargeCount { expected: usize, actual: usize },

    #[error("molecule has no atoms")]
    EmptyMolecule,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn format(line: usize, details: impl Into<String>) -> Self {
        Self::Format {
            line,
            details: details.into(),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
