//! Error types of the generator core
//!
//! [`DocumentError`] and [`ResolutionError`] abort a generation request.
//! [`ShapeWarning`]s are recovered locally: the offending field, register or
//! enumerant is skipped, the warning is logged and handed back to the caller
//! as a diagnostic.

use std::fmt;

use thiserror::Error;

/// Failure of a generation request
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("failed to format the generated header")]
    Format(#[from] fmt::Error),
}

/// The input is not a usable SVD document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed SVD document")]
    Xml(#[from] roxmltree::Error),
    #[error("`{parent}` has no `{tag}` element")]
    MissingElement { parent: String, tag: &'static str },
    #[error("`{0}` must contain child elements")]
    NotAGroup(String),
}

/// A peripheral reference could not be resolved
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("peripheral {peripheral} is derived from unknown peripheral {parent}")]
    UnknownParent { peripheral: String, parent: String },
    #[error("peripheral {peripheral} has a cyclic `derivedFrom` chain")]
    CyclicDerivation { peripheral: String },
    #[error("no such peripheral in the SVD provided: {0}")]
    UnknownPeripheral(String),
}

/// A record that does not have the expected shape and was skipped
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShapeWarning {
    /// Dotted path of the offending element, e.g. `UART0.CR.EN`
    pub path: String,
    pub kind: ShapeWarningKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ShapeWarningKind {
    /// Field has neither `bitOffset`/`bitWidth`, `lsb`/`msb` nor `bitRange`
    MissingBitRange,
    /// `msb` is below `lsb`
    InvertedBitRange,
    /// `enumeratedValue` is not a plain name/value pair
    MalformedEnumerant,
    /// Peripheral without `baseAddress` or register without `addressOffset`
    MissingAddress,
    /// Numeric element that is not an integer literal
    InvalidNumber(String),
    UnsupportedCluster,
    /// Derived peripheral that declares its own registers
    IgnoredRegisters,
    /// Field bit range intersects the one of the named field
    Overlap(String),
}

impl ShapeWarning {
    pub fn new(path: impl Into<String>, kind: ShapeWarningKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for ShapeWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let path = &self.path;
        match &self.kind {
            ShapeWarningKind::MissingBitRange => write!(f, "{path}: field has no bit range, skipping"),
            ShapeWarningKind::InvertedBitRange => write!(f, "{path}: msb is below lsb, skipping"),
            ShapeWarningKind::MalformedEnumerant => {
                write!(f, "{path}: enumerated value is not a name/value pair, skipping")
            }
            ShapeWarningKind::MissingAddress => write!(f, "{path}: no address given, skipping"),
            ShapeWarningKind::InvalidNumber(text) => {
                write!(f, "{path}: `{text}` is not an integer literal, skipping")
            }
            ShapeWarningKind::UnsupportedCluster => write!(f, "{path}: clusters are not supported, skipping"),
            ShapeWarningKind::IgnoredRegisters => {
                write!(f, "{path}: derived peripheral declares registers, using the parent layout")
            }
            ShapeWarningKind::Overlap(other) => write!(f, "{path}: bit range overlaps field {other}"),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
