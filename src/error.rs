use std::{fmt, io};

use quick_xml::events::attributes::AttrError;
use quick_xml::Error as XmlError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal error conditions for the model engine.
///
/// Data-shaped problems (unrecognized document structure, references that do
/// not resolve) are deliberately *not* represented here. A document being
/// edited is expected to be transiently inconsistent, so those conditions are
/// recorded as [`ParseDiagnostic`](crate::diagnostic::ParseDiagnostic)s or as
/// binding/lifecycle status and parsing continues. `MapdocError` is reserved
/// for broken calling contracts and codec-level failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum MapdocError {
    #[error("Calling contract violated: {0}")]
    Contract(String),
    #[error("Mapdoc codec software error: {0}")]
    Codec(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl From<XmlError> for MapdocError {
    fn from(src: XmlError) -> MapdocError {
        MapdocError::Serialization(format!("XML (de)serialization error: {src}"))
    }
}

impl From<AttrError> for MapdocError {
    fn from(src: AttrError) -> MapdocError {
        MapdocError::Serialization(format!("XML attribute error: {src}"))
    }
}

impl From<io::Error> for MapdocError {
    fn from(x: io::Error) -> Self {
        MapdocError::Serialization(format!("Document buffer IO error: {}", x.kind()))
    }
}

impl From<std::string::FromUtf8Error> for MapdocError {
    fn from(src: std::string::FromUtf8Error) -> MapdocError {
        MapdocError::Serialization(format!("Invalid UTF-8 in document buffer: {src}"))
    }
}

impl From<fmt::Error> for MapdocError {
    fn from(x: fmt::Error) -> Self {
        MapdocError::Codec(format!("{x}"))
    }
}
