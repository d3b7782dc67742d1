use std::path::PathBuf;
use thiserror::Error;

use crate::model::{SpriteId, ThingCategory, ThingId};
use crate::validation::ValidationReport;

/// The main error type for thingkit operations.
#[derive(Debug, Error)]
pub enum ThingkitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated {context}: unexpected end of data at offset {offset}")]
    Truncated { context: &'static str, offset: usize },

    #[error("Invalid {context}: {message}")]
    Format {
        context: &'static str,
        message: String,
    },

    #[error("Unknown flag byte 0x{tag:02X} at offset {offset}")]
    UnknownFlag { tag: u8, offset: usize },

    #[error("Expected a {expected} container but the header declares file type {found}")]
    WrongFileType { expected: &'static str, found: u8 },

    #[error("Unsupported client version {version} (oldest supported is 740)")]
    UnsupportedVersion { version: u16 },

    #[error(
        "Interchange file was written for client {client_version} in the legacy layout; \
         re-export it as a newer version"
    )]
    LegacyInterchange { client_version: u16 },

    #[error("Failed to decompress {context}: {source}")]
    Compression {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No thing with ID {0}")]
    UnknownThing(ThingId),

    #[error("No sprite with ID {0}")]
    UnknownSprite(SpriteId),

    #[error("Cannot remove {id}: only the last {category} ({last}) can be removed")]
    NotLastInCategory {
        id: ThingId,
        category: ThingCategory,
        last: ThingId,
    },

    #[error("Too many {what}: {count} exceeds the maximum of {max} for this client version")]
    Capacity {
        what: &'static str,
        count: u64,
        max: u64,
    },

    #[error("Failed to write JSON report: {0}")]
    JsonWrite(#[source] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// A rejected single-field edit.
///
/// Unlike the other errors this never aborts a session: the edit is
/// refused and all state is left as it was.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
