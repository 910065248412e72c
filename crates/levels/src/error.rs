//! Error types for the levels crate

use crate::codec::CodecError;
use tilelevel_core::CoreError;

/// Level-specific error types
///
/// Every variant aborts the load; no partial level is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// File I/O error (missing map file, external tileset)
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    /// The map document could not be parsed
    #[error("Invalid document: {0}")]
    Document(String),

    /// A required attribute is absent
    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    /// An attribute or property value could not be interpreted
    #[error("Invalid value '{value}' for '{attribute}' on <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    /// Tile payload could not be decoded
    #[error("Codec error in layer '{layer}': {source}")]
    Codec {
        layer: String,
        #[source]
        source: CodecError,
    },

    /// Flat tile data does not match the declared grid
    #[error("Dimension error: expected {expected} tiles ({width}x{height}), got {actual}")]
    Dimension {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// Declared map size cannot be addressed as a tile buffer
    #[error("Map of {width}x{height} tiles is too large to load")]
    Oversized { width: usize, height: usize },

    /// Nonzero tile id not covered by any tileset
    #[error("Tile id {0} does not belong to any tileset")]
    UnresolvedTile(u32),

    /// Tileset geometry cannot be used to address tiles
    #[error("Invalid tileset '{name}': {reason}")]
    InvalidTileset { name: String, reason: String },

    /// A layer section is neither a tile layer nor an object layer
    #[error("Unrecognized section <{element}> at position {index}")]
    UnrecognizedSection { element: String, index: usize },

    /// The object factory has no creator for this type name
    #[error("Unknown object type: {0}")]
    UnknownType(String),

    /// Texture registry refused an image (strict mode only)
    #[error("Failed to load texture '{id}' from {path}")]
    Texture { id: String, path: String },
}

impl LevelError {
    pub(crate) fn missing(element: &str, attribute: &str) -> Self {
        LevelError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub(crate) fn invalid(element: &str, attribute: &str, value: &str) -> Self {
        LevelError::InvalidAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<LevelError> for CoreError {
    fn from(err: LevelError) -> Self {
        match err {
            LevelError::FileError(e) => CoreError::Io(e),
            other => CoreError::Level(other.to_string()),
        }
    }
}

/// Result type for level operations
pub type Result<T> = std::result::Result<T, LevelError>;
