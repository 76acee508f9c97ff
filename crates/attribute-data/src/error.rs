//! Error types for attribute loading.

use map_common::{LayerId, MapError};
use thiserror::Error;

/// Errors that can occur while loading a layer's attribute table.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Transport or service failure from the feature service.
    #[error(transparent)]
    Service(#[from] MapError),

    /// The layer metadata did not declare an object id field.
    #[error("layer {0} has no object id field")]
    MissingIdField(LayerId),

    /// A record in a full page carried no object id.
    #[error("layer {layer}: record without object id '{field}'")]
    MissingObjectId { layer: LayerId, field: String },

    /// The object id could not be used as a paging cursor.
    #[error("layer {layer}: object id '{value}' is not an integer")]
    InvalidObjectId { layer: LayerId, value: String },

    /// The service returned a full page that did not move past the cursor.
    #[error("layer {layer}: paging cursor did not advance past {cursor}")]
    CursorStalled { layer: LayerId, cursor: i64 },
}

/// Result type for attribute loading.
pub type Result<T> = std::result::Result<T, LoadError>;
