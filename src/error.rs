//! Error taxonomy.
//!
//! Only image creation, explicit save and export surface errors to the host.
//! Lookup misses are not errors: callers get `bool`/`Option` back and the
//! miss is logged at debug level.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable machine-readable code for an error, shown by the host next to the
/// human-readable message.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

// =============================================================================
// STORAGE
// =============================================================================

/// Failures of the session key/value store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store could not be reached (no window, storage disabled).
    #[error("session storage unavailable")]
    Unavailable,

    /// The store refused a write (quota exceeded, read-only store).
    #[error("storage rejected write for {key}: {reason}")]
    WriteRejected { key: String, reason: String },

    /// A value could not be serialized before writing.
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable => "E_STORAGE_UNAVAILABLE",
            Self::WriteRejected { .. } => "E_STORAGE_WRITE",
            Self::Encode { .. } => "E_STORAGE_ENCODE",
        }
    }
}

// =============================================================================
// SCENE
// =============================================================================

/// Failures reported by the scene-graph collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The scene has no raster backend to export from.
    #[error("scene export is not supported by this surface")]
    ExportUnsupported,

    /// The backend failed while rasterizing.
    #[error("scene export failed: {0}")]
    ExportFailed(String),
}

impl ErrorCode for SceneError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ExportUnsupported => "E_EXPORT_UNSUPPORTED",
            Self::ExportFailed(_) => "E_EXPORT_FAILED",
        }
    }
}

// =============================================================================
// IMAGE
// =============================================================================

/// Failures of the asynchronous image compression collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ImageError {
    /// The input bytes are not a readable image.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// The compressed output could not be produced.
    #[error("image encode failed: {0}")]
    Encode(String),

    /// The input file could not be read.
    #[error("image source unreadable: {0}")]
    Source(String),
}

impl ErrorCode for ImageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_IMAGE_DECODE",
            Self::Encode(_) => "E_IMAGE_ENCODE",
            Self::Source(_) => "E_IMAGE_SOURCE",
        }
    }
}

// =============================================================================
// WHITEBOARD
// =============================================================================

/// Crate-level error returned by the fallible toolbar operations.
#[derive(Debug, thiserror::Error)]
pub enum WhiteboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

impl ErrorCode for WhiteboardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Scene(e) => e.error_code(),
            Self::Image(e) => e.error_code(),
        }
    }
}
