//! Error types for the slideshow controller, loader and configuration.

use std::path::PathBuf;

/// Result type alias for slideshow operations.
pub type Result<T> = std::result::Result<T, SlideshowError>;

/// Errors surfaced by the slideshow.
///
/// Only [`SlideshowError::ImageLoad`] happens at runtime during a session; it is
/// recorded on the slide and never aborts the session. The remaining variants
/// report API misuse or I/O problems and leave state untouched.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SlideshowError {
    /// An image could not be opened or decoded.
    #[error("failed to load image '{location}': {reason}")]
    ImageLoad { location: String, reason: String },

    /// No gallery is registered under this key.
    #[error("unknown gallery '{0}'")]
    UnknownGallery(String),

    /// The gallery exists but has no slide at this index.
    #[error("gallery '{gallery}' has no slide {index} (length {len})")]
    SlideOutOfRange {
        gallery: String,
        index: usize,
        len: usize,
    },

    /// A slide handle that does not belong to this catalog.
    #[error("unknown slide handle {0:?}")]
    UnknownSlide(crate::catalog::SlideId),

    /// Native fullscreen could not be entered.
    #[error("fullscreen request rejected: {0}")]
    Fullscreen(String),

    /// Reading or writing the configuration file failed.
    #[error("config file '{path}': {reason}")]
    Config { path: PathBuf, reason: String },
}

impl SlideshowError {
    /// Create an image load error.
    pub fn image_load(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImageLoad {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration I/O error.
    pub fn config(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Config {
            path: path.into(),
            reason: source.to_string(),
        }
    }
}
