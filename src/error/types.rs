//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for vendorism operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum VendorError {
    /// Configuration Error - missing or invalid configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Source Error - source tree missing or could not be fetched
    #[error("Source error: {message}")]
    Source { message: String },

    /// Hook Error - a before/after hook command failed
    #[error("Hook error: {message}")]
    Hook { message: String },

    /// Dependency Error - dependency resolution failed
    #[error("Dependency error: {message}")]
    Dependency { message: String },

    /// Transform Error - a transform unit could not be loaded or produced an invalid result
    #[error("Transform error: {message}")]
    Transform { message: String },

    /// Filesystem Error - file operation failed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },

    /// Patch Error - a patch could not be created
    #[error("Patch error: {message}")]
    Patch { message: String },
}

impl VendorError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. } => 1,
            Self::Source { .. } => 2,
            Self::Hook { .. } => 3,
            Self::Dependency { .. } => 4,
            Self::Transform { .. } => 5,
            Self::Filesystem { .. } => 6,
            Self::Patch { .. } => 7,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a source error
    #[inline]
    pub fn from_source<S: Into<String>>(message: S) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a hook error
    #[inline]
    pub fn hook<S: Into<String>>(message: S) -> Self {
        Self::Hook {
            message: message.into(),
        }
    }

    /// Create a dependency error
    #[inline]
    pub fn dependency<S: Into<String>>(message: S) -> Self {
        Self::Dependency {
            message: message.into(),
        }
    }

    /// Create a transform error
    #[inline]
    pub fn transform<S: Into<String>>(message: S) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }

    /// Create a patch error
    #[inline]
    pub fn patch<S: Into<String>>(message: S) -> Self {
        Self::Patch {
            message: message.into(),
        }
    }
}
