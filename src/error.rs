//! Error types for gridwall.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`WallError`].
pub type Result<T> = std::result::Result<T, WallError>;

/// Errors that can occur while building or writing a wall model.
#[derive(Error, Debug)]
pub enum WallError {
    /// The occupancy grid is empty or not rectangular.
    #[error("invalid grid: {reason}")]
    InvalidGrid {
        /// Why the grid was rejected.
        reason: String,
    },

    /// The placement parameters cannot position the grid.
    #[error("invalid placement: {reason}")]
    InvalidPlacement {
        /// Why the placement was rejected.
        reason: String,
    },

    /// The wall height is not a positive finite number.
    #[error("invalid wall height {height} (must be positive)")]
    InvalidHeight {
        /// The rejected height.
        height: f64,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Map metadata could not be parsed.
    #[error("invalid map metadata: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Map raster could not be decoded.
    #[error("failed to decode map image: {0}")]
    Image(#[from] image::ImageError),

    /// Error loading a map from file.
    #[error("failed to load map from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a mesh or model file.
    #[error("failed to save {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported mesh file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// The model directory already exists and overwriting was not requested.
    #[error("directory \"{path}\" already exists, use --force to overwrite")]
    ModelExists {
        /// The existing directory.
        path: PathBuf,
    },

    /// The model directory path is taken by a regular file.
    #[error("cannot create model, \"{path}\" exists as a file")]
    ModelPathIsFile {
        /// The conflicting file.
        path: PathBuf,
    },
}

impl WallError {
    /// Create an invalid grid error.
    pub fn invalid_grid(reason: impl Into<String>) -> Self {
        WallError::InvalidGrid {
            reason: reason.into(),
        }
    }

    /// Create an invalid placement error.
    pub fn invalid_placement(reason: impl Into<String>) -> Self {
        WallError::InvalidPlacement {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        WallError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a save error for `path`.
    pub fn save_error(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        WallError::SaveError {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
