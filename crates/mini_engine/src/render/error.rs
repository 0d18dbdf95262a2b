//! Rendering error types

use std::time::Duration;

use super::geometry::ShapeKind;

/// Errors raised by the rendering layer
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A device resource (buffer, allocator, pipeline) could not be created
    #[error("{call} failed: {reason}")]
    ResourceCreation {
        /// Name of the failing device call
        call: &'static str,
        /// Description reported by the device
        reason: String,
    },

    /// A fence did not reach its target value within the wait bound
    #[error("Device lost: fence {fence} not reached after {timeout:?}")]
    DeviceLost {
        /// Fence value the CPU was waiting for
        fence: u64,
        /// How long the CPU waited
        timeout: Duration,
    },

    /// The GPU queue worker is no longer accepting work
    #[error("Command queue closed")]
    QueueClosed,

    /// A render item names a shape the geometry does not contain
    #[error("Geometry has no submesh for {0:?}")]
    UnknownShape(ShapeKind),

    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

impl From<crate::config::ConfigError> for RenderError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
