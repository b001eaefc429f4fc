use crate::host::traits::RenderStatus;

/// Convenience result type used across the bridge.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Error taxonomy surfaced by clip bridges and the export path.
///
/// Missing scanlines are not errors: they are absorbed by the fetch and only reported through
/// `tracing` and [`crate::ClipStats`].
#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    /// Malformed request data (non-finite or inverted regions, bad options).
    #[error("validation error: {0}")]
    Validation(String),

    /// The effect or node a clip belongs to has been torn down.
    #[error("clip '{0}' outlived its effect or node")]
    Detached(String),

    /// A non-optional input clip has no upstream node.
    #[error("unconnected clip: {0}")]
    Unconnected(String),

    /// An upstream render action reported a non-success status.
    #[error("upstream render failed for clip '{clip}': {status:?}")]
    RenderFailed {
        /// Name of the clip whose upstream render failed.
        clip: String,
        /// Status reported by the render action.
        status: RenderStatus,
    },

    /// The plugin graph upstream of a fetch loops back onto itself.
    #[error("clip graph cycle: {0}")]
    Cycle(String),

    /// The upstream chain is deeper than the configured limit.
    #[error("upstream depth limit of {0} exceeded")]
    DepthExceeded(usize),

    /// Write access requested on a read-only image handle.
    #[error("image {0} is read-only for this holder")]
    ReadOnly(u64),

    /// A request outside the supported format/channel set.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BridgeError {
    /// Build a [`BridgeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BridgeError::Unconnected`] value.
    pub fn unconnected(clip: impl Into<String>) -> Self {
        Self::Unconnected(clip.into())
    }

    /// Build a [`BridgeError::Unsupported`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Return `true` for errors that abort a request because an upstream producer failed.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            Self::RenderFailed { .. } | Self::Cycle(_) | Self::DepthExceeded(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
