//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Failures raised by GPU-resident resources.
///
/// These are never retried or masked: a buffer that could not be created
/// or read leaves the caller without a consistent picture of the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// Requested allocation exceeds what the backend can bind.
    BufferTooLarge {
        /// Debug label of the buffer being (re)allocated.
        label: String,
        /// Requested size in bytes.
        requested: u64,
        /// Largest size the backend accepts.
        limit: u64,
    },
    /// The backend reported an error while creating a buffer.
    Allocation {
        /// Debug label of the buffer being (re)allocated.
        label: String,
        /// Backend-provided description.
        message: String,
    },
    /// Mapping a staging buffer for readback failed.
    Readback(String),
    /// WGSL composition or validation failed.
    Shader(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooLarge {
                label,
                requested,
                limit,
            } => write!(
                f,
                "buffer '{label}' needs {requested} bytes, backend limit is \
                 {limit}"
            ),
            Self::Allocation { label, message } => {
                write!(f, "failed to allocate buffer '{label}': {message}")
            }
            Self::Readback(msg) => write!(f, "buffer readback failed: {msg}"),
            Self::Shader(msg) => write!(f, "shader error: {msg}"),
        }
    }
}

impl std::error::Error for GpuError {}

/// Errors produced by the cubefield crate.
#[derive(Debug)]
pub enum CubefieldError {
    /// A GPU-resident resource could not be created, resized or read.
    Gpu(GpuError),
    /// GPU context initialization failure.
    Context(RenderContextError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// A record file could not be parsed.
    RecordParse(String),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for CubefieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Context(e) => write!(f, "GPU context error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::RecordParse(msg) => write!(f, "record parse error: {msg}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for CubefieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Context(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GpuError> for CubefieldError {
    fn from(e: GpuError) -> Self {
        Self::Gpu(e)
    }
}

impl From<RenderContextError> for CubefieldError {
    fn from(e: RenderContextError) -> Self {
        Self::Context(e)
    }
}

impl From<std::io::Error> for CubefieldError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_errors_convert_and_keep_source() {
        let err: CubefieldError = GpuError::BufferTooLarge {
            label: "Instance Buffer".into(),
            requested: 512,
            limit: 256,
        }
        .into();
        assert!(err.to_string().contains("Instance Buffer"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
