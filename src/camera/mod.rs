//! Camera system for flying through the scene.
//!
//! The pure camera math lives in [`core`]; [`controller`] mirrors the
//! camera's uniform block into a GPU buffer and maps input speeds.

/// Fly-camera controller owning the GPU uniform buffer.
pub mod controller;
/// Core camera struct and GPU uniform block.
pub mod core;
