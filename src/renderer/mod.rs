//! Render submission: one instanced cube draw per frame, plus the
//! compute-shader picker that reads the same instance buffer.

/// Instanced cube pipeline and depth target.
pub mod cube;
/// Compute-shader nearest-hit picking.
pub mod gpu_pick;
/// The fixed unit-cube mesh.
pub mod mesh;
