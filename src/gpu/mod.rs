//! GPU resource management.
//!
//! Device/surface ownership, the storage buffer seam shared by the
//! instance store and selection, and WGSL composition.

/// Storage buffers behind the [`buffer::GpuBuffer`] seam.
pub mod buffer;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
