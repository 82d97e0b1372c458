// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! GPU-instanced 3D record explorer built on wgpu.
//!
//! Every record of a data set becomes one cube. The cubes are placed by a
//! selectable layout strategy, colored by year on a cold-to-warm ramp,
//! and drawn with a single instanced draw call. A fly camera moves
//! through the field; clicking casts a ray and toggles the nearest hit
//! record in the selection, which is mirrored into a GPU buffer so the
//! shader can highlight it.
//!
//! # Key entry points
//!
//! - [`engine::CubeEngine`] - owns the GPU context, camera, scene and
//!   renderers; executes [`engine::Command`]s
//! - [`scene::Scene`] - records, instance buffer and selection kept
//!   jointly consistent, generic over the [`gpu::buffer::GpuBuffer`] seam
//! - [`layout::compute_layout`] - the four placement strategies
//! - [`camera::core::Camera`] - pose, projection and the uniform block
//! - [`options::Options`] - runtime configuration with TOML presets
//!
//! # Architecture
//!
//! Everything runs on the render thread. Layout passes rewrite the whole
//! instance buffer; selection changes patch single words in place. The
//! scene can run headless over [`gpu::buffer::HostBuffer`], which is how
//! the store and selection are tested without a device.

pub mod camera;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod input;
pub mod layout;
pub mod math;
pub mod options;
pub mod renderer;
pub mod scene;
pub mod util;
#[cfg(feature = "viewer")]
mod viewer;

pub use engine::{Command, CubeEngine};
pub use error::{CubefieldError, GpuError};
pub use input::{InputEvent, InputProcessor, KeyAction, MouseButton};
pub use layout::{LayoutParams, LayoutStrategy};
pub use options::Options;
pub use scene::record::{Record, RecordId};
pub use scene::Scene;
#[cfg(feature = "viewer")]
pub use viewer::{Viewer, ViewerBuilder};
