//! GPU side of the cube viewer.
//!
//! - `context` owns wgpu instance/device/surface wiring and knows how to
//!   reconfigure the surface when the window resizes.
//! - `pipeline` links the compiled GLSL stages into the one render pipeline,
//!   with bind group layouts driven by the reflected shader interface.
//! - `mesh` holds the uploaded cube buffers.
//! - `texture` implements the placeholder-then-replace face texture.
//! - `uniforms` builds the per-frame matrices and tracks the tick delta.
//! - `state` glues everything together behind the `GpuState` API used by
//!   `window`.

mod context;
mod mesh;
mod pipeline;
mod state;
mod texture;
mod uniforms;

pub(crate) use state::GpuState;
