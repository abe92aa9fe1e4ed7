//! Renderer crate for spincube.
//!
//! Draws a single textured, lit cube into a winit window and lets the pointer
//! spin it with flick momentum. The overall flow is:
//!
//! ```text
//!   CLI / spincube
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ GpuState::render(tick)
//!          ▲               │                      │
//!          │               └─▶ RotationController ┘
//!          │                   (pointer events → pitch/yaw + momentum)
//!          └─ texture worker thread ─▶ placeholder swap on first frame ready
//! ```
//!
//! The GLSL stages are embedded in [`compile`] and compiled through naga at
//! start-up; any compile, reflection or link failure aborts initialisation
//! before a single frame is drawn. The face texture starts as a 1x1
//! placeholder and is replaced at most once when the requested image decodes.

mod compile;
mod geometry;
mod gpu;
mod orbit;
mod runtime;
mod types;
mod window;

use anyhow::Result;

pub use compile::{PipelineError, ShaderStageKind};
pub use geometry::{cube_mesh, CubeMesh};
pub use orbit::{OrientationState, RotationController, FRICTION, POINTER_SENSITIVITY};
pub use runtime::{BoxedTimeSource, FixedStepTimeSource, SystemTimeSource, TimeSample, TimeSource};
pub use types::{Antialiasing, RendererConfig, TextureSource};

/// High-level entry point that owns the chosen configuration.
///
/// All the heavy lifting happens inside the window loop and `GpuState`;
/// `Renderer` simply carries the configuration to them.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and runs until it is closed or Escape is pressed.
    ///
    /// Returns an error when initialisation fails: no usable GPU adapter, a
    /// shader that does not compile or link, or a window that cannot be
    /// created. Texture load failures are not errors; the cube keeps its
    /// placeholder face.
    pub fn run(&mut self) -> Result<()> {
        window::run(&self.config)
    }
}
