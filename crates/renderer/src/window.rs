use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::gpu::GpuState;
use crate::orbit::RotationController;
use crate::runtime::{SystemTimeSource, TimeSource};
use crate::types::RendererConfig;

/// Opens the window and drives the event loop until close or Escape.
///
/// Pointer events are filtered down to what the rotation controller cares
/// about: primary-button drags in surface-local coordinates. `MouseInput`
/// carries no position in winit, so the latest `CursorMoved` position is
/// remembered and replayed on press.
pub(crate) fn run(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(&config.window_title)
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut gpu = GpuState::new(window.clone(), config)?;
    let mut controller = RotationController::new();
    let mut cursor: Option<PhysicalPosition<f64>> = None;
    let mut time_source = SystemTimeSource::new();

    window.request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            match event {
                Event::WindowEvent { window_id, event } if window_id == window.id() => {
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            elwt.exit();
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.state == ElementState::Pressed
                                && !event.repeat
                                && event.logical_key == Key::Named(NamedKey::Escape)
                            {
                                elwt.exit();
                            }
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            cursor = Some(position);
                            controller.pointer_moved(position.x, position.y);
                        }
                        WindowEvent::CursorLeft { .. } => {
                            // Leaving the surface mid-drag counts as a release.
                            cursor = None;
                            controller.pointer_released();
                        }
                        WindowEvent::MouseInput {
                            state: button_state,
                            button: MouseButton::Left,
                            ..
                        } => match button_state {
                            ElementState::Pressed => {
                                // A press before any cursor position is known
                                // cannot anchor a drag; ignore it.
                                if let Some(position) = cursor {
                                    controller.pointer_pressed(position.x, position.y);
                                }
                            }
                            ElementState::Released => {
                                controller.pointer_released();
                            }
                        },
                        // Secondary and middle buttons are suppressed here so a
                        // right-button drag never reaches the controller.
                        WindowEvent::MouseInput { .. } => {}
                        WindowEvent::Resized(new_size) => {
                            gpu.resize(new_size);
                        }
                        WindowEvent::ScaleFactorChanged {
                            mut inner_size_writer,
                            ..
                        } => {
                            // Keep the current physical size across DPI changes.
                            let _ = inner_size_writer.request_inner_size(gpu.size());
                        }
                        WindowEvent::RedrawRequested => {
                            match gpu.render(time_source.sample(), &mut controller) {
                                Ok(()) => {}
                                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                    gpu.resize(gpu.size());
                                }
                                Err(wgpu::SurfaceError::OutOfMemory) => {
                                    error!("surface out of memory; exiting");
                                    elwt.exit();
                                }
                                Err(wgpu::SurfaceError::Timeout) => {
                                    warn!("surface timeout; retrying next frame");
                                }
                                Err(other) => {
                                    warn!("surface error: {other:?}; retrying next frame");
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    // Continuous animation: every processed batch of events
                    // schedules the next redraw.
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .context("window event loop error")
}
