//! Pointer-driven cube rotation.
//!
//! [`RotationController`] turns raw pointer events into a pair of Euler
//! angles with momentum. While a drag is active the angles follow the
//! pointer directly; after release the last velocity keeps spinning the
//! cube and decays a little every frame tick.

/// Scale factor applied to pointer deltas on both axes.
pub const POINTER_SENSITIVITY: f32 = 0.01;

/// Per-tick multiplier applied to angular velocity while no drag is active.
pub const FRICTION: f32 = 0.95;

/// Orientation of the cube plus its angular momentum.
///
/// Angles are radians and accumulate without wrapping or clamping; the
/// projection math is periodic so unbounded growth is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationState {
    /// Rotation around the X axis, driven by vertical pointer motion.
    pub pitch: f32,
    /// Rotation around the Y axis, driven by horizontal pointer motion.
    pub yaw: f32,
    /// Pitch change applied per tick while coasting.
    pub pitch_velocity: f32,
    /// Yaw change applied per tick while coasting.
    pub yaw_velocity: f32,
}

/// Drag state machine owning the [`OrientationState`].
///
/// The embedding layer feeds it pointer events (surface-local pixel
/// coordinates, primary button only) and the frame loop calls
/// [`advance_frame`](Self::advance_frame) once per tick. Everything runs on
/// the event-loop thread, so no synchronisation is involved.
#[derive(Debug, Default)]
pub struct RotationController {
    orientation: OrientationState,
    dragging: bool,
    last_pointer: Option<(f64, f64)>,
}

impl RotationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current orientation, read by the frame renderer every tick.
    pub fn orientation(&self) -> &OrientationState {
        &self.orientation
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Primary button went down: anchor the drag at the given position.
    ///
    /// Velocities are left untouched, so a click without motion neither
    /// stops nor alters an ongoing coast.
    pub fn pointer_pressed(&mut self, x: f64, y: f64) {
        self.dragging = true;
        self.last_pointer = Some((x, y));
    }

    /// Pointer moved. Ignored unless a drag is active.
    ///
    /// Each event replaces the angular velocity with the scaled delta from
    /// the previous position and applies it to the angles immediately, so
    /// the cube tracks the pointer without a frame of lag.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if !self.dragging {
            return;
        }
        let Some((last_x, last_y)) = self.last_pointer else {
            self.last_pointer = Some((x, y));
            return;
        };
        let dx = (x - last_x) as f32;
        let dy = (y - last_y) as f32;
        self.orientation.yaw_velocity = dx * POINTER_SENSITIVITY;
        self.orientation.pitch_velocity = dy * POINTER_SENSITIVITY;
        self.orientation.yaw += self.orientation.yaw_velocity;
        self.orientation.pitch += self.orientation.pitch_velocity;
        self.last_pointer = Some((x, y));
    }

    /// Primary button released (or the pointer left the surface).
    ///
    /// The velocity from the last move survives, which is what produces the
    /// flick: the frame ticks take over integration from here.
    pub fn pointer_released(&mut self) {
        self.dragging = false;
    }

    /// One frame tick: integrate and decay the coasting velocity.
    ///
    /// No-op while dragging; pointer events drive the angles then.
    pub fn advance_frame(&mut self) {
        if self.dragging {
            return;
        }
        let orientation = &mut self.orientation;
        orientation.pitch += orientation.pitch_velocity;
        orientation.yaw += orientation.yaw_velocity;
        orientation.pitch_velocity *= FRICTION;
        orientation.yaw_velocity *= FRICTION;
    }
}
