//! Camera state: a world-space pose, the keyboard-driven free-move
//! controller, and the damped orbit rig that owns rotation. The controller
//! only ever translates; pointer drag rotates through the rig, so the two
//! compose without fighting over the same fields.

use glam::{Mat4, Vec3};

use crate::input::MovementIntent;

/// Translation step per frame while a movement key is held. Not scaled by
/// elapsed frame time, so motion speed tracks the display refresh rate.
pub const DEFAULT_MOVE_SPEED: f32 = 0.1;

/// Orbit easing factor applied to drag velocities each frame.
pub const ORBIT_DAMPING: f32 = 0.25;

const ORBIT_ROTATE_SPEED: f32 = 0.005;
const ORBIT_ZOOM_SPEED: f32 = 0.1;
const ORBIT_MIN_DISTANCE: f32 = 2.0;
const ORBIT_MAX_DISTANCE: f32 = 200.0;
const ORBIT_PITCH_LIMIT: f32 = 1.55;

/// World-space camera pose as the controller sees it: a position it may
/// translate plus derived forward/up directions it only reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl CameraPose {
    /// Pose at `position` looking toward `target` with a world-up vector.
    /// Falls back to -Z forward when the two points coincide.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let offset = target - position;
        let forward = if offset.length_squared() > f32::EPSILON {
            offset.normalize()
        } else {
            Vec3::NEG_Z
        };
        Self {
            position,
            forward,
            up: Vec3::Y,
        }
    }
}

/// Perspective lens matching the hosted scene: 75 degree vertical field of
/// view, near 0.1, far 1000.
#[derive(Debug, Clone, Copy)]
pub struct CameraLens {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraLens {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraLens {
    /// Combined view-projection for `pose` at the given aspect ratio.
    /// Returns `None` for a degenerate aspect so callers skip the frame
    /// instead of propagating NaNs.
    pub fn view_projection(&self, pose: &CameraPose, aspect_ratio: f32) -> Option<Mat4> {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return None;
        }
        let view = Mat4::look_to_rh(pose.position, pose.forward, pose.up);
        let projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            aspect_ratio,
            self.near.max(1e-4),
            self.far.max(self.near + 1.0),
        );
        Some(projection * view)
    }
}

/// Per-frame keyboard translation. Reads the held-key flags, builds a
/// normalized direction vector with both-held cancellation, and translates
/// the pose along the camera forward axis and the world-relative right axis.
#[derive(Debug, Clone, Copy)]
pub struct FreeMoveController {
    pub move_speed: f32,
}

impl Default for FreeMoveController {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_MOVE_SPEED,
        }
    }
}

impl FreeMoveController {
    pub fn new(move_speed: f32) -> Self {
        Self { move_speed }
    }

    /// Advance `pose.position` one frame's worth of held-key motion.
    ///
    /// The direction vector uses `z = -1` while the forward key is held, and
    /// the position is translated by `forward * (z * move_speed)` — so the
    /// forward key walks the eye along negative forward. That sign matches
    /// the captured controls and is kept as observed.
    pub fn advance(&self, intent: &MovementIntent, pose: &mut CameraPose) {
        let mut direction = Vec3::ZERO;
        if intent.forward {
            direction.z -= 1.0;
        }
        if intent.backward {
            direction.z += 1.0;
        }
        if intent.left {
            direction.x -= 1.0;
        }
        if intent.right {
            direction.x += 1.0;
        }
        // Opposed keys cancel to the zero vector; skip normalizing it.
        if direction.length_squared() > 0.0 {
            direction = direction.normalize();
        }

        if intent.forward || intent.backward {
            pose.position += pose.forward * (direction.z * self.move_speed);
        }

        if intent.left || intent.right {
            let right = pose.up.cross(pose.forward);
            if right.length_squared() > f32::EPSILON {
                pose.position += right.normalize() * (direction.x * self.move_speed);
            }
        }
    }
}

/// Damped orbit rig: yaw/pitch/distance around a pivot, rotated by pointer
/// drag and zoomed by scroll. Keyboard motion translates the pivot, so the
/// orbit offset survives free movement.
#[derive(Debug, Clone, Copy)]
pub struct OrbitRig {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub damping: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
}

impl OrbitRig {
    pub fn new(target: Vec3, yaw: f32, pitch: f32, distance: f32) -> Self {
        Self {
            target,
            yaw,
            pitch: pitch.clamp(-ORBIT_PITCH_LIMIT, ORBIT_PITCH_LIMIT),
            distance: distance.clamp(ORBIT_MIN_DISTANCE, ORBIT_MAX_DISTANCE),
            damping: ORBIT_DAMPING,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
        }
    }

    /// Rig framing `target` from the given eye point.
    pub fn framing(target: Vec3, eye: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(ORBIT_MIN_DISTANCE);
        let pitch = (offset.y / distance).asin();
        let yaw = offset.x.atan2(offset.z);
        Self::new(target, yaw, pitch, distance)
    }

    /// Feed a pointer-drag delta (pixels) into the orbit velocities.
    pub fn apply_drag(&mut self, dx: f32, dy: f32) {
        self.yaw_velocity += dx * ORBIT_ROTATE_SPEED;
        self.pitch_velocity += dy * ORBIT_ROTATE_SPEED;
    }

    /// Scroll zoom in discrete steps; positive steps move the eye closer.
    pub fn apply_zoom(&mut self, steps: f32) {
        let scaled = self.distance * (1.0 - steps * ORBIT_ZOOM_SPEED);
        self.distance = scaled.clamp(ORBIT_MIN_DISTANCE, ORBIT_MAX_DISTANCE);
    }

    /// Move the pivot, carrying the eye with it.
    pub fn translate(&mut self, delta: Vec3) {
        self.target += delta;
    }

    /// Integrate and damp the drag velocities; call once per frame.
    pub fn update(&mut self) {
        self.yaw += self.yaw_velocity;
        self.pitch = (self.pitch + self.pitch_velocity).clamp(-ORBIT_PITCH_LIMIT, ORBIT_PITCH_LIMIT);
        let keep = 1.0 - self.damping;
        self.yaw_velocity *= keep;
        self.pitch_velocity *= keep;
    }

    pub fn eye(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + offset * self.distance
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose::looking_at(self.eye(), self.target)
    }

    /// Run one frame of keyboard motion against the rig's pose and fold the
    /// resulting translation back into the pivot.
    pub fn apply_free_move(&mut self, mover: &FreeMoveController, intent: &MovementIntent) {
        let mut pose = self.pose();
        let before = pose.position;
        mover.advance(intent, &mut pose);
        self.translate(pose.position - before);
    }
}

#[cfg(test)]
mod free_move_tests {
    use super::*;
    use crate::input::MovementIntent;

    fn pose_at_origin() -> CameraPose {
        CameraPose::looking_at(Vec3::ZERO, Vec3::NEG_Z)
    }

    #[test]
    fn idle_intent_leaves_the_pose_unchanged() {
        let mover = FreeMoveController::default();
        let mut pose = pose_at_origin();
        mover.advance(&MovementIntent::default(), &mut pose);
        assert_eq!(pose.position, Vec3::ZERO);
    }

    #[test]
    fn forward_moves_along_the_forward_axis_by_move_speed() {
        let mover = FreeMoveController::default();
        let mut pose = pose_at_origin();
        let intent = MovementIntent {
            forward: true,
            ..MovementIntent::default()
        };

        mover.advance(&intent, &mut pose);
        let displacement = pose.position;
        // Strictly along forward (here -Z), magnitude move_speed; the sign
        // is the preserved swapped-label behavior.
        assert!((displacement.length() - DEFAULT_MOVE_SPEED).abs() < 1e-6);
        assert!(displacement.cross(pose.forward).length() < 1e-6);

        // Held across frames the displacement stays monotone on that axis.
        mover.advance(&intent, &mut pose);
        assert!((pose.position.length() - 2.0 * DEFAULT_MOVE_SPEED).abs() < 1e-6);
    }

    #[test]
    fn opposed_keys_cancel() {
        let mover = FreeMoveController::default();
        let mut pose = pose_at_origin();
        let intent = MovementIntent {
            forward: true,
            backward: true,
            ..MovementIntent::default()
        };
        mover.advance(&intent, &mut pose);
        assert_eq!(pose.position, Vec3::ZERO);

        let intent = MovementIntent {
            left: true,
            right: true,
            ..MovementIntent::default()
        };
        mover.advance(&intent, &mut pose);
        assert_eq!(pose.position, Vec3::ZERO);
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let mover = FreeMoveController::default();
        let mut pose = pose_at_origin();
        let intent = MovementIntent {
            forward: true,
            left: true,
            ..MovementIntent::default()
        };
        mover.advance(&intent, &mut pose);
        assert!((pose.position.length() - DEFAULT_MOVE_SPEED).abs() < 1e-6);
    }

    #[test]
    fn strafe_uses_the_world_relative_right_axis() {
        let mover = FreeMoveController::default();
        let mut pose = pose_at_origin();
        let intent = MovementIntent {
            right: true,
            ..MovementIntent::default()
        };
        mover.advance(&intent, &mut pose);
        // right = up x forward; with forward -Z and up +Y that is -X, and
        // direction.x = +1 for the right key.
        assert!((pose.position.x + DEFAULT_MOVE_SPEED).abs() < 1e-6);
        assert!(pose.position.y.abs() < 1e-6);
        assert!(pose.position.z.abs() < 1e-6);
    }

    #[test]
    fn degenerate_up_parallel_forward_does_not_produce_nan() {
        let mover = FreeMoveController::default();
        let mut pose = CameraPose {
            position: Vec3::ZERO,
            forward: Vec3::Y,
            up: Vec3::Y,
        };
        let intent = MovementIntent {
            left: true,
            ..MovementIntent::default()
        };
        mover.advance(&intent, &mut pose);
        assert!(pose.position.is_finite());
        assert_eq!(pose.position, Vec3::ZERO);
    }
}

#[cfg(test)]
mod orbit_tests {
    use super::*;
    use crate::input::MovementIntent;

    #[test]
    fn framing_reconstructs_the_eye_point() {
        let rig = OrbitRig::framing(Vec3::ZERO, Vec3::new(0.0, 10.0, 25.0));
        let eye = rig.eye();
        assert!((eye - Vec3::new(0.0, 10.0, 25.0)).length() < 1e-3);
    }

    #[test]
    fn drag_velocities_decay_under_damping() {
        let mut rig = OrbitRig::new(Vec3::ZERO, 0.0, 0.3, 25.0);
        rig.apply_drag(10.0, 0.0);
        rig.update();
        let first = rig.yaw;
        rig.update();
        let second_step = rig.yaw - first;
        assert!(second_step > 0.0);
        assert!(second_step < first);
        for _ in 0..200 {
            rig.update();
        }
        let settled = rig.yaw;
        rig.update();
        assert!((rig.yaw - settled).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_poles() {
        let mut rig = OrbitRig::new(Vec3::ZERO, 0.0, 0.0, 25.0);
        rig.apply_drag(0.0, 1e6);
        rig.update();
        assert!(rig.pitch <= ORBIT_PITCH_LIMIT);
        assert!(rig.pose().position.is_finite());
    }

    #[test]
    fn translate_moves_pivot_and_eye_together() {
        let mut rig = OrbitRig::framing(Vec3::ZERO, Vec3::new(0.0, 10.0, 25.0));
        let offset_before = rig.eye() - rig.target;
        rig.translate(Vec3::new(3.0, 0.0, -2.0));
        let offset_after = rig.eye() - rig.target;
        assert!((offset_before - offset_after).length() < 1e-5);
        assert_eq!(rig.target, Vec3::new(3.0, 0.0, -2.0));
    }

    #[test]
    fn free_move_composes_with_the_rig() {
        let mut rig = OrbitRig::framing(Vec3::ZERO, Vec3::new(0.0, 10.0, 25.0));
        let mover = FreeMoveController::default();
        let intent = MovementIntent {
            forward: true,
            ..MovementIntent::default()
        };
        let eye_before = rig.eye();
        rig.apply_free_move(&mover, &intent);
        let moved = rig.eye() - eye_before;
        assert!((moved.length() - DEFAULT_MOVE_SPEED).abs() < 1e-5);
    }

    #[test]
    fn zoom_respects_distance_clamps() {
        let mut rig = OrbitRig::new(Vec3::ZERO, 0.0, 0.3, 25.0);
        rig.apply_zoom(1e6);
        assert!(rig.distance >= ORBIT_MIN_DISTANCE);
        rig.apply_zoom(-1e6);
        assert!(rig.distance <= ORBIT_MAX_DISTANCE);
    }
}

#[cfg(test)]
mod lens_tests {
    use super::*;

    #[test]
    fn degenerate_aspect_yields_none() {
        let lens = CameraLens::default();
        let pose = CameraPose::looking_at(Vec3::new(0.0, 10.0, 25.0), Vec3::ZERO);
        assert!(lens.view_projection(&pose, 0.0).is_none());
        assert!(lens.view_projection(&pose, f32::NAN).is_none());
        assert!(lens.view_projection(&pose, 16.0 / 9.0).is_some());
    }
}
