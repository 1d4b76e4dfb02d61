//! Click picking: pixel to NDC conversion, ray construction through the
//! camera, intersection tests against every scene collider, and the handler
//! that drives the guide when the interactive cube is hit.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::camera::{CameraLens, CameraPose};
use crate::dialogue::{GuideMode, GuideState};
use crate::input::PointerClick;
use crate::scene::{OrionScene, SceneObjectId};

/// Topic the click handler feeds to `GuideState::answer`. A stand-in until a
/// free-text input source exists; `answer` itself stays topic-general.
pub const CLICK_TOPIC: &str = "crypto";

/// Map pixel coordinates to device-normalized coordinates. Y is flipped
/// because screen-space Y grows downward while NDC Y grows upward; the exact
/// arithmetic is load-bearing for picking and must not be reordered.
pub fn ndc_from_pixels(px: f32, py: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new((px / width) * 2.0 - 1.0, -(py / height) * 2.0 + 1.0)
}

/// A picking ray with a unit direction, so intersection parameters double as
/// world-space distances.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Unproject a click through the camera: near and far NDC points go
    /// through the inverse view-projection and the ray runs between them.
    /// Returns `None` when the viewport or the perspective divide
    /// degenerates.
    pub fn from_screen(
        pose: &CameraPose,
        lens: &CameraLens,
        click: PointerClick,
        width: f32,
        height: f32,
    ) -> Option<Self> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let view_projection = lens.view_projection(pose, width / height)?;
        let inverse = view_projection.inverse();
        let ndc = ndc_from_pixels(click.x, click.y, width, height);

        let near = unproject(&inverse, Vec4::new(ndc.x, ndc.y, -1.0, 1.0))?;
        let far = unproject(&inverse, Vec4::new(ndc.x, ndc.y, 1.0, 1.0))?;
        let span = far - near;
        if span.length_squared() <= f32::EPSILON {
            return None;
        }

        Some(Self {
            origin: pose.position,
            direction: span.normalize(),
        })
    }

    /// Nearest non-negative intersection distance with a sphere.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let near = -b - sqrt_d;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + sqrt_d;
        if far >= 0.0 {
            return Some(far);
        }
        None
    }

    /// Slab test against an axis-aligned box centered at `center`.
    pub fn intersect_cuboid(&self, center: Vec3, half_extents: Vec3) -> Option<f32> {
        let min = center - half_extents;
        let max = center + half_extents;
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];
            if direction.abs() < 1e-8 {
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let mut t0 = (min[axis] - origin) * inv;
            let mut t1 = (max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None;
        }
        Some(if t_min >= 0.0 { t_min } else { t_max })
    }

    /// Intersection with a finite rectangle lying in the XZ plane at the
    /// rectangle center's height.
    pub fn intersect_rect_xz(
        &self,
        center: Vec3,
        half_width: f32,
        half_depth: f32,
    ) -> Option<f32> {
        if self.direction.y.abs() < 1e-8 {
            return None;
        }
        let t = (center.y - self.origin.y) / self.direction.y;
        if t < 0.0 {
            return None;
        }
        let point = self.origin + self.direction * t;
        if (point.x - center.x).abs() <= half_width && (point.z - center.z).abs() <= half_depth {
            Some(t)
        } else {
            None
        }
    }
}

fn unproject(inverse: &Mat4, clip: Vec4) -> Option<Vec3> {
    let world = *inverse * clip;
    if world.w.abs() <= f32::EPSILON {
        return None;
    }
    let point = world.truncate() / world.w;
    if point.is_finite() { Some(point) } else { None }
}

/// Pick shape attached to a scene object.
#[derive(Debug, Clone, Copy)]
pub enum Collider {
    /// Finite rectangle in the XZ plane centered on the object position.
    HorizontalRect { half_width: f32, half_depth: f32 },
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub object: SceneObjectId,
    pub distance: f32,
}

/// Intersect `ray` against every object in the scene and return the hits
/// ordered by distance from the ray origin.
pub fn cast_scene(scene: &OrionScene, ray: &Ray) -> Vec<RayHit> {
    let mut hits: Vec<RayHit> = scene
        .objects()
        .iter()
        .filter_map(|object| {
            let distance = match object.collider {
                Collider::HorizontalRect {
                    half_width,
                    half_depth,
                } => ray.intersect_rect_xz(object.position, half_width, half_depth)?,
                Collider::Cuboid { half_extents } => {
                    ray.intersect_cuboid(object.position, half_extents)?
                }
                Collider::Sphere { radius } => ray.intersect_sphere(object.position, radius)?,
            };
            Some(RayHit {
                object: object.id,
                distance,
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Resolve one pointer click: build the ray, walk the ordered hits, and for
/// every hit on the interactive object engage the guide and answer the
/// canned topic. Returns true when the message surface should refresh;
/// clicks that intersect nothing are silent no-ops.
pub fn handle_click(
    scene: &OrionScene,
    pose: &CameraPose,
    lens: &CameraLens,
    click: PointerClick,
    width: f32,
    height: f32,
    guide: &mut GuideState,
) -> bool {
    let Some(ray) = Ray::from_screen(pose, lens, click, width, height) else {
        return false;
    };

    let hits = cast_scene(scene, &ray);
    let mut refreshed = false;
    for hit in &hits {
        if hit.object == scene.interactive_id() {
            log::debug!(
                "interactive cube picked at distance {:.3} ({} hit(s) total)",
                hit.distance,
                hits.len()
            );
            guide.set_mode(GuideMode::Engaged);
            guide.answer(CLICK_TOPIC);
            refreshed = true;
        }
    }
    refreshed
}

#[cfg(test)]
mod ndc_tests {
    use super::*;

    #[test]
    fn corners_map_to_the_ndc_extremes() {
        let top_left = ndc_from_pixels(0.0, 0.0, 800.0, 600.0);
        assert!((top_left - Vec2::new(-1.0, 1.0)).length() < 1e-6);

        let bottom_right = ndc_from_pixels(800.0, 600.0, 800.0, 600.0);
        assert!((bottom_right - Vec2::new(1.0, -1.0)).length() < 1e-6);

        let center = ndc_from_pixels(400.0, 300.0, 800.0, 600.0);
        assert!(center.length() < 1e-6);
    }

    #[test]
    fn sampled_grid_stays_inside_the_unit_square() {
        let (width, height) = (1280.0, 720.0);
        for ix in 0..=16 {
            for iy in 0..=16 {
                let px = width * (ix as f32 / 16.0);
                let py = height * (iy as f32 / 16.0);
                let ndc = ndc_from_pixels(px, py, width, height);
                assert!((-1.0..=1.0).contains(&ndc.x), "x out of range at {px},{py}");
                assert!((-1.0..=1.0).contains(&ndc.y), "y out of range at {px},{py}");
            }
        }
    }
}

#[cfg(test)]
mod intersection_tests {
    use super::*;

    fn ray(origin: Vec3, direction: Vec3) -> Ray {
        Ray {
            origin,
            direction: direction.normalize(),
        }
    }

    #[test]
    fn sphere_hit_reports_the_near_surface() {
        let r = ray(Vec3::ZERO, Vec3::Z);
        let t = r
            .intersect_sphere(Vec3::new(0.0, 0.0, 5.0), 1.0)
            .expect("hit");
        assert!((t - 4.0).abs() < 1e-5);

        assert!(r.intersect_sphere(Vec3::new(0.0, 5.0, 5.0), 1.0).is_none());
    }

    #[test]
    fn sphere_hit_from_inside_uses_the_exit_point() {
        let r = ray(Vec3::ZERO, Vec3::Z);
        let t = r.intersect_sphere(Vec3::ZERO, 2.0).expect("hit");
        assert!((t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn cuboid_slab_test_reports_entry_distance() {
        let r = ray(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let t = r
            .intersect_cuboid(Vec3::ZERO, Vec3::splat(0.5))
            .expect("hit");
        assert!((t - 9.5).abs() < 1e-5);

        // Parallel to a slab but outside it.
        let grazing = ray(Vec3::new(2.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(grazing.intersect_cuboid(Vec3::ZERO, Vec3::splat(0.5)).is_none());

        // Box entirely behind the origin.
        let behind = ray(Vec3::new(0.0, 0.0, -10.0), Vec3::NEG_Z);
        assert!(behind.intersect_cuboid(Vec3::ZERO, Vec3::splat(0.5)).is_none());
    }

    #[test]
    fn rect_xz_respects_extent_and_direction() {
        let down = ray(Vec3::new(1.0, 5.0, -2.0), Vec3::NEG_Y);
        let t = down.intersect_rect_xz(Vec3::ZERO, 50.0, 50.0).expect("hit");
        assert!((t - 5.0).abs() < 1e-5);

        let outside = ray(Vec3::new(80.0, 5.0, 0.0), Vec3::NEG_Y);
        assert!(outside.intersect_rect_xz(Vec3::ZERO, 50.0, 50.0).is_none());

        let horizontal = ray(Vec3::new(0.0, 5.0, 0.0), Vec3::X);
        assert!(horizontal.intersect_rect_xz(Vec3::ZERO, 50.0, 50.0).is_none());
    }
}

#[cfg(test)]
mod picking_tests {
    use super::*;
    use crate::dialogue::{CRYPTO_RESPONSE, GuideMode, GuideState};
    use crate::scene::{SceneConfig, OrionScene};

    const WIDTH: f32 = 800.0;
    const HEIGHT: f32 = 600.0;

    fn empty_sky_scene() -> OrionScene {
        OrionScene::build(&SceneConfig {
            star_count: 0,
            star_seed: Some(7),
        })
    }

    fn cube_facing_pose() -> CameraPose {
        // Eye level with the cube center, looking straight down -Z at it.
        CameraPose::looking_at(glam::Vec3::new(0.0, 2.0, 10.0), glam::Vec3::new(0.0, 2.0, 0.0))
    }

    #[test]
    fn center_click_engages_the_guide_with_the_crypto_response() {
        let scene = empty_sky_scene();
        let lens = CameraLens::default();
        let pose = cube_facing_pose();
        let mut guide = GuideState::new();

        let refreshed = handle_click(
            &scene,
            &pose,
            &lens,
            PointerClick {
                x: WIDTH / 2.0,
                y: HEIGHT / 2.0,
            },
            WIDTH,
            HEIGHT,
            &mut guide,
        );

        assert!(refreshed);
        assert_eq!(guide.mode(), GuideMode::Engaged);
        assert_eq!(guide.message(), CRYPTO_RESPONSE);
    }

    #[test]
    fn sky_click_changes_nothing() {
        let scene = empty_sky_scene();
        let lens = CameraLens::default();
        // Looking up and away from every object.
        let pose = CameraPose::looking_at(
            glam::Vec3::new(0.0, 60.0, 200.0),
            glam::Vec3::new(0.0, 400.0, 500.0),
        );
        let mut guide = GuideState::new();

        let refreshed = handle_click(
            &scene,
            &pose,
            &lens,
            PointerClick {
                x: WIDTH / 2.0,
                y: HEIGHT / 2.0,
            },
            WIDTH,
            HEIGHT,
            &mut guide,
        );

        assert!(!refreshed);
        assert_eq!(guide.mode(), GuideMode::Idle);
        assert_eq!(guide.message(), "");
    }

    #[test]
    fn hits_come_back_ordered_by_distance() {
        let scene = empty_sky_scene();
        // Horizontal ray at cube height: enters the pyramid bounding box
        // before reaching the cube.
        let ray = Ray {
            origin: glam::Vec3::new(0.0, 2.0, 10.0),
            direction: glam::Vec3::NEG_Z,
        };
        let hits = cast_scene(&scene, &ray);
        assert!(hits.len() >= 2);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        assert!(hits.iter().any(|hit| hit.object == scene.interactive_id()));
    }

    #[test]
    fn click_on_a_non_interactive_object_does_not_engage() {
        let scene = empty_sky_scene();
        let lens = CameraLens::default();
        // Above the ground, looking down at it far from the cube.
        let pose = CameraPose::looking_at(
            glam::Vec3::new(30.0, 20.0, 40.0),
            glam::Vec3::new(30.0, 0.0, 30.0),
        );
        let mut guide = GuideState::new();

        let refreshed = handle_click(
            &scene,
            &pose,
            &lens,
            PointerClick {
                x: WIDTH / 2.0,
                y: HEIGHT / 2.0,
            },
            WIDTH,
            HEIGHT,
            &mut guide,
        );

        // The ground is hit, but only the cube drives the dialogue.
        assert!(!refreshed);
        assert_eq!(guide.mode(), GuideMode::Idle);
    }
}
