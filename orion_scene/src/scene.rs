//! Static scene contents: the ground plane, the interactive cube, the
//! semi-transparent pyramid, a procedural starfield, and the fixed Orion
//! constellation markers.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::pick::Collider;

pub const GROUND_HALF_EXTENT: f32 = 50.0;
pub const GROUND_COLOR: [f32; 4] = [0.333, 0.333, 0.333, 1.0];

pub const CUBE_POSITION: Vec3 = Vec3::new(0.0, 2.0, 0.0);
pub const CUBE_HALF_EXTENT: f32 = 0.5;
pub const CUBE_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

pub const PYRAMID_POSITION: Vec3 = Vec3::new(0.0, 3.5, 0.0);
pub const PYRAMID_BASE_RADIUS: f32 = 5.0;
pub const PYRAMID_HEIGHT: f32 = 7.0;
pub const PYRAMID_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 0.5];

pub const STAR_RADIUS: f32 = 0.1;
pub const STAR_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
/// Stars scatter across x and z in `(-0.5..0.5) * STAR_SPAN_XZ`.
pub const STAR_SPAN_XZ: f32 = 200.0;
pub const STAR_MIN_HEIGHT: f32 = 10.0;
pub const STAR_HEIGHT_RANGE: f32 = 100.0;

pub const CONSTELLATION_STAR_RADIUS: f32 = 0.3;
pub const CONSTELLATION_STAR_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

/// The seven named Orion stars, placed at fixed world positions.
pub const ORION_STARS: [(&str, [f32; 3]); 7] = [
    ("Betelgeuse", [-10.0, 50.0, -30.0]),
    ("Rigel", [10.0, 40.0, -40.0]),
    ("Bellatrix", [0.0, 30.0, -50.0]),
    ("Mintaka", [-5.0, 20.0, -60.0]),
    ("Alnilam", [0.0, 20.0, -65.0]),
    ("Alnitak", [5.0, 20.0, -70.0]),
    ("Saiph", [-2.0, 10.0, -80.0]),
];

/// Stable handle for one scene object, assigned in build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneObjectId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Ground,
    Cube,
    Pyramid,
    Star,
    ConstellationStar,
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Ground => "ground",
            ObjectKind::Cube => "cube",
            ObjectKind::Pyramid => "pyramid",
            ObjectKind::Star => "star",
            ObjectKind::ConstellationStar => "constellation-star",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SceneObject {
    pub id: SceneObjectId,
    pub kind: ObjectKind,
    pub name: Option<&'static str>,
    pub position: Vec3,
    pub color: [f32; 4],
    pub collider: Collider,
}

/// Build-time knobs: the starfield size, and an optional seed so runs (and
/// tests) can reproduce the same sky.
#[derive(Debug, Clone, Copy)]
pub struct SceneConfig {
    pub star_count: usize,
    pub star_seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            star_count: 500,
            star_seed: None,
        }
    }
}

pub struct OrionScene {
    objects: Vec<SceneObject>,
    interactive: SceneObjectId,
}

impl OrionScene {
    pub fn build(config: &SceneConfig) -> Self {
        let mut rng = match config.star_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut objects = Vec::with_capacity(config.star_count + ORION_STARS.len() + 3);
        let mut next_id = 0u32;
        let mut push = |objects: &mut Vec<SceneObject>,
                        kind: ObjectKind,
                        name: Option<&'static str>,
                        position: Vec3,
                        color: [f32; 4],
                        collider: Collider| {
            let id = SceneObjectId(next_id);
            next_id += 1;
            objects.push(SceneObject {
                id,
                kind,
                name,
                position,
                color,
                collider,
            });
            id
        };

        push(
            &mut objects,
            ObjectKind::Ground,
            None,
            Vec3::ZERO,
            GROUND_COLOR,
            Collider::HorizontalRect {
                half_width: GROUND_HALF_EXTENT,
                half_depth: GROUND_HALF_EXTENT,
            },
        );

        let interactive = push(
            &mut objects,
            ObjectKind::Cube,
            None,
            CUBE_POSITION,
            CUBE_COLOR,
            Collider::Cuboid {
                half_extents: Vec3::splat(CUBE_HALF_EXTENT),
            },
        );

        // The pyramid picks against its bounding box rather than the cone
        // surface; at this scale the difference is not worth the math.
        push(
            &mut objects,
            ObjectKind::Pyramid,
            None,
            PYRAMID_POSITION,
            PYRAMID_COLOR,
            Collider::Cuboid {
                half_extents: Vec3::new(
                    PYRAMID_BASE_RADIUS,
                    PYRAMID_HEIGHT / 2.0,
                    PYRAMID_BASE_RADIUS,
                ),
            },
        );

        for _ in 0..config.star_count {
            let position = Vec3::new(
                rng.random_range(-0.5..0.5f32) * STAR_SPAN_XZ,
                STAR_MIN_HEIGHT + rng.random_range(0.0..1.0f32) * STAR_HEIGHT_RANGE,
                rng.random_range(-0.5..0.5f32) * STAR_SPAN_XZ,
            );
            push(
                &mut objects,
                ObjectKind::Star,
                None,
                position,
                STAR_COLOR,
                Collider::Sphere {
                    radius: STAR_RADIUS,
                },
            );
        }

        for (name, position) in ORION_STARS {
            push(
                &mut objects,
                ObjectKind::ConstellationStar,
                Some(name),
                Vec3::from_array(position),
                CONSTELLATION_STAR_COLOR,
                Collider::Sphere {
                    radius: CONSTELLATION_STAR_RADIUS,
                },
            );
        }

        log::info!(
            "scene built: {} objects ({} stars, {} constellation markers)",
            objects.len(),
            config.star_count,
            ORION_STARS.len()
        );

        Self {
            objects,
            interactive,
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// The one object whose picks drive the dialogue.
    pub fn interactive_id(&self) -> SceneObjectId {
        self.interactive
    }

    pub fn object(&self, id: SceneObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }
}
