//! Procedural primitives for the scene objects. Geometry lives in local
//! space around the origin (unit-ish extents) so instances carry the full
//! world transform, including non-uniform scale for the ground plane.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};
use orion_scene::scene::{
    CONSTELLATION_STAR_RADIUS, GROUND_HALF_EXTENT, ObjectKind, PYRAMID_BASE_RADIUS, PYRAMID_HEIGHT,
    STAR_RADIUS,
};
use orion_scene::OrionScene;

const SPHERE_LAT_DIVS: u32 = 8;
const SPHERE_LON_DIVS: u32 = 12;
/// Four segments turn the cone into the square pyramid.
const PYRAMID_SEGMENTS: u32 = 4;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub struct MeshPrimitive {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl MeshPrimitive {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }
}

#[derive(Clone, Copy)]
pub enum PrimitiveKind {
    Plane,
    Cube,
    Pyramid,
    Sphere,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshUniforms {
    pub view_projection: [[f32; 4]; 4],
}

pub fn primitive(kind: PrimitiveKind) -> MeshPrimitive {
    match kind {
        PrimitiveKind::Plane => build_plane(),
        PrimitiveKind::Cube => build_cube(),
        PrimitiveKind::Pyramid => build_cone(PYRAMID_SEGMENTS),
        PrimitiveKind::Sphere => build_sphere(SPHERE_LAT_DIVS, SPHERE_LON_DIVS),
    }
}

pub fn instance_transform(position: Vec3, scale: Vec3, rotation: Quat) -> [[f32; 4]; 4] {
    to_matrix_columns(Mat4::from_scale_rotation_translation(
        scale, rotation, position,
    ))
}

pub fn view_projection_uniform(matrix: Mat4) -> MeshUniforms {
    MeshUniforms {
        view_projection: to_matrix_columns(matrix),
    }
}

fn to_matrix_columns(matrix: Mat4) -> [[f32; 4]; 4] {
    let data = matrix.to_cols_array();
    [
        [data[0], data[1], data[2], data[3]],
        [data[4], data[5], data[6], data[7]],
        [data[8], data[9], data[10], data[11]],
        [data[12], data[13], data[14], data[15]],
    ]
}

/// Instances for one frame, grouped by primitive so the render pass can draw
/// each geometry with a contiguous instance range. The cube carries the
/// current spin rotation; everything else is static.
pub struct InstanceGroups {
    pub plane: Vec<MeshInstance>,
    pub cube: Vec<MeshInstance>,
    pub sphere: Vec<MeshInstance>,
    pub pyramid: Vec<MeshInstance>,
}

impl InstanceGroups {
    pub fn total(&self) -> usize {
        self.plane.len() + self.cube.len() + self.sphere.len() + self.pyramid.len()
    }
}

pub fn build_instances(scene: &OrionScene, cube_spin: f32) -> InstanceGroups {
    let mut groups = InstanceGroups {
        plane: Vec::new(),
        cube: Vec::new(),
        sphere: Vec::new(),
        pyramid: Vec::new(),
    };

    for object in scene.objects() {
        let instance = match object.kind {
            ObjectKind::Ground => MeshInstance {
                model: instance_transform(
                    object.position,
                    Vec3::new(GROUND_HALF_EXTENT * 2.0, 1.0, GROUND_HALF_EXTENT * 2.0),
                    Quat::IDENTITY,
                ),
                color: object.color,
            },
            ObjectKind::Cube => MeshInstance {
                model: instance_transform(
                    object.position,
                    Vec3::ONE,
                    Quat::from_euler(EulerRot::XYZ, cube_spin, cube_spin, 0.0),
                ),
                color: object.color,
            },
            ObjectKind::Pyramid => MeshInstance {
                model: instance_transform(
                    object.position,
                    Vec3::new(
                        PYRAMID_BASE_RADIUS * 2.0,
                        PYRAMID_HEIGHT,
                        PYRAMID_BASE_RADIUS * 2.0,
                    ),
                    Quat::IDENTITY,
                ),
                color: object.color,
            },
            ObjectKind::Star => MeshInstance {
                model: instance_transform(
                    object.position,
                    Vec3::splat(STAR_RADIUS * 2.0),
                    Quat::IDENTITY,
                ),
                color: object.color,
            },
            ObjectKind::ConstellationStar => MeshInstance {
                model: instance_transform(
                    object.position,
                    Vec3::splat(CONSTELLATION_STAR_RADIUS * 2.0),
                    Quat::IDENTITY,
                ),
                color: object.color,
            },
        };
        match object.kind {
            ObjectKind::Ground => groups.plane.push(instance),
            ObjectKind::Cube => groups.cube.push(instance),
            ObjectKind::Pyramid => groups.pyramid.push(instance),
            ObjectKind::Star | ObjectKind::ConstellationStar => groups.sphere.push(instance),
        }
    }

    groups
}

/// Line-list vertices outlining the pyramid in the same local space as the
/// cone primitive: four slant edges plus the base square.
pub fn pyramid_edges() -> Vec<MeshVertex> {
    let apex = [0.0, 0.5, 0.0];
    let mut corners = Vec::with_capacity(PYRAMID_SEGMENTS as usize);
    for i in 0..PYRAMID_SEGMENTS {
        let angle = (i as f32 / PYRAMID_SEGMENTS as f32) * PI * 2.0;
        corners.push([angle.cos() * 0.5, -0.5, angle.sin() * 0.5]);
    }

    let up = [0.0, 1.0, 0.0];
    let mut vertices = Vec::with_capacity(PYRAMID_SEGMENTS as usize * 4);
    for (i, corner) in corners.iter().enumerate() {
        vertices.push(MeshVertex {
            position: apex,
            normal: up,
        });
        vertices.push(MeshVertex {
            position: *corner,
            normal: up,
        });

        let next = corners[(i + 1) % corners.len()];
        vertices.push(MeshVertex {
            position: *corner,
            normal: up,
        });
        vertices.push(MeshVertex {
            position: next,
            normal: up,
        });
    }
    vertices
}

fn build_plane() -> MeshPrimitive {
    let normal = [0.0, 1.0, 0.0];
    let vertices = vec![
        MeshVertex {
            position: [-0.5, 0.0, -0.5],
            normal,
        },
        MeshVertex {
            position: [0.5, 0.0, -0.5],
            normal,
        },
        MeshVertex {
            position: [0.5, 0.0, 0.5],
            normal,
        },
        MeshVertex {
            position: [-0.5, 0.0, 0.5],
            normal,
        },
    ];
    let indices = vec![0, 2, 1, 0, 3, 2];
    MeshPrimitive::new(vertices, indices)
}

fn build_cube() -> MeshPrimitive {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    // One quad per axis direction, wound counter-clockwise from outside.
    for (axis, sign) in [(0, 1.0f32), (0, -1.0), (1, 1.0), (1, -1.0), (2, 1.0), (2, -1.0)] {
        let mut normal = Vec3::ZERO;
        normal[axis] = sign;
        let tangent_u = Vec3::new(normal.y, normal.z, normal.x);
        let tangent_v = normal.cross(tangent_u);

        let base = vertices.len() as u16;
        for (u, v) in [(-0.5f32, -0.5f32), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let position = normal * 0.5 + tangent_u * u + tangent_v * v;
            vertices.push(MeshVertex {
                position: position.into(),
                normal: normal.into(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshPrimitive::new(vertices, indices)
}

fn build_cone(segments: u32) -> MeshPrimitive {
    let ring = segments.max(3);
    let corners: Vec<Vec3> = (0..ring)
        .map(|i| {
            let (sin, cos) = ((i as f32 / ring as f32) * PI * 2.0).sin_cos();
            Vec3::new(cos * 0.5, -0.5, sin * 0.5)
        })
        .collect();

    let mut vertices = Vec::with_capacity((ring * 2 + 2) as usize);
    let mut indices = Vec::with_capacity((ring * 6) as usize);

    // Slanted side: apex plus the base ring with outward-leaning normals.
    vertices.push(MeshVertex {
        position: [0.0, 0.5, 0.0],
        normal: [0.0, 1.0, 0.0],
    });
    for corner in &corners {
        vertices.push(MeshVertex {
            position: (*corner).into(),
            normal: Vec3::new(corner.x, 0.35, corner.z).normalize().into(),
        });
    }
    for i in 0..ring as u16 {
        indices.extend_from_slice(&[0, 1 + i, 1 + (i + 1) % ring as u16]);
    }

    // Bottom cap fanned from the base center, facing down.
    let center = vertices.len() as u16;
    vertices.push(MeshVertex {
        position: [0.0, -0.5, 0.0],
        normal: [0.0, -1.0, 0.0],
    });
    for corner in &corners {
        vertices.push(MeshVertex {
            position: (*corner).into(),
            normal: [0.0, -1.0, 0.0],
        });
    }
    for i in 0..ring as u16 {
        indices.extend_from_slice(&[center, center + 1 + (i + 1) % ring as u16, center + 1 + i]);
    }

    MeshPrimitive::new(vertices, indices)
}

fn build_sphere(lat_divisions: u32, lon_divisions: u32) -> MeshPrimitive {
    let lat_steps = lat_divisions.max(3);
    let lon_steps = lon_divisions.max(6);
    let mut vertices = Vec::with_capacity(((lat_steps + 1) * (lon_steps + 1)) as usize);
    let mut indices = Vec::with_capacity((lat_steps * lon_steps * 6) as usize);

    for lat in 0..=lat_steps {
        let theta = (lat as f32 / lat_steps as f32) * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for lon in 0..=lon_steps {
            let phi = (lon as f32 / lon_steps as f32) * PI * 2.0;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let direction = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            vertices.push(MeshVertex {
                position: (direction * 0.5).into(),
                normal: direction.normalize_or_zero().into(),
            });
        }
    }

    let ring = (lon_steps + 1) as usize;
    for lat in 0..lat_steps as usize {
        for lon in 0..lon_steps as usize {
            let current = lat * ring + lon;
            let next = current + ring;
            indices.push(current as u16);
            indices.push(next as u16);
            indices.push((current + 1) as u16);

            indices.push((current + 1) as u16);
            indices.push(next as u16);
            indices.push((next + 1) as u16);
        }
    }

    MeshPrimitive::new(vertices, indices)
}

#[cfg(test)]
mod mesh_tests {
    use super::*;
    use orion_scene::SceneConfig;

    #[test]
    fn primitives_index_within_vertex_range() {
        for kind in [
            PrimitiveKind::Plane,
            PrimitiveKind::Cube,
            PrimitiveKind::Pyramid,
            PrimitiveKind::Sphere,
        ] {
            let mesh = primitive(kind);
            assert!(!mesh.indices.is_empty());
            assert_eq!(mesh.indices.len() % 3, 0);
            let max = mesh.indices.iter().copied().max().expect("indices");
            assert!((max as usize) < mesh.vertices.len());
        }
    }

    #[test]
    fn pyramid_edges_form_eight_segments() {
        let edges = pyramid_edges();
        assert_eq!(edges.len(), 16);
    }

    #[test]
    fn instance_groups_cover_every_scene_object() {
        let scene = OrionScene::build(&SceneConfig {
            star_count: 12,
            star_seed: Some(3),
        });
        let groups = build_instances(&scene, 0.0);
        assert_eq!(groups.total(), scene.objects().len());
        assert_eq!(groups.plane.len(), 1);
        assert_eq!(groups.cube.len(), 1);
        assert_eq!(groups.pyramid.len(), 1);
        assert_eq!(groups.sphere.len(), 12 + 7);
    }

    #[test]
    fn cube_spin_only_rotates_the_cube() {
        let scene = OrionScene::build(&SceneConfig {
            star_count: 0,
            star_seed: Some(3),
        });
        let still = build_instances(&scene, 0.0);
        let spun = build_instances(&scene, 0.5);
        assert_ne!(still.cube[0].model, spun.cube[0].model);
        assert_eq!(still.plane[0].model, spun.plane[0].model);
        assert_eq!(still.pyramid[0].model, spun.pyramid[0].model);
    }
}
