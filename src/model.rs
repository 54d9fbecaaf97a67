use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use gltf::buffer;
use itertools::Itertools;

use crate::{error::LoadError, math::bounds::AABB};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
    /// Linear RGBA base colour shared by every primitive.
    pub color: Vec4,
    pub bounding_box: AABB,
}

pub type Buffers<'a> = &'a [buffer::Data];

const DEFAULT_COLOR: Vec4 = Vec4::new(0.8, 0.8, 0.8, 1.0);

impl Model {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> Result<Model, LoadError> {
        let name = name.into();
        let mesh_error = |reason: String| LoadError::Mesh {
            mesh: name.clone(),
            reason,
        };

        let mut primitives = Vec::new();
        let mut color = None;

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(mesh_error(format!(
                    "unsupported primitive mode: {:?}",
                    primitive.mode()
                )));
            }

            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

            let positions = reader
                .read_positions()
                .ok_or_else(|| mesh_error("primitive has no positions".to_string()))?
                .map(Vec3::from)
                .collect_vec();

            // Missing normals leave the surface lit by the ambient term only
            let normals = match reader.read_normals() {
                Some(normals) => normals.map(Vec3::from).collect_vec(),
                None => vec![Vec3::ZERO; positions.len()],
            };

            if normals.len() != positions.len() {
                return Err(mesh_error(format!(
                    "{} normals for {} positions",
                    normals.len(),
                    positions.len()
                )));
            }

            let vertices = positions
                .into_iter()
                .zip_eq(normals)
                .map(|(position, normal)| Vertex { position, normal })
                .collect_vec();

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect_vec(),
                None => (0..vertices.len() as u32).collect_vec(),
            };

            if let Some(&out_of_range) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(mesh_error(format!(
                    "index {} out of range for {} vertices",
                    out_of_range,
                    vertices.len()
                )));
            }

            if color.is_none() {
                let factor = primitive
                    .material()
                    .pbr_metallic_roughness()
                    .base_color_factor();
                color = Some(Vec4::from_array(factor));
            }

            primitives.push(ModelPrimitive {
                index: primitive.index(),
                vertices,
                indices,
            });
        }

        let bounding_box = AABB::from_points(
            primitives
                .iter()
                .flat_map(|primitive| primitive.vertices.iter().map(|vertex| vertex.position)),
        )
        .ok_or_else(|| mesh_error("mesh without vertices".to_string()))?;

        Ok(Model {
            name,
            primitives,
            color: color.unwrap_or(DEFAULT_COLOR),
            bounding_box,
        })
    }

    /// Axis aligned box centred on the origin, with per-face normals.
    pub fn cuboid(name: impl Into<String>, size: Vec3, color: Vec4) -> Model {
        let half = size * 0.5;
        let faces = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for normal in faces {
            // Two axes spanning the face, ordered so that u x v == normal
            let u = normal.any_orthonormal_vector();
            let v = normal.cross(u);
            let base = vertices.len() as u32;

            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (normal + u * su + v * sv) * half;
                vertices.push(Vertex { position, normal });
            }

            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Model {
            name: name.into(),
            primitives: vec![ModelPrimitive {
                index: 0,
                vertices,
                indices,
            }],
            color,
            bounding_box: AABB::new(-half, half),
        }
    }
}
