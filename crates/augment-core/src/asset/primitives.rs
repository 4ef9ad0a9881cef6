// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Procedural meshes for modules that do not load models.

use super::mesh::{IndexData, MaterialDescriptor, MeshAsset, MeshNode, SubmeshData};
use crate::math::{Mat4, Vec3};
use crate::renderer::{PrimitiveType, VertexAttribute, VertexFormat, VertexLayoutDescriptor};
use std::f32::consts::TAU;

/// Position, texcoord and normal, tightly packed.
pub fn static_vertex_layout() -> VertexLayoutDescriptor {
    VertexLayoutDescriptor::packed(
        0,
        &[
            (VertexAttribute::Position, VertexFormat::Float3),
            (VertexAttribute::Texcoord, VertexFormat::Float2),
            (VertexAttribute::Normal, VertexFormat::Float3),
        ],
    )
}

fn vertex(position: Vec3, u: f32, v: f32, normal: Vec3) -> [f32; 8] {
    [
        position.x, position.y, position.z, u, v, normal.x, normal.y, normal.z,
    ]
}

fn single_node_asset(name: &str, vertices: Vec<[f32; 8]>, indices: Vec<u16>) -> MeshAsset {
    let vertex_count = vertices.len() as u32;
    MeshAsset {
        name: name.to_string(),
        nodes: vec![MeshNode {
            name: name.to_string(),
            vertex_data: bytemuck::cast_slice(&vertices).to_vec(),
            vertex_count,
            vertex_layout: static_vertex_layout(),
            submeshes: vec![SubmeshData {
                name: format!("{name} submesh"),
                indices: IndexData::U16(indices),
                primitive: PrimitiveType::Triangle,
                material: MaterialDescriptor::default(),
            }],
            world_transform: Mat4::IDENTITY,
            world_transform_animation: None,
            skin: None,
            skeleton: None,
        }],
        shader_preference: None,
    }
}

/// A unit square in the XZ plane, facing +Y.
pub fn plane(name: &str) -> MeshAsset {
    let n = Vec3::Y;
    let vertices = vec![
        vertex(Vec3::new(-0.5, 0.0, -0.5), 0.0, 0.0, n),
        vertex(Vec3::new(0.5, 0.0, -0.5), 1.0, 0.0, n),
        vertex(Vec3::new(0.5, 0.0, 0.5), 1.0, 1.0, n),
        vertex(Vec3::new(-0.5, 0.0, 0.5), 0.0, 1.0, n),
    ];
    single_node_asset(name, vertices, vec![0, 2, 1, 0, 3, 2])
}

/// A unit cube centered on the origin.
pub fn cube(name: &str) -> MeshAsset {
    let faces = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for normal in faces {
        let (u_axis, v_axis) = normal.any_orthonormal_pair();
        let base = vertices.len() as u16;
        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let position = normal * 0.5 + u_axis * (u - 0.5) + v_axis * (v - 0.5);
            vertices.push(vertex(position, u, v, normal));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    single_node_asset(name, vertices, indices)
}

/// An open cylinder along Y from `y = -0.5` to `y = 0.5`, radius 1.
pub fn cylinder(name: &str, segments: u16) -> MeshAsset {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(segments as usize * 2 + 2);
    let mut indices = Vec::with_capacity(segments as usize * 6);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let (sin, cos) = (t * TAU).sin_cos();
        let normal = Vec3::new(cos, 0.0, sin);
        vertices.push(vertex(normal - Vec3::Y * 0.5, t, 0.0, normal));
        vertices.push(vertex(normal + Vec3::Y * 0.5, t, 1.0, normal));
    }
    for i in 0..segments {
        let b = i * 2;
        indices.extend_from_slice(&[b, b + 1, b + 2, b + 1, b + 3, b + 2]);
    }
    single_node_asset(name, vertices, indices)
}
