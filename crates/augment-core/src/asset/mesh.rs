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

use super::skeleton::{AnimatedSkeleton, SkinData, TransformAnimation};
use crate::config::ShaderPreference;
use crate::math::Mat4;
use crate::renderer::{
    IndexFormat, MaterialUniforms, PrimitiveType, TextureId, TextureIndex, VertexLayoutDescriptor,
};
use std::sync::Arc;

/// Index data of a submesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexData {
    /// 16-bit indices.
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl IndexData {
    /// The GPU index format.
    pub fn format(&self) -> IndexFormat {
        match self {
            IndexData::U16(_) => IndexFormat::Uint16,
            IndexData::U32(_) => IndexFormat::Uint32,
        }
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(v) => v.len(),
            IndexData::U32(v) => v.len(),
        }
    }

    /// Returns `true` if there are no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(v) => bytemuck::cast_slice(v),
            IndexData::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Material of a submesh: constant properties plus bound textures.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialDescriptor {
    /// Values written to the material uniform buffer.
    pub uniforms: MaterialUniforms,
    /// Textures bound to the fragment stage.
    pub textures: Vec<(TextureIndex, TextureId)>,
}

/// A range of indices drawn with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmeshData {
    /// Debug name.
    pub name: String,
    #[allow(missing_docs)]
    pub indices: IndexData,
    #[allow(missing_docs)]
    pub primitive: PrimitiveType,
    #[allow(missing_docs)]
    pub material: MaterialDescriptor,
}

/// One drawable node of an imported model.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    /// Debug name.
    pub name: String,
    /// Interleaved vertex data described by `vertex_layout`.
    pub vertex_data: Vec<u8>,
    /// Number of vertices in `vertex_data`.
    pub vertex_count: u32,
    #[allow(missing_docs)]
    pub vertex_layout: VertexLayoutDescriptor,
    /// Submeshes in draw order.
    pub submeshes: Vec<SubmeshData>,
    /// Static transform of the node inside the model.
    pub world_transform: Mat4,
    /// Keyframed replacement for `world_transform`.
    pub world_transform_animation: Option<TransformAnimation>,
    /// Skin binding, present on skinned nodes.
    pub skin: Option<SkinData>,
    /// Skeleton driving the skin.
    pub skeleton: Option<Arc<AnimatedSkeleton>>,
}

impl MeshNode {
    /// Returns `true` if the node is deformed by a skeleton.
    pub fn is_skinned(&self) -> bool {
        self.skin.is_some() && self.skeleton.is_some() && self.vertex_layout.is_skinned()
    }
}

/// An imported model.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAsset {
    /// Debug name.
    pub name: String,
    /// Drawable nodes.
    pub nodes: Vec<MeshNode>,
    /// Overrides the configured fragment function family.
    pub shader_preference: Option<ShaderPreference>,
}

impl MeshAsset {
    /// Total number of submeshes across all nodes.
    pub fn submesh_count(&self) -> usize {
        self.nodes.iter().map(|n| n.submeshes.len()).sum()
    }
}
