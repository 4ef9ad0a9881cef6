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

//! Draw calls and the UUID-keyed groups they are collected in.
//!
//! Both are built once when a module loads its pipelines and are read-only
//! afterwards. Groups are sorted by the string form of their UUID; ring slot
//! offsets are assigned by position in that order.

use augment_core::asset::{AnimatedSkeleton, MaterialDescriptor, SkinData, TransformAnimation};
use augment_core::math::Mat4;
use augment_core::renderer::{
    BufferId, CullMode, DepthBias, DepthStencilStateId, IndexFormat, ModuleIdentifier,
    PrimitiveType, RenderPipelineId, VertexLayoutDescriptor,
};
use std::sync::Arc;
use uuid::Uuid;

/// GPU-resident submesh.
#[derive(Debug, Clone)]
pub struct SubmeshGpuData {
    /// Index buffer holding the submesh indices.
    pub index_buffer: BufferId,
    /// Number of indices.
    pub index_count: u32,
    #[allow(missing_docs)]
    pub index_format: IndexFormat,
    #[allow(missing_docs)]
    pub primitive: PrimitiveType,
    /// Constant buffer with the submesh's `MaterialUniforms`.
    pub material_buffer: BufferId,
    /// Textures and constants of the material.
    pub material: MaterialDescriptor,
}

/// GPU-resident mesh node: the geometry one draw call renders.
#[derive(Debug, Clone)]
pub struct DrawData {
    /// Debug name.
    pub name: String,
    /// Interleaved vertex buffer.
    pub vertex_buffer: BufferId,
    /// Layout of `vertex_buffer`.
    pub vertex_layout: VertexLayoutDescriptor,
    /// Submeshes in draw order.
    pub submeshes: Vec<SubmeshGpuData>,
    /// Static node transform.
    pub world_transform: Mat4,
    /// Keyframed node transform.
    pub world_transform_animation: Option<TransformAnimation>,
    /// Skin binding for skinned nodes.
    pub skin: Option<SkinData>,
    /// Skeleton driving the skin.
    pub skeleton: Option<Arc<AnimatedSkeleton>>,
}

impl DrawData {
    /// Palette entries needed per frame, zero for rigid meshes.
    pub fn palette_size(&self) -> usize {
        match (&self.skin, &self.skeleton) {
            (Some(skin), Some(_)) => skin.joint_count(),
            _ => 0,
        }
    }

    /// Returns `true` if the node is skinned.
    pub fn is_skinned(&self) -> bool {
        self.palette_size() > 0
    }
}

/// One pipeline state bound to one mesh node.
#[derive(Debug, Clone)]
pub struct DrawCall {
    /// Compiled pipeline.
    pub pipeline: RenderPipelineId,
    /// Depth test state.
    pub depth_stencil: DepthStencilStateId,
    #[allow(missing_docs)]
    pub cull_mode: CullMode,
    /// Depth offset, used by shadow draws.
    pub depth_bias: Option<DepthBias>,
    /// The geometry.
    pub draw_data: Arc<DrawData>,
}

impl DrawCall {
    /// Returns `true` if the draw needs a matrix palette.
    pub fn uses_skinning(&self) -> bool {
        self.draw_data.is_skinned()
    }
}

/// Draw calls sharing one model identity.
#[derive(Debug, Clone)]
pub struct DrawCallGroup {
    /// Model identity. Groups compare equal when their UUIDs are equal.
    pub uuid: Uuid,
    /// Draw calls in submesh order.
    pub draw_calls: Vec<DrawCall>,
    /// The module that built and draws the group.
    pub module: ModuleIdentifier,
    /// Whether the group takes part in the shadow pass.
    pub generates_shadows: bool,
}

impl DrawCallGroup {
    /// Creates a group.
    pub fn new(
        uuid: Uuid,
        module: ModuleIdentifier,
        draw_calls: Vec<DrawCall>,
        generates_shadows: bool,
    ) -> Self {
        Self {
            uuid,
            draw_calls,
            module,
            generates_shadows,
        }
    }

    /// Key used for the deterministic group order.
    pub fn sort_key(&self) -> String {
        self.uuid.to_string()
    }

    /// Returns `true` if any draw call in the group is skinned.
    pub fn uses_skinning(&self) -> bool {
        self.draw_calls.iter().any(DrawCall::uses_skinning)
    }
}

impl PartialEq for DrawCallGroup {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for DrawCallGroup {}

/// Sorts groups by the string form of their UUID.
pub fn sort_draw_call_groups(groups: &mut [DrawCallGroup]) {
    groups.sort_by_cached_key(DrawCallGroup::sort_key);
}

#[cfg(test)]
pub(crate) fn fake_draw_calls(count: usize) -> Vec<DrawCall> {
    (0..count)
        .map(|i| DrawCall {
            pipeline: RenderPipelineId(i),
            depth_stencil: DepthStencilStateId(0),
            cull_mode: CullMode::Back,
            depth_bias: None,
            draw_data: Arc::new(DrawData {
                name: format!("node {i}"),
                vertex_buffer: BufferId(i),
                vertex_layout: Default::default(),
                submeshes: Vec::new(),
                world_transform: Mat4::IDENTITY,
                world_transform_animation: None,
                skin: None,
                skeleton: None,
            }),
        })
        .collect()
}
