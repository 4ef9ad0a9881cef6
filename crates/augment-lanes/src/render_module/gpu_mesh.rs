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

//! Uploading models and compiling their pipelines.

use crate::animation::{validate_skeleton, validate_skin};
use crate::draw_call::{DrawCall, DrawData, SubmeshGpuData};
use crate::pipeline_table::{fragment_function, vertex_function};
use crate::render_pass::RenderPassTemplate;
use augment_core::asset::MeshAsset;
use augment_core::config::ShaderPreference;
use augment_core::renderer::{
    BlendMode, BufferDescriptor, BufferUsage, CompareFunction, DepthStencilDescriptor,
    DepthStencilStateId, GraphicsDevice, ModuleIdentifier, RenderPipelineDescriptor,
    RenderPipelineId, ResourceError, ShaderLibraryId, StorageMode, VertexLayoutDescriptor,
};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

fn static_buffer<'a>(label: String, size: u64, usage: BufferUsage) -> BufferDescriptor<'a> {
    BufferDescriptor {
        label: Some(Cow::Owned(label)),
        size,
        usage,
        storage_mode: StorageMode::Private,
    }
}

/// Uploads every node of `asset`.
///
/// Skin data that fails validation is dropped with a logged warning and the
/// node is drawn rigid. The returned warnings are for the caller to record.
///
/// # Errors
///
/// Returns the first device error.
pub(crate) fn upload_mesh(
    device: &dyn GraphicsDevice,
    asset: &MeshAsset,
) -> Result<(Vec<Arc<DrawData>>, Vec<String>), ResourceError> {
    let mut draws = Vec::with_capacity(asset.nodes.len());
    let mut warnings = Vec::new();

    for node in &asset.nodes {
        let vertex_buffer = device.create_buffer_with_data(
            &static_buffer(
                format!("{} vertices", node.name),
                node.vertex_data.len() as u64,
                BufferUsage::VERTEX,
            ),
            &node.vertex_data,
        )?;

        let mut submeshes = Vec::with_capacity(node.submeshes.len());
        for submesh in &node.submeshes {
            let index_bytes = submesh.indices.as_bytes();
            let index_buffer = device.create_buffer_with_data(
                &static_buffer(
                    format!("{} indices", submesh.name),
                    index_bytes.len() as u64,
                    BufferUsage::INDEX,
                ),
                index_bytes,
            )?;
            let material_buffer = device.create_buffer_with_data(
                &static_buffer(
                    format!("{} material", submesh.name),
                    std::mem::size_of_val(&submesh.material.uniforms) as u64,
                    BufferUsage::UNIFORM,
                ),
                bytemuck::bytes_of(&submesh.material.uniforms),
            )?;
            submeshes.push(SubmeshGpuData {
                index_buffer,
                index_count: submesh.indices.len() as u32,
                index_format: submesh.indices.format(),
                primitive: submesh.primitive,
                material_buffer,
                material: submesh.material.clone(),
            });
        }

        let (mut skin, mut skeleton) = (node.skin.clone(), node.skeleton.clone());
        if let (Some(s), Some(k)) = (&skin, &skeleton) {
            if let Err(e) = validate_skeleton(k).and_then(|_| validate_skin(s, k)) {
                warnings.push(format!("{} skin ignored: {e}", node.name));
                skin = None;
                skeleton = None;
            }
        }

        draws.push(Arc::new(DrawData {
            name: node.name.clone(),
            vertex_buffer,
            vertex_layout: node.vertex_layout.clone(),
            submeshes,
            world_transform: node.world_transform,
            world_transform_animation: node.world_transform_animation.clone(),
            skin,
            skeleton,
        }));
    }

    Ok((draws, warnings))
}

type PipelineKey = (String, Option<String>, VertexLayoutDescriptor);

/// Compiled state objects of one module, reused across groups and passes.
#[derive(Debug, Default)]
pub(crate) struct PipelineCache {
    pipelines: HashMap<PipelineKey, RenderPipelineId>,
    depth_state: Option<DepthStencilStateId>,
}

impl PipelineCache {
    /// The module's depth state, created on first use.
    pub fn depth_state(
        &mut self,
        device: &dyn GraphicsDevice,
        depth_compare: CompareFunction,
        depth_write_enabled: bool,
    ) -> Result<DepthStencilStateId, ResourceError> {
        if let Some(state) = self.depth_state {
            return Ok(state);
        }
        let state = device.create_depth_stencil_state(&DepthStencilDescriptor {
            label: None,
            depth_compare,
            depth_write_enabled,
        })?;
        self.depth_state = Some(state);
        Ok(state)
    }

    /// Compiles, or reuses, the pipeline for `draw_data` in `template`.
    #[allow(clippy::too_many_arguments)]
    pub fn pipeline_for(
        &mut self,
        device: &dyn GraphicsDevice,
        library: ShaderLibraryId,
        module: ModuleIdentifier,
        template: &RenderPassTemplate,
        preference: ShaderPreference,
        draw_data: &DrawData,
        blend: BlendMode,
    ) -> Result<RenderPipelineId, ResourceError> {
        let vertex = vertex_function(module, template.kind, draw_data.is_skinned());
        let fragment = fragment_function(module, template.kind, preference);
        let key = (vertex, fragment, draw_data.vertex_layout.clone());
        if let Some(pipeline) = self.pipelines.get(&key) {
            return Ok(*pipeline);
        }

        let descriptor = RenderPipelineDescriptor {
            label: Some(Cow::Owned(format!("{module} {}", draw_data.name))),
            library,
            vertex_function: Cow::Borrowed(key.0.as_str()),
            fragment_function: key.1.as_deref().map(Cow::Borrowed),
            vertex_layout: Some(key.2.clone()),
            primitive: draw_data
                .submeshes
                .first()
                .map(|s| s.primitive)
                .unwrap_or_default(),
            color_format: template.color_format,
            depth_format: Some(template.depth_format),
            sample_count: template.sample_count,
            blend,
        };
        let pipeline = device.create_render_pipeline(&descriptor)?;
        self.pipelines.insert(key, pipeline);
        Ok(pipeline)
    }

    /// Builds the draw calls of one model for `template`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_calls_for(
        &mut self,
        device: &dyn GraphicsDevice,
        library: ShaderLibraryId,
        module: ModuleIdentifier,
        template: &RenderPassTemplate,
        preference: ShaderPreference,
        draws: &[Arc<DrawData>],
        blend: BlendMode,
    ) -> Result<Vec<DrawCall>, ResourceError> {
        let depth_stencil = self.depth_state(device, CompareFunction::Less, true)?;
        draws
            .iter()
            .map(|draw_data| {
                let pipeline =
                    self.pipeline_for(device, library, module, template, preference, draw_data, blend)?;
                Ok(DrawCall {
                    pipeline,
                    depth_stencil,
                    cull_mode: template.cull_mode,
                    depth_bias: template.depth_bias,
                    draw_data: draw_data.clone(),
                })
            })
            .collect()
    }

    /// Number of distinct pipelines compiled.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }
}
