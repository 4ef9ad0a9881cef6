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

//! The full-screen quad showing the captured camera image.

use super::{ModuleBase, ModuleState, RenderModule, SharedBindings};
use crate::asset_loading::LoadCompletion;
use crate::draw_call::DrawCallGroup;
use crate::pipeline_table::vertex_function;
use crate::render_pass::{RenderPass, RenderPassKind, RenderPassTemplate};
use augment_core::ar::{CapturedImage, FrameInput, GeometricEntity};
use augment_core::asset::ModelProvider;
use augment_core::diagnostics::{ErrorCategory, ErrorLog};
use augment_core::math::{Mat3, Vec2, Vec3};
use augment_core::renderer::{
    BlendMode, BufferIndex, BufferUsage, CameraPlaneVertex,
    CompareFunction, CullMode, DepthStencilDescriptor, DepthStencilStateId, GraphicsDevice,
    ModuleIdentifier, PrimitiveType, RenderDestination, RenderEncoder, RenderPipelineDescriptor,
    RenderPipelineId, ResourceError, ShaderLibraryId, TextureIndex, UniformRingBuffer,
    VertexAttribute, VertexFormat, VertexLayoutDescriptor,
};
use std::borrow::Cow;
use std::sync::Arc;

/// Fragment function sampling the Y and CbCr planes.
pub const CAPTURED_IMAGE_FRAGMENT: &str = "capturedImageFragmentShader";

/// Clip-space corners of the quad, drawn as a triangle strip.
const QUAD: [([f32; 2], [f32; 2]); 4] = [
    ([-1.0, -1.0], [0.0, 1.0]),
    ([1.0, -1.0], [1.0, 1.0]),
    ([-1.0, 1.0], [0.0, 0.0]),
    ([1.0, 1.0], [1.0, 0.0]),
];

/// Quad vertices with texture coordinates mapped through `display_transform`.
///
/// The display transform maps normalized image coordinates to normalized
/// view coordinates, so its inverse takes each corner of the view back into
/// the image.
pub fn quad_vertices(display_transform: &Mat3) -> [CameraPlaneVertex; 4] {
    let inverse = display_transform.inverse();
    QUAD.map(|(position, texcoord)| {
        let mapped = inverse * Vec3::new(texcoord[0], texcoord[1], 1.0);
        let texcoord = if mapped.z.abs() > f32::EPSILON {
            Vec2::new(mapped.x, mapped.y) / mapped.z
        } else {
            Vec2::new(mapped.x, mapped.y)
        };
        CameraPlaneVertex {
            position,
            texcoord: texcoord.to_array(),
        }
    })
}

#[derive(Debug, Clone, Copy)]
struct PlaneResources {
    pipeline: RenderPipelineId,
    depth_state: DepthStencilStateId,
}

/// Draws the camera feed behind everything else.
///
/// The quad lives in a vertex ring with one copy per frame in flight. A
/// viewport change bumps the quad generation; each slot is rewritten the next
/// time its frame comes around, never while an earlier frame may read it.
#[derive(Debug)]
pub struct CameraPlaneModule {
    base: ModuleBase,
    vertices: Option<UniformRingBuffer<CameraPlaneVertex>>,
    resources: Option<PlaneResources>,
    quad: [CameraPlaneVertex; 4],
    quad_generation: u64,
    slot_generations: Vec<u64>,
    texcoords_valid: bool,
    captured_image: Option<CapturedImage>,
}

impl Default for CameraPlaneModule {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraPlaneModule {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self {
            base: ModuleBase::new(ModuleIdentifier::CameraPlane),
            vertices: None,
            resources: None,
            quad: quad_vertices(&Mat3::IDENTITY),
            quad_generation: 0,
            slot_generations: Vec::new(),
            texcoords_valid: false,
            captured_image: None,
        }
    }

    fn build(
        device: &dyn GraphicsDevice,
        library: ShaderLibraryId,
        template: &RenderPassTemplate,
    ) -> Result<PlaneResources, ResourceError> {
        let layout = VertexLayoutDescriptor::packed(
            BufferIndex::MeshPositions.slot(),
            &[
                (VertexAttribute::Position, VertexFormat::Float2),
                (VertexAttribute::Texcoord, VertexFormat::Float2),
            ],
        );
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(Cow::Borrowed("Captured Image Pipeline")),
            library,
            vertex_function: Cow::Owned(vertex_function(
                ModuleIdentifier::CameraPlane,
                RenderPassKind::Main,
                false,
            )),
            fragment_function: Some(Cow::Borrowed(CAPTURED_IMAGE_FRAGMENT)),
            vertex_layout: Some(layout),
            primitive: PrimitiveType::TriangleStrip,
            color_format: template.color_format,
            depth_format: Some(template.depth_format),
            sample_count: template.sample_count,
            blend: BlendMode::Opaque,
        })?;
        let depth_state = device.create_depth_stencil_state(&DepthStencilDescriptor {
            label: Some(Cow::Borrowed("Captured Image Depth")),
            depth_compare: CompareFunction::Always,
            depth_write_enabled: false,
        })?;
        Ok(PlaneResources {
            pipeline,
            depth_state,
        })
    }
}

impl RenderModule for CameraPlaneModule {
    fn identifier(&self) -> ModuleIdentifier {
        self.base.identifier
    }

    fn state(&self) -> ModuleState {
        self.base.state
    }

    fn errors(&self) -> &ErrorLog {
        &self.base.errors
    }

    fn instance_count(&self) -> usize {
        usize::from(self.resources.is_some() && self.captured_image.is_some())
    }

    fn initialize_buffers(
        &mut self,
        device: Option<Arc<dyn GraphicsDevice>>,
        max_in_flight_frames: usize,
        _max_instances: usize,
    ) {
        let Some(device) = self.base.begin_initialize(device, max_in_flight_frames) else {
            return;
        };
        match UniformRingBuffer::with_usage(
            &*device,
            "Captured Image Vertices",
            self.quad.len(),
            self.base.max_in_flight_frames,
            BufferUsage::VERTEX,
        ) {
            Ok(ring) => {
                self.slot_generations = vec![0; ring.slot_count()];
                self.vertices = Some(ring);
            }
            Err(e) => self
                .base
                .serious(ErrorCategory::BufferAllocationFailed, format!("quad vertices: {e}")),
        }
    }

    fn load_assets(
        &mut self,
        _entities: &[GeometricEntity],
        _provider: &dyn ModelProvider,
        completion: LoadCompletion,
    ) {
        completion();
    }

    fn load_pipeline(
        &mut self,
        _entities: &[GeometricEntity],
        library: Option<ShaderLibraryId>,
        _destination: &RenderDestination,
        template: &RenderPassTemplate,
    ) -> Vec<DrawCallGroup> {
        if self.base.is_disabled() || template.kind != RenderPassKind::Main {
            return Vec::new();
        }
        let Some(device) = self.base.require_device() else {
            return Vec::new();
        };
        if self.vertices.is_none() {
            return Vec::new();
        }
        let Some(library) = library else {
            self.base
                .serious(ErrorCategory::PipelineInitializationFailed, "no shader library");
            return Vec::new();
        };
        match Self::build(&*device, library, template) {
            Ok(resources) => {
                self.resources = Some(resources);
                self.base.mark_ready();
            }
            Err(e) => self
                .base
                .serious(ErrorCategory::PipelineInitializationFailed, e.to_string()),
        }
        Vec::new()
    }

    fn update_buffer_state(&mut self, buffer_index: usize) {
        if let Some(vertices) = self.vertices.as_mut() {
            vertices.update(buffer_index);
        }
    }

    fn update_buffers(&mut self, frame: &FrameInput, _pass: &RenderPass) {
        if !self.base.is_ready() {
            return;
        }
        self.captured_image = frame.camera.captured_image;
        if !self.texcoords_valid || frame.camera.viewport_size_did_change {
            self.quad = quad_vertices(&frame.camera.display_transform);
            self.quad_generation += 1;
            self.texcoords_valid = true;
            log::debug!("Camera plane texture coordinates rebuilt for {}", frame.camera.viewport_size);
        }

        let (Some(device), Some(vertices)) = (self.base.device.clone(), self.vertices.as_ref()) else {
            return;
        };
        let slot = vertices.current_slot_index();
        if self.slot_generations.get(slot) == Some(&self.quad_generation) {
            return;
        }
        match vertices.write_slice(&*device, 0, &self.quad) {
            Ok(()) => {
                if let Some(generation) = self.slot_generations.get_mut(slot) {
                    *generation = self.quad_generation;
                }
            }
            Err(e) => self
                .base
                .recoverable(ErrorCategory::BufferAllocationFailed, format!("quad vertices: {e}")),
        }
    }

    fn draw(&self, encoder: &mut dyn RenderEncoder<'_>, pass: &RenderPass, _shared: &SharedBindings) {
        if pass.kind() != RenderPassKind::Main || !self.base.is_ready() {
            return;
        }
        let (Some(resources), Some(vertices), Some(image)) =
            (self.resources, self.vertices.as_ref(), self.captured_image)
        else {
            return;
        };
        encoder.push_debug_group(self.base.identifier.name());
        encoder.set_pipeline(resources.pipeline);
        encoder.set_depth_stencil_state(resources.depth_state);
        encoder.set_cull_mode(CullMode::None);
        let binding = vertices.binding();
        encoder.set_vertex_buffer(BufferIndex::MeshPositions.slot(), binding.buffer, binding.offset);
        encoder.set_fragment_texture(TextureIndex::Y.slot(), image.luma);
        encoder.set_fragment_texture(TextureIndex::CbCr.slot(), image.chroma);
        encoder.draw(PrimitiveType::TriangleStrip, 0..4, 0..1);
        encoder.pop_debug_group();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_display_keeps_texcoords() {
        let vertices = quad_vertices(&Mat3::IDENTITY);
        for (vertex, (_, texcoord)) in vertices.iter().zip(QUAD) {
            assert_eq!(vertex.texcoord, texcoord);
        }
    }

    #[test]
    fn rotated_display_rotates_texcoords() {
        // Portrait: image u runs along view v.
        let display = Mat3::from_cols(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
        );
        let vertices = quad_vertices(&display);
        let back = display * Vec3::new(vertices[0].texcoord[0], vertices[0].texcoord[1], 1.0);
        assert_relative_eq!(back.x, QUAD[0].1[0], epsilon = 1e-5);
        assert_relative_eq!(back.y, QUAD[0].1[1], epsilon = 1e-5);
    }
}
