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

//! Debug overlay of the raw feature points found by the tracker.

use super::{ModuleBase, ModuleState, RenderModule, SharedBindings};
use crate::asset_loading::LoadCompletion;
use crate::draw_call::DrawCallGroup;
use crate::pipeline_table::{fragment_function, vertex_function};
use crate::render_pass::{RenderPass, RenderPassKind, RenderPassTemplate};
use augment_core::ar::{FrameInput, GeometricEntity};
use augment_core::asset::ModelProvider;
use augment_core::config::{RendererConfig, ShaderPreference};
use augment_core::diagnostics::{ErrorCategory, ErrorLog};
use augment_core::renderer::{
    BlendMode, BufferIndex, CompareFunction, CullMode, DepthStencilDescriptor,
    DepthStencilStateId, GraphicsDevice, ModuleIdentifier, PrimitiveType, RenderDestination,
    RenderEncoder, RenderPipelineDescriptor, RenderPipelineId, ShaderLibraryId,
    TrackingPointVertex, UniformRingBuffer,
};
use std::borrow::Cow;
use std::sync::Arc;

/// Point sprite size, in pixels.
pub const POINT_SIZE: f32 = 8.0;

const POINT_COLOR: [f32; 4] = [1.0, 0.85, 0.1, 1.0];

/// Draws the first `max_tracking_points` feature points of each frame.
#[derive(Debug)]
pub struct TrackingPointsModule {
    base: ModuleBase,
    capacity: usize,
    points: Option<UniformRingBuffer<TrackingPointVertex>>,
    pipeline: Option<(RenderPipelineId, DepthStencilStateId)>,
    point_count: usize,
}

impl TrackingPointsModule {
    #[allow(missing_docs)]
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            base: ModuleBase::new(ModuleIdentifier::TrackingPoints),
            capacity: config.max_tracking_points,
            points: None,
            pipeline: None,
            point_count: 0,
        }
    }
}

impl RenderModule for TrackingPointsModule {
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
        self.point_count
    }

    fn initialize_buffers(
        &mut self,
        device: Option<Arc<dyn GraphicsDevice>>,
        max_in_flight_frames: usize,
        max_instances: usize,
    ) {
        let Some(device) = self.base.begin_initialize(device, max_in_flight_frames) else {
            return;
        };
        self.capacity = self.capacity.min(max_instances);
        match UniformRingBuffer::new(
            &*device,
            "Tracking Points",
            self.capacity,
            self.base.max_in_flight_frames,
        ) {
            Ok(ring) => self.points = Some(ring),
            Err(e) => self
                .base
                .serious(ErrorCategory::BufferAllocationFailed, format!("tracking points: {e}")),
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
        let Some(library) = library else {
            self.base
                .serious(ErrorCategory::PipelineInitializationFailed, "no shader library");
            return Vec::new();
        };

        let module = self.base.identifier;
        let vertex = vertex_function(module, RenderPassKind::Main, false);
        let fragment = fragment_function(module, RenderPassKind::Main, ShaderPreference::Simple);
        let built = device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(Cow::Borrowed("Tracking Points Pipeline")),
                library,
                vertex_function: Cow::Owned(vertex),
                fragment_function: fragment.map(Cow::Owned),
                vertex_layout: None,
                primitive: PrimitiveType::Point,
                color_format: template.color_format,
                depth_format: Some(template.depth_format),
                sample_count: template.sample_count,
                blend: BlendMode::AlphaBlended,
            })
            .and_then(|pipeline| {
                let depth = device.create_depth_stencil_state(&DepthStencilDescriptor {
                    label: None,
                    depth_compare: CompareFunction::Always,
                    depth_write_enabled: false,
                })?;
                Ok((pipeline, depth))
            });
        match built {
            Ok(pipeline) => {
                self.pipeline = Some(pipeline);
                self.base.mark_ready();
            }
            Err(e) => self
                .base
                .serious(ErrorCategory::PipelineInitializationFailed, e.to_string()),
        }
        Vec::new()
    }

    fn update_buffer_state(&mut self, buffer_index: usize) {
        if let Some(points) = self.points.as_mut() {
            points.update(buffer_index);
        }
    }

    fn update_buffers(&mut self, frame: &FrameInput, _pass: &RenderPass) {
        self.point_count = 0;
        if !self.base.is_ready() {
            return;
        }
        let (Some(device), Some(points)) = (self.base.device.as_ref(), self.points.as_ref()) else {
            return;
        };
        let vertices: Vec<TrackingPointVertex> = frame
            .camera
            .raw_feature_points
            .iter()
            .take(self.capacity)
            .map(|p| TrackingPointVertex {
                position: p.to_array(),
                size: POINT_SIZE,
                color: POINT_COLOR,
            })
            .collect();
        match points.write_slice(&**device, 0, &vertices) {
            Ok(()) => self.point_count = vertices.len(),
            Err(e) => self
                .base
                .recoverable(ErrorCategory::BufferAllocationFailed, format!("tracking points: {e}")),
        }
    }

    fn draw(&self, encoder: &mut dyn RenderEncoder<'_>, pass: &RenderPass, shared: &SharedBindings) {
        if pass.kind() != RenderPassKind::Main || self.point_count == 0 {
            return;
        }
        let (Some((pipeline, depth)), Some(points)) = (self.pipeline, self.points.as_ref()) else {
            return;
        };
        encoder.push_debug_group(self.base.identifier.name());
        encoder.set_pipeline(pipeline);
        encoder.set_depth_stencil_state(depth);
        encoder.set_cull_mode(CullMode::None);
        if let Some(binding) = shared.shared_uniforms {
            encoder.set_vertex_buffer(BufferIndex::SharedUniforms.slot(), binding.buffer, binding.offset);
        }
        let binding = points.binding();
        encoder.set_vertex_buffer(BufferIndex::TrackingPointData.slot(), binding.buffer, binding.offset);
        encoder.draw(PrimitiveType::Point, 0..self.point_count as u32, 0..1);
        encoder.pop_debug_group();
    }
}
