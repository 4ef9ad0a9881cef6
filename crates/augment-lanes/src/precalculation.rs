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

//! The precalculation compute module.
//!
//! Before any geometry is drawn, the per-instance matrices of every mesh
//! module are written into one output buffer and finalized by a compute
//! kernel. The buffer is split into fixed sections, one per module, each as
//! large as that module's instance cap:
//!
//! ```text
//! | anchors (256) | surfaces (64) | trackers (64) | unanchored (64) | paths (2048) |
//! ```
//!
//! Inside a section entries follow the module's own slot layout, so a vertex
//! shader reads its entry with the same instance index it uses for the
//! instance uniforms. Unused entries hold [`PrecalculatedParameters::empty`].

use crate::draw_call::DrawCallGroup;
use crate::instancing::plan_instances;
use crate::pipeline_table::PRECALCULATION_KERNEL;
use crate::render_module::{path_segments, ModuleBase, ModuleState, DEFAULT_PATH_RADIUS};
use crate::render_pass::RenderPass;
use crate::transform::{compose, compose_at, node_world_transform, ComposedTransform};
use augment_core::ar::{CameraProperties, FrameInput, ShadowProperties};
use augment_core::config::RendererConfig;
use augment_core::diagnostics::{ErrorCategory, ErrorLog};
use augment_core::math::{to_gpu_mat3, to_gpu_mat4};
use augment_core::renderer::{
    BufferBinding, BufferIndex, ComputeEncoder, ComputePipelineDescriptor, ComputePipelineId,
    GraphicsDevice, ModuleIdentifier, PrecalculatedParameters, ShaderLibraryId,
    UniformRingBuffer,
};
use std::borrow::Cow;
use std::sync::Arc;

/// Threads per threadgroup of the kernel.
pub const THREADS_PER_GROUP: u32 = 64;

/// Modules with a section in the output buffer, in section order.
pub const SECTION_ORDER: [ModuleIdentifier; 5] = [
    ModuleIdentifier::Anchors,
    ModuleIdentifier::Surfaces,
    ModuleIdentifier::Trackers,
    ModuleIdentifier::Unanchored,
    ModuleIdentifier::Paths,
];

/// First entry of `module`'s section, `None` for modules without one.
pub fn section_start(module: ModuleIdentifier) -> Option<usize> {
    let mut start = 0;
    for candidate in SECTION_ORDER {
        if candidate == module {
            return Some(start);
        }
        start += candidate.max_instance_count();
    }
    None
}

/// Byte offset of `module`'s section inside a slot of the output buffer.
pub fn section_offset(module: ModuleIdentifier) -> Option<u64> {
    section_start(module).map(|start| start as u64 * UniformRingBuffer::<PrecalculatedParameters>::STRIDE)
}

/// A unit of compute work encoded before the render passes.
///
/// Mirrors the lifecycle of [`RenderModule`](crate::RenderModule) with a
/// generic frame input.
pub trait ComputeModule<I>: Send {
    /// Which module this is.
    fn identifier(&self) -> ModuleIdentifier;

    /// Current lifecycle state.
    fn state(&self) -> ModuleState;

    /// The diagnostics recorded by this module.
    fn errors(&self) -> &ErrorLog;

    /// Allocates the output ring.
    fn initialize_buffers(
        &mut self,
        device: Option<Arc<dyn GraphicsDevice>>,
        max_in_flight_frames: usize,
        max_instances: usize,
    );

    /// Compiles the kernel.
    fn load_pipeline(&mut self, library: Option<ShaderLibraryId>);

    /// Points the ring at the slot of `buffer_index`.
    fn update_buffer_state(&mut self, buffer_index: usize);

    /// Writes this frame's inputs. `pass` supplies the groups of the mesh modules.
    fn prepare(&mut self, input: &I, pass: &RenderPass);

    /// Records the dispatch.
    fn dispatch(&self, encoder: &mut dyn ComputeEncoder<'_>);

    /// The frame has been encoded.
    fn frame_encoding_complete(&mut self) {}

    /// Binding read by the render modules, when the last prepare wrote anything.
    fn output_binding(&self) -> Option<BufferBinding>;
}

/// Computes every mesh module's per-instance matrices in one dispatch.
#[derive(Debug)]
pub struct PrecalculationModule {
    base: ModuleBase,
    render_distance: f32,
    output: Option<UniformRingBuffer<PrecalculatedParameters>>,
    pipeline: Option<ComputePipelineId>,
    entry_count: usize,
}

impl PrecalculationModule {
    #[allow(missing_docs)]
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            base: ModuleBase::new(ModuleIdentifier::Precalculation),
            render_distance: config.render_distance,
            output: None,
            pipeline: None,
            entry_count: 0,
        }
    }

    /// Entries written by the last prepare, gaps included.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }
}

fn parameters(
    composed: &ComposedTransform,
    camera: &CameraProperties,
    shadow: &ShadowProperties,
) -> PrecalculatedParameters {
    let model_view = camera.view_matrix * composed.model;
    let mut entry = PrecalculatedParameters::empty();
    entry.has_geometry = 1;
    entry.use_depth = 1;
    if let Some(heading) = composed.heading {
        entry.has_heading = 1;
        entry.heading_type = heading.heading_type.as_gpu();
        entry.heading_transform = to_gpu_mat4(&heading.transform());
    }
    entry.world_transform = to_gpu_mat4(&composed.world);
    entry.coordinate_space_transform = to_gpu_mat4(&composed.coordinate_space);
    entry.location_transform = to_gpu_mat4(&composed.location);
    entry.projection_matrix = to_gpu_mat4(&camera.projection_matrix);
    entry.model_matrix = to_gpu_mat4(&composed.model);
    entry.normal_matrix = to_gpu_mat3(&composed.normal);
    entry.model_view_matrix = to_gpu_mat4(&model_view);
    entry.model_view_projection_matrix = to_gpu_mat4(&(camera.projection_matrix * model_view));
    entry.shadow_mvp_transform_matrix = to_gpu_mat4(&(shadow.shadow_mvp_matrix * composed.model));
    entry.directional_light_mvp = to_gpu_mat4(&(shadow.directional_light_mvp * composed.model));
    entry
}

/// Fills `entries` from `start` with one module's slots.
fn fill_section(
    module: ModuleIdentifier,
    start: usize,
    groups: &[&DrawCallGroup],
    frame: &FrameInput,
    render_distance: f32,
    entries: &mut Vec<PrecalculatedParameters>,
) {
    let camera = &frame.camera;
    let seconds = camera.elapsed_seconds();
    let cap = module.max_instance_count();
    let mut put = |slot: usize, entry: PrecalculatedParameters| {
        let index = start + slot;
        if entries.len() <= index {
            entries.resize(index + 1, PrecalculatedParameters::empty());
        }
        entries[index] = entry;
    };

    if module == ModuleIdentifier::Paths {
        let Some(group) = groups.first() else {
            return;
        };
        let draw_calls = group.draw_calls.len().max(1);
        let segments = path_segments(&frame.entities, camera, render_distance, DEFAULT_PATH_RADIUS, cap / draw_calls);
        for (index, draw_call) in group.draw_calls.iter().enumerate() {
            let world = node_world_transform(&draw_call.draw_data, seconds);
            for (i, segment) in segments.iter().enumerate() {
                let composed = compose_at(segment.transform, world, None);
                put(index * segments.len() + i, parameters(&composed, camera, &frame.shadow));
            }
        }
        return;
    }

    let plan = plan_instances(module, groups, &frame.entities, camera, render_distance, cap);
    for planned in &plan.groups {
        let Some(group) = groups.iter().find(|g| g.uuid == planned.uuid) else {
            continue;
        };
        for (index, draw_call) in group.draw_calls.iter().enumerate() {
            let world = node_world_transform(&draw_call.draw_data, seconds);
            for (i, entity) in planned.entities.iter().enumerate() {
                let composed = compose(entity, world, camera);
                put(planned.slot(index, i), parameters(&composed, camera, &frame.shadow));
            }
        }
    }
}

impl ComputeModule<FrameInput> for PrecalculationModule {
    fn identifier(&self) -> ModuleIdentifier {
        self.base.identifier
    }

    fn state(&self) -> ModuleState {
        self.base.state
    }

    fn errors(&self) -> &ErrorLog {
        &self.base.errors
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
        let capacity = max_instances.max(self.base.identifier.max_instance_count());
        match UniformRingBuffer::new(
            &*device,
            "Precalculated Parameters",
            capacity,
            self.base.max_in_flight_frames,
        ) {
            Ok(ring) => self.output = Some(ring),
            Err(e) => self
                .base
                .serious(ErrorCategory::BufferAllocationFailed, format!("output buffer: {e}")),
        }
    }

    fn load_pipeline(&mut self, library: Option<ShaderLibraryId>) {
        if self.base.is_disabled() {
            return;
        }
        let Some(device) = self.base.require_device() else {
            return;
        };
        let Some(library) = library else {
            self.base
                .serious(ErrorCategory::PipelineInitializationFailed, "no shader library");
            return;
        };
        let descriptor = ComputePipelineDescriptor {
            label: Some(Cow::Borrowed("Precalculation Pipeline")),
            library,
            function: Cow::Borrowed(PRECALCULATION_KERNEL),
        };
        match device.create_compute_pipeline(&descriptor) {
            Ok(pipeline) => {
                self.pipeline = Some(pipeline);
                self.base.mark_ready();
            }
            Err(e) => self
                .base
                .serious(ErrorCategory::PipelineInitializationFailed, e.to_string()),
        }
    }

    fn update_buffer_state(&mut self, buffer_index: usize) {
        if let Some(output) = self.output.as_mut() {
            output.update(buffer_index);
        }
    }

    fn prepare(&mut self, frame: &FrameInput, pass: &RenderPass) {
        self.entry_count = 0;
        if !self.base.is_ready() {
            return;
        }
        let (Some(device), Some(output)) = (self.base.device.as_ref(), self.output.as_ref()) else {
            return;
        };

        let mut entries = Vec::new();
        for module in SECTION_ORDER {
            let Some(start) = section_start(module) else {
                continue;
            };
            let groups: Vec<&DrawCallGroup> =
                pass.draw_call_groups.iter().filter(|g| g.module == module).collect();
            if groups.is_empty() {
                continue;
            }
            fill_section(module, start, &groups, frame, self.render_distance, &mut entries);
        }

        // The slot may still hold a larger frame; blank everything past the populated extent.
        let populated = entries.len();
        entries.resize(output.capacity(), PrecalculatedParameters::empty());
        match output.write_slice(&**device, 0, &entries) {
            Ok(()) => self.entry_count = populated,
            Err(e) => self
                .base
                .recoverable(ErrorCategory::BufferAllocationFailed, format!("output buffer: {e}")),
        }
        log::trace!("Precalculation prepared {} entries", self.entry_count);
    }

    fn dispatch(&self, encoder: &mut dyn ComputeEncoder<'_>) {
        let (Some(pipeline), Some(output)) = (self.pipeline, self.output.as_ref()) else {
            return;
        };
        if self.entry_count == 0 {
            return;
        }
        let binding = output.binding();
        encoder.set_pipeline(pipeline);
        encoder.set_buffer(BufferIndex::PrecalculationOutputBuffer.slot(), binding.buffer, binding.offset);
        encoder.dispatch_threads(self.entry_count as u32, THREADS_PER_GROUP);
    }

    fn output_binding(&self) -> Option<BufferBinding> {
        if self.entry_count == 0 {
            return None;
        }
        self.output.as_ref().map(UniformRingBuffer::binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_disjoint_and_fill_the_cap() {
        let mut end = 0;
        for module in SECTION_ORDER {
            assert_eq!(section_start(module), Some(end));
            end += module.max_instance_count();
        }
        assert_eq!(end, ModuleIdentifier::Precalculation.max_instance_count());
    }

    #[test]
    fn modules_without_geometry_have_no_section() {
        assert_eq!(section_start(ModuleIdentifier::CameraPlane), None);
        assert_eq!(section_offset(ModuleIdentifier::Anchors), Some(0));
        assert_eq!(
            section_offset(ModuleIdentifier::Surfaces),
            Some(256 * std::mem::size_of::<PrecalculatedParameters>() as u64)
        );
    }
}
