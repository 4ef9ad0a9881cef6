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

//! Paths drawn as chains of cylinders between consecutive points.

use super::instanced::{encode_draw_call, DrawCallFrame, Rings};
use super::{ModuleBase, ModuleState, PipelineCache, RenderModule, SharedBindings};
use crate::asset_loading::LoadCompletion;
use crate::draw_call::{DrawCallGroup, DrawData};
use crate::effects::evaluate_effects;
use crate::instancing::{environment_uniforms, instance_uniforms};
use crate::render_pass::{RenderPass, RenderPassKind, RenderPassTemplate};
use crate::transform::{compose_at, node_world_transform, within_render_distance};
use augment_core::ar::{CameraProperties, FrameInput, GeometricEntity, PathSegmentAnchor};
use augment_core::asset::{primitives, ModelProvider};
use augment_core::config::{RendererConfig, ShaderPreference};
use augment_core::diagnostics::{ErrorCategory, ErrorLog};
use augment_core::math::{segment_transform, Mat4};
use augment_core::renderer::{
    BlendMode, GraphicsDevice, ModuleIdentifier, RenderDestination, RenderEncoder,
    ShaderLibraryId,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Radius of the cylinder drawn between two path points, in meters.
pub const DEFAULT_PATH_RADIUS: f32 = 0.02;

const CYLINDER_SEGMENTS: u16 = 16;

/// A drawn piece of a path.
#[derive(Debug, Clone, Copy)]
pub struct PathSegment<'a> {
    /// Point the segment starts at; its effects style the segment.
    pub start: &'a PathSegmentAnchor,
    #[allow(missing_docs)]
    pub end: &'a PathSegmentAnchor,
    /// Maps the unit cylinder onto the segment.
    pub transform: Mat4,
}

/// Builds the visible segments of every path in `entities`.
///
/// Paths keep the order in which their first point appears; points are
/// ordered by sequence number. A segment is kept only when both its ends are
/// inside the render distance, and at most `max_segments` are returned.
pub fn path_segments<'a>(
    entities: &'a [GeometricEntity],
    camera: &CameraProperties,
    render_distance: f32,
    radius: f32,
    max_segments: usize,
) -> Vec<PathSegment<'a>> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut paths: HashMap<Uuid, Vec<&'a PathSegmentAnchor>> = HashMap::new();
    for entity in entities {
        if let GeometricEntity::PathSegment(point) = entity {
            let points = paths.entry(point.path_identifier).or_insert_with(|| {
                order.push(point.path_identifier);
                Vec::new()
            });
            points.push(point);
        }
    }

    let mut segments = Vec::new();
    for path in order {
        let Some(mut points) = paths.remove(&path) else {
            continue;
        };
        points.sort_by_key(|p| p.sequence);
        for pair in points.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let (from, to) = (start.state.position(), end.state.position());
            if !within_render_distance(from, camera, render_distance)
                || !within_render_distance(to, camera, render_distance)
            {
                continue;
            }
            if segments.len() == max_segments {
                return segments;
            }
            segments.push(PathSegment {
                start,
                end,
                transform: segment_transform(from, to, radius),
            });
        }
    }
    segments
}

/// Renders path points as connected cylinders.
///
/// The cylinder is generated procedurally, so the module never asks the
/// model provider for anything.
pub struct PathsModule {
    base: ModuleBase,
    render_distance: f32,
    shader_preference: ShaderPreference,
    radius: f32,
    max_instances: usize,
    cylinder: Vec<Arc<DrawData>>,
    pipelines: PipelineCache,
    rings: Option<Rings>,
    frame_state: Vec<DrawCallFrame>,
    instance_count: usize,
}

impl std::fmt::Debug for PathsModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathsModule")
            .field("state", &self.base.state)
            .field("radius", &self.radius)
            .field("instance_count", &self.instance_count)
            .finish()
    }
}

impl PathsModule {
    #[allow(missing_docs)]
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            base: ModuleBase::new(ModuleIdentifier::Paths),
            render_distance: config.render_distance,
            shader_preference: config.shader_preference,
            radius: DEFAULT_PATH_RADIUS,
            max_instances: ModuleIdentifier::Paths.max_instance_count(),
            cylinder: Vec::new(),
            pipelines: PipelineCache::default(),
            rings: None,
            frame_state: Vec::new(),
            instance_count: 0,
        }
    }

    /// Overrides the cylinder radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Segments drawn per frame, given the cylinder's draw call count.
    fn max_segments(&self) -> usize {
        self.max_instances / self.cylinder.len().max(1)
    }
}

impl RenderModule for PathsModule {
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
        self.instance_count
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
        self.max_instances = max_instances;
        match Rings::new(&*device, max_instances, 0, self.base.max_in_flight_frames) {
            Ok(rings) => self.rings = Some(rings),
            Err(e) => self
                .base
                .serious(ErrorCategory::BufferAllocationFailed, format!("uniform rings: {e}")),
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
        entities: &[GeometricEntity],
        library: Option<ShaderLibraryId>,
        _destination: &RenderDestination,
        template: &RenderPassTemplate,
    ) -> Vec<DrawCallGroup> {
        if self.base.is_disabled() {
            return Vec::new();
        }
        let Some(device) = self.base.require_device() else {
            return Vec::new();
        };
        let main = template.kind == RenderPassKind::Main;
        let Some(library) = library else {
            if main {
                self.base
                    .serious(ErrorCategory::PipelineInitializationFailed, "no shader library");
            }
            return Vec::new();
        };

        if self.cylinder.is_empty() {
            match super::upload_mesh(&*device, &primitives::cylinder("Path Cylinder", CYLINDER_SEGMENTS)) {
                Ok((draws, _)) => self.cylinder = draws,
                Err(e) => {
                    self.base
                        .serious(ErrorCategory::BufferAllocationFailed, format!("path cylinder: {e}"));
                    return Vec::new();
                }
            }
        }

        let generates_shadows = entities
            .iter()
            .any(|e| matches!(e, GeometricEntity::PathSegment(p) if p.state.generates_shadows));
        if !main && !generates_shadows {
            return Vec::new();
        }

        let module = self.base.identifier;
        match self.pipelines.draw_calls_for(
            &*device,
            library,
            module,
            template,
            self.shader_preference,
            &self.cylinder,
            BlendMode::Opaque,
        ) {
            Ok(draw_calls) => {
                if main {
                    self.base.mark_ready();
                }
                vec![DrawCallGroup::new(module.general_uuid(), module, draw_calls, generates_shadows)]
            }
            Err(e) => {
                let message = format!("{}: {e}", template.label);
                if main {
                    self.base.serious(ErrorCategory::PipelineInitializationFailed, message);
                } else {
                    self.base.warning(ErrorCategory::PipelineInitializationFailed, message);
                }
                Vec::new()
            }
        }
    }

    fn update_buffer_state(&mut self, buffer_index: usize) {
        if let Some(rings) = self.rings.as_mut() {
            rings.update(buffer_index);
        }
    }

    fn update_buffers(&mut self, frame: &FrameInput, _pass: &RenderPass) {
        self.instance_count = 0;
        self.frame_state.clear();
        if !self.base.is_ready() {
            return;
        }
        let (Some(device), Some(rings)) = (self.base.device.clone(), self.rings.as_ref()) else {
            return;
        };

        let camera = &frame.camera;
        let seconds = camera.elapsed_seconds();
        let segments = path_segments(
            &frame.entities,
            camera,
            self.render_distance,
            self.radius,
            self.max_segments(),
        );

        let slots = segments.len() * self.cylinder.len();
        let mut instance_data = Vec::with_capacity(slots);
        let mut effects_data = Vec::with_capacity(slots);
        let mut environment_data = Vec::with_capacity(slots);
        for (index, draw_data) in self.cylinder.iter().enumerate() {
            let world = node_world_transform(draw_data, seconds);
            for segment in &segments {
                instance_data.push(instance_uniforms(&compose_at(segment.transform, world, None)));
                effects_data.push(evaluate_effects(&segment.start.state.effects, seconds));
                environment_data.push(environment_uniforms(&frame.environment, &frame.shadow, None));
            }
            self.frame_state.push(DrawCallFrame {
                base_instance: (index * segments.len()) as u32,
                instance_count: segments.len() as u32,
                palette: None,
                skip: false,
            });
        }

        if let Err(e) = rings.write(&*device, &instance_data, &effects_data, &environment_data) {
            self.base
                .recoverable(ErrorCategory::BufferAllocationFailed, format!("segment uniforms: {e}"));
            self.frame_state.clear();
            return;
        }
        self.instance_count = slots;
        log::trace!("{}: {} segments", self.base.identifier, segments.len());
    }

    fn draw(&self, encoder: &mut dyn RenderEncoder<'_>, pass: &RenderPass, shared: &SharedBindings) {
        if !self.base.is_ready() || self.instance_count == 0 {
            return;
        }
        let Some(rings) = self.rings.as_ref() else {
            return;
        };
        let module = self.base.identifier;
        let mut groups = pass.groups_for(module).peekable();
        if groups.peek().is_none() {
            return;
        }

        encoder.push_debug_group(module.name());
        rings.bind(encoder, module, pass, shared);
        let with_materials = pass.kind() == RenderPassKind::Main;
        for group in groups {
            for (draw_call, frame_draw) in group.draw_calls.iter().zip(&self.frame_state) {
                encode_draw_call(encoder, draw_call, frame_draw, with_materials);
            }
        }
        encoder.pop_debug_group();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augment_core::ar::AnchorState;
    use augment_core::math::{translation_of, Vec3};

    fn point(path: Uuid, sequence: u32, position: Vec3) -> GeometricEntity {
        GeometricEntity::PathSegment(PathSegmentAnchor {
            state: AnchorState::new(Mat4::from_translation(position)),
            path_identifier: path,
            sequence,
        })
    }

    #[test]
    fn points_are_joined_in_sequence_order() {
        let path = Uuid::new_v4();
        let entities = vec![
            point(path, 2, Vec3::new(2.0, 0.0, 0.0)),
            point(path, 0, Vec3::ZERO),
            point(path, 1, Vec3::new(1.0, 0.0, 0.0)),
        ];
        let segments = path_segments(&entities, &CameraProperties::default(), 500.0, 0.1, 100);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start.sequence, 0);
        assert_eq!(segments[1].end.sequence, 2);
        assert_eq!(translation_of(&segments[0].transform), Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn separate_paths_are_not_joined() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let entities = vec![
            point(a, 0, Vec3::ZERO),
            point(b, 0, Vec3::new(0.0, 5.0, 0.0)),
            point(a, 1, Vec3::X),
            point(b, 1, Vec3::new(0.0, 6.0, 0.0)),
        ];
        let segments = path_segments(&entities, &CameraProperties::default(), 500.0, 0.1, 100);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start.path_identifier, a);
        assert_eq!(segments[1].start.path_identifier, b);
    }

    #[test]
    fn segments_leaving_the_render_distance_are_culled() {
        let path = Uuid::new_v4();
        let entities = vec![
            point(path, 0, Vec3::ZERO),
            point(path, 1, Vec3::new(5.0, 0.0, 0.0)),
            point(path, 2, Vec3::new(50.0, 0.0, 0.0)),
        ];
        let segments = path_segments(&entities, &CameraProperties::default(), 10.0, 0.1, 100);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn segment_count_is_capped() {
        let path = Uuid::new_v4();
        let entities: Vec<_> = (0..10).map(|i| point(path, i, Vec3::new(i as f32, 0.0, 0.0))).collect();
        assert_eq!(path_segments(&entities, &CameraProperties::default(), 500.0, 0.1, 3).len(), 3);
    }
}
