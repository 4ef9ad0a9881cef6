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

//! Instanced model rendering for anchors, surfaces, trackers and unanchored objects.

use super::{ModuleBase, ModuleState, PipelineCache, RenderModule, SharedBindings};
use crate::animation::{evaluate_animation_at, evaluate_matrix_palette};
use crate::asset_loading::{request_models, AssetCache, LoadCompletion};
use crate::draw_call::{sort_draw_call_groups, DrawCall, DrawCallGroup, DrawData};
use crate::effects::evaluate_effects;
use crate::instancing::{environment_uniforms, instance_uniforms, plan_instances};
use crate::palette::PaletteRing;
use crate::precalculation::section_offset;
use crate::render_pass::{RenderPass, RenderPassKind, RenderPassTemplate};
use crate::transform::{compose, node_world_transform};
use augment_core::ar::{FrameInput, GeometricEntity};
use augment_core::asset::{primitives, ModelProvider};
use augment_core::config::{RendererConfig, ShaderPreference};
use augment_core::diagnostics::{ErrorCategory, ErrorLog};
use augment_core::renderer::{
    AnchorEffectsUniforms, AnchorInstanceUniforms, BlendMode, BufferBinding, BufferIndex,
    EnvironmentUniforms, GraphicsDevice, ModuleIdentifier, RenderDestination, RenderEncoder,
    ResourceError, ShaderLibraryId, TextureId, TextureIndex, UniformRingBuffer,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Frame state of one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCallFrame {
    /// First instance slot read by the draw.
    pub base_instance: u32,
    /// Instances drawn.
    pub instance_count: u32,
    /// Joint palette of a skinned draw.
    pub palette: Option<BufferBinding>,
    /// The palette did not fit; the draw is skipped this frame.
    pub skip: bool,
}

/// Frame state of one group, shared by every pass drawing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFrameState {
    /// One entry per draw call, in group order.
    pub draw_calls: Vec<DrawCallFrame>,
}

/// The uniform rings of a mesh module.
pub(super) struct Rings {
    pub instances: UniformRingBuffer<AnchorInstanceUniforms>,
    pub effects: UniformRingBuffer<AnchorEffectsUniforms>,
    pub environment: UniformRingBuffer<EnvironmentUniforms>,
    pub palettes: Option<PaletteRing>,
}

impl Rings {
    /// Allocates the rings; no palette ring when `max_palette_size` is 0.
    pub fn new(
        device: &dyn GraphicsDevice,
        max_instances: usize,
        max_palette_size: usize,
        slots: usize,
    ) -> Result<Self, ResourceError> {
        let palettes = match max_palette_size {
            0 => None,
            size => Some(PaletteRing::new(device, size, slots)?),
        };
        Ok(Self {
            instances: UniformRingBuffer::new(device, "Instance Uniforms", max_instances, slots)?,
            effects: UniformRingBuffer::new(device, "Effects Uniforms", max_instances, slots)?,
            environment: UniformRingBuffer::new(device, "Environment Uniforms", max_instances, slots)?,
            palettes,
        })
    }

    pub fn update(&mut self, buffer_index: usize) {
        self.instances.update(buffer_index);
        self.effects.update(buffer_index);
        self.environment.update(buffer_index);
        if let Some(palettes) = self.palettes.as_mut() {
            palettes.begin_frame(buffer_index);
        }
    }

    /// Writes the first slots of the three instance rings.
    pub fn write(
        &self,
        device: &dyn GraphicsDevice,
        instances: &[AnchorInstanceUniforms],
        effects: &[AnchorEffectsUniforms],
        environment: &[EnvironmentUniforms],
    ) -> Result<(), ResourceError> {
        if instances.is_empty() {
            return Ok(());
        }
        self.instances.write_slice(device, 0, instances)?;
        self.effects.write_slice(device, 0, effects)?;
        self.environment.write_slice(device, 0, environment)
    }

    /// Binds the rings, and the shared buffers they are drawn with, as `pass` requests.
    pub fn bind(
        &self,
        encoder: &mut dyn RenderEncoder<'_>,
        module: ModuleIdentifier,
        pass: &RenderPass,
        shared: &SharedBindings,
    ) {
        if pass.uses_shared_buffer {
            if let Some(binding) = shared.shared_uniforms {
                encoder.set_vertex_buffer(BufferIndex::SharedUniforms.slot(), binding.buffer, binding.offset);
            }
        }
        if let (Some(binding), Some(offset)) = (shared.precalculation, section_offset(module)) {
            encoder.set_vertex_buffer(
                BufferIndex::PrecalculationOutputBuffer.slot(),
                binding.buffer,
                binding.offset + offset,
            );
        }
        let instances = self.instances.binding();
        encoder.set_vertex_buffer(
            BufferIndex::AnchorInstanceUniforms.slot(),
            instances.buffer,
            instances.offset,
        );
        if pass.uses_environment {
            let environment = self.environment.binding();
            encoder.set_fragment_buffer(
                BufferIndex::EnvironmentUniforms.slot(),
                environment.buffer,
                environment.offset,
            );
        }
        if pass.uses_effects {
            let effects = self.effects.binding();
            encoder.set_vertex_buffer(BufferIndex::AnchorEffectsUniforms.slot(), effects.buffer, effects.offset);
            encoder.set_fragment_buffer(BufferIndex::AnchorEffectsUniforms.slot(), effects.buffer, effects.offset);
        }
    }
}

/// Records one draw call for every submesh of its node.
pub(super) fn encode_draw_call(
    encoder: &mut dyn RenderEncoder<'_>,
    draw_call: &DrawCall,
    frame_draw: &DrawCallFrame,
    with_materials: bool,
) {
    if frame_draw.skip || frame_draw.instance_count == 0 {
        return;
    }
    let draw_data = &draw_call.draw_data;
    encoder.set_pipeline(draw_call.pipeline);
    encoder.set_depth_stencil_state(draw_call.depth_stencil);
    encoder.set_cull_mode(draw_call.cull_mode);
    if let Some(bias) = draw_call.depth_bias {
        encoder.set_depth_bias(bias);
    }
    encoder.set_vertex_buffer(BufferIndex::MeshPositions.slot(), draw_data.vertex_buffer, 0);
    if let Some(palette) = frame_draw.palette {
        encoder.set_vertex_buffer(BufferIndex::MeshPalettes.slot(), palette.buffer, palette.offset);
    }

    for submesh in &draw_data.submeshes {
        if with_materials {
            encoder.set_fragment_buffer(BufferIndex::MaterialUniforms.slot(), submesh.material_buffer, 0);
            for (index, texture) in &submesh.material.textures {
                encoder.set_fragment_texture(index.slot(), *texture);
            }
        }
        encoder.draw_indexed(
            submesh.primitive,
            submesh.index_count,
            submesh.index_format,
            submesh.index_buffer,
            0,
            frame_draw.instance_count,
            frame_draw.base_instance,
        );
    }
}

/// Draws a model per entity, batching entities that share a model into one
/// instanced draw per mesh node.
///
/// Entities with an identifier draw the model loaded for that identifier,
/// everything else draws the module's general model.
pub struct InstancedModelModule {
    base: ModuleBase,
    render_distance: f32,
    shader_preference: ShaderPreference,
    max_palette_size: usize,
    max_instances: usize,
    blend: BlendMode,
    assets: AssetCache,
    meshes: HashMap<Uuid, Vec<Arc<DrawData>>>,
    preferences: HashMap<Uuid, ShaderPreference>,
    pipelines: PipelineCache,
    rings: Option<Rings>,
    frame_groups: HashMap<Uuid, GroupFrameState>,
    instance_count: usize,
    environment_texture: Option<TextureId>,
    pending_environment_texture: Option<TextureId>,
    shadow_map: Option<TextureId>,
}

impl std::fmt::Debug for InstancedModelModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstancedModelModule")
            .field("identifier", &self.base.identifier)
            .field("state", &self.base.state)
            .field("meshes", &self.meshes.len())
            .field("instance_count", &self.instance_count)
            .finish()
    }
}

impl InstancedModelModule {
    /// Creates the module for `identifier` with the limits of `config`.
    pub fn new(identifier: ModuleIdentifier, config: &RendererConfig) -> Self {
        let blend = match identifier {
            ModuleIdentifier::Anchors | ModuleIdentifier::Surfaces => BlendMode::AlphaBlended,
            _ => BlendMode::Opaque,
        };
        Self {
            base: ModuleBase::new(identifier),
            render_distance: config.render_distance,
            shader_preference: config.shader_preference,
            max_palette_size: config.max_palette_size,
            max_instances: identifier.max_instance_count(),
            blend,
            assets: AssetCache::default(),
            meshes: HashMap::new(),
            preferences: HashMap::new(),
            pipelines: PipelineCache::default(),
            rings: None,
            frame_groups: HashMap::new(),
            instance_count: 0,
            environment_texture: None,
            pending_environment_texture: None,
            shadow_map: None,
        }
    }

    #[allow(missing_docs)]
    pub fn anchors(config: &RendererConfig) -> Self {
        Self::new(ModuleIdentifier::Anchors, config)
    }

    #[allow(missing_docs)]
    pub fn surfaces(config: &RendererConfig) -> Self {
        Self::new(ModuleIdentifier::Surfaces, config)
    }

    #[allow(missing_docs)]
    pub fn trackers(config: &RendererConfig) -> Self {
        Self::new(ModuleIdentifier::Trackers, config)
    }

    #[allow(missing_docs)]
    pub fn unanchored(config: &RendererConfig) -> Self {
        Self::new(ModuleIdentifier::Unanchored, config)
    }

    /// Frame state of the group `uuid`, if it drew this frame.
    pub fn group_frame_state(&self, uuid: &Uuid) -> Option<&GroupFrameState> {
        self.frame_groups.get(uuid)
    }

    /// Current slot of the instance uniform ring.
    pub fn instance_binding(&self) -> Option<BufferBinding> {
        self.rings.as_ref().map(|r| r.instances.binding())
    }

    /// Current slot of the effects uniform ring.
    pub fn effects_binding(&self) -> Option<BufferBinding> {
        self.rings.as_ref().map(|r| r.effects.binding())
    }

    /// The environment texture currently bound.
    pub fn environment_texture(&self) -> Option<TextureId> {
        self.environment_texture
    }

    fn resolve_uuid(&self, entity: &GeometricEntity) -> Uuid {
        match entity.identifier() {
            Some(id) if self.meshes.contains_key(&id) => id,
            _ => self.base.identifier.general_uuid(),
        }
    }

    /// Uploads every cached model not yet on the device.
    fn upload_meshes(&mut self, device: &dyn GraphicsDevice) {
        let general = self.base.identifier.general_uuid();
        if self.base.identifier == ModuleIdentifier::Surfaces && !self.assets.contains(&general) {
            log::debug!("{} falling back to a procedural plane", self.base.identifier);
            self.assets.insert(general, primitives::plane("Surface Plane"));
        }

        for (uuid, asset) in self.assets.snapshot() {
            if self.meshes.contains_key(&uuid) {
                continue;
            }
            match super::upload_mesh(device, &asset) {
                Ok((draws, warnings)) => {
                    for warning in warnings {
                        self.base.warning(ErrorCategory::InvalidAssetData, warning);
                    }
                    if draws.is_empty() {
                        self.base.warning(
                            ErrorCategory::MeshDataUnavailable,
                            format!("model {} has no mesh nodes", asset.name),
                        );
                        continue;
                    }
                    if let Some(preference) = asset.shader_preference {
                        self.preferences.insert(uuid, preference);
                    }
                    self.meshes.insert(uuid, draws);
                }
                Err(e) => {
                    self.base.serious(
                        ErrorCategory::BufferAllocationFailed,
                        format!("uploading {} failed: {e}", asset.name),
                    );
                    return;
                }
            }
        }
    }
}

impl RenderModule for InstancedModelModule {
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
        match Rings::new(
            &*device,
            max_instances,
            self.max_palette_size,
            self.base.max_in_flight_frames,
        ) {
            Ok(rings) => self.rings = Some(rings),
            Err(e) => self.base.serious(
                ErrorCategory::BufferAllocationFailed,
                format!("uniform rings: {e}"),
            ),
        }
    }

    fn load_assets(
        &mut self,
        entities: &[GeometricEntity],
        provider: &dyn ModelProvider,
        completion: LoadCompletion,
    ) {
        if self.base.is_disabled() {
            completion();
            return;
        }
        request_models(
            self.base.identifier,
            entities,
            provider,
            &self.assets,
            &self.base.errors,
            completion,
        );
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
        if main && template.color_format.is_none() {
            self.base.serious(
                ErrorCategory::RenderPassUnavailable,
                format!("main pass template {} has no color attachment", template.label),
            );
            return Vec::new();
        }
        let Some(library) = library else {
            if main {
                self.base
                    .serious(ErrorCategory::PipelineInitializationFailed, "no shader library");
            } else {
                self.base
                    .warning(ErrorCategory::PipelineInitializationFailed, "no shader library");
            }
            return Vec::new();
        };

        if main {
            self.upload_meshes(&*device);
            if self.base.is_disabled() {
                return Vec::new();
            }
        }

        let module = self.base.identifier;
        if !self.meshes.contains_key(&module.general_uuid()) {
            if main {
                self.base.serious(ErrorCategory::ModelNotFound, "general model unavailable");
            }
            return Vec::new();
        }

        let mut casters: HashMap<Uuid, bool> = HashMap::new();
        for entity in entities.iter().filter(|e| module.accepts(e.kind())) {
            *casters.entry(self.resolve_uuid(entity)).or_default() |= entity.state().generates_shadows;
        }

        let mut groups = Vec::with_capacity(self.meshes.len());
        for (uuid, draws) in &self.meshes {
            let generates_shadows = casters.get(uuid).copied().unwrap_or(false);
            if !main && !generates_shadows {
                continue;
            }
            let preference = self.preferences.get(uuid).copied().unwrap_or(self.shader_preference);
            match self
                .pipelines
                .draw_calls_for(&*device, library, module, template, preference, draws, self.blend)
            {
                Ok(draw_calls) => {
                    groups.push(DrawCallGroup::new(*uuid, module, draw_calls, generates_shadows))
                }
                Err(e) if main => {
                    self.base.serious(
                        ErrorCategory::PipelineInitializationFailed,
                        format!("{}: {e}", template.label),
                    );
                    return Vec::new();
                }
                Err(e) => {
                    self.base.warning(
                        ErrorCategory::PipelineInitializationFailed,
                        format!("{}: {e}", template.label),
                    );
                }
            }
        }

        sort_draw_call_groups(&mut groups);
        log::debug!(
            "{module} built {} groups for {} ({} pipelines cached)",
            groups.len(),
            template.label,
            self.pipelines.len()
        );
        if main {
            self.base.mark_ready();
        }
        groups
    }

    fn update_buffer_state(&mut self, buffer_index: usize) {
        if let Some(rings) = self.rings.as_mut() {
            rings.update(buffer_index);
        }
    }

    fn update_buffers(&mut self, frame: &FrameInput, pass: &RenderPass) {
        self.instance_count = 0;
        self.frame_groups.clear();
        if !self.base.is_ready() {
            return;
        }
        let (Some(device), Some(rings)) = (self.base.device.clone(), self.rings.as_mut()) else {
            return;
        };

        let module = self.base.identifier;
        let camera = &frame.camera;
        let seconds = camera.elapsed_seconds();
        let groups: Vec<&DrawCallGroup> =
            pass.draw_call_groups.iter().filter(|g| g.module == module).collect();
        let plan = plan_instances(
            module,
            &groups,
            &frame.entities,
            camera,
            self.render_distance,
            self.max_instances,
        );

        let mut instance_data = Vec::with_capacity(plan.slot_count);
        let mut effects_data = Vec::with_capacity(plan.slot_count);
        let mut environment_data = Vec::with_capacity(plan.slot_count);
        let mut pending_texture = None;
        let mut palette_overflow = false;
        let mut failures = Vec::new();

        for planned in &plan.groups {
            let Some(group) = groups.iter().find(|g| g.uuid == planned.uuid) else {
                continue;
            };
            let mut state = GroupFrameState::default();
            for (index, draw_call) in group.draw_calls.iter().enumerate() {
                let draw_data = &draw_call.draw_data;
                let world = node_world_transform(draw_data, seconds);
                for entity in &planned.entities {
                    instance_data.push(instance_uniforms(&compose(entity, world, camera)));
                    effects_data.push(evaluate_effects(&entity.state().effects, seconds));
                    let probe = entity
                        .identifier()
                        .and_then(|id| frame.environment.best_probe_for(&id));
                    if pending_texture.is_none() {
                        pending_texture = probe.and_then(|p| p.texture);
                    }
                    environment_data.push(environment_uniforms(
                        &frame.environment,
                        &frame.shadow,
                        probe,
                    ));
                }

                let mut frame_draw = DrawCallFrame {
                    base_instance: planned.draw_call_base(index) as u32,
                    instance_count: planned.instance_count() as u32,
                    palette: None,
                    skip: false,
                };
                if let (Some(skin), Some(skeleton)) = (&draw_data.skin, &draw_data.skeleton) {
                    let pose = evaluate_animation_at(skeleton, seconds);
                    let palette = evaluate_matrix_palette(&pose, skin);
                    match rings.palettes.as_mut().map(|p| p.push(&*device, &palette)) {
                        Some(Ok(Some(binding))) => frame_draw.palette = Some(binding),
                        Some(Ok(None)) | None => {
                            frame_draw.skip = true;
                            palette_overflow = true;
                        }
                        Some(Err(e)) => {
                            frame_draw.skip = true;
                            failures.push(format!("palette of {}: {e}", draw_data.name));
                        }
                    }
                }
                state.draw_calls.push(frame_draw);
            }
            self.frame_groups.insert(planned.uuid, state);
        }

        if let Err(e) = rings.write(&*device, &instance_data, &effects_data, &environment_data) {
            failures.push(format!("instance uniforms: {e}"));
        }

        for failure in failures {
            self.base.recoverable(ErrorCategory::BufferAllocationFailed, failure);
        }
        if palette_overflow {
            self.base.warning(
                ErrorCategory::PaletteOverflow,
                format!("joint palette full at frame {}", camera.current_frame),
            );
        }

        self.instance_count = plan.slot_count;
        self.pending_environment_texture = pending_texture;
        self.shadow_map = frame.shadow.shadow_map;
        log::trace!(
            "{module}: {} instances in {} groups ({} culled, {} over cap)",
            plan.slot_count,
            plan.groups.len(),
            plan.culled,
            plan.dropped
        );
    }

    fn draw(&self, encoder: &mut dyn RenderEncoder<'_>, pass: &RenderPass, shared: &SharedBindings) {
        if !self.base.is_ready() || self.instance_count == 0 {
            return;
        }
        let Some(rings) = self.rings.as_ref() else {
            return;
        };
        let module = self.base.identifier;
        let mut groups = pass
            .groups_for(module)
            .filter_map(|g| self.frame_groups.get(&g.uuid).map(|state| (g, state)))
            .peekable();
        if groups.peek().is_none() {
            return;
        }

        encoder.push_debug_group(module.name());
        rings.bind(encoder, module, pass, shared);
        if pass.uses_environment {
            if let Some(texture) = self.environment_texture {
                encoder.set_fragment_texture(TextureIndex::EnvironmentMap.slot(), texture);
            }
        }
        if pass.uses_shadows {
            if let Some(texture) = self.shadow_map {
                encoder.set_fragment_texture(TextureIndex::ShadowMap.slot(), texture);
            }
        }

        let with_materials = pass.kind() == RenderPassKind::Main;
        for (group, state) in groups {
            for (draw_call, frame_draw) in group.draw_calls.iter().zip(&state.draw_calls) {
                encode_draw_call(encoder, draw_call, frame_draw, with_materials);
            }
        }

        encoder.pop_debug_group();
    }

    fn frame_encoding_complete(&mut self, _passes: &[RenderPass]) {
        if let Some(texture) = self.pending_environment_texture.take() {
            if self.environment_texture != Some(texture) {
                log::debug!("{} environment texture now {texture:?}", self.base.identifier);
            }
            self.environment_texture = Some(texture);
        }
    }
}
