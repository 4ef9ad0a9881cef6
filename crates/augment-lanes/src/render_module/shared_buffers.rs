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

//! Camera matrices shared by every geometry module.

use super::{ModuleBase, ModuleState, RenderModule, SharedBindings};
use crate::asset_loading::LoadCompletion;
use crate::draw_call::DrawCallGroup;
use crate::render_pass::{RenderPass, RenderPassKind, RenderPassTemplate};
use augment_core::ar::{FrameInput, GeometricEntity};
use augment_core::asset::ModelProvider;
use augment_core::diagnostics::{ErrorCategory, ErrorLog};
use augment_core::math::to_gpu_mat4;
use augment_core::renderer::{
    GraphicsDevice, ModuleIdentifier, RenderDestination, RenderEncoder, ShaderLibraryId,
    SharedUniforms, UniformRingBuffer,
};
use std::sync::Arc;

/// Owns the [`SharedUniforms`] ring. Draws nothing itself.
#[derive(Debug)]
pub struct SharedBuffersModule {
    base: ModuleBase,
    uniforms: Option<UniformRingBuffer<SharedUniforms>>,
    use_depth: bool,
    written: bool,
}

impl Default for SharedBuffersModule {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedBuffersModule {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self {
            base: ModuleBase::new(ModuleIdentifier::SharedBuffers),
            uniforms: None,
            use_depth: true,
            written: false,
        }
    }

    /// Whether shaders should read scene depth.
    pub fn with_depth(mut self, use_depth: bool) -> Self {
        self.use_depth = use_depth;
        self
    }
}

impl RenderModule for SharedBuffersModule {
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
        usize::from(self.written)
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
        match UniformRingBuffer::new(&*device, "Shared Uniforms", 1, self.base.max_in_flight_frames) {
            Ok(ring) => self.uniforms = Some(ring),
            Err(e) => self
                .base
                .serious(ErrorCategory::BufferAllocationFailed, format!("shared uniforms: {e}")),
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
        _library: Option<ShaderLibraryId>,
        _destination: &RenderDestination,
        template: &RenderPassTemplate,
    ) -> Vec<DrawCallGroup> {
        if template.kind == RenderPassKind::Main && self.uniforms.is_some() {
            self.base.mark_ready();
        }
        Vec::new()
    }

    fn update_buffer_state(&mut self, buffer_index: usize) {
        self.written = false;
        if let Some(ring) = self.uniforms.as_mut() {
            ring.update(buffer_index);
        }
    }

    fn update_buffers(&mut self, frame: &FrameInput, _pass: &RenderPass) {
        if !self.base.is_ready() {
            return;
        }
        let (Some(device), Some(ring)) = (self.base.device.as_ref(), self.uniforms.as_ref()) else {
            return;
        };
        let uniforms = SharedUniforms::new(
            to_gpu_mat4(&frame.camera.projection_matrix),
            to_gpu_mat4(&frame.camera.view_matrix),
            self.use_depth,
        );
        match ring.write(&**device, 0, &uniforms) {
            Ok(()) => self.written = true,
            Err(e) => self
                .base
                .recoverable(ErrorCategory::BufferAllocationFailed, format!("shared uniforms: {e}")),
        }
    }

    fn contribute_shared(&self, shared: &mut SharedBindings) {
        if self.written {
            shared.shared_uniforms = self.uniforms.as_ref().map(UniformRingBuffer::binding);
        }
    }

    fn draw(&self, _encoder: &mut dyn RenderEncoder<'_>, _pass: &RenderPass, _shared: &SharedBindings) {}
}
