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

//! The render module family.
//!
//! Every module follows the same lifecycle:
//!
//! 1. [`initialize_buffers`](RenderModule::initialize_buffers) allocates its uniform rings.
//! 2. [`load_assets`](RenderModule::load_assets) resolves models from the provider.
//! 3. [`load_pipeline`](RenderModule::load_pipeline) compiles pipelines and builds draw call groups.
//! 4. Each frame: [`update_buffer_state`](RenderModule::update_buffer_state),
//!    [`update_buffers`](RenderModule::update_buffers), [`draw`](RenderModule::draw) and
//!    finally [`frame_encoding_complete`](RenderModule::frame_encoding_complete).
//!
//! Steps 2 and 3 run on the bootstrap worker; step 4 runs on the render thread.

mod base;
mod camera_plane;
mod gpu_mesh;
mod instanced;
mod paths;
mod shared_buffers;
mod tracking_points;

pub use camera_plane::{quad_vertices, CameraPlaneModule};
pub use instanced::{DrawCallFrame, GroupFrameState, InstancedModelModule};
pub use paths::{path_segments, PathSegment, PathsModule, DEFAULT_PATH_RADIUS};
pub use shared_buffers::SharedBuffersModule;
pub use tracking_points::TrackingPointsModule;

pub(crate) use base::ModuleBase;
use gpu_mesh::{upload_mesh, PipelineCache};

use crate::asset_loading::LoadCompletion;
use crate::draw_call::DrawCallGroup;
use crate::render_pass::{RenderPass, RenderPassTemplate};
use augment_core::ar::{FrameInput, GeometricEntity};
use augment_core::asset::ModelProvider;
use augment_core::diagnostics::ErrorLog;
use augment_core::renderer::{
    BufferBinding, GraphicsDevice, ModuleIdentifier, RenderDestination, RenderEncoder,
    ShaderLibraryId,
};
use std::sync::Arc;

/// Lifecycle state of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
    /// No buffers yet.
    Uninitialized,
    /// Buffers allocated, pipelines not yet built.
    Initializing,
    /// Pipelines built; the module draws.
    Ready,
    /// A serious error occurred; the module never draws again.
    Disabled,
}

/// Per-frame bindings produced by one module and consumed by the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SharedBindings {
    /// Camera matrices for the current frame.
    pub shared_uniforms: Option<BufferBinding>,
    /// Output of the precalculation pass.
    pub precalculation: Option<BufferBinding>,
}

/// A unit of rendering work with its own buffers, models and pipelines.
pub trait RenderModule: Send {
    /// Which module this is.
    fn identifier(&self) -> ModuleIdentifier;

    /// Draw order; lower layers draw first.
    fn render_layer(&self) -> i32 {
        self.identifier().render_layer()
    }

    /// Current lifecycle state.
    fn state(&self) -> ModuleState;

    /// The diagnostics recorded by this module.
    fn errors(&self) -> &ErrorLog;

    /// Instances written by the last [`update_buffers`](Self::update_buffers).
    fn instance_count(&self) -> usize;

    /// Allocates the uniform rings.
    ///
    /// A no-op when the module already has a device. Records a serious
    /// `DeviceNotFound` error when `device` is `None`.
    fn initialize_buffers(
        &mut self,
        device: Option<Arc<dyn GraphicsDevice>>,
        max_in_flight_frames: usize,
        max_instances: usize,
    );

    /// Resolves models for `entities`. `completion` runs exactly once.
    fn load_assets(
        &mut self,
        entities: &[GeometricEntity],
        provider: &dyn ModelProvider,
        completion: LoadCompletion,
    );

    /// Compiles pipelines against `template` and returns the module's groups,
    /// sorted by UUID.
    fn load_pipeline(
        &mut self,
        entities: &[GeometricEntity],
        library: Option<ShaderLibraryId>,
        destination: &RenderDestination,
        template: &RenderPassTemplate,
    ) -> Vec<DrawCallGroup>;

    /// Points every ring at the slot of `buffer_index`.
    fn update_buffer_state(&mut self, buffer_index: usize);

    /// Writes this frame's uniforms into the current slots.
    fn update_buffers(&mut self, frame: &FrameInput, pass: &RenderPass);

    /// Adds the bindings this module shares with others.
    fn contribute_shared(&self, _shared: &mut SharedBindings) {}

    /// Records the module's draw calls for `pass`.
    fn draw(&self, encoder: &mut dyn RenderEncoder<'_>, pass: &RenderPass, shared: &SharedBindings);

    /// Every pass of the frame has been encoded.
    fn frame_encoding_complete(&mut self, _passes: &[RenderPass]) {}
}
