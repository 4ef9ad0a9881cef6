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

//! The resource-provider side of a graphics backend.

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use crate::renderer::traits::CommandEncoder;
use std::fmt::Debug;

/// A logical graphics device able to allocate resources and compile state objects.
///
/// Every method takes `&self`: devices are shared between the render thread and
/// the bootstrap worker, so implementations synchronise internally.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Loads the precompiled shader library bundled with the renderer.
    /// ## Returns
    /// A `Result` containing the ID of the library.
    /// ## Errors
    /// * `ResourceError` - If no library is available.
    fn create_default_library(&self) -> Result<ShaderLibraryId, ResourceError>;

    /// Compiles a render pipeline from the provided descriptor.
    /// ## Arguments
    /// * `descriptor` - The pipeline configuration, including function names.
    /// ## Errors
    /// * `ResourceError::Shader` - If a named function is missing from the library.
    /// * `ResourceError::Pipeline` - If the backend rejects the state.
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError>;

    /// Compiles a compute pipeline from the provided descriptor.
    /// ## Errors
    /// * `ResourceError::Shader` - If the kernel is missing from the library.
    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, ResourceError>;

    /// Creates a depth-stencil state object.
    fn create_depth_stencil_state(
        &self,
        descriptor: &DepthStencilDescriptor,
    ) -> Result<DepthStencilStateId, ResourceError>;

    /// Creates a new GPU buffer.
    /// ## Arguments
    /// * `descriptor` - A reference to a `BufferDescriptor` containing the buffer configuration.
    /// ## Returns
    /// A `Result` containing the ID of the created buffer or an error if the creation fails.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a new GPU buffer and initializes it with the provided data.
    /// This is often more efficient for creating static buffers.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Writes data to a GPU buffer.
    /// ## Arguments
    /// * `id` - The ID of the buffer to write to.
    /// * `offset` - The offset in the buffer where the data will be written.
    /// * `data` - A slice of bytes containing the data to be written.
    /// ## Errors
    /// * `ResourceError::OutOfBounds` - If the write does not fit the buffer.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Creates a command encoder for recording one frame of GPU work.
    /// ## Arguments
    /// * `label` - An optional debug label.
    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder>;
}
