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

use crate::renderer::api::*;
use std::ops::Range;

/// A trait representing an active render pass, used for recording drawing commands.
///
/// A `RenderEncoder` is obtained from a [`CommandEncoder`] and records state
/// changes and draw calls. The `'pass` lifetime ties it to the encoder that
/// created it, so only one pass can be open at a time.
pub trait RenderEncoder<'pass> {
    /// Sets the active render pipeline for subsequent draw calls.
    fn set_pipeline(&mut self, pipeline: RenderPipelineId);

    /// Sets the depth-stencil state.
    fn set_depth_stencil_state(&mut self, state: DepthStencilStateId);

    /// Sets which faces are culled.
    fn set_cull_mode(&mut self, mode: CullMode);

    /// Sets the depth offset for subsequent draws.
    fn set_depth_bias(&mut self, bias: DepthBias);

    /// Binds a buffer to a vertex-stage slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64);

    /// Binds a buffer to a fragment-stage slot.
    fn set_fragment_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64);

    /// Binds a texture to a fragment-stage slot.
    fn set_fragment_texture(&mut self, slot: u32, texture: TextureId);

    /// Pushes a labelled group onto the debug stack.
    fn push_debug_group(&mut self, label: &str);

    /// Pops the innermost debug group.
    fn pop_debug_group(&mut self);

    /// Records a non-indexed draw call.
    fn draw(&mut self, primitive: PrimitiveType, vertices: Range<u32>, instances: Range<u32>);

    /// Records an indexed, instanced draw call.
    ///
    /// Instance IDs seen by the shader start at `base_instance`.
    #[allow(clippy::too_many_arguments)]
    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        index_count: u32,
        index_format: IndexFormat,
        index_buffer: BufferId,
        index_offset: u64,
        instance_count: u32,
        base_instance: u32,
    );
}

/// A trait representing an active compute pass, used for recording dispatch commands.
pub trait ComputeEncoder<'pass> {
    /// Sets the active compute pipeline.
    fn set_pipeline(&mut self, pipeline: ComputePipelineId);

    /// Binds a buffer to a kernel slot.
    fn set_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64);

    /// Dispatches `thread_count` threads in groups of `threads_per_group`.
    fn dispatch_threads(&mut self, thread_count: u32, threads_per_group: u32);
}

/// A trait for an object that records a sequence of GPU commands.
///
/// A `CommandEncoder` is the main tool for building a [`CommandBufferId`]. It
/// opens render and compute passes; each pass ends when its encoder is dropped.
pub trait CommandEncoder: Send {
    /// Begins a new render pass.
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Box<dyn RenderEncoder<'encoder> + 'encoder>;

    /// Begins a new compute pass.
    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        descriptor: &ComputePassDescriptor<'encoder>,
    ) -> Box<dyn ComputeEncoder<'encoder> + 'encoder>;

    /// Finalizes the command recording and returns a handle to the resulting command buffer.
    fn finish(self: Box<Self>) -> CommandBufferId;
}
