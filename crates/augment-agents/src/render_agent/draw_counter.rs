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

//! Counts the draws the modules actually encode into a pass.

use augment_core::renderer::{
    BufferId, CullMode, DepthBias, DepthStencilStateId, IndexFormat, PrimitiveType,
    RenderEncoder, RenderPipelineId, TextureId,
};
use std::ops::Range;

/// Forwards every command to `inner`, counting draw calls on the way.
pub(crate) struct CountingEncoder<'a, 'pass> {
    inner: &'a mut dyn RenderEncoder<'pass>,
    draw_calls: usize,
}

impl<'a, 'pass> CountingEncoder<'a, 'pass> {
    pub(crate) fn new(inner: &'a mut dyn RenderEncoder<'pass>) -> Self {
        Self {
            inner,
            draw_calls: 0,
        }
    }

    pub(crate) fn draw_calls(&self) -> usize {
        self.draw_calls
    }
}

impl<'pass> RenderEncoder<'pass> for CountingEncoder<'_, 'pass> {
    fn set_pipeline(&mut self, pipeline: RenderPipelineId) {
        self.inner.set_pipeline(pipeline);
    }

    fn set_depth_stencil_state(&mut self, state: DepthStencilStateId) {
        self.inner.set_depth_stencil_state(state);
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.inner.set_cull_mode(mode);
    }

    fn set_depth_bias(&mut self, bias: DepthBias) {
        self.inner.set_depth_bias(bias);
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64) {
        self.inner.set_vertex_buffer(slot, buffer, offset);
    }

    fn set_fragment_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64) {
        self.inner.set_fragment_buffer(slot, buffer, offset);
    }

    fn set_fragment_texture(&mut self, slot: u32, texture: TextureId) {
        self.inner.set_fragment_texture(slot, texture);
    }

    fn push_debug_group(&mut self, label: &str) {
        self.inner.push_debug_group(label);
    }

    fn pop_debug_group(&mut self) {
        self.inner.pop_debug_group();
    }

    fn draw(&mut self, primitive: PrimitiveType, vertices: Range<u32>, instances: Range<u32>) {
        self.draw_calls += 1;
        self.inner.draw(primitive, vertices, instances);
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        index_count: u32,
        index_format: IndexFormat,
        index_buffer: BufferId,
        index_offset: u64,
        instance_count: u32,
        base_instance: u32,
    ) {
        self.draw_calls += 1;
        self.inner.draw_indexed(
            primitive,
            index_count,
            index_format,
            index_buffer,
            index_offset,
            instance_count,
            base_instance,
        );
    }
}
