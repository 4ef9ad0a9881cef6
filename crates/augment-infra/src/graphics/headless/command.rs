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

use std::ops::Range;

use augment_core::renderer::traits::{CommandEncoder, ComputeEncoder, RenderEncoder};
use augment_core::renderer::{
    BufferId, CommandBufferId, ComputePassDescriptor, ComputePipelineId, CullMode, DepthBias,
    DepthStencilStateId, IndexFormat, PrimitiveType, RenderPassDescriptor, RenderPipelineId,
    TextureId,
};

use super::device::HeadlessDevice;

/// One call made on a headless encoder.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    BeginRenderPass {
        label: Option<String>,
        color_target: Option<TextureId>,
        depth_target: Option<TextureId>,
    },
    EndRenderPass,
    BeginComputePass {
        label: Option<String>,
    },
    EndComputePass,
    SetPipeline(RenderPipelineId),
    SetComputePipeline(ComputePipelineId),
    SetDepthStencilState(DepthStencilStateId),
    SetCullMode(CullMode),
    SetDepthBias(DepthBias),
    SetVertexBuffer {
        slot: u32,
        buffer: BufferId,
        offset: u64,
    },
    SetFragmentBuffer {
        slot: u32,
        buffer: BufferId,
        offset: u64,
    },
    SetComputeBuffer {
        slot: u32,
        buffer: BufferId,
        offset: u64,
    },
    SetFragmentTexture {
        slot: u32,
        texture: TextureId,
    },
    PushDebugGroup(String),
    PopDebugGroup,
    Draw {
        primitive: PrimitiveType,
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        primitive: PrimitiveType,
        index_count: u32,
        index_format: IndexFormat,
        index_buffer: BufferId,
        index_offset: u64,
        instance_count: u32,
        base_instance: u32,
    },
    DispatchThreads {
        thread_count: u32,
        threads_per_group: u32,
    },
}

/// A finished command buffer, as stored by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommandBuffer {
    #[allow(missing_docs)]
    pub id: CommandBufferId,
    #[allow(missing_docs)]
    pub label: Option<String>,
    /// Every command, in recording order.
    pub commands: Vec<RecordedCommand>,
}

impl RecordedCommandBuffer {
    /// The indexed draws, in recording order.
    pub fn indexed_draws(&self) -> impl Iterator<Item = &RecordedCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::DrawIndexed { .. }))
    }

    /// Labels of the debug groups pushed, in recording order.
    pub fn debug_groups(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::PushDebugGroup(label) => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of vertex or fragment binds at `slot`.
    pub fn binds_at(&self, slot: u32) -> usize {
        self.commands
            .iter()
            .filter(|c| {
                matches!(c, RecordedCommand::SetVertexBuffer { slot: s, .. }
                    | RecordedCommand::SetFragmentBuffer { slot: s, .. } if *s == slot)
            })
            .count()
    }
}

/// Records render commands until dropped.
pub struct HeadlessRenderEncoder<'a> {
    commands: &'a mut Vec<RecordedCommand>,
}

impl<'pass> RenderEncoder<'pass> for HeadlessRenderEncoder<'pass> {
    fn set_pipeline(&mut self, pipeline: RenderPipelineId) {
        self.commands.push(RecordedCommand::SetPipeline(pipeline));
    }

    fn set_depth_stencil_state(&mut self, state: DepthStencilStateId) {
        self.commands.push(RecordedCommand::SetDepthStencilState(state));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.commands.push(RecordedCommand::SetCullMode(mode));
    }

    fn set_depth_bias(&mut self, bias: DepthBias) {
        self.commands.push(RecordedCommand::SetDepthBias(bias));
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64) {
        self.commands.push(RecordedCommand::SetVertexBuffer {
            slot,
            buffer,
            offset,
        });
    }

    fn set_fragment_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64) {
        self.commands.push(RecordedCommand::SetFragmentBuffer {
            slot,
            buffer,
            offset,
        });
    }

    fn set_fragment_texture(&mut self, slot: u32, texture: TextureId) {
        self.commands
            .push(RecordedCommand::SetFragmentTexture { slot, texture });
    }

    fn push_debug_group(&mut self, label: &str) {
        self.commands
            .push(RecordedCommand::PushDebugGroup(label.to_string()));
    }

    fn pop_debug_group(&mut self) {
        self.commands.push(RecordedCommand::PopDebugGroup);
    }

    fn draw(&mut self, primitive: PrimitiveType, vertices: Range<u32>, instances: Range<u32>) {
        self.commands.push(RecordedCommand::Draw {
            primitive,
            vertices,
            instances,
        });
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
        self.commands.push(RecordedCommand::DrawIndexed {
            primitive,
            index_count,
            index_format,
            index_buffer,
            index_offset,
            instance_count,
            base_instance,
        });
    }
}

impl Drop for HeadlessRenderEncoder<'_> {
    fn drop(&mut self) {
        self.commands.push(RecordedCommand::EndRenderPass);
    }
}

/// Records compute commands until dropped.
pub struct HeadlessComputeEncoder<'a> {
    commands: &'a mut Vec<RecordedCommand>,
}

impl<'pass> ComputeEncoder<'pass> for HeadlessComputeEncoder<'pass> {
    fn set_pipeline(&mut self, pipeline: ComputePipelineId) {
        self.commands
            .push(RecordedCommand::SetComputePipeline(pipeline));
    }

    fn set_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64) {
        self.commands.push(RecordedCommand::SetComputeBuffer {
            slot,
            buffer,
            offset,
        });
    }

    fn dispatch_threads(&mut self, thread_count: u32, threads_per_group: u32) {
        self.commands.push(RecordedCommand::DispatchThreads {
            thread_count,
            threads_per_group,
        });
    }
}

impl Drop for HeadlessComputeEncoder<'_> {
    fn drop(&mut self) {
        self.commands.push(RecordedCommand::EndComputePass);
    }
}

/// A command encoder that keeps what it records.
pub struct HeadlessCommandEncoder {
    device: HeadlessDevice,
    label: Option<String>,
    commands: Vec<RecordedCommand>,
}

impl HeadlessCommandEncoder {
    pub(crate) fn new(device: HeadlessDevice, label: Option<&str>) -> Self {
        Self {
            device,
            label: label.map(String::from),
            commands: Vec::new(),
        }
    }
}

impl CommandEncoder for HeadlessCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Box<dyn RenderEncoder<'encoder> + 'encoder> {
        self.commands.push(RecordedCommand::BeginRenderPass {
            label: descriptor.label.as_deref().map(String::from),
            color_target: descriptor.color_target,
            depth_target: descriptor.depth_target,
        });
        Box::new(HeadlessRenderEncoder {
            commands: &mut self.commands,
        })
    }

    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        descriptor: &ComputePassDescriptor<'encoder>,
    ) -> Box<dyn ComputeEncoder<'encoder> + 'encoder> {
        self.commands.push(RecordedCommand::BeginComputePass {
            label: descriptor.label.as_deref().map(String::from),
        });
        Box::new(HeadlessComputeEncoder {
            commands: &mut self.commands,
        })
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let Self {
            device,
            label,
            commands,
        } = *self;
        log::trace!("HeadlessCommandEncoder {label:?} finished with {} commands", commands.len());
        device.register_command_buffer(label, commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augment_core::renderer::{GraphicsDevice, LoadAction};

    #[test]
    fn passes_are_closed_when_their_encoder_drops() {
        let device = HeadlessDevice::new();
        let mut encoder = device.create_command_encoder(Some("frame"));
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: None,
                color_target: None,
                depth_target: None,
                depth_load: LoadAction::Clear(1.0),
            });
            pass.push_debug_group("Anchors");
            pass.pop_debug_group();
        }
        {
            let mut compute = encoder.begin_compute_pass(&ComputePassDescriptor::default());
            compute.dispatch_threads(10, 64);
        }
        let id = encoder.finish();

        let buffers = device.take_command_buffers();
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].id, id);
        assert_eq!(buffers[0].label.as_deref(), Some("frame"));
        assert_eq!(buffers[0].debug_groups(), vec!["Anchors"]);
        assert_eq!(buffers[0].commands[3], RecordedCommand::EndRenderPass);
        assert_eq!(buffers[0].commands.last(), Some(&RecordedCommand::EndComputePass));
    }
}
