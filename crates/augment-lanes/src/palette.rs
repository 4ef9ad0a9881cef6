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

//! The per-frame matrix palette ring used by vertex skinning.

use augment_core::math::{to_gpu_mat4, Mat4};
use augment_core::renderer::{
    BufferBinding, GpuMat4, GraphicsDevice, ResourceError, UniformRingBuffer,
};

/// A capacity-limited palette slot per frame in flight.
///
/// Skinned draws reserve a contiguous run of entries each frame. The cursor
/// resets when the frame advances; a request that does not fit is refused
/// instead of writing past the slot.
#[derive(Debug)]
pub struct PaletteRing {
    ring: UniformRingBuffer<GpuMat4>,
    cursor: usize,
}

impl PaletteRing {
    /// Allocates `max_palette_size` entries per slot.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the allocation fails.
    pub fn new(
        device: &dyn GraphicsDevice,
        max_palette_size: usize,
        slot_count: usize,
    ) -> Result<Self, ResourceError> {
        Ok(Self {
            ring: UniformRingBuffer::new(device, "Joint Palette", max_palette_size, slot_count)?,
            cursor: 0,
        })
    }

    /// Selects the slot for `buffer_index` and empties it.
    pub fn begin_frame(&mut self, buffer_index: usize) {
        self.ring.update(buffer_index);
        self.cursor = 0;
    }

    /// Entries still free in the current slot.
    pub fn remaining(&self) -> usize {
        self.ring.capacity() - self.cursor
    }

    /// Writes `palette` after the entries already used this frame.
    ///
    /// Returns the binding of the first written entry, or `None` when the
    /// palette does not fit in what is left of the slot.
    ///
    /// # Errors
    ///
    /// Returns the device error if the write fails.
    pub fn push(
        &mut self,
        device: &dyn GraphicsDevice,
        palette: &[Mat4],
    ) -> Result<Option<BufferBinding>, ResourceError> {
        if palette.len() > self.remaining() {
            return Ok(None);
        }
        let first = self.cursor;
        let entries: Vec<GpuMat4> = palette.iter().map(to_gpu_mat4).collect();
        self.ring.write_slice(device, first, &entries)?;
        self.cursor += palette.len();
        Ok(Some(BufferBinding {
            buffer: self.ring.buffer(),
            offset: self.ring.instance_offset(first)?,
        }))
    }

    /// Releases the allocation.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        self.ring.destroy(device);
    }
}
