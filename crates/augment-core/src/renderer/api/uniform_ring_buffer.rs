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

//! Frame-sliced ring buffer for per-instance GPU uniform data.
//!
//! A [`UniformRingBuffer`] is a single allocation split into one slot per
//! frame in flight. Each slot holds up to `capacity` instances of `T`:
//!
//! ```text
//! | slot 0: T T T ... pad | slot 1: T T T ... pad | slot 2: T T T ... pad |
//!   ^ frame % 3 == 0        ^ frame % 3 == 1        ^ frame % 3 == 2
//! ```
//!
//! The slot size is rounded to the 256-byte constant-buffer alignment. The CPU
//! only ever writes into the slot selected by [`UniformRingBuffer::update`];
//! the frame pacer guarantees the GPU is done reading it.

use crate::renderer::{
    api::buffer::{BufferBinding, BufferDescriptor, BufferId, BufferUsage},
    error::ResourceError,
    traits::GraphicsDevice,
};
use bytemuck::Pod;
use std::marker::PhantomData;

/// Rounds `size` to the constant-buffer alignment.
///
/// The result always grows by at least one alignment unit, so a size that is
/// already a multiple of 256 still receives an extra 256 bytes.
#[inline]
pub const fn aligned_stride(size: u64) -> u64 {
    (size & !0xFF) + 0x100
}

/// A ring of uniform slots, one per frame in flight.
#[derive(Debug)]
pub struct UniformRingBuffer<T: Pod> {
    buffer: BufferId,
    capacity: usize,
    slot_count: usize,
    slot_size: u64,
    current_index: usize,
    label: &'static str,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformRingBuffer<T> {
    /// Size in bytes of one `T` inside a slot.
    pub const STRIDE: u64 = std::mem::size_of::<T>() as u64;

    /// Allocates the ring.
    ///
    /// # Arguments
    ///
    /// * `device` - The graphics device to allocate on.
    /// * `label` - A debug label for the allocation.
    /// * `capacity` - Maximum number of instances per slot.
    /// * `slot_count` - Number of frames in flight.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the allocation fails.
    pub fn new(
        device: &dyn GraphicsDevice,
        label: &'static str,
        capacity: usize,
        slot_count: usize,
    ) -> Result<Self, ResourceError> {
        Self::with_usage(device, label, capacity, slot_count, BufferUsage::UNIFORM)
    }

    /// Allocates a ring whose buffer is also bound as `usage`, e.g. vertex data
    /// that changes between frames.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the allocation fails.
    pub fn with_usage(
        device: &dyn GraphicsDevice,
        label: &'static str,
        capacity: usize,
        slot_count: usize,
        usage: BufferUsage,
    ) -> Result<Self, ResourceError> {
        let slot_count = slot_count.max(1);
        let slot_size = aligned_stride(Self::STRIDE * capacity as u64);
        let mut descriptor = BufferDescriptor::uniform(label, slot_size * slot_count as u64);
        descriptor.usage = usage | BufferUsage::COPY_DST;
        let buffer = device.create_buffer(&descriptor)?;

        log::debug!(
            "UniformRingBuffer({label}) allocated {slot_count} slots of {slot_size} bytes ({capacity} x {} bytes)",
            Self::STRIDE
        );

        Ok(Self {
            buffer,
            capacity,
            slot_count,
            slot_size,
            current_index: 0,
            label,
            _marker: PhantomData,
        })
    }

    /// Selects the slot for `buffer_index`.
    ///
    /// Pure address arithmetic; nothing is sent to the device.
    pub fn update(&mut self, buffer_index: usize) {
        self.current_index = buffer_index % self.slot_count;
    }

    /// Byte offset of the current slot inside the allocation.
    #[inline]
    pub fn slot_offset(&self) -> u64 {
        self.slot_size * self.current_index as u64
    }

    /// Binding of the current slot, as passed to the encoder.
    #[inline]
    pub fn binding(&self) -> BufferBinding {
        BufferBinding {
            buffer: self.buffer,
            offset: self.slot_offset(),
        }
    }

    /// Byte offset of instance `index` inside the current slot.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::OutOfBounds`] if `index` is not below the capacity.
    pub fn instance_offset(&self, index: usize) -> Result<u64, ResourceError> {
        if index >= self.capacity {
            return Err(ResourceError::OutOfBounds);
        }
        Ok(self.slot_offset() + Self::STRIDE * index as u64)
    }

    /// Writes `value` at instance `index` of the current slot.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::OutOfBounds`] past the capacity, or the device error.
    pub fn write(
        &self,
        device: &dyn GraphicsDevice,
        index: usize,
        value: &T,
    ) -> Result<(), ResourceError> {
        let offset = self.instance_offset(index)?;
        device.write_buffer(self.buffer, offset, bytemuck::bytes_of(value))
    }

    /// Writes a contiguous run of instances starting at `first`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::OutOfBounds`] if the run does not fit the slot.
    pub fn write_slice(
        &self,
        device: &dyn GraphicsDevice,
        first: usize,
        values: &[T],
    ) -> Result<(), ResourceError> {
        if values.is_empty() {
            return Ok(());
        }
        if first + values.len() > self.capacity {
            return Err(ResourceError::OutOfBounds);
        }
        let offset = self.instance_offset(first)?;
        device.write_buffer(self.buffer, offset, bytemuck::cast_slice(values))
    }

    /// Releases the allocation.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Err(e) = device.destroy_buffer(self.buffer) {
            log::warn!("UniformRingBuffer({}) failed to release: {e}", self.label);
        }
    }

    /// The backing buffer.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Instances per slot.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Size of one slot in bytes.
    pub fn slot_size(&self) -> u64 {
        self.slot_size
    }

    /// The current slot index (for debugging/telemetry).
    pub fn current_slot_index(&self) -> usize {
        self.current_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_rounds_to_next_256_boundary() {
        assert_eq!(aligned_stride(0), 256);
        assert_eq!(aligned_stride(1), 256);
        assert_eq!(aligned_stride(255), 256);
        assert_eq!(aligned_stride(256), 512);
        assert_eq!(aligned_stride(384 * 256), 384 * 256 + 256);
    }
}
