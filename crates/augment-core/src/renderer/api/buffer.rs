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

//! Defines data structures related to GPU buffer resources.

use std::borrow::Cow;

/// A set of flags describing the allowed usages of a [`BufferId`].
///
/// The device uses them to pick a memory placement and to validate that the
/// buffer is bound the way it was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferUsage {
    bits: u32,
}

impl BufferUsage {
    /// No usage.
    pub const NONE: Self = Self { bits: 0 };
    /// The buffer can be used as the destination of a CPU write.
    pub const COPY_DST: Self = Self { bits: 1 << 0 };
    /// The buffer can be bound as a vertex buffer.
    pub const VERTEX: Self = Self { bits: 1 << 1 };
    /// The buffer can be bound as an index buffer.
    pub const INDEX: Self = Self { bits: 1 << 2 };
    /// The buffer can be bound as a uniform buffer.
    pub const UNIFORM: Self = Self { bits: 1 << 3 };
    /// The buffer can be bound as a read/write storage buffer.
    pub const STORAGE: Self = Self { bits: 1 << 4 };

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether every flag of `other` is set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for BufferUsage {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Where the memory backing a buffer lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageMode {
    /// Visible to both CPU and GPU. Used for every per-frame uniform ring.
    #[default]
    Shared,
    /// GPU-only memory, filled once at creation.
    Private,
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// A bitmask of [`BufferUsage`] flags describing how the buffer will be used.
    pub usage: BufferUsage,
    /// The storage mode hint for the allocation.
    pub storage_mode: StorageMode,
}

impl<'a> BufferDescriptor<'a> {
    /// Describes a CPU-writable uniform allocation of `size` bytes.
    pub fn uniform(label: impl Into<Cow<'a, str>>, size: u64) -> Self {
        Self {
            label: Some(label.into()),
            size,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            storage_mode: StorageMode::Shared,
        }
    }
}

/// An opaque handle to a GPU buffer resource.
///
/// This ID is returned by [`GraphicsDevice::create_buffer`](crate::renderer::GraphicsDevice::create_buffer)
/// and is used to reference the buffer in all subsequent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// A buffer plus the byte offset a binding starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferBinding {
    /// The bound buffer.
    pub buffer: BufferId,
    /// Byte offset of the binding.
    pub offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_flags_combine() {
        let usage = BufferUsage::UNIFORM | BufferUsage::COPY_DST;
        assert!(usage.contains(BufferUsage::UNIFORM));
        assert!(usage.contains(BufferUsage::COPY_DST));
        assert!(!usage.contains(BufferUsage::VERTEX));
    }

    #[test]
    fn uniform_descriptor_is_shared_and_writable() {
        let desc = BufferDescriptor::uniform("Anchor Instances", 512);
        assert_eq!(desc.storage_mode, StorageMode::Shared);
        assert!(desc.usage.contains(BufferUsage::COPY_DST));
        assert_eq!(desc.label.as_deref(), Some("Anchor Instances"));
    }
}
