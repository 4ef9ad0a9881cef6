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

use augment_core::renderer::{aligned_stride, AnchorEffectsUniforms, GraphicsDevice, UniformRingBuffer, GPU_IDENTITY};
use augment_infra::HeadlessDevice;

fn effects(alpha: f32) -> AnchorEffectsUniforms {
    AnchorEffectsUniforms::new(alpha, 0.0, [1.0, 1.0, 1.0], GPU_IDENTITY)
}

#[test]
fn ring_allocates_one_aligned_slot_per_frame() {
    let device = HeadlessDevice::new();
    let ring = UniformRingBuffer::<AnchorEffectsUniforms>::new(&device, "effects", 10, 3).unwrap();

    let stride = std::mem::size_of::<AnchorEffectsUniforms>() as u64;
    assert_eq!(ring.slot_size(), aligned_stride(stride * 10));
    assert_eq!(
        device.buffer_contents(ring.buffer()).map(|b| b.len() as u64),
        Some(ring.slot_size() * 3)
    );
}

#[test]
fn frames_never_overwrite_each_others_slot() {
    let device = HeadlessDevice::new();
    let depth = 3;
    let mut ring = UniformRingBuffer::<AnchorEffectsUniforms>::new(&device, "effects", 4, depth).unwrap();

    // Frames 0..depth are all in flight at once.
    for frame in 0..depth {
        ring.update(frame);
        ring.write(&device, 2, &effects(frame as f32)).unwrap();
    }

    for frame in 0..depth {
        ring.update(frame);
        let offset = ring.instance_offset(2).unwrap();
        let read = device
            .read_buffer::<AnchorEffectsUniforms>(ring.buffer(), offset, 1)
            .unwrap();
        assert_eq!(read[0].alpha, frame as f32);
    }
}

#[test]
fn slot_index_wraps_with_the_frame_index() {
    let device = HeadlessDevice::new();
    let mut ring = UniformRingBuffer::<AnchorEffectsUniforms>::new(&device, "effects", 1, 3).unwrap();

    ring.update(1);
    let first = ring.slot_offset();
    ring.update(4);
    assert_eq!(ring.current_slot_index(), 1);
    assert_eq!(ring.slot_offset(), first);
}

#[test]
fn writes_beyond_capacity_are_refused() {
    let device = HeadlessDevice::new();
    let ring = UniformRingBuffer::<AnchorEffectsUniforms>::new(&device, "effects", 2, 1).unwrap();
    assert!(ring.write(&device, 2, &effects(1.0)).is_err());
    assert!(ring.write_slice(&device, 1, &[effects(1.0), effects(1.0)]).is_err());
    assert_eq!(device.bytes_written(), 0);
}

#[test]
fn destroy_releases_the_allocation() {
    let device = HeadlessDevice::new();
    let ring = UniformRingBuffer::<AnchorEffectsUniforms>::new(&device, "effects", 2, 2).unwrap();
    let id = ring.buffer();
    ring.destroy(&device);
    assert!(device.buffer_contents(id).is_none());
    assert!(device.destroy_buffer(id).is_err());
}
