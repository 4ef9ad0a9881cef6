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

mod common;

use augment_core::ar::{CapturedImage, GeometricEntity};
use augment_core::math::{Mat3, Vec3};
use augment_core::renderer::{
    BufferId, BufferIndex, CameraPlaneVertex, CommandEncoder, ComputePassDescriptor,
    GraphicsDevice, ModuleIdentifier, PrecalculatedParameters, PrimitiveType, TextureId,
};
use augment_core::RendererConfig;
use augment_infra::RecordedCommand;
use augment_lanes::precalculation::section_start;
use augment_lanes::render_module::{
    quad_vertices, CameraPlaneModule, InstancedModelModule, PathsModule, SharedBuffersModule, TrackingPointsModule,
};
use augment_lanes::{ComputeModule, ModuleState, PrecalculationModule, RenderModule, SharedBindings};
use common::{anchor_at, frame_with, path_point, Harness, TestProvider};
use uuid::Uuid;

fn draw_count(buffer: &augment_infra::RecordedCommandBuffer) -> usize {
    buffer
        .commands
        .iter()
        .filter(|c| matches!(c, RecordedCommand::Draw { .. } | RecordedCommand::DrawIndexed { .. }))
        .count()
}

#[test]
fn three_path_points_draw_two_segments() {
    let mut harness = Harness::new();
    let mut module = PathsModule::new(&RendererConfig::default());
    let path = Uuid::new_v4();
    let entities = vec![
        path_point(path, 2, Vec3::new(2.0, 0.0, -1.0)),
        path_point(path, 0, Vec3::new(0.0, 0.0, -1.0)),
        path_point(path, 1, Vec3::new(1.0, 0.0, -1.0)),
    ];
    harness.boot(&mut module, &entities, &TestProvider::new());
    assert_eq!(module.state(), ModuleState::Ready);
    assert_eq!(harness.main.groups_for(ModuleIdentifier::Paths).count(), 1);
    assert_eq!(harness.shadow.groups_for(ModuleIdentifier::Paths).count(), 0);

    let commands = harness.render(&mut module, &frame_with(entities), 0, false);
    assert_eq!(module.instance_count(), 2);
    let draws: Vec<_> = commands.indexed_draws().collect();
    assert_eq!(draws.len(), 1);
    assert!(matches!(
        draws[0],
        RecordedCommand::DrawIndexed { instance_count: 2, base_instance: 0, .. }
    ));
}

#[test]
fn a_single_point_draws_nothing() {
    let mut harness = Harness::new();
    let mut module = PathsModule::new(&RendererConfig::default());
    let entities = vec![path_point(Uuid::new_v4(), 0, Vec3::ZERO)];
    harness.boot(&mut module, &entities, &TestProvider::new());

    let commands = harness.render(&mut module, &frame_with(entities), 0, false);
    assert_eq!(module.instance_count(), 0);
    assert_eq!(draw_count(&commands), 0);
}

#[test]
fn camera_plane_draws_the_captured_image() {
    let mut harness = Harness::new();
    let mut module = CameraPlaneModule::new();
    harness.boot(&mut module, &[], &TestProvider::new());
    assert_eq!(module.state(), ModuleState::Ready);

    let mut frame = frame_with(Vec::new());
    frame.camera.display_transform = Mat3::from_cols(
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 1.0),
    );
    let written = harness.device.bytes_written();
    let commands = harness.render(&mut module, &frame, 0, false);
    assert!(harness.device.bytes_written() > written);
    assert_eq!(draw_count(&commands), 0);

    frame.camera.captured_image = Some(CapturedImage {
        luma: TextureId(7),
        chroma: TextureId(8),
    });
    let commands = harness.render(&mut module, &frame, 1, false);
    assert!(commands.commands.iter().any(|c| matches!(
        c,
        RecordedCommand::Draw { primitive: PrimitiveType::TriangleStrip, .. }
    )));
    harness.render(&mut module, &frame, 2, false);

    // Every slot holds the quad now; nothing changes until the viewport does.
    let written = harness.device.bytes_written();
    harness.render(&mut module, &frame, 3, false);
    assert_eq!(harness.device.bytes_written(), written);

    let shadow = harness.encode(&module, true);
    assert_eq!(draw_count(&shadow), 0);
}

fn quad_binding(commands: &augment_infra::RecordedCommandBuffer) -> (BufferId, u64) {
    commands
        .commands
        .iter()
        .find_map(|c| match c {
            RecordedCommand::SetVertexBuffer { slot, buffer, offset }
                if *slot == BufferIndex::MeshPositions.slot() =>
            {
                Some((*buffer, *offset))
            }
            _ => None,
        })
        .unwrap()
}

#[test]
fn viewport_change_leaves_quads_of_frames_in_flight_alone() {
    let mut harness = Harness::new();
    let mut module = CameraPlaneModule::new();
    harness.boot(&mut module, &[], &TestProvider::new());

    let rotated = Mat3::from_cols(
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 1.0),
    );
    let mut frame = frame_with(Vec::new());
    frame.camera.display_transform = rotated;
    frame.camera.captured_image = Some(CapturedImage {
        luma: TextureId(7),
        chroma: TextureId(8),
    });
    let (buffer, first_offset) = quad_binding(&harness.render(&mut module, &frame, 0, false));

    frame.camera.display_transform = Mat3::IDENTITY;
    frame.camera.viewport_size_did_change = true;
    let (same_buffer, second_offset) = quad_binding(&harness.render(&mut module, &frame, 1, false));
    assert_eq!(buffer, same_buffer);
    assert_ne!(first_offset, second_offset);

    let in_flight: Vec<CameraPlaneVertex> =
        harness.device.read_buffer(buffer, first_offset, 4).unwrap();
    let current: Vec<CameraPlaneVertex> =
        harness.device.read_buffer(buffer, second_offset, 4).unwrap();
    assert_eq!(in_flight, quad_vertices(&rotated).to_vec());
    assert_eq!(current, quad_vertices(&Mat3::IDENTITY).to_vec());
}

#[test]
fn shared_buffers_publish_camera_uniforms_once_written() {
    let mut harness = Harness::new();
    let mut module = SharedBuffersModule::new();
    harness.boot(&mut module, &[], &TestProvider::new());
    assert_eq!(module.state(), ModuleState::Ready);

    let mut shared = SharedBindings::default();
    module.contribute_shared(&mut shared);
    assert!(shared.shared_uniforms.is_none());

    module.update_buffer_state(0);
    module.update_buffers(&frame_with(Vec::new()), &harness.main);
    module.contribute_shared(&mut shared);
    assert!(shared.shared_uniforms.is_some());

    module.update_buffer_state(1);
    let mut next = SharedBindings::default();
    module.contribute_shared(&mut next);
    assert!(next.shared_uniforms.is_none());
}

#[test]
fn tracking_points_draw_the_feature_points() {
    let config = RendererConfig {
        debug_tracking_points: true,
        max_tracking_points: 3,
        ..RendererConfig::default()
    };
    let mut harness = Harness::new();
    let mut module = TrackingPointsModule::new(&config);
    harness.boot(&mut module, &[], &TestProvider::new());
    assert_eq!(module.state(), ModuleState::Ready);

    let mut frame = frame_with(Vec::new());
    frame.camera.raw_feature_points = (0..5).map(|i| Vec3::splat(i as f32)).collect();
    let commands = harness.render(&mut module, &frame, 0, false);
    assert_eq!(module.instance_count(), 3);
    assert!(commands.commands.iter().any(|c| matches!(
        c,
        RecordedCommand::Draw { primitive: PrimitiveType::Point, vertices, .. } if *vertices == (0..3)
    )));
}

#[test]
fn precalculation_fills_each_module_section() {
    let config = RendererConfig::default();
    let mut harness = Harness::new();
    let path = Uuid::new_v4();
    let entities: Vec<GeometricEntity> = vec![
        anchor_at(Vec3::new(0.0, 0.0, -1.0)),
        anchor_at(Vec3::new(0.0, 0.0, -2.0)),
        path_point(path, 0, Vec3::new(0.0, 0.0, -1.0)),
        path_point(path, 1, Vec3::new(0.0, 1.0, -1.0)),
        path_point(path, 2, Vec3::new(0.0, 2.0, -1.0)),
    ];
    let mut anchors = InstancedModelModule::anchors(&config);
    harness.boot(&mut anchors, &entities, &TestProvider::new());
    let mut paths = PathsModule::new(&config);
    harness.boot(&mut paths, &entities, &TestProvider::new());

    let mut module = PrecalculationModule::new(&config);
    module.initialize_buffers(Some(harness.shared_device()), 3, ModuleIdentifier::Precalculation.max_instance_count());
    module.load_pipeline(harness.device.create_default_library().ok());
    assert_eq!(module.state(), ModuleState::Ready);

    let frame = frame_with(entities);
    module.update_buffer_state(0);
    module.prepare(&frame, &harness.main);

    let paths_start = section_start(ModuleIdentifier::Paths).unwrap();
    assert_eq!(module.entry_count(), paths_start + 2);

    let binding = module.output_binding().unwrap();
    let entries: Vec<PrecalculatedParameters> = harness
        .device
        .read_buffer(binding.buffer, binding.offset, module.entry_count())
        .unwrap();
    assert_eq!(entries[0].has_geometry, 1);
    assert_eq!(entries[1].has_geometry, 1);
    assert_eq!(entries[2].has_geometry, 0);
    assert_eq!(entries[paths_start].has_geometry, 1);
    assert_eq!(entries[paths_start + 1].has_geometry, 1);

    let mut encoder = harness.device.create_command_encoder(Some("precalculation"));
    {
        let mut compute = encoder.begin_compute_pass(&ComputePassDescriptor::default());
        module.dispatch(&mut *compute);
    }
    encoder.finish();
    let buffer = harness.device.take_command_buffers().pop().unwrap();
    assert!(buffer.commands.contains(&RecordedCommand::SetComputeBuffer {
        slot: BufferIndex::PrecalculationOutputBuffer.slot(),
        buffer: binding.buffer,
        offset: binding.offset,
    }));
    assert!(buffer.commands.iter().any(|c| matches!(
        c,
        RecordedCommand::DispatchThreads { thread_count, threads_per_group: 64 }
            if *thread_count as usize == paths_start + 2
    )));
}

#[test]
fn precalculation_blanks_entries_left_by_a_larger_frame() {
    let config = RendererConfig::default();
    let mut harness = Harness::new();
    let crowd: Vec<GeometricEntity> = (1..=4)
        .map(|i| anchor_at(Vec3::new(0.0, 0.0, -(i as f32))))
        .collect();
    let mut anchors = InstancedModelModule::anchors(&config);
    harness.boot(&mut anchors, &crowd, &TestProvider::new());

    let mut module = PrecalculationModule::new(&config);
    module.initialize_buffers(Some(harness.shared_device()), 3, ModuleIdentifier::Precalculation.max_instance_count());
    module.load_pipeline(harness.device.create_default_library().ok());

    module.update_buffer_state(0);
    module.prepare(&frame_with(crowd.clone()), &harness.main);
    assert_eq!(module.entry_count(), 4);

    // Buffer index 3 lands on the same ring slot as 0.
    module.update_buffer_state(3);
    module.prepare(&frame_with(crowd[..1].to_vec()), &harness.main);
    assert_eq!(module.entry_count(), 1);

    let binding = module.output_binding().unwrap();
    let entries: Vec<PrecalculatedParameters> = harness
        .device
        .read_buffer(binding.buffer, binding.offset, ModuleIdentifier::Precalculation.max_instance_count())
        .unwrap();
    let flags: Vec<i32> = entries[..4].iter().map(|e| e.has_geometry).collect();
    assert_eq!(flags, vec![1, 0, 0, 0]);
    assert!(entries[1..].iter().all(|e| e.has_geometry == 0));
}

#[test]
fn precalculation_without_groups_binds_nothing() {
    let harness = Harness::new();
    let mut module = PrecalculationModule::new(&RendererConfig::default());
    module.initialize_buffers(Some(harness.shared_device()), 3, 0);
    module.load_pipeline(harness.device.create_default_library().ok());

    module.update_buffer_state(0);
    module.prepare(&frame_with(vec![anchor_at(Vec3::ZERO)]), &harness.main);
    assert_eq!(module.entry_count(), 0);
    assert!(module.output_binding().is_none());
}
