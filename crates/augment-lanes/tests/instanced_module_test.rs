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

use augment_core::ar::{EnvironmentProbe, ProbeAssociation};
use augment_core::asset::{primitives, AnimatedSkeleton, MeshAsset, SkinData};
use augment_core::diagnostics::{ErrorCategory, ErrorSeverity};
use augment_core::math::{Mat4, Quat, Vec3};
use augment_core::renderer::{BufferIndex, ModuleIdentifier, TextureId};
use augment_core::RendererConfig;
use augment_infra::{HeadlessDevice, RecordedCommand};
use augment_lanes::render_module::InstancedModelModule;
use augment_lanes::{ModuleState, RenderModule};
use common::{anchor_at, anchor_with, frame_with, Harness, TestProvider};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn indexed_draws(buffer: &augment_infra::RecordedCommandBuffer) -> Vec<(u32, u32)> {
    buffer
        .indexed_draws()
        .filter_map(|c| match c {
            RecordedCommand::DrawIndexed {
                base_instance,
                instance_count,
                ..
            } => Some((*base_instance, *instance_count)),
            _ => None,
        })
        .collect()
}

fn two_node_asset(name: &str) -> MeshAsset {
    let mut asset = primitives::cube(name);
    let mut second = asset.nodes[0].clone();
    second.name = format!("{name} second");
    asset.nodes.push(second);
    asset
}

fn skinned_asset() -> MeshAsset {
    let skeleton = Arc::new(AnimatedSkeleton {
        joint_paths: vec!["root".into(), "root/arm".into(), "root/arm/hand".into()],
        parent_indices: vec![None, Some(0), Some(1)],
        key_times: vec![0.0],
        translations: vec![vec![Vec3::ZERO; 3]],
        rotations: vec![vec![Quat::IDENTITY; 3]],
    });
    let skin = SkinData {
        skin_to_skeleton: vec![0, 1, 2],
        inverse_bind_transforms: vec![Mat4::IDENTITY; 3],
    };
    let mut asset = two_node_asset("skinned");
    for node in &mut asset.nodes {
        node.skin = Some(skin.clone());
        node.skeleton = Some(skeleton.clone());
    }
    asset
}

#[test]
fn anchors_beyond_render_distance_are_not_drawn() {
    let mut harness = Harness::new();
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    let mut entities = Vec::new();
    for i in 0..300 {
        let position = if i % 6 == 5 {
            Vec3::new(0.0, 0.0, -600.0 - i as f32)
        } else {
            Vec3::new((i % 10) as f32, 0.0, -((i / 10) as f32))
        };
        entities.push(anchor_at(position));
    }
    harness.boot(&mut module, &entities, &TestProvider::new());
    assert_eq!(module.state(), ModuleState::Ready);

    let commands = harness.render(&mut module, &frame_with(entities), 0, false);
    assert_eq!(module.instance_count(), 250);
    assert_eq!(indexed_draws(&commands), vec![(0, 250)]);
}

#[test]
fn render_distance_is_exclusive() {
    let mut harness = Harness::new();
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    let entities = vec![
        anchor_at(Vec3::new(0.0, 0.0, -500.0)),
        anchor_at(Vec3::new(0.0, 0.0, -499.5)),
    ];
    harness.boot(&mut module, &entities, &TestProvider::new());

    harness.render(&mut module, &frame_with(entities), 0, false);
    assert_eq!(module.instance_count(), 1);
}

#[test]
fn anchor_instances_are_capped() {
    let mut harness = Harness::new();
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    let entities: Vec<_> = (0..300).map(|i| anchor_at(Vec3::new(0.0, 0.0, -(i as f32) * 0.5))).collect();
    harness.boot(&mut module, &entities, &TestProvider::new());

    let commands = harness.render(&mut module, &frame_with(entities), 0, false);
    assert_eq!(module.instance_count(), 256);
    let general = ModuleIdentifier::Anchors.general_uuid();
    let state = module.group_frame_state(&general).unwrap();
    assert_eq!(state.draw_calls[0].instance_count, 256);
    assert_eq!(indexed_draws(&commands), vec![(0, 256)]);
}

#[test]
fn groups_occupy_contiguous_instance_ranges() {
    let mut harness = Harness::new();
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    let special = Uuid::new_v4();
    let entities = vec![
        anchor_at(Vec3::new(0.0, 0.0, -1.0)),
        anchor_with(special, Vec3::new(1.0, 0.0, -1.0)),
        anchor_at(Vec3::new(0.0, 1.0, -1.0)),
        anchor_with(special, Vec3::new(1.0, 1.0, -1.0)),
        anchor_at(Vec3::new(0.0, 2.0, -1.0)),
    ];
    let provider = TestProvider::new().with_general(two_node_asset("general"));
    harness.boot(&mut module, &entities, &provider);

    let commands = harness.render(&mut module, &frame_with(entities), 0, false);
    // Two nodes of three general instances plus one node of two special ones.
    assert_eq!(module.instance_count(), 8);

    let mut draws = indexed_draws(&commands);
    assert_eq!(draws.len(), 3);
    draws.sort();
    let mut next = 0;
    for (base, count) in &draws {
        assert_eq!(*base, next);
        next += count;
    }
    assert_eq!(next, 8);

    let general = module
        .group_frame_state(&ModuleIdentifier::Anchors.general_uuid())
        .unwrap();
    let bases: Vec<_> = general.draw_calls.iter().map(|d| d.base_instance).collect();
    assert_eq!(bases[1] - bases[0], 3);
}

#[test]
fn smallest_covering_probe_supplies_the_environment_texture() {
    let mut harness = Harness::new();
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    let id = Uuid::new_v4();
    let entities = vec![anchor_with(id, Vec3::new(0.0, 0.0, -2.0))];
    harness.boot(&mut module, &entities, &TestProvider::new());

    let probe = |extent: f32, texture: usize| ProbeAssociation {
        probe: EnvironmentProbe {
            identifier: Uuid::new_v4(),
            transform: Mat4::IDENTITY,
            extent: Vec3::splat(extent),
            texture: Some(TextureId(texture)),
        },
        related_anchors: HashSet::from([id]),
    };
    let mut frame = frame_with(entities);
    frame.environment.probes = vec![probe(10.0, 10), probe(2.0, 2)];

    harness.render(&mut module, &frame, 0, false);
    assert_eq!(module.environment_texture(), None);
    module.frame_encoding_complete(&[]);
    assert_eq!(module.environment_texture(), Some(TextureId(2)));
}

#[test]
fn missing_models_fall_back_and_complete_once() {
    let device = HeadlessDevice::new();
    let mut harness = Harness::with_device(device);
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    let entities: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| anchor_with(*id, Vec3::new(i as f32, 0.0, -3.0)))
        .collect();
    let provider = TestProvider::new().threaded().without(ids[1]).without(ids[3]);

    module.initialize_buffers(Some(harness.shared_device()), 3, 256);
    let completions = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = crossbeam_channel::unbounded();
    let counter = completions.clone();
    module.load_assets(
        &entities,
        &provider,
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        }),
    );
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(provider.request_count(), 6);
    assert_eq!(
        module.errors().count(ErrorSeverity::Warning, ErrorCategory::ModelNotFound),
        2
    );

    let groups = module.load_pipeline(
        &entities,
        Some(augment_core::renderer::ShaderLibraryId(0)),
        &Default::default(),
        &harness.main.template,
    );
    assert_eq!(groups.len(), 4);
    assert_eq!(module.state(), ModuleState::Ready);
    harness.main.add_groups(groups);

    harness.render(&mut module, &frame_with(entities), 0, false);
    assert_eq!(module.instance_count(), 5);
    let general = module
        .group_frame_state(&ModuleIdentifier::Anchors.general_uuid())
        .unwrap();
    assert_eq!(general.draw_calls[0].instance_count, 2);
}

#[test]
fn palette_overflow_skips_the_draw_and_warns_each_frame() {
    let mut harness = Harness::new();
    let config = RendererConfig {
        max_palette_size: 5,
        ..RendererConfig::default()
    };
    let mut module = InstancedModelModule::anchors(&config);
    let entities = vec![anchor_at(Vec3::new(0.0, 0.0, -1.0))];
    harness.boot(
        &mut module,
        &entities,
        &TestProvider::new().with_general(skinned_asset()),
    );

    let frame = frame_with(entities);
    let commands = harness.render(&mut module, &frame, 0, false);
    assert_eq!(indexed_draws(&commands).len(), 1);
    assert_eq!(commands.binds_at(BufferIndex::MeshPalettes.slot()), 1);

    let state = module
        .group_frame_state(&ModuleIdentifier::Anchors.general_uuid())
        .unwrap();
    assert!(state.draw_calls[0].palette.is_some());
    assert!(state.draw_calls[1].skip);
    assert_eq!(
        module.errors().count(ErrorSeverity::Warning, ErrorCategory::PaletteOverflow),
        1
    );

    harness.render(&mut module, &frame, 1, false);
    assert_eq!(
        module.errors().count(ErrorSeverity::Warning, ErrorCategory::PaletteOverflow),
        2
    );
    assert_eq!(module.state(), ModuleState::Ready);
}

#[test]
fn shadow_pass_draws_casters_without_materials() {
    let mut harness = Harness::new();
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    let caster = Uuid::new_v4();
    let entities = vec![
        anchor_at(Vec3::new(0.0, 0.0, -1.0)),
        anchor_with(caster, Vec3::new(1.0, 0.0, -1.0)),
    ];
    let entities: Vec<_> = entities
        .into_iter()
        .map(|mut e| {
            if let augment_core::ar::GeometricEntity::Augmented(a) = &mut e {
                a.state.generates_shadows = a.state.identifier == Some(caster);
            }
            e
        })
        .collect();
    harness.boot(&mut module, &entities, &TestProvider::new());
    assert_eq!(harness.main.groups_for(ModuleIdentifier::Anchors).count(), 2);
    assert_eq!(harness.shadow.groups_for(ModuleIdentifier::Anchors).count(), 1);

    let main = harness.render(&mut module, &frame_with(entities), 0, false);
    assert_eq!(indexed_draws(&main).len(), 2);
    assert!(main.binds_at(BufferIndex::MaterialUniforms.slot()) > 0);

    let shadow = harness.encode(&module, true);
    assert_eq!(indexed_draws(&shadow).len(), 1);
    assert_eq!(shadow.binds_at(BufferIndex::MaterialUniforms.slot()), 0);
    assert_eq!(shadow.binds_at(BufferIndex::EnvironmentUniforms.slot()), 0);

    let pipeline = shadow
        .commands
        .iter()
        .find_map(|c| match c {
            RecordedCommand::SetPipeline(id) => Some(*id),
            _ => None,
        })
        .unwrap();
    let functions = harness.device.pipeline_functions(pipeline).unwrap();
    assert_eq!(functions.vertex, "anchorGeometryShadowVertexTransform");
}

#[test]
fn missing_main_fragment_function_disables_the_module() {
    let device = HeadlessDevice::new();
    device.remove_function("anchorGeometryFragmentLightingPBR");
    let mut harness = Harness::with_device(device);
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    let entities = vec![anchor_at(Vec3::new(0.0, 0.0, -1.0))];
    harness.boot(&mut module, &entities, &TestProvider::new());

    assert_eq!(module.state(), ModuleState::Disabled);
    assert_eq!(
        module
            .errors()
            .count(ErrorSeverity::Serious, ErrorCategory::PipelineInitializationFailed),
        1
    );
    let commands = harness.render(&mut module, &frame_with(entities), 0, false);
    assert_eq!(module.instance_count(), 0);
    assert!(indexed_draws(&commands).is_empty());
}

#[test]
fn missing_shadow_function_only_warns() {
    let device = HeadlessDevice::new();
    device.remove_function("anchorGeometryShadowVertexTransform");
    let mut harness = Harness::with_device(device);
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    let mut entity = anchor_at(Vec3::new(0.0, 0.0, -1.0));
    if let augment_core::ar::GeometricEntity::Augmented(a) = &mut entity {
        a.state.generates_shadows = true;
    }
    harness.boot(&mut module, &[entity], &TestProvider::new());

    assert_eq!(module.state(), ModuleState::Ready);
    assert_eq!(harness.shadow.groups_for(ModuleIdentifier::Anchors).count(), 0);
    assert_eq!(
        module
            .errors()
            .count(ErrorSeverity::Warning, ErrorCategory::PipelineInitializationFailed),
        1
    );
}

#[test]
fn missing_library_or_device_disables_the_module() {
    let device = HeadlessDevice::new();
    device.remove_library();
    let mut harness = Harness::with_device(device);
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    harness.boot(&mut module, &[], &TestProvider::new());
    assert_eq!(module.state(), ModuleState::Disabled);

    let mut orphan = InstancedModelModule::trackers(&RendererConfig::default());
    orphan.initialize_buffers(None, 3, 64);
    assert_eq!(orphan.state(), ModuleState::Disabled);
    assert_eq!(
        orphan.errors().count(ErrorSeverity::Serious, ErrorCategory::DeviceNotFound),
        1
    );
}

#[test]
fn main_pass_without_a_color_attachment_disables_the_module() {
    let mut harness = Harness::new();
    harness.main.template.color_format = None;
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    harness.boot(&mut module, &[anchor_at(Vec3::ZERO)], &TestProvider::new());

    assert_eq!(module.state(), ModuleState::Disabled);
    assert_eq!(
        module.errors().count(ErrorSeverity::Serious, ErrorCategory::RenderPassUnavailable),
        1
    );
    assert!(harness.main.draw_call_groups.is_empty());
}

#[test]
fn anchors_without_a_general_model_are_disabled() {
    let mut harness = Harness::new();
    let mut module = InstancedModelModule::anchors(&RendererConfig::default());
    harness.boot(&mut module, &[], &TestProvider::new().without_general());

    assert_eq!(module.state(), ModuleState::Disabled);
    assert_eq!(
        module.errors().count(ErrorSeverity::Serious, ErrorCategory::ModelNotFound),
        1
    );
}

#[test]
fn surfaces_fall_back_to_a_plane() {
    let mut harness = Harness::new();
    let mut module = InstancedModelModule::surfaces(&RendererConfig::default());
    harness.boot(&mut module, &[], &TestProvider::new().without_general());

    assert_eq!(module.state(), ModuleState::Ready);
    assert_eq!(
        module.errors().count(ErrorSeverity::Warning, ErrorCategory::ModelNotFound),
        1
    );
    assert_eq!(harness.main.groups_for(ModuleIdentifier::Surfaces).count(), 1);
}

#[test]
fn ring_slots_advance_with_the_buffer_index() {
    let mut harness = Harness::new();
    let mut module = InstancedModelModule::unanchored(&RendererConfig::default());
    harness.boot(&mut module, &[], &TestProvider::new());

    module.update_buffer_state(0);
    let first = module.instance_binding().unwrap();
    module.update_buffer_state(1);
    let second = module.instance_binding().unwrap();
    assert_eq!(first.buffer, second.buffer);
    assert!(second.offset > first.offset);
    assert_eq!(second.offset % 256, 0);
}
