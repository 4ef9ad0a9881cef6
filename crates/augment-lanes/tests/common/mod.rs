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

//! Shared fixtures for the render module tests: a scripted model provider
//! and helpers that drive a module through its lifecycle on a headless device.

#![allow(dead_code)]

use augment_core::ar::{AnchorState, FrameInput, GeometricEntity, PathSegmentAnchor};
use augment_core::asset::{primitives, AssetCompletion, MeshAsset, ModelProvider};
use augment_core::math::{Mat4, Vec3};
use augment_core::renderer::{
    GraphicsDevice, LoadAction, RenderDestination, RenderPassDescriptor,
};
use augment_infra::{HeadlessDevice, RecordedCommandBuffer};
use augment_lanes::{RenderModule, RenderPass, SharedBindings};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Answers every request with a cube unless told otherwise.
#[derive(Default)]
pub struct TestProvider {
    pub models: HashMap<Uuid, MeshAsset>,
    pub general: Option<MeshAsset>,
    pub missing: HashSet<Uuid>,
    pub missing_general: bool,
    pub threaded: bool,
    pub requests: Mutex<Vec<(String, Option<Uuid>)>>,
}

impl TestProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threaded(mut self) -> Self {
        self.threaded = true;
        self
    }

    pub fn with_model(mut self, id: Uuid, asset: MeshAsset) -> Self {
        self.models.insert(id, asset);
        self
    }

    pub fn with_general(mut self, asset: MeshAsset) -> Self {
        self.general = Some(asset);
        self
    }

    pub fn without(mut self, id: Uuid) -> Self {
        self.missing.insert(id);
        self
    }

    pub fn without_general(mut self) -> Self {
        self.missing_general = true;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn resolve(&self, type_tag: &str, identifier: Option<Uuid>) -> Option<MeshAsset> {
        match identifier {
            Some(id) if self.missing.contains(&id) => None,
            Some(id) => Some(
                self.models
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| primitives::cube(&format!("{type_tag} {id}"))),
            ),
            None if self.missing_general => None,
            None => Some(
                self.general
                    .clone()
                    .unwrap_or_else(|| primitives::cube(&format!("{type_tag} general"))),
            ),
        }
    }
}

impl ModelProvider for TestProvider {
    fn load_asset(&self, type_tag: &str, identifier: Option<Uuid>, completion: AssetCompletion) {
        self.requests.lock().unwrap().push((type_tag.to_string(), identifier));
        let asset = self.resolve(type_tag, identifier);
        if self.threaded {
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(5));
                completion(asset);
            });
        } else {
            completion(asset);
        }
    }
}

pub fn anchor_at(position: Vec3) -> GeometricEntity {
    GeometricEntity::augmented(AnchorState::new(Mat4::from_translation(position)))
}

pub fn anchor_with(id: Uuid, position: Vec3) -> GeometricEntity {
    GeometricEntity::augmented(AnchorState::new(Mat4::from_translation(position)).with_identifier(id))
}

pub fn path_point(path: Uuid, sequence: u32, position: Vec3) -> GeometricEntity {
    GeometricEntity::PathSegment(PathSegmentAnchor {
        state: AnchorState::new(Mat4::from_translation(position)),
        path_identifier: path,
        sequence,
    })
}

/// A device plus the two passes modules build their groups into.
pub struct Harness {
    pub device: HeadlessDevice,
    pub main: RenderPass,
    pub shadow: RenderPass,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_device(HeadlessDevice::new())
    }

    pub fn with_device(device: HeadlessDevice) -> Self {
        let destination = RenderDestination::default();
        Self {
            device,
            main: RenderPass::main(&destination),
            shadow: RenderPass::shadow(),
        }
    }

    pub fn shared_device(&self) -> Arc<dyn GraphicsDevice> {
        Arc::new(self.device.clone())
    }

    /// Runs buffers, assets and both pipelines, waiting for the asset load.
    pub fn boot(
        &mut self,
        module: &mut dyn RenderModule,
        entities: &[GeometricEntity],
        provider: &dyn ModelProvider,
    ) {
        let identifier = module.identifier();
        module.initialize_buffers(Some(self.shared_device()), 3, identifier.max_instance_count());

        let (tx, rx) = crossbeam_channel::bounded(1);
        module.load_assets(entities, provider, Box::new(move || {
            let _ = tx.send(());
        }));
        rx.recv_timeout(Duration::from_secs(5)).expect("asset load never completed");

        let library = self.device.create_default_library().ok();
        let destination = RenderDestination::default();
        let main = module.load_pipeline(entities, library, &destination, &self.main.template);
        self.main.add_groups(main);
        let shadow = module.load_pipeline(entities, library, &destination, &self.shadow.template);
        self.shadow.add_groups(shadow);
    }

    /// Updates `module` for `frame` and records its draws into a fresh command buffer.
    pub fn render(
        &self,
        module: &mut dyn RenderModule,
        frame: &FrameInput,
        buffer_index: usize,
        shadow: bool,
    ) -> RecordedCommandBuffer {
        module.update_buffer_state(buffer_index);
        module.update_buffers(frame, &self.main);
        self.encode(module, shadow)
    }

    /// Records the draws of an already updated module.
    pub fn encode(&self, module: &dyn RenderModule, shadow: bool) -> RecordedCommandBuffer {
        let pass = if shadow { &self.shadow } else { &self.main };
        let mut encoder = self.device.create_command_encoder(Some("test frame"));
        {
            let descriptor = RenderPassDescriptor {
                label: Some(pass.template.label.clone().into()),
                color_target: None,
                depth_target: None,
                depth_load: LoadAction::Clear(1.0),
            };
            let mut render = encoder.begin_render_pass(&descriptor);
            module.draw(&mut *render, pass, &SharedBindings::default());
        }
        encoder.finish();
        self.device
            .take_command_buffers()
            .pop()
            .expect("the encoder registers its command buffer")
    }
}

pub fn frame_with(entities: Vec<GeometricEntity>) -> FrameInput {
    FrameInput {
        entities,
        ..FrameInput::default()
    }
}
