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

//! One-time module setup, run off the render thread.
//!
//! Buffers are allocated, models requested and pipelines compiled on a worker
//! thread. The modules travel to the worker and back inside the job, so the
//! render thread never observes a half-initialised module.

use augment_core::ar::GeometricEntity;
use augment_core::asset::ModelProvider;
use augment_core::renderer::{GraphicsDevice, ModuleIdentifier, RenderDestination};
use augment_lanes::{
    ComputeModule, DrawCallGroup, PrecalculationModule, RenderModule, RenderPassTemplate,
};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything the worker needs, moved onto it.
pub(crate) struct BootstrapJob {
    pub device: Arc<dyn GraphicsDevice>,
    pub provider: Arc<dyn ModelProvider>,
    pub entities: Vec<GeometricEntity>,
    pub modules: Vec<Box<dyn RenderModule>>,
    pub precalculation: Option<PrecalculationModule>,
    pub destination: RenderDestination,
    pub main: RenderPassTemplate,
    pub shadow: Option<RenderPassTemplate>,
    pub max_in_flight_frames: usize,
    pub asset_timeout: Duration,
}

/// The modules handed back, with the groups they built.
pub(crate) struct BootstrapOutcome {
    pub modules: Vec<Box<dyn RenderModule>>,
    pub precalculation: Option<PrecalculationModule>,
    pub main_groups: Vec<DrawCallGroup>,
    pub shadow_groups: Vec<DrawCallGroup>,
    pub elapsed: Duration,
}

/// Starts the worker. The outcome arrives on the returned channel.
pub(crate) fn spawn(job: BootstrapJob) -> std::io::Result<Receiver<BootstrapOutcome>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::Builder::new()
        .name("augment-bootstrap".to_string())
        .spawn(move || {
            let outcome = run(job);
            if tx.send(outcome).is_err() {
                log::warn!("Bootstrap finished after the render agent went away");
            }
        })?;
    Ok(rx)
}

fn wait_for_assets(
    modules: &mut [Box<dyn RenderModule>],
    entities: &[GeometricEntity],
    provider: &dyn ModelProvider,
    timeout: Duration,
) {
    let (tx, rx) = crossbeam_channel::unbounded::<ModuleIdentifier>();
    for module in modules.iter_mut() {
        let tx = tx.clone();
        let identifier = module.identifier();
        module.load_assets(
            entities,
            provider,
            Box::new(move || {
                let _ = tx.send(identifier);
            }),
        );
    }
    drop(tx);

    let mut pending: Vec<ModuleIdentifier> = modules.iter().map(|m| m.identifier()).collect();
    let deadline = Instant::now() + timeout;
    while !pending.is_empty() {
        match rx.recv_deadline(deadline) {
            Ok(identifier) => {
                log::debug!("{identifier} assets loaded");
                pending.retain(|p| *p != identifier);
            }
            Err(e) => {
                log::warn!("Giving up on assets of {pending:?}: {e}");
                break;
            }
        }
    }
}

fn run(job: BootstrapJob) -> BootstrapOutcome {
    let started = Instant::now();
    let BootstrapJob {
        device,
        provider,
        entities,
        mut modules,
        mut precalculation,
        destination,
        main,
        shadow,
        max_in_flight_frames,
        asset_timeout,
    } = job;
    log::info!("Bootstrapping {} render modules", modules.len());

    for module in modules.iter_mut() {
        let max_instances = module.identifier().max_instance_count();
        module.initialize_buffers(Some(device.clone()), max_in_flight_frames, max_instances);
    }
    if let Some(precalculation) = precalculation.as_mut() {
        precalculation.initialize_buffers(
            Some(device.clone()),
            max_in_flight_frames,
            ModuleIdentifier::Precalculation.max_instance_count(),
        );
    }

    wait_for_assets(&mut modules, &entities, &*provider, asset_timeout);
    log::info!("Assets resolved after {:?}", started.elapsed());

    let library = match device.create_default_library() {
        Ok(library) => Some(library),
        Err(e) => {
            log::error!("No shader library: {e}");
            None
        }
    };

    let mut main_groups = Vec::new();
    let mut shadow_groups = Vec::new();
    for module in modules.iter_mut() {
        main_groups.extend(module.load_pipeline(&entities, library, &destination, &main));
        if let Some(shadow) = &shadow {
            shadow_groups.extend(module.load_pipeline(&entities, library, &destination, shadow));
        }
    }
    if let Some(precalculation) = precalculation.as_mut() {
        precalculation.load_pipeline(library);
    }

    let elapsed = started.elapsed();
    log::info!(
        "Bootstrap complete in {elapsed:?}: {} main groups, {} shadow groups",
        main_groups.len(),
        shadow_groups.len()
    );
    BootstrapOutcome {
        modules,
        precalculation,
        main_groups,
        shadow_groups,
        elapsed,
    }
}
