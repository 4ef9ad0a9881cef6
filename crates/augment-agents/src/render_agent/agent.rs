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

//! Defines the RenderAgent, the central orchestrator for the rendering subsystem.

use super::bootstrap::{self, BootstrapJob, BootstrapOutcome};
use super::draw_counter::CountingEncoder;
use super::frame_pacer::{FramePacer, FrameSlot};
use super::stats::FrameStats;
use anyhow::{anyhow, bail, Context, Result};
use augment_core::ar::{FrameInput, GeometricEntity};
use augment_core::asset::ModelProvider;
use augment_core::config::RendererConfig;
use augment_core::diagnostics::{ErrorSeverity, RenderModuleError};
use augment_core::renderer::{
    CommandBufferId, ComputePassDescriptor, GraphicsDevice, LoadAction, ModuleIdentifier,
    RenderDestination, RenderPassDescriptor, TextureId,
};
use augment_lanes::render_module::{
    CameraPlaneModule, InstancedModelModule, PathsModule, SharedBuffersModule, TrackingPointsModule,
};
use augment_lanes::{
    ComputeModule, ModuleState, PrecalculationModule, RenderModule, RenderPass, SharedBindings,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long the bootstrap waits for the model provider.
const DEFAULT_ASSET_TIMEOUT: Duration = Duration::from_secs(30);

const MAIN_PASS: usize = 0;
const SHADOW_PASS: usize = 1;

/// Attachments of the frame being encoded, owned by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTargets {
    /// Drawable color texture.
    pub color: Option<TextureId>,
    /// Depth texture of the main pass.
    pub depth: Option<TextureId>,
}

/// A frame whose commands are ready for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedFrame {
    #[allow(missing_docs)]
    pub slot: FrameSlot,
    /// The commands to submit. Report `slot.frame_index` back once the GPU is done.
    pub command_buffer: CommandBufferId,
}

enum BootstrapState {
    Idle,
    Running(Receiver<BootstrapOutcome>),
    Ready,
    Failed,
}

/// The agent responsible for driving every render module through a frame.
///
/// Setup runs once on a worker thread (see [`start_bootstrap`](Self::start_bootstrap));
/// afterwards [`render_frame`](Self::render_frame) encodes one frame at a time on the
/// calling thread, in ascending render layer order.
pub struct RenderAgent {
    config: RendererConfig,
    device: Arc<dyn GraphicsDevice>,
    destination: RenderDestination,
    modules: Vec<Box<dyn RenderModule>>,
    precalculation: Option<PrecalculationModule>,
    /// The main pass, followed by the shadow pass when shadows are enabled.
    passes: Vec<RenderPass>,
    pacer: FramePacer,
    stats: FrameStats,
    bootstrap: BootstrapState,
    asset_timeout: Duration,
}

impl RenderAgent {
    /// Creates an agent with the module set `config` asks for.
    pub fn new(device: Arc<dyn GraphicsDevice>, config: RendererConfig) -> Self {
        Self::with_destination(device, config, RenderDestination::default())
    }

    /// Creates an agent rendering into attachments of `destination`'s formats.
    pub fn with_destination(
        device: Arc<dyn GraphicsDevice>,
        config: RendererConfig,
        destination: RenderDestination,
    ) -> Self {
        let mut modules: Vec<Box<dyn RenderModule>> = vec![
            Box::new(CameraPlaneModule::new()),
            Box::new(SharedBuffersModule::new()),
            Box::new(InstancedModelModule::surfaces(&config)),
            Box::new(InstancedModelModule::anchors(&config)),
            Box::new(InstancedModelModule::trackers(&config)),
            Box::new(InstancedModelModule::unanchored(&config)),
            Box::new(PathsModule::new(&config)),
        ];
        if config.debug_tracking_points {
            modules.push(Box::new(TrackingPointsModule::new(&config)));
        }
        modules.sort_by_key(|m| m.render_layer());

        let precalculation = config
            .precalculation_enabled
            .then(|| PrecalculationModule::new(&config));
        let mut passes = vec![RenderPass::main(&destination)];
        if config.shadows_enabled {
            passes.push(RenderPass::shadow());
        }

        Self {
            passes,
            pacer: FramePacer::new(config.max_in_flight_frames),
            stats: FrameStats::default(),
            bootstrap: BootstrapState::Idle,
            asset_timeout: DEFAULT_ASSET_TIMEOUT,
            modules,
            precalculation,
            destination,
            device,
            config,
        }
    }

    /// Creates an agent from a RON configuration document.
    pub fn from_ron(device: Arc<dyn GraphicsDevice>, config: &str) -> Result<Self> {
        let config =
            RendererConfig::from_ron_str(config).context("Failed to parse renderer configuration")?;
        Ok(Self::new(device, config))
    }

    /// Sets how long the bootstrap waits for models before building pipelines anyway.
    pub fn with_asset_timeout(mut self, timeout: Duration) -> Self {
        self.asset_timeout = timeout;
        self
    }

    /// Adds a module. Only allowed while no bootstrap is running.
    pub fn register_module(&mut self, module: Box<dyn RenderModule>) -> Result<()> {
        if matches!(self.bootstrap, BootstrapState::Running(_)) {
            bail!("cannot register {} while bootstrapping", module.identifier());
        }
        self.modules.push(module);
        self.modules.sort_by_key(|m| m.render_layer());
        Ok(())
    }

    /// Starts loading assets and pipelines for `entities` on a worker thread.
    ///
    /// Calling it again after a bootstrap finished loads models for new
    /// identifiers; modules keep their buffers and already uploaded meshes.
    /// Frames are not encoded while it runs.
    pub fn start_bootstrap(
        &mut self,
        entities: Vec<GeometricEntity>,
        provider: Arc<dyn ModelProvider>,
    ) -> Result<()> {
        match self.bootstrap {
            BootstrapState::Running(_) => bail!("bootstrap already running"),
            BootstrapState::Failed => bail!("a previous bootstrap failed; the modules are gone"),
            BootstrapState::Idle | BootstrapState::Ready => {}
        }
        let job = BootstrapJob {
            device: self.device.clone(),
            provider,
            entities,
            modules: std::mem::take(&mut self.modules),
            precalculation: self.precalculation.take(),
            destination: self.destination,
            main: self.passes[MAIN_PASS].template.clone(),
            shadow: self.passes.get(SHADOW_PASS).map(|p| p.template.clone()),
            max_in_flight_frames: self.config.max_in_flight_frames,
            asset_timeout: self.asset_timeout,
        };
        match bootstrap::spawn(job) {
            Ok(rx) => {
                self.bootstrap = BootstrapState::Running(rx);
                Ok(())
            }
            Err(e) => {
                self.bootstrap = BootstrapState::Failed;
                Err(e).context("Failed to spawn the bootstrap worker")
            }
        }
    }

    fn install(&mut self, outcome: BootstrapOutcome) {
        let BootstrapOutcome {
            mut modules,
            precalculation,
            main_groups,
            shadow_groups,
            elapsed,
        } = outcome;
        modules.sort_by_key(|m| m.render_layer());
        self.modules = modules;
        self.precalculation = precalculation;

        for (pass, groups) in self.passes.iter_mut().zip([main_groups, shadow_groups]) {
            pass.draw_call_groups.clear();
            pass.add_groups(groups);
        }
        self.bootstrap = BootstrapState::Ready;

        let disabled = self
            .modules
            .iter()
            .filter(|m| m.state() == ModuleState::Disabled)
            .count();
        log::info!(
            "RenderAgent ready after {elapsed:?}: {} modules ({disabled} disabled), {} draw calls",
            self.modules.len(),
            self.passes[MAIN_PASS].draw_call_count()
        );
    }

    /// Installs the bootstrap result if it has arrived. Returns [`is_ready`](Self::is_ready).
    pub fn poll_bootstrap(&mut self) -> bool {
        if let BootstrapState::Running(rx) = &self.bootstrap {
            match rx.try_recv() {
                Ok(outcome) => self.install(outcome),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    log::error!("Bootstrap worker exited without a result");
                    self.bootstrap = BootstrapState::Failed;
                }
            }
        }
        self.is_ready()
    }

    /// Blocks until the bootstrap result is installed.
    ///
    /// # Errors
    ///
    /// Fails if no bootstrap was started, the worker died, or `timeout` passed.
    pub fn wait_until_ready(&mut self, timeout: Duration) -> Result<()> {
        let outcome = match &self.bootstrap {
            BootstrapState::Ready => return Ok(()),
            BootstrapState::Idle => bail!("bootstrap was never started"),
            BootstrapState::Failed => bail!("bootstrap failed"),
            BootstrapState::Running(rx) => rx.recv_timeout(timeout),
        };
        match outcome {
            Ok(outcome) => {
                self.install(outcome);
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                Err(anyhow!("bootstrap did not finish within {timeout:?}"))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.bootstrap = BootstrapState::Failed;
                Err(anyhow!("bootstrap worker exited without a result"))
            }
        }
    }

    /// Returns `true` once the modules are back from the bootstrap worker.
    pub fn is_ready(&self) -> bool {
        matches!(self.bootstrap, BootstrapState::Ready)
    }

    /// Encodes one frame.
    ///
    /// Returns `None` before the bootstrap finished or while every ring slot is
    /// still in flight. Report the frame complete with
    /// [`frame_completed`](Self::frame_completed) to release its slot.
    pub fn render_frame(&mut self, frame: &FrameInput, targets: &FrameTargets) -> Option<EncodedFrame> {
        if !self.is_ready() {
            log::trace!("RenderAgent: not ready, frame {} dropped", frame.camera.current_frame);
            return None;
        }
        let Some(slot) = self.pacer.try_acquire() else {
            self.stats.skip();
            log::debug!("RenderAgent: every ring slot in flight, frame {} skipped", frame.camera.current_frame);
            return None;
        };
        let started = Instant::now();
        let buffer_index = slot.buffer_index;

        for module in self.modules.iter_mut() {
            module.update_buffer_state(buffer_index);
        }
        let main_pass = &self.passes[MAIN_PASS];
        if let Some(precalculation) = self.precalculation.as_mut() {
            precalculation.update_buffer_state(buffer_index);
            precalculation.prepare(frame, main_pass);
        }
        for module in self.modules.iter_mut() {
            module.update_buffers(frame, main_pass);
        }

        let mut shared = SharedBindings::default();
        for module in &self.modules {
            module.contribute_shared(&mut shared);
        }
        shared.precalculation = self.precalculation.as_ref().and_then(|p| p.output_binding());

        let label = format!("Frame {}", slot.frame_index);
        let mut encoder = self.device.create_command_encoder(Some(label.as_str()));
        let mut draw_calls = 0;

        if let (Some(precalculation), Some(_)) = (&self.precalculation, shared.precalculation) {
            let descriptor = ComputePassDescriptor {
                label: Some(Cow::Borrowed("Precalculation Pass")),
            };
            let mut compute = encoder.begin_compute_pass(&descriptor);
            precalculation.dispatch(&mut *compute);
        }

        if let Some(shadow) = self.passes.get(SHADOW_PASS) {
            match frame.shadow.shadow_map {
                Some(shadow_map) if !shadow.draw_call_groups.is_empty() => {
                    let descriptor = RenderPassDescriptor {
                        label: Some(Cow::Borrowed(shadow.template.label.as_str())),
                        color_target: None,
                        depth_target: Some(shadow_map),
                        depth_load: LoadAction::Clear(1.0),
                    };
                    let mut render = encoder.begin_render_pass(&descriptor);
                    let mut counter = CountingEncoder::new(&mut *render);
                    for module in &self.modules {
                        module.draw(&mut counter, shadow, &shared);
                    }
                    draw_calls += counter.draw_calls();
                }
                _ => log::trace!("RenderAgent: shadow pass skipped"),
            }
        }

        {
            let main_pass = &self.passes[MAIN_PASS];
            let descriptor = RenderPassDescriptor {
                label: Some(Cow::Borrowed(main_pass.template.label.as_str())),
                color_target: targets.color,
                depth_target: targets.depth,
                depth_load: LoadAction::Clear(1.0),
            };
            let mut render = encoder.begin_render_pass(&descriptor);
            let mut counter = CountingEncoder::new(&mut *render);
            for module in &self.modules {
                module.draw(&mut counter, main_pass, &shared);
            }
            draw_calls += counter.draw_calls();
        }
        let command_buffer = encoder.finish();

        for module in self.modules.iter_mut() {
            module.frame_encoding_complete(&self.passes);
        }
        if let Some(precalculation) = self.precalculation.as_mut() {
            precalculation.frame_encoding_complete();
        }

        let instances = self.modules.iter().map(|m| m.instance_count()).sum();
        let precalculated = self.precalculation.as_ref().map_or(0, |p| p.entry_count());
        self.stats.record(draw_calls, instances, precalculated, started.elapsed());
        log::trace!("RenderAgent: {}", self.stats);

        Some(EncodedFrame {
            slot,
            command_buffer,
        })
    }

    /// Releases the ring slot of `frame_index`.
    pub fn frame_completed(&self, frame_index: u64) {
        let _ = self.pacer.completion_sender().send(frame_index);
    }

    /// A handle for reporting completed frames from the GPU's completion thread.
    pub fn completion_sender(&self) -> Sender<u64> {
        self.pacer.completion_sender()
    }

    /// Counters of the last encoded frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The main pass and the groups built into it.
    pub fn main_pass(&self) -> &RenderPass {
        &self.passes[MAIN_PASS]
    }

    /// The shadow pass, when shadows are enabled.
    pub fn shadow_pass(&self) -> Option<&RenderPass> {
        self.passes.get(SHADOW_PASS)
    }

    /// Every hosted module, in draw order.
    pub fn modules(&self) -> impl Iterator<Item = &dyn RenderModule> {
        self.modules.iter().map(|m| m.as_ref())
    }

    /// The state of `identifier`, if it is hosted.
    pub fn module_state(&self, identifier: ModuleIdentifier) -> Option<ModuleState> {
        if identifier == ModuleIdentifier::Precalculation {
            return self.precalculation.as_ref().map(|p| p.state());
        }
        self.modules
            .iter()
            .find(|m| m.identifier() == identifier)
            .map(|m| m.state())
    }

    /// Every error recorded by every module so far.
    pub fn errors(&self) -> Vec<RenderModuleError> {
        let mut errors: Vec<RenderModuleError> = self
            .modules
            .iter()
            .flat_map(|m| m.errors().snapshot())
            .collect();
        if let Some(precalculation) = &self.precalculation {
            errors.extend(precalculation.errors().snapshot());
        }
        errors
    }

    /// Returns `true` if any module recorded a serious error.
    pub fn has_serious_errors(&self) -> bool {
        self.errors().iter().any(|e| e.severity == ErrorSeverity::Serious)
    }
}

impl std::fmt::Debug for RenderAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderAgent")
            .field("modules", &self.modules.len())
            .field("ready", &self.is_ready())
            .field("stats", &self.stats)
            .finish()
    }
}
