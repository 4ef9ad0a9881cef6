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

// Augment Sandbox
// Boots the renderer on the headless device and drives it with a synthetic session.

mod session;

use anyhow::{Context, Result};
use augment_agents::{FrameTargets, RenderAgent};
use augment_core::renderer::{GraphicsDevice, TextureId};
use augment_core::RendererConfig;
use augment_infra::HeadlessDevice;
use crossbeam_channel::Sender;
use session::{SyntheticProvider, SyntheticSession};
use std::sync::Arc;
use std::time::Duration;

const FRAME_COUNT: u64 = 180;
const FRAME_RATE: f64 = 60.0;
const GPU_LATENCY: Duration = Duration::from_millis(4);

fn load_config() -> Result<RendererConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read configuration {path}"))?;
            RendererConfig::from_ron_str(&text)
                .with_context(|| format!("Failed to parse configuration {path}"))
        }
        None => Ok(RendererConfig {
            debug_tracking_points: true,
            ..RendererConfig::default()
        }),
    }
}

/// Pretends to be the GPU: completes every submitted frame after a short delay.
fn spawn_gpu(completions: Sender<u64>) -> Sender<u64> {
    let (submit, submitted) = crossbeam_channel::unbounded::<u64>();
    std::thread::spawn(move || {
        for frame_index in submitted {
            std::thread::sleep(GPU_LATENCY);
            if completions.send(frame_index).is_err() {
                break;
            }
        }
    });
    submit
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    log::info!("Renderer configuration: {config:?}");

    let device = HeadlessDevice::new();
    let shared_device: Arc<dyn GraphicsDevice> = Arc::new(device.clone());
    let mut agent = RenderAgent::new(shared_device, config);
    let mut session = SyntheticSession::new(FRAME_RATE);
    let provider = Arc::new(SyntheticProvider {
        unknown: session.unknown_identifier(),
        latency: Duration::from_millis(20),
    });

    agent.start_bootstrap(session.entities(), provider)?;
    agent.wait_until_ready(Duration::from_secs(10))?;

    let gpu = spawn_gpu(agent.completion_sender());
    let targets = FrameTargets {
        color: Some(TextureId(10)),
        depth: Some(TextureId(11)),
    };

    for _ in 0..FRAME_COUNT {
        let input = session.next_frame();
        let encoded = loop {
            if let Some(encoded) = agent.render_frame(&input, &targets) {
                break encoded;
            }
            std::thread::sleep(Duration::from_millis(1));
        };
        gpu.send(encoded.slot.frame_index)
            .context("GPU thread stopped")?;

        if encoded.slot.frame_index % 30 == 0 {
            log::info!("{}", agent.stats());
        }
        std::thread::sleep(Duration::from_secs_f64(1.0 / FRAME_RATE));
    }

    let buffers = device.take_command_buffers();
    log::info!(
        "Encoded {} command buffers, {} bytes written to the device",
        buffers.len(),
        device.bytes_written()
    );
    for error in agent.errors() {
        log::info!("Recorded: {error}");
    }
    if agent.has_serious_errors() {
        log::warn!("Some render modules were disabled");
    }
    Ok(())
}
