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

use super::ModuleState;
use augment_core::diagnostics::{ErrorCategory, ErrorLog, RenderModuleError};
use augment_core::renderer::{GraphicsDevice, ModuleIdentifier};
use std::sync::Arc;

/// State every module carries: identity, lifecycle, diagnostics and device.
#[derive(Debug)]
pub(crate) struct ModuleBase {
    pub identifier: ModuleIdentifier,
    pub state: ModuleState,
    pub errors: ErrorLog,
    pub device: Option<Arc<dyn GraphicsDevice>>,
    pub max_in_flight_frames: usize,
}

impl ModuleBase {
    pub fn new(identifier: ModuleIdentifier) -> Self {
        Self {
            identifier,
            state: ModuleState::Uninitialized,
            errors: ErrorLog::new(),
            device: None,
            max_in_flight_frames: 1,
        }
    }

    /// Accepts the device on the first call.
    ///
    /// Returns the device to allocate with, or `None` when there is nothing
    /// to do (already initialised, or no device).
    pub fn begin_initialize(
        &mut self,
        device: Option<Arc<dyn GraphicsDevice>>,
        max_in_flight_frames: usize,
    ) -> Option<Arc<dyn GraphicsDevice>> {
        if self.device.is_some() {
            log::debug!("{} buffers already initialized", self.identifier);
            return None;
        }
        let Some(device) = device else {
            self.serious(ErrorCategory::DeviceNotFound, "no graphics device");
            return None;
        };
        self.device = Some(device.clone());
        self.max_in_flight_frames = max_in_flight_frames.max(1);
        if self.state == ModuleState::Uninitialized {
            self.state = ModuleState::Initializing;
        }
        Some(device)
    }

    /// The device, recording a serious error when there is none.
    pub fn require_device(&mut self) -> Option<Arc<dyn GraphicsDevice>> {
        if self.device.is_none() {
            self.serious(ErrorCategory::DeviceNotFound, "no graphics device");
        }
        self.device.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state == ModuleState::Ready
    }

    pub fn is_disabled(&self) -> bool {
        self.state == ModuleState::Disabled
    }

    /// Marks the module ready unless it has been disabled.
    pub fn mark_ready(&mut self) {
        if !self.is_disabled() {
            self.state = ModuleState::Ready;
            log::info!("{} ready", self.identifier);
        }
    }

    pub fn warning(&self, category: ErrorCategory, message: impl Into<String>) {
        self.errors
            .record(RenderModuleError::warning(category, self.identifier, message));
    }

    pub fn recoverable(&self, category: ErrorCategory, message: impl Into<String>) {
        self.errors
            .record(RenderModuleError::recoverable(category, self.identifier, message));
    }

    /// Records a serious error and disables the module.
    pub fn serious(&mut self, category: ErrorCategory, message: impl Into<String>) {
        self.errors
            .record(RenderModuleError::serious(category, self.identifier, message));
        self.state = ModuleState::Disabled;
    }
}
