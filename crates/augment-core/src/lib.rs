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

//! # Augment Core
//!
//! Foundational crate containing the GPU contracts, the AR data model and the
//! uniform layouts shared between the CPU and the shaders.
//!
//! Nothing in this crate touches a concrete graphics API. The hot-path render
//! modules live in `augment-lanes`, the frame orchestrator in `augment-agents`,
//! and concrete [`GraphicsDevice`](renderer::GraphicsDevice) implementations in
//! `augment-infra`.

#![warn(missing_docs)]

pub mod ar;
pub mod asset;
pub mod config;
pub mod diagnostics;
pub mod math;
pub mod renderer;

pub use config::RendererConfig;
pub use diagnostics::{ErrorCategory, ErrorLog, ErrorSeverity, RenderModuleError};
