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

//! # Augment Lanes
//!
//! The per-frame hot path of the AR renderer: the render module family, the
//! draw call groups they build, skeletal animation evaluation and the
//! precalculation compute module.
//!
//! Everything here is driven by the orchestrator in `augment-agents` and only
//! talks to the GPU through the traits of `augment-core`.

#![warn(missing_docs)]

pub mod animation;
pub mod asset_loading;
pub mod draw_call;
pub mod effects;
pub mod instancing;
pub mod palette;
pub mod pipeline_table;
pub mod precalculation;
pub mod render_module;
pub mod render_pass;
pub mod transform;

pub use draw_call::{DrawCall, DrawCallGroup, DrawData, SubmeshGpuData};
pub use precalculation::{ComputeModule, PrecalculationModule};
pub use render_module::{ModuleState, RenderModule, SharedBindings};
pub use render_pass::{RenderPass, RenderPassKind, RenderPassTemplate};
