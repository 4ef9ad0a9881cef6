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

//! Acts as the **[A]gent** for the rendering subsystem.
//!
//! This module decides *when* and *in what order* the render modules run, but
//! delegates the actual GPU command generation to the modules of `augment-lanes`.
//!
//! Its responsibilities:
//! - Bootstrapping the modules on a worker thread and waiting for every model.
//! - Pacing frames so that no module writes a ring slot the GPU still reads.
//! - Encoding the precalculation, shadow and main passes of each frame.
//! - Reporting per-frame statistics and the accumulated module errors.

mod agent;
mod bootstrap;
mod draw_counter;
mod frame_pacer;
mod stats;

pub use agent::*;
pub use frame_pacer::*;
pub use stats::*;
