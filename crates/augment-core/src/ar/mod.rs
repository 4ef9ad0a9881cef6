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

//! The AR data model consumed by the renderer each frame.
//!
//! Everything in here is produced upstream by the tracking session or the host
//! application. The renderer only ever reads it.

mod anchor;
mod camera;
mod effects;
mod environment;
mod frame;
mod heading;

pub use anchor::*;
pub use camera::*;
pub use effects::*;
pub use environment::*;
pub use frame::*;
pub use heading::*;
