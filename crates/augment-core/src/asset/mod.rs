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

//! The asset contract between the renderer and the model provider.
//!
//! Importing models is someone else's job. The renderer asks a
//! [`ModelProvider`] for a [`MeshAsset`] per entity kind and identifier and
//! receives already decoded vertex data, materials and skeletons.

mod mesh;
pub mod primitives;
mod provider;
mod skeleton;

pub use mesh::*;
pub use primitives::*;
pub use provider::*;
pub use skeleton::*;
