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

use super::mesh::MeshAsset;
use uuid::Uuid;

/// Callback receiving the result of a model request. `None` means not found.
pub type AssetCompletion = Box<dyn FnOnce(Option<MeshAsset>) + Send + 'static>;

/// Resolves models for the entities the renderer draws.
///
/// Implementations may call `completion` synchronously or from any thread,
/// but must call it exactly once per request.
pub trait ModelProvider: Send + Sync {
    /// Requests the model for an entity kind, optionally narrowed by identifier.
    ///
    /// # Arguments
    ///
    /// * `type_tag` - The entity kind, e.g. `"AugmentedAnchor"`.
    /// * `identifier` - The entity's model identity, `None` for the general model.
    /// * `completion` - Receives the asset or `None`.
    fn load_asset(&self, type_tag: &str, identifier: Option<Uuid>, completion: AssetCompletion);
}
