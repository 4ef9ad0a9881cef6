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

use super::anchor::GeometricEntity;
use super::camera::CameraProperties;
use super::environment::{EnvironmentProperties, ShadowProperties};

/// Everything the session produced for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    #[allow(missing_docs)]
    pub camera: CameraProperties,
    #[allow(missing_docs)]
    pub environment: EnvironmentProperties,
    #[allow(missing_docs)]
    pub shadow: ShadowProperties,
    /// All entities, in session order.
    pub entities: Vec<GeometricEntity>,
}
