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

//! Descriptors consumed when opening passes on a command encoder.

use super::texture::TextureId;
use std::borrow::Cow;

/// An opaque handle to a finished command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub usize);

/// What happens to an attachment at the start of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadAction {
    /// Keep the existing contents.
    Load,
    /// Clear to the given value.
    Clear(f64),
    /// Contents are undefined.
    DontCare,
}

/// Describes the attachments of a render pass.
#[derive(Debug, Clone)]
pub struct RenderPassDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The color target, `None` for depth-only passes.
    pub color_target: Option<TextureId>,
    /// The depth target.
    pub depth_target: Option<TextureId>,
    /// Load action for the depth attachment.
    pub depth_load: LoadAction,
}

/// Describes a compute pass.
#[derive(Debug, Clone, Default)]
pub struct ComputePassDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
}
