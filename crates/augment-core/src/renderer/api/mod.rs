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

//! Public, backend-agnostic data types of the rendering API.

pub mod buffer;
pub mod command;
pub mod common;
pub mod indices;
pub mod module;
pub mod pipeline;
pub mod texture;
pub mod uniform_ring_buffer;
pub mod uniforms;

pub use self::buffer::*;
pub use self::command::*;
pub use self::common::*;
pub use self::indices::*;
pub use self::module::*;
pub use self::pipeline::*;
pub use self::texture::*;
pub use self::uniform_ring_buffer::*;
pub use self::uniforms::*;
