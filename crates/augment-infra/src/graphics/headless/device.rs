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

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use augment_core::renderer::traits::CommandEncoder;
use augment_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, CommandBufferId, ComputePipelineDescriptor,
    ComputePipelineId, DepthStencilDescriptor, DepthStencilStateId, GraphicsDevice,
    RenderPipelineDescriptor, RenderPipelineId, ResourceError, ShaderError, ShaderLibraryId,
};
use bytemuck::Pod;

use super::command::{HeadlessCommandEncoder, RecordedCommandBuffer};

/// The library handed out by [`GraphicsDevice::create_default_library`].
const DEFAULT_LIBRARY: ShaderLibraryId = ShaderLibraryId(0);

#[derive(Debug)]
struct HeadlessBufferEntry {
    label: Option<String>,
    usage: BufferUsage,
    data: Vec<u8>,
}

/// Functions a compiled render pipeline was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFunctions {
    #[allow(missing_docs)]
    pub label: Option<String>,
    #[allow(missing_docs)]
    pub vertex: String,
    #[allow(missing_docs)]
    pub fragment: Option<String>,
}

/// The internal, non-clonable state of the [`HeadlessDevice`].
#[derive(Debug)]
struct HeadlessDeviceInternal {
    buffers: Mutex<HashMap<BufferId, HeadlessBufferEntry>>,
    render_pipelines: Mutex<HashMap<RenderPipelineId, PipelineFunctions>>,
    compute_pipelines: Mutex<HashMap<ComputePipelineId, String>>,
    missing_functions: Mutex<HashSet<String>>,
    finished: Mutex<Vec<RecordedCommandBuffer>>,

    next_buffer_id: AtomicUsize,
    next_pipeline_id: AtomicUsize,
    next_depth_state_id: AtomicUsize,
    next_command_buffer_id: AtomicUsize,

    has_library: AtomicBool,
    fail_allocations: AtomicBool,
    bytes_written: AtomicUsize,
}

/// A clonable, thread-safe handle to a device whose memory is plain `Vec<u8>`.
///
/// Failure injection hooks let tests exercise the error paths of the
/// renderer: missing shader functions, a missing library and failing
/// allocations.
#[derive(Clone, Debug)]
pub struct HeadlessDevice {
    internal: Arc<HeadlessDeviceInternal>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HeadlessDevice {
    /// A device with a default library containing every function.
    pub fn new() -> Self {
        Self {
            internal: Arc::new(HeadlessDeviceInternal {
                buffers: Mutex::new(HashMap::new()),
                render_pipelines: Mutex::new(HashMap::new()),
                compute_pipelines: Mutex::new(HashMap::new()),
                missing_functions: Mutex::new(HashSet::new()),
                finished: Mutex::new(Vec::new()),
                next_buffer_id: AtomicUsize::new(1),
                next_pipeline_id: AtomicUsize::new(1),
                next_depth_state_id: AtomicUsize::new(1),
                next_command_buffer_id: AtomicUsize::new(0),
                has_library: AtomicBool::new(true),
                fail_allocations: AtomicBool::new(false),
                bytes_written: AtomicUsize::new(0),
            }),
        }
    }

    /// Removes `function` from the library; pipelines using it fail to compile.
    pub fn remove_function(&self, function: impl Into<String>) -> &Self {
        lock(&self.internal.missing_functions).insert(function.into());
        self
    }

    /// Makes [`GraphicsDevice::create_default_library`] fail.
    pub fn remove_library(&self) -> &Self {
        self.internal.has_library.store(false, Ordering::SeqCst);
        self
    }

    /// Makes every following buffer allocation fail.
    pub fn fail_allocations(&self, fail: bool) -> &Self {
        self.internal.fail_allocations.store(fail, Ordering::SeqCst);
        self
    }

    /// Copy of a buffer's contents.
    pub fn buffer_contents(&self, id: BufferId) -> Option<Vec<u8>> {
        lock(&self.internal.buffers).get(&id).map(|b| b.data.clone())
    }

    /// Reads `count` values of `T` starting at byte `offset`.
    pub fn read_buffer<T: Pod>(&self, id: BufferId, offset: u64, count: usize) -> Option<Vec<T>> {
        let buffers = lock(&self.internal.buffers);
        let data = &buffers.get(&id)?.data;
        let size = std::mem::size_of::<T>();
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(size.checked_mul(count)?)?;
        let bytes = data.get(start..end)?;
        Some(bytes.chunks_exact(size).map(bytemuck::pod_read_unaligned).collect())
    }

    /// Label a buffer was created with.
    pub fn buffer_label(&self, id: BufferId) -> Option<String> {
        lock(&self.internal.buffers).get(&id).and_then(|b| b.label.clone())
    }

    /// Live buffers created with `usage`.
    pub fn buffer_count(&self, usage: BufferUsage) -> usize {
        lock(&self.internal.buffers)
            .values()
            .filter(|b| b.usage.contains(usage))
            .count()
    }

    /// Total bytes written through [`GraphicsDevice::write_buffer`].
    pub fn bytes_written(&self) -> usize {
        self.internal.bytes_written.load(Ordering::SeqCst)
    }

    /// Functions of a compiled render pipeline.
    pub fn pipeline_functions(&self, id: RenderPipelineId) -> Option<PipelineFunctions> {
        lock(&self.internal.render_pipelines).get(&id).cloned()
    }

    /// Number of render pipelines compiled so far.
    pub fn render_pipeline_count(&self) -> usize {
        lock(&self.internal.render_pipelines).len()
    }

    /// Kernel of a compiled compute pipeline.
    pub fn compute_function(&self, id: ComputePipelineId) -> Option<String> {
        lock(&self.internal.compute_pipelines).get(&id).cloned()
    }

    /// Removes and returns every finished command buffer, oldest first.
    pub fn take_command_buffers(&self) -> Vec<RecordedCommandBuffer> {
        std::mem::take(&mut *lock(&self.internal.finished))
    }

    /// (crate-internal) Stores a finished command buffer and hands out its ID.
    pub(crate) fn register_command_buffer(
        &self,
        label: Option<String>,
        commands: Vec<super::RecordedCommand>,
    ) -> CommandBufferId {
        let id = CommandBufferId(
            self.internal
                .next_command_buffer_id
                .fetch_add(1, Ordering::SeqCst),
        );
        lock(&self.internal.finished).push(RecordedCommandBuffer {
            id,
            label,
            commands,
        });
        id
    }

    fn check_library(&self, library: ShaderLibraryId) -> Result<(), ResourceError> {
        if library != DEFAULT_LIBRARY || !self.internal.has_library.load(Ordering::SeqCst) {
            return Err(ShaderError::LibraryNotFound { id: library }.into());
        }
        Ok(())
    }

    fn check_function(&self, library: ShaderLibraryId, function: &str) -> Result<(), ResourceError> {
        if lock(&self.internal.missing_functions).contains(function) {
            return Err(ShaderError::FunctionNotFound {
                library,
                function: function.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_default_library(&self) -> Result<ShaderLibraryId, ResourceError> {
        if !self.internal.has_library.load(Ordering::SeqCst) {
            return Err(ResourceError::BackendError(
                "HeadlessDevice: no default library".to_string(),
            ));
        }
        Ok(DEFAULT_LIBRARY)
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        self.check_library(descriptor.library)?;
        for (_, function) in descriptor.functions() {
            self.check_function(descriptor.library, function)?;
        }

        let id = RenderPipelineId(self.internal.next_pipeline_id.fetch_add(1, Ordering::SeqCst));
        let functions = PipelineFunctions {
            label: descriptor.label.as_deref().map(String::from),
            vertex: descriptor.vertex_function.to_string(),
            fragment: descriptor.fragment_function.as_deref().map(String::from),
        };
        log::debug!(
            "HeadlessDevice: Created render pipeline {:?} ({}, {:?})",
            id,
            functions.vertex,
            functions.fragment
        );
        self.internal
            .render_pipelines
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (render_pipelines): {e}")))?
            .insert(id, functions);
        Ok(id)
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, ResourceError> {
        self.check_library(descriptor.library)?;
        self.check_function(descriptor.library, &descriptor.function)?;

        let id = ComputePipelineId(self.internal.next_pipeline_id.fetch_add(1, Ordering::SeqCst));
        self.internal
            .compute_pipelines
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (compute_pipelines): {e}")))?
            .insert(id, descriptor.function.to_string());
        Ok(id)
    }

    fn create_depth_stencil_state(
        &self,
        _descriptor: &DepthStencilDescriptor,
    ) -> Result<DepthStencilStateId, ResourceError> {
        Ok(DepthStencilStateId(
            self.internal.next_depth_state_id.fetch_add(1, Ordering::SeqCst),
        ))
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.create_buffer_with_data(descriptor, &[])
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let label = descriptor.label.as_deref().map(String::from);
        if self.internal.fail_allocations.load(Ordering::SeqCst) {
            return Err(ResourceError::AllocationFailed {
                label: label.unwrap_or_default(),
                size: descriptor.size,
            });
        }
        let size = usize::try_from(descriptor.size).map_err(|_| ResourceError::OutOfBounds)?;
        if data.len() > size {
            return Err(ResourceError::OutOfBounds);
        }

        let mut contents = vec![0u8; size];
        contents[..data.len()].copy_from_slice(data);
        let id = BufferId(self.internal.next_buffer_id.fetch_add(1, Ordering::SeqCst));
        log::trace!("HeadlessDevice: Created buffer {id:?} {label:?} of {size} bytes");

        self.internal
            .buffers
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (buffers): {e}")))?
            .insert(
                id,
                HeadlessBufferEntry {
                    label,
                    usage: descriptor.usage,
                    data: contents,
                },
            );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut buffers = self
            .internal
            .buffers
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (buffers): {e}")))?;
        match buffers.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::NotFound),
        }
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut buffers = self
            .internal
            .buffers
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (buffers): {e}")))?;
        let entry = buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        let start = usize::try_from(offset).map_err(|_| ResourceError::OutOfBounds)?;
        let end = start.checked_add(data.len()).ok_or(ResourceError::OutOfBounds)?;
        let target = entry.data.get_mut(start..end).ok_or(ResourceError::OutOfBounds)?;
        target.copy_from_slice(data);
        self.internal.bytes_written.fetch_add(data.len(), Ordering::Relaxed);
        Ok(())
    }

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(HeadlessCommandEncoder::new(self.clone(), label))
    }
}
