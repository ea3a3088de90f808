// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Portable backend that records native calls into an inspectable log.
//!
//! Nothing is executed. Every encoder call is appended to the device's
//! [`TraceCommand`] log, which makes the recorder's output observable on
//! hosts without a GPU.

mod command;
mod encoder;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::rhi::{
    Backend, Buffer, BufferUsage, NativeCommandBuffer, NativeDevice, NativeFence,
    RenderPassDescriptor, Sampler, Texture, TextureDescription, TextureUsage,
};
use crate::core::{CmdListError, Result};

pub use command::{
    TraceColorAttachment, TraceCommand, TraceDepthAttachment, TraceStencilAttachment,
};
pub use encoder::{TraceBlitEncoder, TraceComputeEncoder, TraceRenderEncoder};

/// Backend whose native calls are recorded, not executed.
#[derive(Debug, Clone)]
pub struct TraceBackend;

impl Backend for TraceBackend {
    type Device = TraceDevice;
    type CommandBuffer = TraceCommandBuffer;
    type RenderEncoder = TraceRenderEncoder;
    type BlitEncoder = TraceBlitEncoder;
    type ComputeEncoder = TraceComputeEncoder;
    type Fence = TraceFence;

    type Buffer = TraceBuffer;
    type Texture = TraceTexture;
    type Sampler = TraceSampler;
    type RenderPipelineState = TraceStateObject;
    type ComputePipelineState = TraceStateObject;
    type DepthStencilState = TraceStateObject;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceBuffer {
    id: u64,
    size: u64,
}

impl TraceBuffer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceTexture {
    id: u64,
}

impl TraceTexture {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSampler {
    id: u64,
}

impl TraceSampler {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Pipeline or depth-stencil state object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStateObject {
    id: u64,
}

impl TraceStateObject {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Completion flag of a trace submission. Signalled by the test or by `wait`.
#[derive(Debug, Clone, Default)]
pub struct TraceFence {
    complete: Arc<AtomicBool>,
}

impl TraceFence {
    /// Mark the submission as finished.
    pub fn signal(&self) {
        self.complete.store(true, Ordering::Release);
    }
}

impl NativeFence for TraceFence {
    fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    fn wait(&self) {
        // Nothing executes, so the submission is finished as soon as anyone waits.
        self.signal();
    }
}

#[derive(Default)]
struct DeviceInner {
    next_id: AtomicU64,
    log: Mutex<Vec<TraceCommand>>,
    buffer_contents: Mutex<HashMap<u64, Vec<u8>>>,
    fences: Mutex<Vec<TraceFence>>,
}

/// Trace device. Clones share the same log and id space.
#[derive(Clone, Default)]
pub struct TraceDevice {
    inner: Arc<DeviceInner>,
}

impl TraceDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record(&self, command: TraceCommand) {
        tracing::trace!(?command, "trace");
        self.inner.log.lock().push(command);
    }

    /// Snapshot of every call recorded so far.
    pub fn commands(&self) -> Vec<TraceCommand> {
        self.inner.log.lock().clone()
    }

    /// Drain the log.
    pub fn take_commands(&self) -> Vec<TraceCommand> {
        std::mem::take(&mut *self.inner.log.lock())
    }

    /// Bytes last written to a staging buffer.
    pub fn buffer_contents(&self, buffer: &TraceBuffer) -> Option<Vec<u8>> {
        self.inner.buffer_contents.lock().get(&buffer.id).cloned()
    }

    /// Unsignalled fence, as returned by a commit.
    pub fn new_fence(&self) -> TraceFence {
        let fence = TraceFence::default();
        self.inner.fences.lock().push(fence.clone());
        fence
    }

    /// Complete every submission made so far.
    pub fn signal_all(&self) {
        for fence in self.inner.fences.lock().iter() {
            fence.signal();
        }
    }

    /// Create a buffer whose allocation is padded to four bytes.
    pub fn create_buffer(&self, size: u64, usage: BufferUsage) -> Arc<Buffer<TraceBackend>> {
        let raw = TraceBuffer {
            id: self.next_id(),
            size: size.next_multiple_of(4),
        };
        Arc::new(Buffer::from_raw(raw, size, usage))
    }

    /// Create a device texture, or a buffer-backed one when `desc` has STAGING usage.
    pub fn create_texture(&self, desc: TextureDescription) -> Arc<Texture<TraceBackend>> {
        if desc.usage.contains(TextureUsage::STAGING) {
            let raw = TraceBuffer {
                id: self.next_id(),
                size: desc.staging_size(),
            };
            Arc::new(Texture::from_staging_buffer(raw, desc))
        } else {
            Arc::new(Texture::from_raw(TraceTexture { id: self.next_id() }, desc))
        }
    }

    pub fn create_sampler(&self) -> Arc<Sampler<TraceBackend>> {
        Arc::new(Sampler::from_raw(TraceSampler { id: self.next_id() }))
    }

    /// Pipeline or depth-stencil state object.
    pub fn create_state_object(&self) -> TraceStateObject {
        TraceStateObject { id: self.next_id() }
    }
}

impl std::fmt::Debug for TraceDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceDevice")
            .field("commands", &self.inner.log.lock().len())
            .finish()
    }
}

impl NativeDevice<TraceBackend> for TraceDevice {
    fn new_command_buffer(&self) -> Result<TraceCommandBuffer> {
        let id = self.next_id();
        self.record(TraceCommand::NewCommandBuffer { id });
        Ok(TraceCommandBuffer {
            id,
            device: self.clone(),
        })
    }

    fn new_staging_buffer(&self, size: u64) -> Result<TraceBuffer> {
        let buffer = TraceBuffer {
            id: self.next_id(),
            size,
        };
        self.inner
            .buffer_contents
            .lock()
            .insert(buffer.id, vec![0; size as usize]);
        Ok(buffer)
    }

    fn write_staging_buffer(&self, buffer: &TraceBuffer, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset + data.len() as u64;
        if end > buffer.size {
            return Err(CmdListError::Gpu(format!(
                "write of {} bytes at {} overruns staging buffer of {}",
                data.len(),
                offset,
                buffer.size
            )));
        }
        let mut contents = self.inner.buffer_contents.lock();
        let bytes = contents
            .entry(buffer.id)
            .or_insert_with(|| vec![0; buffer.size as usize]);
        bytes[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }
}

/// Trace command buffer. Encoders append to the owning device's log.
#[derive(Debug)]
pub struct TraceCommandBuffer {
    id: u64,
    device: TraceDevice,
}

impl TraceCommandBuffer {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl NativeCommandBuffer<TraceBackend> for TraceCommandBuffer {
    fn render_command_encoder(
        &mut self,
        desc: &RenderPassDescriptor<TraceBackend>,
    ) -> Result<TraceRenderEncoder> {
        self.device.record(encoder::begin_render_pass(desc));
        Ok(TraceRenderEncoder::new(self.device.clone()))
    }

    fn blit_command_encoder(&mut self) -> Result<TraceBlitEncoder> {
        self.device.record(TraceCommand::BeginBlitPass);
        Ok(TraceBlitEncoder::new(self.device.clone()))
    }

    fn compute_command_encoder(&mut self) -> Result<TraceComputeEncoder> {
        self.device.record(TraceCommand::BeginComputePass);
        Ok(TraceComputeEncoder::new(self.device.clone()))
    }

    fn commit(self) -> Result<TraceFence> {
        self.device.record(TraceCommand::Commit {
            command_buffer: self.id,
        });
        Ok(self.device.new_fence())
    }
}
