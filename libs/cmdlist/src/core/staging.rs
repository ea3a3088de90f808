// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Completion-tracked pool of CPU-visible upload buffers.
//!
//! Buffer updates copy through a staging buffer that the GPU reads after the
//! recording is submitted. The pool holds those buffers against the fence of
//! the submission that uses them and only hands them out again once the fence
//! reports completion.

use std::sync::Arc;

use parking_lot::Mutex;

use super::config::StagingConfig;
use super::rhi::{Backend, Buffer, BufferUsage, NativeDevice, NativeFence};
use super::Result;

struct InFlight<B: Backend> {
    fence: Arc<B::Fence>,
    buffers: Vec<Buffer<B>>,
}

struct PoolState<B: Backend> {
    free: Vec<Buffer<B>>,
    free_bytes: u64,
    in_flight: Vec<InFlight<B>>,
}

impl<B: Backend> PoolState<B> {
    fn push_free(&mut self, buffer: Buffer<B>, config: &StagingConfig) -> bool {
        if self.free.len() >= config.max_pooled_buffers
            || self.free_bytes + buffer.size() > config.max_pooled_bytes
        {
            return false;
        }
        self.free_bytes += buffer.size();
        self.free.push(buffer);
        true
    }

    /// Smallest free buffer that fits `size`.
    fn take_fitting(&mut self, size: u64) -> Option<Buffer<B>> {
        let index = self
            .free
            .iter()
            .enumerate()
            .filter(|(_, buffer)| buffer.size() >= size)
            .min_by_key(|(_, buffer)| buffer.size())
            .map(|(index, _)| index)?;
        let buffer = self.free.swap_remove(index);
        self.free_bytes -= buffer.size();
        Some(buffer)
    }
}

/// Shared staging buffer pool. Clones refer to the same pool.
pub struct StagingPool<B: Backend> {
    state: Arc<Mutex<PoolState<B>>>,
    config: StagingConfig,
}

impl<B: Backend> Clone for StagingPool<B> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: self.config.clone(),
        }
    }
}

impl<B: Backend> StagingPool<B> {
    pub fn new(config: StagingConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(PoolState {
                free: Vec::new(),
                free_bytes: 0,
                in_flight: Vec::new(),
            })),
            config,
        }
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Get a staging buffer of at least `size` bytes.
    ///
    /// Completed submissions are reclaimed first so their buffers can be reused.
    pub fn acquire(&self, device: &B::Device, size: u64) -> Result<Buffer<B>> {
        self.reclaim();

        if let Some(buffer) = self.state.lock().take_fitting(size) {
            tracing::trace!(size, pooled_size = buffer.size(), "Reusing staging buffer");
            return Ok(buffer);
        }

        let raw = device.new_staging_buffer(size)?;
        tracing::trace!(size, "Allocated staging buffer");
        Ok(Buffer::from_raw(raw, size, BufferUsage::STAGING))
    }

    /// Hold `buffers` until `fence` completes.
    pub fn retire(&self, fence: Arc<B::Fence>, buffers: Vec<Buffer<B>>) {
        if buffers.is_empty() {
            return;
        }
        tracing::debug!(count = buffers.len(), "Retiring staging buffers to submission");
        self.state.lock().in_flight.push(InFlight { fence, buffers });
    }

    /// Return buffers the GPU never saw (discarded recordings).
    pub fn release(&self, buffers: Vec<Buffer<B>>) {
        let mut state = self.state.lock();
        for buffer in buffers {
            if !state.push_free(buffer, &self.config) {
                tracing::trace!("Staging free list full, dropping buffer");
            }
        }
    }

    /// Move buffers of completed submissions to the free list. Returns the
    /// number of submissions reclaimed.
    pub fn reclaim(&self) -> usize {
        let mut state = self.state.lock();
        let (completed, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.in_flight)
            .into_iter()
            .partition(|in_flight| in_flight.fence.is_complete());
        state.in_flight = pending;

        let reclaimed = completed.len();
        let mut dropped = 0usize;
        for buffer in completed.into_iter().flat_map(|in_flight| in_flight.buffers) {
            if !state.push_free(buffer, &self.config) {
                dropped += 1;
            }
        }

        if reclaimed > 0 {
            tracing::debug!(
                reclaimed,
                dropped,
                free = state.free.len(),
                "Reclaimed staging buffers from completed submissions"
            );
        }
        reclaimed
    }

    /// Buffers ready for reuse.
    pub fn free_count(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Buffers held by submissions that have not completed.
    pub fn in_flight_count(&self) -> usize {
        self.state
            .lock()
            .in_flight
            .iter()
            .map(|in_flight| in_flight.buffers.len())
            .sum()
    }
}

impl<B: Backend> std::fmt::Debug for StagingPool<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingPool")
            .field("free", &self.free_count())
            .field("in_flight", &self.in_flight_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{TraceBackend, TraceDevice};

    fn pool(max_buffers: usize, max_bytes: u64) -> StagingPool<TraceBackend> {
        StagingPool::new(StagingConfig {
            max_pooled_buffers: max_buffers,
            max_pooled_bytes: max_bytes,
        })
    }

    #[test]
    fn test_buffers_reused_only_after_fence_completes() {
        let device = TraceDevice::new();
        let pool = pool(4, 1024);

        let buffer = pool.acquire(&device, 64).expect("acquire");
        let id = buffer.raw().id();
        let fence = Arc::new(device.new_fence());
        pool.retire(Arc::clone(&fence), vec![buffer]);

        assert_eq!(pool.in_flight_count(), 1);
        let second = pool.acquire(&device, 64).expect("acquire");
        assert_ne!(second.raw().id(), id);

        fence.signal();
        assert_eq!(pool.reclaim(), 1);
        assert_eq!(pool.free_count(), 1);
        let third = pool.acquire(&device, 32).expect("acquire");
        assert_eq!(third.raw().id(), id);
    }

    #[test]
    fn test_released_buffers_are_immediately_reusable() {
        let device = TraceDevice::new();
        let pool = pool(4, 1024);

        let buffer = pool.acquire(&device, 128).expect("acquire");
        let id = buffer.raw().id();
        pool.release(vec![buffer]);

        assert_eq!(pool.acquire(&device, 100).expect("acquire").raw().id(), id);
    }

    #[test]
    fn test_free_list_respects_caps() {
        let device = TraceDevice::new();
        let pool = pool(2, 200);

        let buffers: Vec<_> = (0..3)
            .map(|_| pool.acquire(&device, 64).expect("acquire"))
            .collect();
        pool.release(buffers);
        assert_eq!(pool.free_count(), 2);

        let large = pool.acquire(&device, 512).expect("acquire");
        pool.release(vec![large]);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn test_acquire_prefers_smallest_fitting_buffer() {
        let device = TraceDevice::new();
        let pool = pool(4, 4096);

        let big = pool.acquire(&device, 1024).expect("acquire");
        let small = pool.acquire(&device, 128).expect("acquire");
        let small_id = small.raw().id();
        pool.release(vec![big, small]);

        assert_eq!(pool.acquire(&device, 100).expect("acquire").raw().id(), small_id);
    }
}
