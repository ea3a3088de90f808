// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Deferred state: what has been set on the recorder but not yet pushed to
//! the open encoder.

use std::sync::Arc;

use crate::core::rhi::{
    Backend, Buffer, ComputePipeline, GraphicsPipeline, ResourceSet, ScissorRect, Viewport,
};
use crate::core::{CmdListError, Result};

/// Slot-indexed bindings with a per-slot "already pushed" flag.
#[derive(Debug)]
pub(crate) struct BoundSlots<T> {
    entries: Vec<Option<T>>,
    active: Vec<bool>,
}

impl<T> Default for BoundSlots<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            active: Vec::new(),
        }
    }
}

impl<T> BoundSlots<T> {
    /// Drop every binding and resize to `count` empty slots.
    pub(crate) fn reset(&mut self, count: usize) {
        self.entries.clear();
        self.entries.resize_with(count, || None);
        self.active.clear();
        self.active.resize(count, false);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Bind `value` at `slot`. The slot must already exist.
    pub(crate) fn set(&mut self, slot: usize, value: T) -> Result<()> {
        let count = self.entries.len();
        let entry = self.entries.get_mut(slot).ok_or_else(|| {
            CmdListError::OutOfBounds(format!("slot {} of {} declared", slot, count))
        })?;
        *entry = Some(value);
        self.active[slot] = false;
        Ok(())
    }

    /// Bind `value` at `slot`, growing the slot list as needed.
    pub(crate) fn set_growing(&mut self, slot: usize, value: T) {
        if slot >= self.entries.len() {
            self.entries.resize_with(slot + 1, || None);
            self.active.resize(slot + 1, false);
        }
        self.entries[slot] = Some(value);
        self.active[slot] = false;
    }

    #[cfg(test)]
    pub(crate) fn get(&self, slot: usize) -> Option<&T> {
        self.entries.get(slot).and_then(Option::as_ref)
    }

    pub(crate) fn mark_active(&mut self, slot: usize) {
        if let Some(active) = self.active.get_mut(slot) {
            *active = true;
        }
    }

    /// Force every slot to be pushed again on next use.
    pub(crate) fn mark_all_inactive(&mut self) {
        self.active.iter_mut().for_each(|active| *active = false);
    }

    pub(crate) fn active_flags(&self) -> &[bool] {
        &self.active
    }

    /// First slot that must be pushed but has nothing bound.
    pub(crate) fn first_unbound_pending(&self) -> Option<usize> {
        (0..self.entries.len()).find(|&slot| !self.active[slot] && self.entries[slot].is_none())
    }

    /// Slots waiting to be pushed, with their bindings.
    pub(crate) fn pending(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(slot, _)| !self.active[*slot])
            .filter_map(|(slot, entry)| entry.as_ref().map(|value| (slot, value)))
    }
}

/// Per-render-target values with one dirty flag for the whole array.
#[derive(Debug, Default)]
pub(crate) struct TrackedArray<T> {
    values: Vec<T>,
    dirty: bool,
}

impl<T: Copy + Default> TrackedArray<T> {
    /// Resize to `count` default values.
    pub(crate) fn reset(&mut self, count: usize) {
        self.values.clear();
        self.values.resize(count, T::default());
    }

    pub(crate) fn set(&mut self, index: usize, value: T) -> Result<()> {
        let count = self.values.len();
        let slot = self.values.get_mut(index).ok_or_else(|| {
            CmdListError::OutOfBounds(format!("index {} of {} render targets", index, count))
        })?;
        *slot = value;
        self.dirty = true;
        Ok(())
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn values(&self) -> &[T] {
        &self.values
    }
}

/// A vertex buffer bound at a vertex-buffer slot.
#[derive(Debug)]
pub(crate) struct VertexBinding<B: Backend> {
    pub(crate) buffer: Arc<Buffer<B>>,
    pub(crate) offset: u64,
}

/// Pending depth/stencil clear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DepthClear {
    pub(crate) depth: f32,
    pub(crate) stencil: u8,
}

/// Graphics-domain state.
#[derive(Debug)]
pub(crate) struct GraphicsState<B: Backend> {
    pub(crate) pipeline: Option<Arc<GraphicsPipeline<B>>>,
    pub(crate) pipeline_changed: bool,
    pub(crate) resource_sets: BoundSlots<Arc<ResourceSet<B>>>,
    pub(crate) vertex_buffers: BoundSlots<VertexBinding<B>>,
    pub(crate) viewports: TrackedArray<Viewport>,
    pub(crate) scissors: TrackedArray<ScissorRect>,
}

impl<B: Backend> Default for GraphicsState<B> {
    fn default() -> Self {
        Self {
            pipeline: None,
            pipeline_changed: false,
            resource_sets: BoundSlots::default(),
            vertex_buffers: BoundSlots::default(),
            viewports: TrackedArray::default(),
            scissors: TrackedArray::default(),
        }
    }
}

impl<B: Backend> GraphicsState<B> {
    pub(crate) fn set_pipeline(&mut self, pipeline: Arc<GraphicsPipeline<B>>) {
        self.resource_sets.reset(pipeline.resource_layouts.len());
        self.pipeline = Some(pipeline);
        self.pipeline_changed = true;
    }

    /// The render encoder was closed: everything must be re-sent.
    pub(crate) fn invalidate(&mut self) {
        self.pipeline_changed = true;
        self.resource_sets.mark_all_inactive();
        self.vertex_buffers.mark_all_inactive();
        self.viewports.mark_dirty();
        self.scissors.mark_dirty();
    }
}

/// Compute-domain state.
#[derive(Debug)]
pub(crate) struct ComputeState<B: Backend> {
    pub(crate) pipeline: Option<Arc<ComputePipeline<B>>>,
    pub(crate) pipeline_changed: bool,
    pub(crate) resource_sets: BoundSlots<Arc<ResourceSet<B>>>,
}

impl<B: Backend> Default for ComputeState<B> {
    fn default() -> Self {
        Self {
            pipeline: None,
            pipeline_changed: false,
            resource_sets: BoundSlots::default(),
        }
    }
}

impl<B: Backend> ComputeState<B> {
    pub(crate) fn set_pipeline(&mut self, pipeline: Arc<ComputePipeline<B>>) {
        self.resource_sets.reset(pipeline.resource_layouts.len());
        self.pipeline = Some(pipeline);
        self.pipeline_changed = true;
    }

    /// The compute encoder was closed.
    pub(crate) fn invalidate(&mut self) {
        self.pipeline_changed = true;
        self.resource_sets.mark_all_inactive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_bindings_and_flags() {
        let mut slots = BoundSlots::default();
        slots.reset(2);
        slots.set(0, 'a').expect("set");
        slots.mark_active(0);
        assert_eq!(slots.active_flags(), &[true, false]);

        slots.reset(3);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.active_flags(), &[false, false, false]);
        assert!(slots.get(0).is_none());
    }

    #[test]
    fn test_set_past_declared_count_is_out_of_bounds() {
        let mut slots = BoundSlots::default();
        slots.reset(1);
        assert!(matches!(slots.set(1, 7u32), Err(CmdListError::OutOfBounds(_))));
    }

    #[test]
    fn test_rebinding_clears_active_flag() {
        let mut slots = BoundSlots::default();
        slots.reset(2);
        slots.set(1, 1u32).expect("set");
        slots.mark_active(1);
        assert_eq!(slots.pending().count(), 0);

        slots.set(1, 2u32).expect("set");
        let pending: Vec<_> = slots.pending().collect();
        assert_eq!(pending, vec![(1, &2u32)]);
        assert_eq!(slots.first_unbound_pending(), Some(0));
    }

    #[test]
    fn test_growing_slots() {
        let mut slots = BoundSlots::default();
        slots.set_growing(2, "vb");
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.pending().count(), 1);
        assert_eq!(slots.first_unbound_pending(), Some(0));
    }

    #[test]
    fn test_single_write_marks_whole_array_dirty() {
        let mut viewports: TrackedArray<Viewport> = TrackedArray::default();
        viewports.reset(2);
        assert!(!viewports.is_dirty());

        viewports
            .set(1, Viewport::new(0.0, 0.0, 64.0, 64.0, 0.0, 1.0))
            .expect("set");
        assert!(viewports.is_dirty());
        assert_eq!(viewports.values().len(), 2);

        viewports.clear_dirty();
        assert!(matches!(
            viewports.set(2, Viewport::default()),
            Err(CmdListError::OutOfBounds(_))
        ));
        assert!(!viewports.is_dirty());
    }
}
