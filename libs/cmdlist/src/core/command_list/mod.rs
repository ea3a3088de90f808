// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The command recorder.
//!
//! [`CommandList`] turns draw, dispatch and copy calls into native encoder
//! calls. State setters only record what changed; the next draw or dispatch
//! opens the right encoder and pushes the changed state before the command.

mod binding;
mod copy;
mod dirty;
mod encoder;

use std::sync::Arc;

use crate::core::config::CommandListConfig;
use crate::core::rhi::{
    Backend, Buffer, BufferUsage, ComputePipeline, Extent3d, GraphicsPipeline, IndexFormat,
    NativeCommandBuffer, NativeComputeEncoder, NativeDevice, NativeFence, NativeRenderEncoder,
    Pipeline, RenderTarget, ResourceCounts, ResourceLayout, ResourceSet, RgbaFloat, ScissorRect,
    Viewport,
};
use crate::core::staging::StagingPool;
use crate::core::{CmdListError, Result};

pub use binding::resource_base;
pub use copy::TextureCopy;
pub use encoder::EncoderKind;

use dirty::{ComputeState, DepthClear, GraphicsState, VertexBinding};
use encoder::EncoderState;

/// Index buffer consumed by indexed draws.
#[derive(Debug)]
struct IndexBinding<B: Backend> {
    buffer: Arc<Buffer<B>>,
    format: IndexFormat,
    offset: u64,
}

/// A committed recording. Reports when the GPU has finished executing it.
pub struct Submission<B: Backend> {
    fence: Arc<B::Fence>,
}

impl<B: Backend> Submission<B> {
    pub fn is_complete(&self) -> bool {
        self.fence.is_complete()
    }

    /// Block until the GPU has finished the recording.
    pub fn wait(&self) {
        self.fence.wait();
    }
}

impl<B: Backend> std::fmt::Debug for Submission<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission")
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// Records GPU work for one native command buffer at a time.
///
/// A recording runs `begin`, any number of commands, `end`, then `commit`.
/// A fresh list is already recording, so the first `begin` is optional.
pub struct CommandList<B: Backend> {
    device: B::Device,
    config: CommandListConfig,
    staging: StagingPool<B>,
    command_buffer: Option<B::CommandBuffer>,
    encoder: EncoderState<B>,

    framebuffer: Option<Arc<dyn RenderTarget<B>>>,
    framebuffer_ever_active: bool,
    clear_colors: Vec<Option<RgbaFloat>>,
    clear_depth: Option<DepthClear>,

    index_buffer: Option<IndexBinding<B>>,
    graphics: GraphicsState<B>,
    compute: ComputeState<B>,

    /// Upload buffers referenced by this recording, released at commit.
    staging_buffers: Vec<Buffer<B>>,
}

impl<B: Backend> CommandList<B> {
    /// Create a recorder with its own staging pool.
    pub fn new(device: B::Device, config: CommandListConfig) -> Result<Self> {
        let staging = StagingPool::new(config.staging.clone());
        Self::with_staging_pool(device, config, staging)
    }

    /// Create a recorder that shares `staging` with other recorders.
    pub fn with_staging_pool(
        device: B::Device,
        config: CommandListConfig,
        staging: StagingPool<B>,
    ) -> Result<Self> {
        let command_buffer = device.new_command_buffer()?;
        tracing::debug!(label = ?config.label, "Created command list");
        Ok(Self {
            device,
            config,
            staging,
            command_buffer: Some(command_buffer),
            encoder: EncoderState::new(),
            framebuffer: None,
            framebuffer_ever_active: false,
            clear_colors: Vec::new(),
            clear_depth: None,
            index_buffer: None,
            graphics: GraphicsState::default(),
            compute: ComputeState::default(),
            staging_buffers: Vec::new(),
        })
    }

    pub fn label(&self) -> Option<&str> {
        self.config.label.as_deref()
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn staging_pool(&self) -> &StagingPool<B> {
        &self.staging
    }

    /// Start a new recording.
    ///
    /// Any uncommitted work is discarded together with every piece of cached
    /// state. Staging buffers of the discarded work go straight back to the pool.
    pub fn begin(&mut self) -> Result<()> {
        self.encoder.close();
        self.command_buffer = None;
        self.staging.release(std::mem::take(&mut self.staging_buffers));
        self.clear_cached_state();
        self.command_buffer = Some(self.device.new_command_buffer()?);
        tracing::debug!(label = ?self.config.label, "Began recording");
        Ok(())
    }

    fn clear_cached_state(&mut self) {
        self.framebuffer = None;
        self.framebuffer_ever_active = false;
        self.clear_colors.clear();
        self.clear_depth = None;
        self.index_buffer = None;
        self.graphics = GraphicsState::default();
        self.compute = ComputeState::default();
    }

    /// Finish recording.
    ///
    /// Clears requested on a framebuffer that was never drawn to still get
    /// their render pass. No encoder is left open. Does not submit.
    pub fn end(&mut self) -> Result<()> {
        if self.command_buffer.is_none() {
            return Err(CmdListError::InvalidState(
                "end() called on a command list that is not recording".into(),
            ));
        }
        self.ensure_no_blit_encoder();
        self.ensure_no_compute_encoder();
        if self.framebuffer.is_some() && !self.framebuffer_ever_active {
            self.begin_current_render_pass()?;
        }
        self.ensure_no_render_pass();
        tracing::debug!(label = ?self.config.label, "Ended recording");
        Ok(())
    }

    /// Submit the finished recording to the device queue.
    ///
    /// Staging buffers used by the recording stay reserved until the returned
    /// submission completes. Call `begin` before recording again.
    pub fn commit(&mut self) -> Result<Submission<B>> {
        let open = self.encoder.kind();
        if open != EncoderKind::None {
            return Err(CmdListError::InvalidState(format!(
                "commit() with an open {} encoder, call end() first",
                open
            )));
        }
        let command_buffer = self.command_buffer.take().ok_or_else(|| {
            CmdListError::InvalidState("commit() on a command list that is not recording".into())
        })?;

        let staging_buffers = std::mem::take(&mut self.staging_buffers);
        let fence = match command_buffer.commit() {
            Ok(fence) => Arc::new(fence),
            Err(e) => {
                self.staging.release(staging_buffers);
                return Err(e);
            }
        };
        tracing::debug!(
            label = ?self.config.label,
            staging_buffers = staging_buffers.len(),
            "Committed recording"
        );
        self.staging.retire(Arc::clone(&fence), staging_buffers);
        Ok(Submission { fence })
    }

    /// Bind the framebuffer subsequent draws render into.
    ///
    /// Pending clears on a framebuffer that was never drawn to are flushed
    /// first. Viewports and scissors are reset to cover the new target.
    pub fn set_framebuffer(&mut self, framebuffer: Arc<dyn RenderTarget<B>>) -> Result<()> {
        if let Some(current) = &self.framebuffer {
            if Arc::ptr_eq(current, &framebuffer) {
                return Ok(());
            }
            if !self.framebuffer_ever_active && self.ensure_render_pass()? {
                self.end_current_render_pass();
            }
        }
        self.ensure_no_render_pass();

        let color_targets = framebuffer.color_target_count();
        let viewport_count = color_targets.max(1);
        self.graphics.viewports.reset(viewport_count);
        self.graphics.scissors.reset(viewport_count);
        self.clear_colors.clear();
        self.clear_colors.resize(color_targets, None);
        self.clear_depth = None;
        self.framebuffer_ever_active = false;
        self.framebuffer = Some(framebuffer);

        self.set_full_viewports()?;
        self.set_full_scissor_rects()?;
        tracing::trace!(color_targets, "Bound framebuffer");
        Ok(())
    }

    /// Bind a graphics or compute pipeline.
    ///
    /// Resource set slots of that domain are resized to the pipeline's layout
    /// count and emptied.
    pub fn set_pipeline(&mut self, pipeline: impl Into<Pipeline<B>>) {
        match pipeline.into() {
            Pipeline::Graphics(pipeline) => self.graphics.set_pipeline(pipeline),
            Pipeline::Compute(pipeline) => self.compute.set_pipeline(pipeline),
        }
    }

    pub fn set_graphics_resource_set(
        &mut self,
        slot: usize,
        set: Arc<ResourceSet<B>>,
    ) -> Result<()> {
        let pipeline = self
            .graphics
            .pipeline
            .as_ref()
            .ok_or(CmdListError::NoPipeline("graphics"))?;
        check_set_layout(&pipeline.resource_layouts, slot, &set)?;
        self.graphics.resource_sets.set(slot, set)
    }

    pub fn set_compute_resource_set(
        &mut self,
        slot: usize,
        set: Arc<ResourceSet<B>>,
    ) -> Result<()> {
        let pipeline = self
            .compute
            .pipeline
            .as_ref()
            .ok_or(CmdListError::NoPipeline("compute"))?;
        check_set_layout(&pipeline.resource_layouts, slot, &set)?;
        self.compute.resource_sets.set(slot, set)
    }

    /// Bind a vertex buffer. Pushed to the render encoder at the next draw.
    pub fn set_vertex_buffer(
        &mut self,
        index: u32,
        buffer: Arc<Buffer<B>>,
        offset: u64,
    ) -> Result<()> {
        if !buffer.usage().contains(BufferUsage::VERTEX) {
            return Err(CmdListError::ResourceMismatch(format!(
                "vertex buffer {} lacks VERTEX usage",
                index
            )));
        }
        if offset > buffer.size() {
            return Err(CmdListError::OutOfBounds(format!(
                "vertex buffer offset {} exceeds size {}",
                offset,
                buffer.size()
            )));
        }
        self.graphics
            .vertex_buffers
            .set_growing(index as usize, VertexBinding { buffer, offset });
        Ok(())
    }

    /// Bind the index buffer. Indexed draws read from `offset` onwards.
    pub fn set_index_buffer(
        &mut self,
        buffer: Arc<Buffer<B>>,
        format: IndexFormat,
        offset: u64,
    ) -> Result<()> {
        if !buffer.usage().contains(BufferUsage::INDEX) {
            return Err(CmdListError::ResourceMismatch("index buffer lacks INDEX usage".into()));
        }
        if offset > buffer.size() {
            return Err(CmdListError::OutOfBounds(format!(
                "index buffer offset {} exceeds size {}",
                offset,
                buffer.size()
            )));
        }
        self.index_buffer = Some(IndexBinding {
            buffer,
            format,
            offset,
        });
        Ok(())
    }

    pub fn set_viewport(&mut self, index: usize, viewport: Viewport) -> Result<()> {
        self.graphics.viewports.set(index, viewport)
    }

    /// Set every viewport to cover the whole framebuffer.
    pub fn set_full_viewports(&mut self) -> Result<()> {
        let (width, height) = self.framebuffer_extent()?;
        let full = Viewport::new(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        for index in 0..self.graphics.viewports.values().len() {
            self.graphics.viewports.set(index, full)?;
        }
        Ok(())
    }

    pub fn set_scissor_rect(&mut self, index: usize, rect: ScissorRect) -> Result<()> {
        self.graphics.scissors.set(index, rect)
    }

    /// Set every scissor rectangle to cover the whole framebuffer.
    pub fn set_full_scissor_rects(&mut self) -> Result<()> {
        let (width, height) = self.framebuffer_extent()?;
        let full = ScissorRect::new(0, 0, width, height);
        for index in 0..self.graphics.scissors.values().len() {
            self.graphics.scissors.set(index, full)?;
        }
        Ok(())
    }

    fn framebuffer_extent(&self) -> Result<(u32, u32)> {
        self.framebuffer
            .as_ref()
            .map(|framebuffer| framebuffer.extent())
            .ok_or(CmdListError::NoFramebuffer)
    }

    /// Request a clear of color target `index`, applied when the next render pass begins.
    pub fn clear_color_target(&mut self, index: usize, color: RgbaFloat) -> Result<()> {
        if self.framebuffer.is_none() {
            return Err(CmdListError::NoFramebuffer);
        }
        if index >= self.clear_colors.len() {
            return Err(CmdListError::OutOfBounds(format!(
                "color target {} of {}",
                index,
                self.clear_colors.len()
            )));
        }
        self.ensure_no_render_pass();
        self.clear_colors[index] = Some(color);
        Ok(())
    }

    /// Request a depth/stencil clear, applied when the next render pass begins.
    pub fn clear_depth_stencil(&mut self, depth: f32, stencil: u8) -> Result<()> {
        let framebuffer = self.framebuffer.as_ref().ok_or(CmdListError::NoFramebuffer)?;
        if framebuffer.depth_target_format().is_none() {
            return Err(CmdListError::NoDepthTarget);
        }
        self.ensure_no_render_pass();
        self.clear_depth = Some(DepthClear { depth, stencil });
        Ok(())
    }

    pub fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        vertex_start: u32,
        instance_start: u32,
    ) -> Result<()> {
        let Some(pipeline) = self.pre_draw()? else {
            return Ok(());
        };
        self.encoder.render()?.draw_primitives(
            pipeline.topology,
            vertex_start,
            vertex_count,
            instance_count,
            instance_start,
        );
        Ok(())
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        index_start: u32,
        vertex_offset: i32,
        instance_start: u32,
    ) -> Result<()> {
        if self.index_buffer.is_none() {
            return Err(CmdListError::NoIndexBuffer);
        }
        let Some(pipeline) = self.pre_draw()? else {
            return Ok(());
        };
        let (encoder, index) = self.render_with_index()?;
        let offset = index.offset + index.format.size_in_bytes() * index_start as u64;
        encoder.draw_indexed_primitives(
            pipeline.topology,
            index_count,
            index.format,
            index.buffer.raw(),
            offset,
            instance_count,
            vertex_offset,
            instance_start,
        );
        Ok(())
    }

    /// Issue `draw_count` draws whose arguments live in `indirect_buffer`,
    /// each record `stride` bytes after the previous one.
    pub fn draw_indirect(
        &mut self,
        indirect_buffer: &Buffer<B>,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<()> {
        let Some(pipeline) = self.pre_draw()? else {
            return Ok(());
        };
        let encoder = self.encoder.render()?;
        for i in 0..draw_count as u64 {
            encoder.draw_primitives_indirect(
                pipeline.topology,
                indirect_buffer.raw(),
                offset + i * stride as u64,
            );
        }
        Ok(())
    }

    /// Indexed variant of [`CommandList::draw_indirect`].
    pub fn draw_indexed_indirect(
        &mut self,
        indirect_buffer: &Buffer<B>,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<()> {
        if self.index_buffer.is_none() {
            return Err(CmdListError::NoIndexBuffer);
        }
        let Some(pipeline) = self.pre_draw()? else {
            return Ok(());
        };
        let (encoder, index) = self.render_with_index()?;
        for i in 0..draw_count as u64 {
            encoder.draw_indexed_primitives_indirect(
                pipeline.topology,
                index.format,
                index.buffer.raw(),
                index.offset,
                indirect_buffer.raw(),
                offset + i * stride as u64,
            );
        }
        Ok(())
    }

    fn render_with_index(&mut self) -> Result<(&mut B::RenderEncoder, &IndexBinding<B>)> {
        let index = self.index_buffer.as_ref().ok_or(CmdListError::NoIndexBuffer)?;
        let encoder = self.encoder.render()?;
        Ok((encoder, index))
    }

    /// Open a render pass and push changed graphics state.
    ///
    /// Returns `None` when the framebuffer is not renderable; the draw is skipped.
    fn pre_draw(&mut self) -> Result<Option<Arc<GraphicsPipeline<B>>>> {
        let pipeline = self
            .graphics
            .pipeline
            .clone()
            .ok_or(CmdListError::NoPipeline("graphics"))?;
        if let Some(slot) = self.graphics.resource_sets.first_unbound_pending() {
            return Err(CmdListError::ResourceSetNotBound { slot });
        }
        if !self.ensure_render_pass()? {
            return Ok(None);
        }
        let has_depth = self
            .framebuffer
            .as_ref()
            .is_some_and(|framebuffer| framebuffer.depth_target_format().is_some());

        let encoder = self.encoder.render()?;
        let graphics = &mut self.graphics;

        if graphics.viewports.is_dirty() {
            encoder.set_viewports(graphics.viewports.values());
            graphics.viewports.clear_dirty();
        }
        if graphics.scissors.is_dirty() && pipeline.scissor_test_enabled {
            encoder.set_scissor_rects(graphics.scissors.values());
            graphics.scissors.clear_dirty();
        }
        if graphics.pipeline_changed {
            encoder.set_render_pipeline_state(&pipeline.render_pipeline_state);
            encoder.set_cull_mode(pipeline.cull_mode);
            encoder.set_front_facing(pipeline.front_face);
            encoder.set_blend_color(pipeline.blend_color);
            if has_depth {
                encoder.set_depth_stencil_state(&pipeline.depth_stencil_state);
                encoder.set_depth_clip_mode(pipeline.depth_clip_mode);
            }
            graphics.pipeline_changed = false;
        }

        let pending: Vec<(usize, Arc<ResourceSet<B>>)> = graphics
            .resource_sets
            .pending()
            .map(|(slot, set)| (slot, Arc::clone(set)))
            .collect();
        for (slot, set) in pending {
            binding::activate_graphics_set::<B>(
                encoder,
                &pipeline.resource_layouts,
                pipeline.vertex_buffer_count,
                slot,
                &set,
            );
            graphics.resource_sets.mark_active(slot);
        }

        let mut pushed = Vec::new();
        for (slot, vertex) in graphics.vertex_buffers.pending() {
            encoder.set_vertex_buffer(vertex.buffer.raw(), vertex.offset, slot as u32);
            pushed.push(slot);
        }
        for slot in pushed {
            graphics.vertex_buffers.mark_active(slot);
        }

        Ok(Some(pipeline))
    }

    pub fn dispatch(
        &mut self,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> Result<()> {
        let pipeline = self.pre_compute()?;
        self.encoder.compute()?.dispatch_thread_groups(
            Extent3d::new(group_count_x, group_count_y, group_count_z),
            pipeline.threads_per_group,
        );
        Ok(())
    }

    /// Dispatch with thread-group counts read from `indirect_buffer` at `offset`.
    pub fn dispatch_indirect(&mut self, indirect_buffer: &Buffer<B>, offset: u64) -> Result<()> {
        let pipeline = self.pre_compute()?;
        self.encoder.compute()?.dispatch_thread_groups_indirect(
            indirect_buffer.raw(),
            offset,
            pipeline.threads_per_group,
        );
        Ok(())
    }

    /// Open a compute encoder and push changed compute state.
    fn pre_compute(&mut self) -> Result<Arc<ComputePipeline<B>>> {
        let pipeline = self
            .compute
            .pipeline
            .clone()
            .ok_or(CmdListError::NoPipeline("compute"))?;
        if let Some(slot) = self.compute.resource_sets.first_unbound_pending() {
            return Err(CmdListError::ResourceSetNotBound { slot });
        }
        let pending: Vec<(usize, Arc<ResourceSet<B>>)> = self
            .compute
            .resource_sets
            .pending()
            .map(|(slot, set)| (slot, Arc::clone(set)))
            .collect();
        for (slot, set) in &pending {
            binding::check_compute_set(*slot, set)?;
        }

        self.ensure_compute_encoder()?;
        let encoder = self.encoder.compute()?;
        let compute = &mut self.compute;

        if compute.pipeline_changed {
            encoder.set_compute_pipeline_state(&pipeline.compute_pipeline_state);
            compute.pipeline_changed = false;
        }
        for (slot, set) in pending {
            binding::activate_compute_set::<B>(encoder, &pipeline.resource_layouts, slot, &set);
            compute.resource_sets.mark_active(slot);
        }

        Ok(pipeline)
    }

    /// Kind of native encoder currently open.
    pub fn active_encoder(&self) -> EncoderKind {
        self.encoder.kind()
    }

    /// Whether a native command buffer is available for recording.
    pub fn is_recording(&self) -> bool {
        self.command_buffer.is_some()
    }

    /// Per-slot flags: has the graphics resource set been pushed to the current encoder.
    pub fn graphics_resource_sets_active(&self) -> &[bool] {
        self.graphics.resource_sets.active_flags()
    }

    pub fn compute_resource_sets_active(&self) -> &[bool] {
        self.compute.resource_sets.active_flags()
    }

    /// Native index bases of graphics set `set_index` under the bound pipeline.
    pub fn graphics_resource_base(&self, set_index: usize) -> Result<ResourceCounts> {
        let pipeline = self
            .graphics
            .pipeline
            .as_ref()
            .ok_or(CmdListError::NoPipeline("graphics"))?;
        Ok(resource_base(&pipeline.resource_layouts, set_index))
    }

    pub fn compute_resource_base(&self, set_index: usize) -> Result<ResourceCounts> {
        let pipeline = self
            .compute
            .pipeline
            .as_ref()
            .ok_or(CmdListError::NoPipeline("compute"))?;
        Ok(resource_base(&pipeline.resource_layouts, set_index))
    }

    /// Staging buffers this recording holds until commit.
    pub fn staging_buffer_count(&self) -> usize {
        self.staging_buffers.len()
    }
}

fn check_set_layout<B: Backend>(
    layouts: &[Arc<ResourceLayout>],
    slot: usize,
    set: &ResourceSet<B>,
) -> Result<()> {
    let layout = layouts.get(slot).ok_or_else(|| {
        CmdListError::OutOfBounds(format!(
            "resource set slot {} of {} declared",
            slot,
            layouts.len()
        ))
    })?;
    if !Arc::ptr_eq(layout, set.layout()) && **layout != **set.layout() {
        return Err(CmdListError::ResourceMismatch(format!(
            "resource set does not match the pipeline layout at slot {}",
            slot
        )));
    }
    Ok(())
}

impl<B: Backend> Drop for CommandList<B> {
    fn drop(&mut self) {
        if self.encoder.close() != EncoderKind::None {
            tracing::debug!(label = ?self.config.label, "Closed open encoder on drop");
        }
        self.staging.release(std::mem::take(&mut self.staging_buffers));
    }
}

impl<B: Backend> std::fmt::Debug for CommandList<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandList")
            .field("label", &self.config.label)
            .field("recording", &self.is_recording())
            .field("encoder", &self.encoder.kind())
            .field("staging_buffers", &self.staging_buffers.len())
            .finish()
    }
}
