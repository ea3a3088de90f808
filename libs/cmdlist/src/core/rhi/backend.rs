// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Native layer contracts.
//!
//! A [`Backend`] names the native handle types of one graphics API together
//! with the device, command buffer and encoder objects the recorder drives.
//! The recorder only ever talks to the native layer through these traits.

use std::fmt;

use crate::core::Result;

use super::{
    CullMode, DepthClipMode, Extent3d, FrontFace, IndexFormat, Origin3d, PrimitiveTopology,
    RenderPassDescriptor, RgbaFloat, ScissorRect, Viewport,
};

/// Family of native types for one graphics API.
pub trait Backend: Sized + fmt::Debug + Clone + 'static {
    type Device: NativeDevice<Self>;
    type CommandBuffer: NativeCommandBuffer<Self>;
    type RenderEncoder: NativeRenderEncoder<Self>;
    type BlitEncoder: NativeBlitEncoder<Self>;
    type ComputeEncoder: NativeComputeEncoder<Self>;
    type Fence: NativeFence;

    type Buffer: fmt::Debug + Clone;
    type Texture: fmt::Debug + Clone;
    type Sampler: fmt::Debug + Clone;
    type RenderPipelineState: fmt::Debug;
    type ComputePipelineState: fmt::Debug;
    type DepthStencilState: fmt::Debug;
}

/// Device/queue services consumed by the recorder.
pub trait NativeDevice<B: Backend> {
    /// Allocate a fresh command buffer from the device queue.
    fn new_command_buffer(&self) -> Result<B::CommandBuffer>;

    /// Create a CPU-visible buffer of at least `size` bytes.
    fn new_staging_buffer(&self, size: u64) -> Result<B::Buffer>;

    /// Write `data` into a CPU-visible buffer at `offset`.
    fn write_staging_buffer(&self, buffer: &B::Buffer, offset: u64, data: &[u8]) -> Result<()>;
}

/// A native command buffer. Encoders are opened from it one at a time.
pub trait NativeCommandBuffer<B: Backend> {
    fn render_command_encoder(
        &mut self,
        desc: &RenderPassDescriptor<B>,
    ) -> Result<B::RenderEncoder>;

    fn blit_command_encoder(&mut self) -> Result<B::BlitEncoder>;

    fn compute_command_encoder(&mut self) -> Result<B::ComputeEncoder>;

    /// Hand the finished command buffer to the queue. The returned fence
    /// reports when the GPU has finished executing it.
    fn commit(self) -> Result<B::Fence>;
}

/// Completion signal for a committed command buffer.
pub trait NativeFence {
    fn is_complete(&self) -> bool;

    /// Block until the GPU has finished the submission.
    fn wait(&self);
}

/// Render command encoder calls.
pub trait NativeRenderEncoder<B: Backend> {
    fn set_viewports(&mut self, viewports: &[Viewport]);
    fn set_scissor_rects(&mut self, rects: &[ScissorRect]);
    fn set_render_pipeline_state(&mut self, state: &B::RenderPipelineState);
    fn set_cull_mode(&mut self, mode: CullMode);
    fn set_front_facing(&mut self, winding: FrontFace);
    fn set_blend_color(&mut self, color: RgbaFloat);
    fn set_depth_stencil_state(&mut self, state: &B::DepthStencilState);
    fn set_depth_clip_mode(&mut self, mode: DepthClipMode);

    fn set_vertex_buffer(&mut self, buffer: &B::Buffer, offset: u64, index: u32);
    fn set_fragment_buffer(&mut self, buffer: &B::Buffer, offset: u64, index: u32);
    fn set_vertex_texture(&mut self, texture: &B::Texture, index: u32);
    fn set_fragment_texture(&mut self, texture: &B::Texture, index: u32);
    fn set_vertex_sampler(&mut self, sampler: &B::Sampler, index: u32);
    fn set_fragment_sampler(&mut self, sampler: &B::Sampler, index: u32);

    fn draw_primitives(
        &mut self,
        topology: PrimitiveTopology,
        vertex_start: u32,
        vertex_count: u32,
        instance_count: u32,
        base_instance: u32,
    );

    #[allow(clippy::too_many_arguments)]
    fn draw_indexed_primitives(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        index_format: IndexFormat,
        index_buffer: &B::Buffer,
        index_buffer_offset: u64,
        instance_count: u32,
        base_vertex: i32,
        base_instance: u32,
    );

    fn draw_primitives_indirect(
        &mut self,
        topology: PrimitiveTopology,
        indirect_buffer: &B::Buffer,
        indirect_offset: u64,
    );

    fn draw_indexed_primitives_indirect(
        &mut self,
        topology: PrimitiveTopology,
        index_format: IndexFormat,
        index_buffer: &B::Buffer,
        index_buffer_offset: u64,
        indirect_buffer: &B::Buffer,
        indirect_offset: u64,
    );

    fn end_encoding(&mut self);
}

/// Blit command encoder calls.
pub trait NativeBlitEncoder<B: Backend> {
    fn copy_buffer(
        &mut self,
        src: &B::Buffer,
        src_offset: u64,
        dst: &B::Buffer,
        dst_offset: u64,
        size: u64,
    );

    #[allow(clippy::too_many_arguments)]
    fn copy_buffer_to_texture(
        &mut self,
        src: &B::Buffer,
        src_offset: u64,
        src_bytes_per_row: u64,
        src_bytes_per_image: u64,
        size: Extent3d,
        dst: &B::Texture,
        dst_slice: u32,
        dst_level: u32,
        dst_origin: Origin3d,
    );

    #[allow(clippy::too_many_arguments)]
    fn copy_texture_to_buffer(
        &mut self,
        src: &B::Texture,
        src_slice: u32,
        src_level: u32,
        src_origin: Origin3d,
        size: Extent3d,
        dst: &B::Buffer,
        dst_offset: u64,
        dst_bytes_per_row: u64,
        dst_bytes_per_image: u64,
    );

    fn end_encoding(&mut self);
}

/// Compute command encoder calls.
pub trait NativeComputeEncoder<B: Backend> {
    fn set_compute_pipeline_state(&mut self, state: &B::ComputePipelineState);
    fn set_buffer(&mut self, buffer: &B::Buffer, offset: u64, index: u32);
    fn dispatch_thread_groups(&mut self, groups: Extent3d, threads_per_group: Extent3d);
    fn dispatch_thread_groups_indirect(
        &mut self,
        indirect_buffer: &B::Buffer,
        indirect_offset: u64,
        threads_per_group: Extent3d,
    );
    fn end_encoding(&mut self);
}
