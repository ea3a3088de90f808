// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Metal render, blit and compute encoders.

use metal::MTLBlitOption;

use crate::core::rhi::{
    CullMode, DepthClipMode, Extent3d, FrontFace, IndexFormat, NativeBlitEncoder,
    NativeComputeEncoder, NativeRenderEncoder, Origin3d, PrimitiveTopology, RgbaFloat,
    ScissorRect, Viewport,
};

use super::MetalBackend;
use super::metal_format::{
    cull_mode, depth_clip_mode, index_type, origin, primitive_type, scissor_rect, size, viewport,
    winding,
};

#[derive(Debug)]
pub struct MetalRenderEncoder {
    encoder: metal::RenderCommandEncoder,
}

impl MetalRenderEncoder {
    pub(super) fn new(encoder: metal::RenderCommandEncoder) -> Self {
        Self { encoder }
    }
}

impl NativeRenderEncoder<MetalBackend> for MetalRenderEncoder {
    // Only slot 0 is applied; multi-viewport needs a layered render target.
    fn set_viewports(&mut self, viewports: &[Viewport]) {
        if let Some(first) = viewports.first() {
            self.encoder.set_viewport(viewport(first));
        }
    }

    fn set_scissor_rects(&mut self, rects: &[ScissorRect]) {
        if let Some(first) = rects.first() {
            self.encoder.set_scissor_rect(scissor_rect(first));
        }
    }

    fn set_render_pipeline_state(&mut self, state: &metal::RenderPipelineState) {
        self.encoder.set_render_pipeline_state(state);
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.encoder.set_cull_mode(cull_mode(mode));
    }

    fn set_front_facing(&mut self, front_face: FrontFace) {
        self.encoder.set_front_facing_winding(winding(front_face));
    }

    fn set_blend_color(&mut self, color: RgbaFloat) {
        self.encoder
            .set_blend_color(color.r, color.g, color.b, color.a);
    }

    fn set_depth_stencil_state(&mut self, state: &metal::DepthStencilState) {
        self.encoder.set_depth_stencil_state(state);
    }

    fn set_depth_clip_mode(&mut self, mode: DepthClipMode) {
        self.encoder.set_depth_clip_mode(depth_clip_mode(mode));
    }

    fn set_vertex_buffer(&mut self, buffer: &metal::Buffer, offset: u64, index: u32) {
        self.encoder
            .set_vertex_buffer(index as u64, Some(buffer), offset);
    }

    fn set_fragment_buffer(&mut self, buffer: &metal::Buffer, offset: u64, index: u32) {
        self.encoder
            .set_fragment_buffer(index as u64, Some(buffer), offset);
    }

    fn set_vertex_texture(&mut self, texture: &metal::Texture, index: u32) {
        self.encoder.set_vertex_texture(index as u64, Some(texture));
    }

    fn set_fragment_texture(&mut self, texture: &metal::Texture, index: u32) {
        self.encoder.set_fragment_texture(index as u64, Some(texture));
    }

    fn set_vertex_sampler(&mut self, sampler: &metal::SamplerState, index: u32) {
        self.encoder
            .set_vertex_sampler_state(index as u64, Some(sampler));
    }

    fn set_fragment_sampler(&mut self, sampler: &metal::SamplerState, index: u32) {
        self.encoder
            .set_fragment_sampler_state(index as u64, Some(sampler));
    }

    fn draw_primitives(
        &mut self,
        topology: PrimitiveTopology,
        vertex_start: u32,
        vertex_count: u32,
        instance_count: u32,
        base_instance: u32,
    ) {
        self.encoder.draw_primitives_instanced_base_instance(
            primitive_type(topology),
            vertex_start as u64,
            vertex_count as u64,
            instance_count as u64,
            base_instance as u64,
        );
    }

    fn draw_indexed_primitives(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        index_format: IndexFormat,
        index_buffer: &metal::Buffer,
        index_buffer_offset: u64,
        instance_count: u32,
        base_vertex: i32,
        base_instance: u32,
    ) {
        self.encoder.draw_indexed_primitives_instanced_base_instance(
            primitive_type(topology),
            index_count as u64,
            index_type(index_format),
            index_buffer,
            index_buffer_offset,
            instance_count as u64,
            base_vertex as i64,
            base_instance as u64,
        );
    }

    fn draw_primitives_indirect(
        &mut self,
        topology: PrimitiveTopology,
        indirect_buffer: &metal::Buffer,
        indirect_offset: u64,
    ) {
        self.encoder.draw_primitives_indirect(
            primitive_type(topology),
            indirect_buffer,
            indirect_offset,
        );
    }

    fn draw_indexed_primitives_indirect(
        &mut self,
        topology: PrimitiveTopology,
        index_format: IndexFormat,
        index_buffer: &metal::Buffer,
        index_buffer_offset: u64,
        indirect_buffer: &metal::Buffer,
        indirect_offset: u64,
    ) {
        self.encoder.draw_indexed_primitives_indirect(
            primitive_type(topology),
            index_type(index_format),
            index_buffer,
            index_buffer_offset,
            indirect_buffer,
            indirect_offset,
        );
    }

    fn end_encoding(&mut self) {
        self.encoder.end_encoding();
    }
}

#[derive(Debug)]
pub struct MetalBlitEncoder {
    encoder: metal::BlitCommandEncoder,
}

impl MetalBlitEncoder {
    pub(super) fn new(encoder: metal::BlitCommandEncoder) -> Self {
        Self { encoder }
    }
}

impl NativeBlitEncoder<MetalBackend> for MetalBlitEncoder {
    fn copy_buffer(
        &mut self,
        src: &metal::Buffer,
        src_offset: u64,
        dst: &metal::Buffer,
        dst_offset: u64,
        size: u64,
    ) {
        self.encoder
            .copy_from_buffer(src, src_offset, dst, dst_offset, size);
    }

    fn copy_buffer_to_texture(
        &mut self,
        src: &metal::Buffer,
        src_offset: u64,
        src_bytes_per_row: u64,
        src_bytes_per_image: u64,
        extent: Extent3d,
        dst: &metal::Texture,
        dst_slice: u32,
        dst_level: u32,
        dst_origin: Origin3d,
    ) {
        self.encoder.copy_from_buffer_to_texture(
            src,
            src_offset,
            src_bytes_per_row,
            src_bytes_per_image,
            size(extent),
            dst,
            dst_slice as u64,
            dst_level as u64,
            origin(dst_origin),
            MTLBlitOption::empty(),
        );
    }

    fn copy_texture_to_buffer(
        &mut self,
        src: &metal::Texture,
        src_slice: u32,
        src_level: u32,
        src_origin: Origin3d,
        extent: Extent3d,
        dst: &metal::Buffer,
        dst_offset: u64,
        dst_bytes_per_row: u64,
        dst_bytes_per_image: u64,
    ) {
        self.encoder.copy_from_texture_to_buffer(
            src,
            src_slice as u64,
            src_level as u64,
            origin(src_origin),
            size(extent),
            dst,
            dst_offset,
            dst_bytes_per_row,
            dst_bytes_per_image,
            MTLBlitOption::empty(),
        );
    }

    fn end_encoding(&mut self) {
        self.encoder.end_encoding();
    }
}

#[derive(Debug)]
pub struct MetalComputeEncoder {
    encoder: metal::ComputeCommandEncoder,
}

impl MetalComputeEncoder {
    pub(super) fn new(encoder: metal::ComputeCommandEncoder) -> Self {
        Self { encoder }
    }
}

impl NativeComputeEncoder<MetalBackend> for MetalComputeEncoder {
    fn set_compute_pipeline_state(&mut self, state: &metal::ComputePipelineState) {
        self.encoder.set_compute_pipeline_state(state);
    }

    fn set_buffer(&mut self, buffer: &metal::Buffer, offset: u64, index: u32) {
        self.encoder.set_buffer(index as u64, Some(buffer), offset);
    }

    fn dispatch_thread_groups(&mut self, groups: Extent3d, threads_per_group: Extent3d) {
        self.encoder
            .dispatch_thread_groups(size(groups), size(threads_per_group));
    }

    fn dispatch_thread_groups_indirect(
        &mut self,
        indirect_buffer: &metal::Buffer,
        indirect_offset: u64,
        threads_per_group: Extent3d,
    ) {
        self.encoder.dispatch_thread_groups_indirect(
            indirect_buffer,
            indirect_offset,
            size(threads_per_group),
        );
    }

    fn end_encoding(&mut self) {
        self.encoder.end_encoding();
    }
}
