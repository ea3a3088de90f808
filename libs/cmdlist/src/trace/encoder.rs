// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::core::rhi::{
    CullMode, DepthClipMode, Extent3d, FrontFace, IndexFormat, NativeBlitEncoder,
    NativeComputeEncoder, NativeRenderEncoder, Origin3d, PrimitiveTopology, RenderPassDescriptor,
    RgbaFloat, ScissorRect, Viewport,
};

use super::{
    TraceBackend, TraceBuffer, TraceColorAttachment, TraceCommand, TraceDepthAttachment,
    TraceDevice, TraceSampler, TraceStateObject, TraceStencilAttachment, TraceTexture,
};

pub(crate) fn begin_render_pass(desc: &RenderPassDescriptor<TraceBackend>) -> TraceCommand {
    TraceCommand::BeginRenderPass {
        color_attachments: desc
            .color_attachments
            .iter()
            .map(|color| TraceColorAttachment {
                texture: color.texture.id(),
                load_action: color.load_action,
                store_action: color.store_action,
                clear_color: color.clear_color,
                resolve_texture: color.resolve_texture.as_ref().map(TraceTexture::id),
            })
            .collect(),
        depth_attachment: desc.depth_attachment.as_ref().map(|depth| TraceDepthAttachment {
            texture: depth.texture.id(),
            load_action: depth.load_action,
            clear_depth: depth.clear_depth,
        }),
        stencil_attachment: desc
            .stencil_attachment
            .as_ref()
            .map(|stencil| TraceStencilAttachment {
                texture: stencil.texture.id(),
                load_action: stencil.load_action,
                clear_stencil: stencil.clear_stencil,
            }),
    }
}

#[derive(Debug)]
pub struct TraceRenderEncoder {
    device: TraceDevice,
}

impl TraceRenderEncoder {
    pub(crate) fn new(device: TraceDevice) -> Self {
        Self { device }
    }
}

impl NativeRenderEncoder<TraceBackend> for TraceRenderEncoder {
    fn set_viewports(&mut self, viewports: &[Viewport]) {
        self.device.record(TraceCommand::SetViewports(viewports.to_vec()));
    }

    fn set_scissor_rects(&mut self, rects: &[ScissorRect]) {
        self.device.record(TraceCommand::SetScissorRects(rects.to_vec()));
    }

    fn set_render_pipeline_state(&mut self, state: &TraceStateObject) {
        self.device
            .record(TraceCommand::SetRenderPipelineState(state.id()));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.device.record(TraceCommand::SetCullMode(mode));
    }

    fn set_front_facing(&mut self, winding: FrontFace) {
        self.device.record(TraceCommand::SetFrontFacing(winding));
    }

    fn set_blend_color(&mut self, color: RgbaFloat) {
        self.device.record(TraceCommand::SetBlendColor(color));
    }

    fn set_depth_stencil_state(&mut self, state: &TraceStateObject) {
        self.device
            .record(TraceCommand::SetDepthStencilState(state.id()));
    }

    fn set_depth_clip_mode(&mut self, mode: DepthClipMode) {
        self.device.record(TraceCommand::SetDepthClipMode(mode));
    }

    fn set_vertex_buffer(&mut self, buffer: &TraceBuffer, offset: u64, index: u32) {
        self.device.record(TraceCommand::SetVertexBuffer {
            buffer: buffer.id(),
            offset,
            index,
        });
    }

    fn set_fragment_buffer(&mut self, buffer: &TraceBuffer, offset: u64, index: u32) {
        self.device.record(TraceCommand::SetFragmentBuffer {
            buffer: buffer.id(),
            offset,
            index,
        });
    }

    fn set_vertex_texture(&mut self, texture: &TraceTexture, index: u32) {
        self.device.record(TraceCommand::SetVertexTexture {
            texture: texture.id(),
            index,
        });
    }

    fn set_fragment_texture(&mut self, texture: &TraceTexture, index: u32) {
        self.device.record(TraceCommand::SetFragmentTexture {
            texture: texture.id(),
            index,
        });
    }

    fn set_vertex_sampler(&mut self, sampler: &TraceSampler, index: u32) {
        self.device.record(TraceCommand::SetVertexSampler {
            sampler: sampler.id(),
            index,
        });
    }

    fn set_fragment_sampler(&mut self, sampler: &TraceSampler, index: u32) {
        self.device.record(TraceCommand::SetFragmentSampler {
            sampler: sampler.id(),
            index,
        });
    }

    fn draw_primitives(
        &mut self,
        topology: PrimitiveTopology,
        vertex_start: u32,
        vertex_count: u32,
        instance_count: u32,
        base_instance: u32,
    ) {
        self.device.record(TraceCommand::Draw {
            topology,
            vertex_start,
            vertex_count,
            instance_count,
            base_instance,
        });
    }

    fn draw_indexed_primitives(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        index_format: IndexFormat,
        index_buffer: &TraceBuffer,
        index_buffer_offset: u64,
        instance_count: u32,
        base_vertex: i32,
        base_instance: u32,
    ) {
        self.device.record(TraceCommand::DrawIndexed {
            topology,
            index_count,
            index_format,
            index_buffer: index_buffer.id(),
            index_buffer_offset,
            instance_count,
            base_vertex,
            base_instance,
        });
    }

    fn draw_primitives_indirect(
        &mut self,
        topology: PrimitiveTopology,
        indirect_buffer: &TraceBuffer,
        indirect_offset: u64,
    ) {
        self.device.record(TraceCommand::DrawIndirect {
            topology,
            indirect_buffer: indirect_buffer.id(),
            indirect_offset,
        });
    }

    fn draw_indexed_primitives_indirect(
        &mut self,
        topology: PrimitiveTopology,
        index_format: IndexFormat,
        index_buffer: &TraceBuffer,
        index_buffer_offset: u64,
        indirect_buffer: &TraceBuffer,
        indirect_offset: u64,
    ) {
        self.device.record(TraceCommand::DrawIndexedIndirect {
            topology,
            index_format,
            index_buffer: index_buffer.id(),
            index_buffer_offset,
            indirect_buffer: indirect_buffer.id(),
            indirect_offset,
        });
    }

    fn end_encoding(&mut self) {
        self.device.record(TraceCommand::EndRenderPass);
    }
}

#[derive(Debug)]
pub struct TraceBlitEncoder {
    device: TraceDevice,
}

impl TraceBlitEncoder {
    pub(crate) fn new(device: TraceDevice) -> Self {
        Self { device }
    }
}

impl NativeBlitEncoder<TraceBackend> for TraceBlitEncoder {
    fn copy_buffer(
        &mut self,
        src: &TraceBuffer,
        src_offset: u64,
        dst: &TraceBuffer,
        dst_offset: u64,
        size: u64,
    ) {
        self.device.record(TraceCommand::CopyBuffer {
            src: src.id(),
            src_offset,
            dst: dst.id(),
            dst_offset,
            size,
        });
    }

    fn copy_buffer_to_texture(
        &mut self,
        src: &TraceBuffer,
        src_offset: u64,
        src_bytes_per_row: u64,
        src_bytes_per_image: u64,
        size: Extent3d,
        dst: &TraceTexture,
        dst_slice: u32,
        dst_level: u32,
        dst_origin: Origin3d,
    ) {
        self.device.record(TraceCommand::CopyBufferToTexture {
            src: src.id(),
            src_offset,
            src_bytes_per_row,
            src_bytes_per_image,
            size,
            dst: dst.id(),
            dst_slice,
            dst_level,
            dst_origin,
        });
    }

    fn copy_texture_to_buffer(
        &mut self,
        src: &TraceTexture,
        src_slice: u32,
        src_level: u32,
        src_origin: Origin3d,
        size: Extent3d,
        dst: &TraceBuffer,
        dst_offset: u64,
        dst_bytes_per_row: u64,
        dst_bytes_per_image: u64,
    ) {
        self.device.record(TraceCommand::CopyTextureToBuffer {
            src: src.id(),
            src_slice,
            src_level,
            src_origin,
            size,
            dst: dst.id(),
            dst_offset,
            dst_bytes_per_row,
            dst_bytes_per_image,
        });
    }

    fn end_encoding(&mut self) {
        self.device.record(TraceCommand::EndBlitPass);
    }
}

#[derive(Debug)]
pub struct TraceComputeEncoder {
    device: TraceDevice,
}

impl TraceComputeEncoder {
    pub(crate) fn new(device: TraceDevice) -> Self {
        Self { device }
    }
}

impl NativeComputeEncoder<TraceBackend> for TraceComputeEncoder {
    fn set_compute_pipeline_state(&mut self, state: &TraceStateObject) {
        self.device
            .record(TraceCommand::SetComputePipelineState(state.id()));
    }

    fn set_buffer(&mut self, buffer: &TraceBuffer, offset: u64, index: u32) {
        self.device.record(TraceCommand::SetComputeBuffer {
            buffer: buffer.id(),
            offset,
            index,
        });
    }

    fn dispatch_thread_groups(&mut self, groups: Extent3d, threads_per_group: Extent3d) {
        self.device.record(TraceCommand::Dispatch {
            groups,
            threads_per_group,
        });
    }

    fn dispatch_thread_groups_indirect(
        &mut self,
        indirect_buffer: &TraceBuffer,
        indirect_offset: u64,
        threads_per_group: Extent3d,
    ) {
        self.device.record(TraceCommand::DispatchIndirect {
            indirect_buffer: indirect_buffer.id(),
            indirect_offset,
            threads_per_group,
        });
    }

    fn end_encoding(&mut self) {
        self.device.record(TraceCommand::EndComputePass);
    }
}
