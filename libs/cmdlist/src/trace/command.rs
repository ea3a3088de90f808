// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Recorded native calls.

use crate::core::rhi::{
    CullMode, DepthClipMode, Extent3d, FrontFace, IndexFormat, LoadAction, Origin3d,
    PrimitiveTopology, RgbaFloat, ScissorRect, StoreAction, Viewport,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TraceColorAttachment {
    pub texture: u64,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_color: RgbaFloat,
    pub resolve_texture: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceDepthAttachment {
    pub texture: u64,
    pub load_action: LoadAction,
    pub clear_depth: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceStencilAttachment {
    pub texture: u64,
    pub load_action: LoadAction,
    pub clear_stencil: u8,
}

/// One native call, in the order the recorder issued it.
///
/// Resources are identified by the id their trace handle was created with.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceCommand {
    NewCommandBuffer {
        id: u64,
    },
    Commit {
        command_buffer: u64,
    },

    BeginRenderPass {
        color_attachments: Vec<TraceColorAttachment>,
        depth_attachment: Option<TraceDepthAttachment>,
        stencil_attachment: Option<TraceStencilAttachment>,
    },
    EndRenderPass,
    BeginBlitPass,
    EndBlitPass,
    BeginComputePass,
    EndComputePass,

    SetViewports(Vec<Viewport>),
    SetScissorRects(Vec<ScissorRect>),
    SetRenderPipelineState(u64),
    SetCullMode(CullMode),
    SetFrontFacing(FrontFace),
    SetBlendColor(RgbaFloat),
    SetDepthStencilState(u64),
    SetDepthClipMode(DepthClipMode),
    SetVertexBuffer {
        buffer: u64,
        offset: u64,
        index: u32,
    },
    SetFragmentBuffer {
        buffer: u64,
        offset: u64,
        index: u32,
    },
    SetVertexTexture {
        texture: u64,
        index: u32,
    },
    SetFragmentTexture {
        texture: u64,
        index: u32,
    },
    SetVertexSampler {
        sampler: u64,
        index: u32,
    },
    SetFragmentSampler {
        sampler: u64,
        index: u32,
    },
    Draw {
        topology: PrimitiveTopology,
        vertex_start: u32,
        vertex_count: u32,
        instance_count: u32,
        base_instance: u32,
    },
    DrawIndexed {
        topology: PrimitiveTopology,
        index_count: u32,
        index_format: IndexFormat,
        index_buffer: u64,
        index_buffer_offset: u64,
        instance_count: u32,
        base_vertex: i32,
        base_instance: u32,
    },
    DrawIndirect {
        topology: PrimitiveTopology,
        indirect_buffer: u64,
        indirect_offset: u64,
    },
    DrawIndexedIndirect {
        topology: PrimitiveTopology,
        index_format: IndexFormat,
        index_buffer: u64,
        index_buffer_offset: u64,
        indirect_buffer: u64,
        indirect_offset: u64,
    },

    CopyBuffer {
        src: u64,
        src_offset: u64,
        dst: u64,
        dst_offset: u64,
        size: u64,
    },
    CopyBufferToTexture {
        src: u64,
        src_offset: u64,
        src_bytes_per_row: u64,
        src_bytes_per_image: u64,
        size: Extent3d,
        dst: u64,
        dst_slice: u32,
        dst_level: u32,
        dst_origin: Origin3d,
    },
    CopyTextureToBuffer {
        src: u64,
        src_slice: u32,
        src_level: u32,
        src_origin: Origin3d,
        size: Extent3d,
        dst: u64,
        dst_offset: u64,
        dst_bytes_per_row: u64,
        dst_bytes_per_image: u64,
    },

    SetComputePipelineState(u64),
    SetComputeBuffer {
        buffer: u64,
        offset: u64,
        index: u32,
    },
    Dispatch {
        groups: Extent3d,
        threads_per_group: Extent3d,
    },
    DispatchIndirect {
        indirect_buffer: u64,
        indirect_offset: u64,
        threads_per_group: Extent3d,
    },
}

impl TraceCommand {
    /// Whether this call opens an encoder.
    pub fn is_begin_pass(&self) -> bool {
        matches!(
            self,
            Self::BeginRenderPass { .. } | Self::BeginBlitPass | Self::BeginComputePass
        )
    }

    /// Whether this call closes an encoder.
    pub fn is_end_pass(&self) -> bool {
        matches!(
            self,
            Self::EndRenderPass | Self::EndBlitPass | Self::EndComputePass
        )
    }

    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::Draw { .. }
                | Self::DrawIndexed { .. }
                | Self::DrawIndirect { .. }
                | Self::DrawIndexedIndirect { .. }
        )
    }
}
