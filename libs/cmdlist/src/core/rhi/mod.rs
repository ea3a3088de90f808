// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Render Hardware Interface (RHI) - the resources and native contracts the
//! recorder is written against.

mod backend;
mod buffer;
mod format;
mod framebuffer;
mod layout;
mod pipeline;
mod texture;
mod types;

pub use backend::{
    Backend, NativeBlitEncoder, NativeCommandBuffer, NativeComputeEncoder, NativeDevice,
    NativeFence, NativeRenderEncoder,
};
pub use buffer::{Buffer, BufferUsage};
pub use format::{COMPRESSED_BLOCK_DIMENSION, PixelFormat};
pub use framebuffer::{
    ColorAttachmentDescriptor, DepthAttachmentDescriptor, Framebuffer, FramebufferAttachment,
    RenderPassDescriptor, RenderTarget, StencilAttachmentDescriptor,
};
pub use layout::{
    BindableResource, ResourceBinding, ResourceClass, ResourceCounts, ResourceKind,
    ResourceLayout, ResourceLayoutElement, ResourceSet, ShaderStages,
};
pub use pipeline::{ComputePipeline, GraphicsPipeline, Pipeline};
pub use texture::{
    Sampler, SubresourceLayout, Texture, TextureDescription, TextureKind, TextureUsage,
};
pub use types::{
    CullMode, DepthClipMode, Extent3d, FrontFace, IndexFormat, LoadAction, Origin3d,
    PrimitiveTopology, RgbaFloat, ScissorRect, StoreAction, Viewport,
};
