// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Metal backend.

mod metal_command_buffer;
mod metal_device;
mod metal_encoder;
mod metal_format;

pub use metal_command_buffer::{MetalCommandBuffer, MetalFence};
pub use metal_device::MetalDevice;
pub use metal_encoder::{MetalBlitEncoder, MetalComputeEncoder, MetalRenderEncoder};

use crate::core::rhi::Backend;

/// Native types of the Metal API.
#[derive(Debug, Clone)]
pub struct MetalBackend;

impl Backend for MetalBackend {
    type Device = MetalDevice;
    type CommandBuffer = MetalCommandBuffer;
    type RenderEncoder = MetalRenderEncoder;
    type BlitEncoder = MetalBlitEncoder;
    type ComputeEncoder = MetalComputeEncoder;
    type Fence = MetalFence;

    type Buffer = metal::Buffer;
    type Texture = metal::Texture;
    type Sampler = metal::SamplerState;
    type RenderPipelineState = metal::RenderPipelineState;
    type ComputePipelineState = metal::ComputePipelineState;
    type DepthStencilState = metal::DepthStencilState;
}
