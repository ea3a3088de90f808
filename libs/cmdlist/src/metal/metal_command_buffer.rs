// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Metal command buffer and its completion fence.

use metal::MTLCommandBufferStatus;

use crate::core::Result;
use crate::core::rhi::{NativeCommandBuffer, NativeFence, RenderPassDescriptor};

use super::metal_format::{clear_color, load_action, store_action};
use super::{MetalBackend, MetalBlitEncoder, MetalComputeEncoder, MetalRenderEncoder};

/// Metal command buffer wrapper.
#[derive(Debug)]
pub struct MetalCommandBuffer {
    command_buffer: metal::CommandBuffer,
}

impl MetalCommandBuffer {
    pub fn new(command_buffer: metal::CommandBuffer) -> Self {
        Self { command_buffer }
    }

    pub fn as_metal_command_buffer(&self) -> &metal::CommandBufferRef {
        &self.command_buffer
    }
}

fn metal_render_pass(desc: &RenderPassDescriptor<MetalBackend>) -> &'static metal::RenderPassDescriptorRef {
    let pass = metal::RenderPassDescriptor::new();

    for (index, color) in desc.color_attachments.iter().enumerate() {
        let Some(attachment) = pass.color_attachments().object_at(index as u64) else {
            continue;
        };
        attachment.set_texture(Some(&color.texture));
        attachment.set_level(color.level as u64);
        attachment.set_slice(color.slice as u64);
        attachment.set_load_action(load_action(color.load_action));
        attachment.set_store_action(store_action(color.store_action));
        attachment.set_clear_color(clear_color(color.clear_color));
        if let Some(resolve) = &color.resolve_texture {
            attachment.set_resolve_texture(Some(resolve));
        }
    }

    if let (Some(depth), Some(attachment)) = (&desc.depth_attachment, pass.depth_attachment()) {
        attachment.set_texture(Some(&depth.texture));
        attachment.set_level(depth.level as u64);
        attachment.set_slice(depth.slice as u64);
        attachment.set_load_action(load_action(depth.load_action));
        attachment.set_store_action(store_action(depth.store_action));
        attachment.set_clear_depth(depth.clear_depth as f64);
    }

    if let (Some(stencil), Some(attachment)) = (&desc.stencil_attachment, pass.stencil_attachment())
    {
        attachment.set_texture(Some(&stencil.texture));
        attachment.set_level(stencil.level as u64);
        attachment.set_slice(stencil.slice as u64);
        attachment.set_load_action(load_action(stencil.load_action));
        attachment.set_store_action(store_action(stencil.store_action));
        attachment.set_clear_stencil(stencil.clear_stencil as u32);
    }

    pass
}

impl NativeCommandBuffer<MetalBackend> for MetalCommandBuffer {
    fn render_command_encoder(
        &mut self,
        desc: &RenderPassDescriptor<MetalBackend>,
    ) -> Result<MetalRenderEncoder> {
        let pass = metal_render_pass(desc);
        let encoder = self.command_buffer.new_render_command_encoder(pass).to_owned();
        Ok(MetalRenderEncoder::new(encoder))
    }

    fn blit_command_encoder(&mut self) -> Result<MetalBlitEncoder> {
        let encoder = self.command_buffer.new_blit_command_encoder().to_owned();
        Ok(MetalBlitEncoder::new(encoder))
    }

    fn compute_command_encoder(&mut self) -> Result<MetalComputeEncoder> {
        let encoder = self.command_buffer.new_compute_command_encoder().to_owned();
        Ok(MetalComputeEncoder::new(encoder))
    }

    fn commit(self) -> Result<MetalFence> {
        self.command_buffer.commit();
        Ok(MetalFence {
            command_buffer: self.command_buffer,
        })
    }
}

/// Completion of a committed Metal command buffer.
#[derive(Debug)]
pub struct MetalFence {
    command_buffer: metal::CommandBuffer,
}

impl NativeFence for MetalFence {
    fn is_complete(&self) -> bool {
        matches!(
            self.command_buffer.status(),
            MTLCommandBufferStatus::Completed | MTLCommandBufferStatus::Error
        )
    }

    fn wait(&self) {
        self.command_buffer.wait_until_completed();
    }
}
