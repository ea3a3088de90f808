// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Shared fixtures for recorder integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use cmdlist::rhi::{
    ComputePipeline, CullMode, DepthClipMode, Extent3d, Framebuffer, FramebufferAttachment,
    FrontFace, GraphicsPipeline, PixelFormat, PrimitiveTopology, ResourceKind, ResourceLayout,
    ResourceLayoutElement, RgbaFloat, ShaderStages, TextureDescription, TextureUsage,
};
use cmdlist::{CommandList, CommandListConfig, TraceBackend, TraceCommand, TraceDevice};

pub type TraceList = CommandList<TraceBackend>;

/// A recorder on a fresh trace device, with the construction calls drained.
pub fn recorder() -> (TraceDevice, TraceList) {
    let device = TraceDevice::new();
    let list = CommandList::new(device.clone(), CommandListConfig::default().with_label("test"))
        .expect("command list");
    device.take_commands();
    (device, list)
}

/// Layout whose elements all use `stages`.
pub fn layout(kinds: &[ResourceKind], stages: ShaderStages) -> Arc<ResourceLayout> {
    Arc::new(ResourceLayout::new(
        kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| ResourceLayoutElement::new(format!("r{}", i), *kind, stages)),
    ))
}

pub fn graphics_pipeline(
    device: &TraceDevice,
    resource_layouts: Vec<Arc<ResourceLayout>>,
    vertex_buffer_count: u32,
) -> Arc<GraphicsPipeline<TraceBackend>> {
    Arc::new(GraphicsPipeline {
        render_pipeline_state: device.create_state_object(),
        depth_stencil_state: device.create_state_object(),
        resource_layouts,
        vertex_buffer_count,
        topology: PrimitiveTopology::TriangleList,
        cull_mode: CullMode::Back,
        front_face: FrontFace::Clockwise,
        blend_color: RgbaFloat::WHITE,
        depth_clip_mode: DepthClipMode::Clip,
        scissor_test_enabled: false,
    })
}

pub fn compute_pipeline(
    device: &TraceDevice,
    resource_layouts: Vec<Arc<ResourceLayout>>,
) -> Arc<ComputePipeline<TraceBackend>> {
    Arc::new(ComputePipeline {
        compute_pipeline_state: device.create_state_object(),
        resource_layouts,
        threads_per_group: Extent3d::new(8, 8, 1),
    })
}

/// Offscreen framebuffer with `color_count` RGBA8 targets and an optional depth target.
pub fn framebuffer(
    device: &TraceDevice,
    width: u32,
    height: u32,
    color_count: usize,
    depth_format: Option<PixelFormat>,
) -> Arc<Framebuffer<TraceBackend>> {
    let colors = (0..color_count)
        .map(|_| {
            FramebufferAttachment::new(device.create_texture(TextureDescription::texture_2d(
                width,
                height,
                PixelFormat::Rgba8Unorm,
                TextureUsage::RENDER_TARGET,
            )))
        })
        .collect();
    let depth = depth_format.map(|format| {
        FramebufferAttachment::new(device.create_texture(TextureDescription::texture_2d(
            width,
            height,
            format,
            TextureUsage::DEPTH_STENCIL,
        )))
    });
    Arc::new(Framebuffer::new(colors, depth).expect("framebuffer"))
}

pub fn count(commands: &[TraceCommand], predicate: impl Fn(&TraceCommand) -> bool) -> usize {
    commands.iter().filter(|command| predicate(command)).count()
}

/// Every opened encoder is closed before the next one opens.
pub fn assert_encoders_exclusive(commands: &[TraceCommand]) {
    let mut open = false;
    for command in commands {
        if command.is_begin_pass() {
            assert!(!open, "encoder opened while another was open: {:?}", commands);
            open = true;
        } else if command.is_end_pass() {
            assert!(open, "encoder closed while none was open: {:?}", commands);
            open = false;
        }
    }
}
