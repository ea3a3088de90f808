// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Integration tests for render pass lifecycle: clears, framebuffer switches
//! and encoder exclusivity.

mod common;

use std::sync::Arc;

use cmdlist::rhi::{
    BufferUsage, LoadAction, PixelFormat, RgbaFloat, ScissorRect, StoreAction, Viewport,
};
use cmdlist::{CmdListError, EncoderKind, TraceCommand};

use common::{assert_encoders_exclusive, count, framebuffer, graphics_pipeline, recorder};

const RED: RgbaFloat = RgbaFloat::new(1.0, 0.0, 0.0, 1.0);

#[test]
fn test_clear_without_draw_emits_single_clearing_pass() {
    let (device, mut list) = recorder();
    let fb = framebuffer(&device, 64, 64, 1, None);
    let target = fb.color_targets()[0].texture.device_texture().unwrap().id();

    list.set_framebuffer(fb).unwrap();
    list.clear_color_target(0, RED).unwrap();
    list.end().unwrap();

    let commands = device.take_commands();
    assert_eq!(count(&commands, TraceCommand::is_begin_pass), 1);
    match &commands[0] {
        TraceCommand::BeginRenderPass {
            color_attachments, ..
        } => {
            assert_eq!(color_attachments.len(), 1);
            assert_eq!(color_attachments[0].texture, target);
            assert_eq!(color_attachments[0].load_action, LoadAction::Clear);
            assert_eq!(color_attachments[0].store_action, StoreAction::Store);
            assert_eq!(color_attachments[0].clear_color, RED);
        }
        other => panic!("expected render pass, got {:?}", other),
    }
    assert_eq!(commands[1], TraceCommand::EndRenderPass);
    assert_eq!(commands.len(), 2);
    assert_eq!(list.active_encoder(), EncoderKind::None);
}

#[test]
fn test_clear_targets_its_own_attachment_index() {
    let (device, mut list) = recorder();
    let fb = framebuffer(&device, 32, 32, 3, None);

    list.set_framebuffer(fb).unwrap();
    list.clear_color_target(2, RED).unwrap();
    list.end().unwrap();

    let commands = device.take_commands();
    let TraceCommand::BeginRenderPass {
        color_attachments, ..
    } = &commands[0]
    else {
        panic!("expected render pass, got {:?}", commands[0]);
    };
    let actions: Vec<LoadAction> = color_attachments.iter().map(|a| a.load_action).collect();
    assert_eq!(
        actions,
        vec![LoadAction::Load, LoadAction::Load, LoadAction::Clear]
    );
}

#[test]
fn test_clear_applies_only_to_next_pass() {
    let (device, mut list) = recorder();
    let fb = framebuffer(&device, 16, 16, 1, None);
    list.set_framebuffer(fb).unwrap();
    list.set_pipeline(graphics_pipeline(&device, vec![], 0));

    list.clear_color_target(0, RED).unwrap();
    list.draw(3, 1, 0, 0).unwrap();
    // Copy forces the render pass closed; the next draw reopens it.
    let buffer = device.create_buffer(16, BufferUsage::UNIFORM);
    list.update_buffer(&buffer, 0, &[0; 16]).unwrap();
    list.draw(3, 1, 0, 0).unwrap();
    list.end().unwrap();

    let passes: Vec<LoadAction> = device
        .take_commands()
        .into_iter()
        .filter_map(|command| match command {
            TraceCommand::BeginRenderPass {
                color_attachments, ..
            } => Some(color_attachments[0].load_action),
            _ => None,
        })
        .collect();
    assert_eq!(passes, vec![LoadAction::Clear, LoadAction::Load]);
}

#[test]
fn test_depth_stencil_clear_sets_both_attachments() {
    let (device, mut list) = recorder();
    let fb = framebuffer(&device, 16, 16, 1, Some(PixelFormat::D24UnormS8Uint));

    list.set_framebuffer(fb).unwrap();
    list.clear_depth_stencil(0.25, 7).unwrap();
    list.end().unwrap();

    let commands = device.take_commands();
    let TraceCommand::BeginRenderPass {
        depth_attachment,
        stencil_attachment,
        ..
    } = &commands[0]
    else {
        panic!("expected render pass, got {:?}", commands[0]);
    };
    let depth = depth_attachment.as_ref().unwrap();
    assert_eq!(depth.load_action, LoadAction::Clear);
    assert_eq!(depth.clear_depth, 0.25);
    let stencil = stencil_attachment.as_ref().unwrap();
    assert_eq!(stencil.load_action, LoadAction::Clear);
    assert_eq!(stencil.clear_stencil, 7);
}

#[test]
fn test_depth_only_format_has_no_stencil_attachment() {
    let (device, mut list) = recorder();
    let fb = framebuffer(&device, 16, 16, 1, Some(PixelFormat::D32Float));

    list.set_framebuffer(fb).unwrap();
    list.clear_depth_stencil(1.0, 0).unwrap();
    list.end().unwrap();

    let commands = device.take_commands();
    let TraceCommand::BeginRenderPass {
        depth_attachment,
        stencil_attachment,
        ..
    } = &commands[0]
    else {
        panic!("expected render pass, got {:?}", commands[0]);
    };
    assert!(depth_attachment.is_some());
    assert!(stencil_attachment.is_none());
}

#[test]
fn test_clear_errors() {
    let (device, mut list) = recorder();
    assert!(matches!(
        list.clear_color_target(0, RED),
        Err(CmdListError::NoFramebuffer)
    ));

    list.set_framebuffer(framebuffer(&device, 16, 16, 1, None))
        .unwrap();
    assert!(matches!(
        list.clear_color_target(1, RED),
        Err(CmdListError::OutOfBounds(_))
    ));
    assert!(matches!(
        list.clear_depth_stencil(1.0, 0),
        Err(CmdListError::NoDepthTarget)
    ));
}

#[test]
fn test_switching_framebuffer_flushes_pending_clear() {
    let (device, mut list) = recorder();
    let first = framebuffer(&device, 16, 16, 1, None);
    let second = framebuffer(&device, 16, 16, 1, None);

    list.set_framebuffer(first).unwrap();
    list.clear_color_target(0, RED).unwrap();
    list.set_framebuffer(second).unwrap();

    let commands = device.take_commands();
    assert!(matches!(
        &commands[0],
        TraceCommand::BeginRenderPass { color_attachments, .. }
            if color_attachments[0].load_action == LoadAction::Clear
    ));
    assert_eq!(commands[1], TraceCommand::EndRenderPass);
    assert_eq!(list.active_encoder(), EncoderKind::None);
}

#[test]
fn test_rebinding_same_framebuffer_is_noop() {
    let (device, mut list) = recorder();
    let fb = framebuffer(&device, 16, 16, 1, None);
    list.set_framebuffer(fb.clone()).unwrap();
    list.set_pipeline(graphics_pipeline(&device, vec![], 0));
    list.draw(3, 1, 0, 0).unwrap();

    list.set_framebuffer(fb).unwrap();
    assert_eq!(list.active_encoder(), EncoderKind::Render);
    list.draw(3, 1, 0, 0).unwrap();
    list.end().unwrap();

    let commands = device.take_commands();
    assert_eq!(count(&commands, TraceCommand::is_begin_pass), 1);
    assert_eq!(count(&commands, TraceCommand::is_draw), 2);
}

#[test]
fn test_framebuffer_sets_full_viewport_on_first_draw() {
    let (device, mut list) = recorder();
    list.set_framebuffer(framebuffer(&device, 640, 480, 2, None))
        .unwrap();
    list.set_pipeline(graphics_pipeline(&device, vec![], 0));
    list.draw(3, 1, 0, 0).unwrap();

    let full = Viewport::new(0.0, 0.0, 640.0, 480.0, 0.0, 1.0);
    let commands = device.take_commands();
    assert!(commands.contains(&TraceCommand::SetViewports(vec![full, full])));
}

#[test]
fn test_scissors_only_sent_with_scissor_test() {
    let (device, mut list) = recorder();
    list.set_framebuffer(framebuffer(&device, 64, 64, 1, None))
        .unwrap();
    list.set_pipeline(graphics_pipeline(&device, vec![], 0));
    list.set_scissor_rect(0, ScissorRect::new(1, 2, 3, 4)).unwrap();
    list.draw(3, 1, 0, 0).unwrap();
    let commands = device.take_commands();
    assert_eq!(
        count(&commands, |c| matches!(c, TraceCommand::SetScissorRects(_))),
        0
    );

    let mut scissored = Arc::try_unwrap(graphics_pipeline(&device, vec![], 0)).unwrap();
    scissored.scissor_test_enabled = true;
    list.set_pipeline(Arc::new(scissored));
    list.draw(3, 1, 0, 0).unwrap();
    let commands = device.take_commands();
    assert!(commands.contains(&TraceCommand::SetScissorRects(vec![ScissorRect::new(
        1, 2, 3, 4
    )])));
}

#[test]
fn test_non_renderable_framebuffer_skips_draws() {
    let (device, mut list) = recorder();
    let fb = framebuffer(&device, 64, 64, 1, None);
    fb.set_renderable(false);
    list.set_framebuffer(fb).unwrap();
    list.set_pipeline(graphics_pipeline(&device, vec![], 0));

    list.draw(3, 1, 0, 0).unwrap();
    list.draw(6, 2, 0, 0).unwrap();
    list.end().unwrap();

    let commands = device.take_commands();
    assert_eq!(count(&commands, TraceCommand::is_draw), 0);
    assert_eq!(count(&commands, TraceCommand::is_begin_pass), 0);
}

#[test]
fn test_draw_without_state_fails() {
    let (device, mut list) = recorder();
    assert!(matches!(
        list.draw(3, 1, 0, 0),
        Err(CmdListError::NoPipeline(_))
    ));

    list.set_pipeline(graphics_pipeline(&device, vec![], 0));
    assert!(matches!(
        list.draw(3, 1, 0, 0),
        Err(CmdListError::NoFramebuffer)
    ));
}

#[test]
fn test_encoders_never_overlap() {
    let (device, mut list) = recorder();
    list.set_framebuffer(framebuffer(&device, 16, 16, 1, None))
        .unwrap();
    list.set_pipeline(graphics_pipeline(&device, vec![], 0));
    list.set_pipeline(common::compute_pipeline(&device, vec![]));
    let buffer = device.create_buffer(64, BufferUsage::UNIFORM);

    list.draw(3, 1, 0, 0).unwrap();
    list.update_buffer(&buffer, 0, &[1; 16]).unwrap();
    list.dispatch(1, 1, 1).unwrap();
    list.draw(3, 1, 0, 0).unwrap();
    list.copy_buffer(&buffer, 0, &buffer, 32, 16).unwrap();
    list.update_buffer(&buffer, 16, &[2; 8]).unwrap();
    list.dispatch(2, 1, 1).unwrap();
    list.end().unwrap();

    let commands = device.take_commands();
    assert_encoders_exclusive(&commands);
    assert_eq!(commands.last(), Some(&TraceCommand::EndComputePass));
    // render, blit, compute, render, blit (shared by copy and update), compute
    assert_eq!(count(&commands, TraceCommand::is_begin_pass), 6);
}

#[test]
fn test_resolve_texture_uses_one_shot_pass() {
    use cmdlist::rhi::{TextureDescription, TextureUsage};

    let (device, mut list) = recorder();
    let source = device.create_texture(
        TextureDescription::texture_2d(32, 32, PixelFormat::Rgba8Unorm, TextureUsage::RENDER_TARGET)
            .with_sample_count(4),
    );
    let destination = device.create_texture(TextureDescription::texture_2d(
        32,
        32,
        PixelFormat::Rgba8Unorm,
        TextureUsage::SAMPLED,
    ));

    list.resolve_texture(&source, &destination).unwrap();
    assert_eq!(list.active_encoder(), EncoderKind::None);

    let commands = device.take_commands();
    assert_eq!(commands.len(), 2);
    let TraceCommand::BeginRenderPass {
        color_attachments, ..
    } = &commands[0]
    else {
        panic!("expected render pass, got {:?}", commands[0]);
    };
    assert_eq!(
        color_attachments[0].store_action,
        StoreAction::MultisampleResolve
    );
    assert_eq!(
        color_attachments[0].resolve_texture,
        Some(destination.device_texture().unwrap().id())
    );
    assert_eq!(commands[1], TraceCommand::EndRenderPass);

    assert!(matches!(
        list.resolve_texture(&destination, &source),
        Err(CmdListError::ResourceMismatch(_))
    ));
}
