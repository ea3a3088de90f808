// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Render targets and the native render pass descriptors built from them.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::{CmdListError, Result};

use super::{Backend, LoadAction, PixelFormat, RgbaFloat, StoreAction, Texture};

/// Color attachment of a render pass.
#[derive(Debug, Clone)]
pub struct ColorAttachmentDescriptor<B: Backend> {
    pub texture: B::Texture,
    pub level: u32,
    pub slice: u32,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_color: RgbaFloat,
    /// Destination of a multisample resolve store.
    pub resolve_texture: Option<B::Texture>,
}

impl<B: Backend> ColorAttachmentDescriptor<B> {
    /// Attachment that loads and stores existing contents.
    pub fn load_store(texture: B::Texture, level: u32, slice: u32) -> Self {
        Self {
            texture,
            level,
            slice,
            load_action: LoadAction::Load,
            store_action: StoreAction::Store,
            clear_color: RgbaFloat::CLEAR,
            resolve_texture: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DepthAttachmentDescriptor<B: Backend> {
    pub texture: B::Texture,
    pub level: u32,
    pub slice: u32,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_depth: f32,
}

#[derive(Debug, Clone)]
pub struct StencilAttachmentDescriptor<B: Backend> {
    pub texture: B::Texture,
    pub level: u32,
    pub slice: u32,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_stencil: u8,
}

/// Everything a native render encoder needs to begin a pass.
#[derive(Debug, Clone)]
pub struct RenderPassDescriptor<B: Backend> {
    pub color_attachments: Vec<ColorAttachmentDescriptor<B>>,
    pub depth_attachment: Option<DepthAttachmentDescriptor<B>>,
    pub stencil_attachment: Option<StencilAttachmentDescriptor<B>>,
}

impl<B: Backend> Default for RenderPassDescriptor<B> {
    fn default() -> Self {
        Self {
            color_attachments: Vec::new(),
            depth_attachment: None,
            stencil_attachment: None,
        }
    }
}

impl<B: Backend> RenderPassDescriptor<B> {
    /// Single-attachment pass that only resolves `source` into `destination`.
    pub fn resolve(source: B::Texture, destination: B::Texture) -> Self {
        Self {
            color_attachments: vec![ColorAttachmentDescriptor {
                store_action: StoreAction::MultisampleResolve,
                resolve_texture: Some(destination),
                ..ColorAttachmentDescriptor::load_store(source, 0, 0)
            }],
            ..Self::default()
        }
    }
}

/// Something the recorder can open a render pass against.
pub trait RenderTarget<B: Backend>: fmt::Debug {
    /// Width and height of the attachments, in texels.
    fn extent(&self) -> (u32, u32);

    fn color_target_count(&self) -> usize;

    /// Format of the depth target, if one is attached.
    fn depth_target_format(&self) -> Option<PixelFormat>;

    /// Whether a render pass can be opened right now. Presentation-backed
    /// targets report `false` while no drawable is available.
    fn is_renderable(&self) -> bool {
        true
    }

    /// Build a fresh descriptor that loads and stores every attachment.
    fn create_render_pass_descriptor(&self) -> Result<RenderPassDescriptor<B>>;
}

/// A texture subresource used as a framebuffer attachment.
#[derive(Debug, Clone)]
pub struct FramebufferAttachment<B: Backend> {
    pub texture: Arc<Texture<B>>,
    pub array_layer: u32,
    pub mip_level: u32,
}

impl<B: Backend> FramebufferAttachment<B> {
    pub fn new(texture: Arc<Texture<B>>) -> Self {
        Self {
            texture,
            array_layer: 0,
            mip_level: 0,
        }
    }

    pub fn with_subresource(mut self, array_layer: u32, mip_level: u32) -> Self {
        self.array_layer = array_layer;
        self.mip_level = mip_level;
        self
    }

    fn device_texture(&self) -> Result<&B::Texture> {
        self.texture.device_texture().ok_or_else(|| {
            CmdListError::ResourceMismatch("staging textures cannot be render targets".into())
        })
    }
}

/// Offscreen framebuffer over device textures.
#[derive(Debug)]
pub struct Framebuffer<B: Backend> {
    color_targets: Vec<FramebufferAttachment<B>>,
    depth_target: Option<FramebufferAttachment<B>>,
    renderable: AtomicBool,
}

impl<B: Backend> Framebuffer<B> {
    pub fn new(
        color_targets: Vec<FramebufferAttachment<B>>,
        depth_target: Option<FramebufferAttachment<B>>,
    ) -> Result<Self> {
        for attachment in &color_targets {
            attachment.device_texture()?;
            if attachment.texture.format().is_depth() {
                return Err(CmdListError::ResourceMismatch(format!(
                    "color target has depth format {:?}",
                    attachment.texture.format()
                )));
            }
        }
        if let Some(depth) = &depth_target {
            depth.device_texture()?;
            if !depth.texture.format().is_depth() {
                return Err(CmdListError::ResourceMismatch(format!(
                    "depth target has color format {:?}",
                    depth.texture.format()
                )));
            }
        }

        Ok(Self {
            color_targets,
            depth_target,
            renderable: AtomicBool::new(true),
        })
    }

    pub fn color_targets(&self) -> &[FramebufferAttachment<B>] {
        &self.color_targets
    }

    pub fn depth_target(&self) -> Option<&FramebufferAttachment<B>> {
        self.depth_target.as_ref()
    }

    /// Mark the framebuffer (un)available for rendering.
    pub fn set_renderable(&self, renderable: bool) {
        self.renderable.store(renderable, Ordering::Release);
    }
}

impl<B: Backend> RenderTarget<B> for Framebuffer<B> {
    fn extent(&self) -> (u32, u32) {
        self.color_targets
            .first()
            .or(self.depth_target.as_ref())
            .map(|target| {
                let extent = target.texture.mip_extent(target.mip_level);
                (extent.width, extent.height)
            })
            .unwrap_or((0, 0))
    }

    fn color_target_count(&self) -> usize {
        self.color_targets.len()
    }

    fn depth_target_format(&self) -> Option<PixelFormat> {
        self.depth_target.as_ref().map(|d| d.texture.format())
    }

    fn is_renderable(&self) -> bool {
        self.renderable.load(Ordering::Acquire)
    }

    fn create_render_pass_descriptor(&self) -> Result<RenderPassDescriptor<B>> {
        let color_attachments = self
            .color_targets
            .iter()
            .map(|target| {
                Ok(ColorAttachmentDescriptor::load_store(
                    target.device_texture()?.clone(),
                    target.mip_level,
                    target.array_layer,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let (depth_attachment, stencil_attachment) = match &self.depth_target {
            Some(target) => {
                let texture = target.device_texture()?;
                let depth = DepthAttachmentDescriptor {
                    texture: texture.clone(),
                    level: target.mip_level,
                    slice: target.array_layer,
                    load_action: LoadAction::Load,
                    store_action: StoreAction::Store,
                    clear_depth: 1.0,
                };
                let stencil = target.texture.format().has_stencil().then(|| {
                    StencilAttachmentDescriptor {
                        texture: texture.clone(),
                        level: target.mip_level,
                        slice: target.array_layer,
                        load_action: LoadAction::Load,
                        store_action: StoreAction::Store,
                        clear_stencil: 0,
                    }
                });
                (Some(depth), stencil)
            }
            None => (None, None),
        };

        Ok(RenderPassDescriptor {
            color_attachments,
            depth_attachment,
            stencil_attachment,
        })
    }
}
