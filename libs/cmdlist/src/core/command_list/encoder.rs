// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Single-active-encoder state and the transitions between encoding modes.

use std::fmt;
use std::sync::Arc;

use crate::core::rhi::{
    Backend, LoadAction, NativeBlitEncoder, NativeCommandBuffer, NativeComputeEncoder,
    NativeRenderEncoder,
};
use crate::core::{CmdListError, Result};

use super::CommandList;

/// Which kind of native encoder is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderKind {
    None,
    Render,
    Blit,
    Compute,
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Render => "render",
            Self::Blit => "blit",
            Self::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// A native encoder together with its kind.
pub(crate) enum ActiveEncoder<B: Backend> {
    Idle,
    Render(B::RenderEncoder),
    Blit(B::BlitEncoder),
    Compute(B::ComputeEncoder),
}

impl<B: Backend> ActiveEncoder<B> {
    fn kind(&self) -> EncoderKind {
        match self {
            Self::Idle => EncoderKind::None,
            Self::Render(_) => EncoderKind::Render,
            Self::Blit(_) => EncoderKind::Blit,
            Self::Compute(_) => EncoderKind::Compute,
        }
    }
}

/// The open encoder, if any. At most one exists per recording.
///
/// Dropping the state ends whatever encoder is still open.
pub(crate) struct EncoderState<B: Backend> {
    active: ActiveEncoder<B>,
}

impl<B: Backend> EncoderState<B> {
    pub(crate) fn new() -> Self {
        Self {
            active: ActiveEncoder::Idle,
        }
    }

    pub(crate) fn kind(&self) -> EncoderKind {
        self.active.kind()
    }

    /// Install a freshly created encoder, ending any previous one.
    pub(crate) fn open(&mut self, encoder: ActiveEncoder<B>) {
        self.close();
        tracing::trace!(encoder = %encoder.kind(), "Opened encoder");
        self.active = encoder;
    }

    pub(crate) fn render(&mut self) -> Result<&mut B::RenderEncoder> {
        match &mut self.active {
            ActiveEncoder::Render(encoder) => Ok(encoder),
            other => Err(CmdListError::EncoderState {
                expected: EncoderKind::Render,
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn blit(&mut self) -> Result<&mut B::BlitEncoder> {
        match &mut self.active {
            ActiveEncoder::Blit(encoder) => Ok(encoder),
            other => Err(CmdListError::EncoderState {
                expected: EncoderKind::Blit,
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn compute(&mut self) -> Result<&mut B::ComputeEncoder> {
        match &mut self.active {
            ActiveEncoder::Compute(encoder) => Ok(encoder),
            other => Err(CmdListError::EncoderState {
                expected: EncoderKind::Compute,
                found: other.kind(),
            }),
        }
    }

    /// End the open encoder and return to idle. Returns the kind that was closed.
    pub(crate) fn close(&mut self) -> EncoderKind {
        let closed = self.kind();
        match std::mem::replace(&mut self.active, ActiveEncoder::Idle) {
            ActiveEncoder::Idle => {}
            ActiveEncoder::Render(mut encoder) => encoder.end_encoding(),
            ActiveEncoder::Blit(mut encoder) => encoder.end_encoding(),
            ActiveEncoder::Compute(mut encoder) => encoder.end_encoding(),
        }
        if closed != EncoderKind::None {
            tracing::trace!(encoder = %closed, "Ended encoder");
        }
        closed
    }
}

impl<B: Backend> Drop for EncoderState<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: Backend> CommandList<B> {
    pub(super) fn command_buffer(&mut self) -> Result<&mut B::CommandBuffer> {
        self.command_buffer.as_mut().ok_or_else(|| {
            CmdListError::InvalidState("command list is not recording, call begin() first".into())
        })
    }

    /// Make sure a render encoder is open on the current framebuffer.
    ///
    /// Returns `Ok(false)` when the framebuffer cannot be rendered to right now.
    pub(super) fn ensure_render_pass(&mut self) -> Result<bool> {
        if self.framebuffer.is_none() {
            return Err(CmdListError::NoFramebuffer);
        }
        self.ensure_no_blit_encoder();
        self.ensure_no_compute_encoder();
        if self.encoder.kind() == EncoderKind::Render {
            return Ok(true);
        }
        self.begin_current_render_pass()
    }

    /// Open a render encoder on the current framebuffer, applying pending clears.
    pub(super) fn begin_current_render_pass(&mut self) -> Result<bool> {
        let framebuffer = match &self.framebuffer {
            Some(framebuffer) => Arc::clone(framebuffer),
            None => return Err(CmdListError::NoFramebuffer),
        };
        if !framebuffer.is_renderable() {
            tracing::debug!(
                label = ?self.config.label,
                "Framebuffer not renderable, skipping render pass"
            );
            return Ok(false);
        }

        let mut desc = framebuffer.create_render_pass_descriptor()?;
        for (attachment, clear) in desc.color_attachments.iter_mut().zip(&self.clear_colors) {
            if let Some(color) = clear {
                attachment.load_action = LoadAction::Clear;
                attachment.clear_color = *color;
            }
        }
        if let Some(clear) = self.clear_depth {
            if let Some(depth) = desc.depth_attachment.as_mut() {
                depth.load_action = LoadAction::Clear;
                depth.clear_depth = clear.depth;
            }
            if let Some(stencil) = desc.stencil_attachment.as_mut() {
                stencil.load_action = LoadAction::Clear;
                stencil.clear_stencil = clear.stencil;
            }
        }

        let encoder = self.command_buffer()?.render_command_encoder(&desc)?;
        self.encoder.open(ActiveEncoder::Render(encoder));

        self.clear_colors.iter_mut().for_each(|clear| *clear = None);
        self.clear_depth = None;
        self.framebuffer_ever_active = true;
        tracing::debug!(label = ?self.config.label, "Began render pass");
        Ok(true)
    }

    pub(super) fn ensure_no_render_pass(&mut self) {
        if self.encoder.kind() == EncoderKind::Render {
            self.end_current_render_pass();
        }
    }

    /// Close the render encoder. Everything bound to it must be re-sent on
    /// the next one.
    pub(super) fn end_current_render_pass(&mut self) {
        self.encoder.close();
        self.graphics.invalidate();
        tracing::debug!(label = ?self.config.label, "Ended render pass");
    }

    pub(super) fn ensure_blit_encoder(&mut self) -> Result<()> {
        if self.encoder.kind() == EncoderKind::Blit {
            return Ok(());
        }
        self.ensure_no_render_pass();
        self.ensure_no_compute_encoder();
        let encoder = self.command_buffer()?.blit_command_encoder()?;
        self.encoder.open(ActiveEncoder::Blit(encoder));
        tracing::debug!(label = ?self.config.label, "Began blit encoder");
        Ok(())
    }

    pub(super) fn ensure_no_blit_encoder(&mut self) {
        if self.encoder.kind() == EncoderKind::Blit {
            self.encoder.close();
        }
    }

    pub(super) fn ensure_compute_encoder(&mut self) -> Result<()> {
        if self.encoder.kind() == EncoderKind::Compute {
            return Ok(());
        }
        self.ensure_no_blit_encoder();
        self.ensure_no_render_pass();
        let encoder = self.command_buffer()?.compute_command_encoder()?;
        self.encoder.open(ActiveEncoder::Compute(encoder));
        tracing::debug!(label = ?self.config.label, "Began compute encoder");
        Ok(())
    }

    pub(super) fn ensure_no_compute_encoder(&mut self) {
        if self.encoder.kind() == EncoderKind::Compute {
            self.encoder.close();
            self.compute.invalidate();
        }
    }
}
