// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

use super::command_list::EncoderKind;

#[derive(Error, Debug)]
pub enum CmdListError {
    /// Buffer update/copy offsets or sizes that the native blit path cannot express.
    #[error("Alignment violation: {0}")]
    Alignment(String),

    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// Texture or sampler bindings on the compute stage.
    #[error("Unsupported binding: {0}")]
    UnsupportedBinding(String),

    #[error("Resource does not match its layout: {0}")]
    ResourceMismatch(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("No {0} pipeline is bound")]
    NoPipeline(&'static str),

    #[error("No framebuffer is bound")]
    NoFramebuffer,

    #[error("No index buffer is bound")]
    NoIndexBuffer,

    #[error("The bound framebuffer has no depth target")]
    NoDepthTarget,

    #[error("Resource set slot {slot} has no set bound")]
    ResourceSetNotBound { slot: usize },

    /// Internal consistency check of the encoder state machine failed.
    #[error("Expected an open {expected:?} encoder, found {found:?}")]
    EncoderState {
        expected: EncoderKind,
        found: EncoderKind,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("GPU operation failed: {0}")]
    Gpu(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CmdListError>;
