// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! GPU command recording for explicit-encoder graphics APIs.
//!
//! [`CommandList`] records draws, dispatches and copies against a
//! [`Backend`](core::rhi::Backend) and emits only the native encoder calls
//! needed, in an order the native layer accepts.

#![allow(clippy::too_many_arguments)] // Native encoder entry points mirror the API they wrap

pub mod core;
pub mod trace;

// Metal backend: always available on macOS/iOS
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub mod metal;

pub use core::rhi;
pub use core::{
    resource_base, CmdListError, CommandList, CommandListConfig, EncoderKind, Result,
    StagingConfig, StagingPool, Submission, TextureCopy,
};
pub use trace::{TraceBackend, TraceCommand, TraceDevice};

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub use metal::MetalBackend;
