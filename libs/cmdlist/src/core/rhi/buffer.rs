// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! RHI buffer wrapper.

use bitflags::bitflags;

use super::Backend;

bitflags! {
    /// How a buffer may be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const UNIFORM = 1 << 2;
        const STRUCTURED_READ_ONLY = 1 << 3;
        const STRUCTURED_READ_WRITE = 1 << 4;
        const INDIRECT = 1 << 5;
        /// CPU-visible memory used for uploads and readback.
        const STAGING = 1 << 6;
    }
}

/// A native buffer together with the size and usage it was created with.
#[derive(Debug, Clone)]
pub struct Buffer<B: Backend> {
    raw: B::Buffer,
    size: u64,
    usage: BufferUsage,
}

impl<B: Backend> Buffer<B> {
    /// Wrap a native buffer created by the device.
    ///
    /// `size` is the logical size. The native allocation must be at least
    /// `size` rounded up to a multiple of 4 bytes, since buffer updates copy
    /// in 4-byte units.
    pub fn from_raw(raw: B::Buffer, size: u64, usage: BufferUsage) -> Self {
        Self { raw, size, usage }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn is_staging(&self) -> bool {
        self.usage.contains(BufferUsage::STAGING)
    }

    /// Native handle.
    pub fn raw(&self) -> &B::Buffer {
        &self.raw
    }
}
