// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Pixel formats and the size queries the copy paths need.

/// Texture pixel formats supported by the RHI.
///
/// Platform backends map these to native format constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8Unorm,
    R16Float,
    R32Float,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
    Rgba32Float,
    D32Float,
    D24UnormS8Uint,
    D32FloatS8Uint,
    /// BC1, 8-byte 4x4 blocks.
    Bc1RgbaUnorm,
    /// BC3, 16-byte 4x4 blocks.
    Bc3Unorm,
    /// BC7, 16-byte 4x4 blocks.
    Bc7Unorm,
}

/// Width and height of a block-compressed block, in texels.
pub const COMPRESSED_BLOCK_DIMENSION: u32 = 4;

impl PixelFormat {
    /// Bytes advanced per texel along a row.
    ///
    /// For block-compressed formats this is the block size divided by the
    /// block width, so `x * texel_stride()` addresses the block holding `x`
    /// when `x` is block aligned.
    pub fn texel_stride(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::R16Float | Self::Rg8Unorm => 2,
            Self::R32Float
            | Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::D32Float
            | Self::D24UnormS8Uint => 4,
            Self::Rgba16Float | Self::D32FloatS8Uint => 8,
            Self::Rgba32Float => 16,
            Self::Bc1RgbaUnorm | Self::Bc3Unorm | Self::Bc7Unorm => {
                self.block_size_in_bytes().unwrap_or(0) / COMPRESSED_BLOCK_DIMENSION
            }
        }
    }

    /// Size of one compressed block, or `None` for uncompressed formats.
    pub fn block_size_in_bytes(&self) -> Option<u32> {
        match self {
            Self::Bc1RgbaUnorm => Some(8),
            Self::Bc3Unorm | Self::Bc7Unorm => Some(16),
            _ => None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.block_size_in_bytes().is_some()
    }

    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            Self::D32Float | Self::D24UnormS8Uint | Self::D32FloatS8Uint
        )
    }

    pub fn has_stencil(&self) -> bool {
        matches!(self, Self::D24UnormS8Uint | Self::D32FloatS8Uint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_stride_addresses_blocks() {
        // Texel 8 of a BC1 row lives in block 2, at byte 16.
        assert_eq!(8 * PixelFormat::Bc1RgbaUnorm.texel_stride(), 16);
        assert_eq!(8 * PixelFormat::Bc7Unorm.texel_stride(), 32);
        assert!(PixelFormat::Bc3Unorm.is_compressed());
        assert!(!PixelFormat::Rgba8Unorm.is_compressed());
    }

    #[test]
    fn test_depth_and_stencil() {
        assert!(PixelFormat::D32Float.is_depth());
        assert!(!PixelFormat::D32Float.has_stencil());
        assert!(PixelFormat::D24UnormS8Uint.has_stencil());
        assert!(!PixelFormat::Rgba16Float.is_depth());
    }
}
