// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! RHI texture and sampler wrappers.

use bitflags::bitflags;

use super::format::COMPRESSED_BLOCK_DIMENSION;
use super::{Backend, Extent3d, PixelFormat};

bitflags! {
    /// Texture usage flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Can be bound as a texture (sampled).
        const SAMPLED = 1 << 0;
        /// Can be bound as a storage texture (read/write).
        const STORAGE = 1 << 1;
        /// Can be used as a color render target.
        const RENDER_TARGET = 1 << 2;
        /// Can be used as a depth/stencil target.
        const DEPTH_STENCIL = 1 << 3;
        /// CPU-visible, backed by linear buffer memory.
        const STAGING = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture1D,
    Texture2D,
    Texture3D,
}

/// Descriptor for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescription {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub format: PixelFormat,
    pub kind: TextureKind,
    pub usage: TextureUsage,
    pub sample_count: u32,
}

impl TextureDescription {
    /// Single-mip, single-layer 2D texture.
    pub fn texture_2d(width: u32, height: u32, format: PixelFormat, usage: TextureUsage) -> Self {
        Self {
            width,
            height,
            depth: 1,
            mip_levels: 1,
            array_layers: 1,
            format,
            kind: TextureKind::Texture2D,
            usage,
            sample_count: 1,
        }
    }

    /// Single-mip 3D texture.
    pub fn texture_3d(
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
        usage: TextureUsage,
    ) -> Self {
        Self {
            depth,
            kind: TextureKind::Texture3D,
            ..Self::texture_2d(width, height, format, usage)
        }
    }

    pub fn with_mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    pub fn with_array_layers(mut self, array_layers: u32) -> Self {
        self.array_layers = array_layers;
        self
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Extent of a mip level.
    pub fn mip_extent(&self, mip_level: u32) -> Extent3d {
        Extent3d {
            width: (self.width >> mip_level).max(1),
            height: (self.height >> mip_level).max(1),
            depth: (self.depth >> mip_level).max(1),
        }
    }

    /// Row pitch, depth pitch and size of one mip level.
    fn mip_pitches(&self, mip_level: u32) -> (u64, u64, u64) {
        let extent = self.mip_extent(mip_level);
        let (row_pitch, rows) = match self.format.block_size_in_bytes() {
            Some(block_size) => {
                let blocks_wide = extent.width.div_ceil(COMPRESSED_BLOCK_DIMENSION) as u64;
                let blocks_high = extent.height.div_ceil(COMPRESSED_BLOCK_DIMENSION) as u64;
                (
                    blocks_wide * block_size as u64 / COMPRESSED_BLOCK_DIMENSION as u64,
                    blocks_high * COMPRESSED_BLOCK_DIMENSION as u64,
                )
            }
            None => (
                extent.width as u64 * self.format.texel_stride() as u64,
                extent.height as u64,
            ),
        };
        let depth_pitch = row_pitch * rows;
        (row_pitch, depth_pitch, depth_pitch * extent.depth as u64)
    }

    fn array_layer_size(&self) -> u64 {
        (0..self.mip_levels)
            .map(|level| self.mip_pitches(level).2)
            .sum()
    }

    /// Bytes of linear memory holding every subresource.
    pub fn staging_size(&self) -> u64 {
        self.array_layer_size() * self.array_layers as u64
    }

    /// Layout of a subresource in linear staging memory.
    ///
    /// Subresources are stored layer-major, mips ascending within a layer.
    pub fn subresource_layout(&self, mip_level: u32, array_layer: u32) -> SubresourceLayout {
        let mip_offset: u64 = (0..mip_level).map(|level| self.mip_pitches(level).2).sum();
        let (row_pitch, depth_pitch, size) = self.mip_pitches(mip_level);
        SubresourceLayout {
            offset: array_layer as u64 * self.array_layer_size() + mip_offset,
            row_pitch,
            depth_pitch,
            size,
        }
    }
}

/// Linear memory layout of one staging subresource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceLayout {
    /// Byte offset of the subresource inside the staging buffer.
    pub offset: u64,
    /// Bytes per texel row. Block-compressed rows are a quarter of a block row.
    pub row_pitch: u64,
    /// Bytes per depth slice.
    pub depth_pitch: u64,
    /// Total bytes of the subresource.
    pub size: u64,
}

#[derive(Debug, Clone)]
enum TextureStorage<B: Backend> {
    Device(B::Texture),
    Staging(B::Buffer),
}

/// A device texture or a staging texture backed by a CPU-visible buffer.
#[derive(Debug, Clone)]
pub struct Texture<B: Backend> {
    storage: TextureStorage<B>,
    desc: TextureDescription,
}

impl<B: Backend> Texture<B> {
    /// Wrap a native GPU texture.
    pub fn from_raw(raw: B::Texture, desc: TextureDescription) -> Self {
        let desc = TextureDescription {
            usage: desc.usage - TextureUsage::STAGING,
            ..desc
        };
        Self {
            storage: TextureStorage::Device(raw),
            desc,
        }
    }

    /// Wrap a CPU-visible buffer as a staging texture.
    ///
    /// The buffer must hold at least [`Texture::staging_size`] bytes for `desc`.
    pub fn from_staging_buffer(buffer: B::Buffer, desc: TextureDescription) -> Self {
        let desc = TextureDescription {
            usage: desc.usage | TextureUsage::STAGING,
            ..desc
        };
        Self {
            storage: TextureStorage::Staging(buffer),
            desc,
        }
    }

    pub fn description(&self) -> &TextureDescription {
        &self.desc
    }

    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    pub fn kind(&self) -> TextureKind {
        self.desc.kind
    }

    pub fn is_staging(&self) -> bool {
        matches!(self.storage, TextureStorage::Staging(_))
    }

    /// Native texture, if this is a device texture.
    pub fn device_texture(&self) -> Option<&B::Texture> {
        match &self.storage {
            TextureStorage::Device(raw) => Some(raw),
            TextureStorage::Staging(_) => None,
        }
    }

    /// Backing buffer, if this is a staging texture.
    pub fn staging_buffer(&self) -> Option<&B::Buffer> {
        match &self.storage {
            TextureStorage::Staging(buffer) => Some(buffer),
            TextureStorage::Device(_) => None,
        }
    }

    /// Extent of a mip level.
    pub fn mip_extent(&self, mip_level: u32) -> Extent3d {
        self.desc.mip_extent(mip_level)
    }

    /// Bytes required to back every subresource of this texture in staging memory.
    pub fn staging_size(&self) -> u64 {
        self.desc.staging_size()
    }

    /// Layout of a subresource in staging memory.
    pub fn subresource_layout(&self, mip_level: u32, array_layer: u32) -> SubresourceLayout {
        self.desc.subresource_layout(mip_level, array_layer)
    }
}

/// A native sampler state.
#[derive(Debug, Clone)]
pub struct Sampler<B: Backend> {
    raw: B::Sampler,
}

impl<B: Backend> Sampler<B> {
    pub fn from_raw(raw: B::Sampler) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &B::Sampler {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncompressed_subresource_layout() {
        let desc = TextureDescription::texture_2d(
            16,
            8,
            PixelFormat::Rgba8Unorm,
            TextureUsage::STAGING,
        )
        .with_mip_levels(2)
        .with_array_layers(2);

        let mip0 = desc.subresource_layout(0, 0);
        assert_eq!(mip0.row_pitch, 64);
        assert_eq!(mip0.depth_pitch, 512);
        assert_eq!(mip0.offset, 0);

        let mip1 = desc.subresource_layout(1, 0);
        assert_eq!(mip1.row_pitch, 32);
        assert_eq!(mip1.depth_pitch, 128);
        assert_eq!(mip1.offset, 512);

        // Second layer starts after both mips of the first.
        assert_eq!(desc.subresource_layout(0, 1).offset, 640);
        assert_eq!(desc.subresource_layout(1, 1).offset, 640 + 512);
        assert_eq!(desc.staging_size(), 1280);
    }

    #[test]
    fn test_compressed_row_pitch_is_per_texel_row() {
        let desc = TextureDescription::texture_2d(
            16,
            16,
            PixelFormat::Bc1RgbaUnorm,
            TextureUsage::STAGING,
        );
        let layout = desc.subresource_layout(0, 0);
        // Four 8-byte blocks per block row, spread over four texel rows.
        assert_eq!(layout.row_pitch, 8);
        assert_eq!(layout.depth_pitch, 128);
        assert_eq!(layout.size, 128);
    }

    #[test]
    fn test_compressed_small_mip_pads_to_one_block() {
        let desc = TextureDescription::texture_2d(
            4,
            4,
            PixelFormat::Bc7Unorm,
            TextureUsage::STAGING,
        )
        .with_mip_levels(3);
        let tail = desc.subresource_layout(2, 0);
        assert_eq!(tail.row_pitch, 4);
        assert_eq!(tail.depth_pitch, 16);
    }

    #[test]
    fn test_depth_pitch_scales_3d_size() {
        let desc = TextureDescription::texture_3d(
            4,
            4,
            3,
            PixelFormat::R32Float,
            TextureUsage::STAGING,
        );
        let layout = desc.subresource_layout(0, 0);
        assert_eq!(layout.depth_pitch, 64);
        assert_eq!(layout.size, 192);
    }
}
