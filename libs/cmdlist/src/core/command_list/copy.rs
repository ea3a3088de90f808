// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Buffer updates, buffer/texture copies and multisample resolves.

use crate::core::rhi::{
    Backend, Buffer, Extent3d, NativeBlitEncoder, NativeCommandBuffer, NativeDevice,
    NativeRenderEncoder, Origin3d, RenderPassDescriptor, Texture, TextureKind,
    COMPRESSED_BLOCK_DIMENSION,
};
use crate::core::{CmdListError, Result};

use super::CommandList;

/// Native blits address buffers in 4-byte units.
const COPY_ALIGNMENT: u64 = 4;

const ZERO_PADDING: [u8; COPY_ALIGNMENT as usize] = [0; COPY_ALIGNMENT as usize];

/// Region of a texture-to-texture copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCopy {
    pub src_origin: Origin3d,
    pub src_mip_level: u32,
    pub src_base_array_layer: u32,
    pub dst_origin: Origin3d,
    pub dst_mip_level: u32,
    pub dst_base_array_layer: u32,
    pub extent: Extent3d,
    pub layer_count: u32,
}

impl TextureCopy {
    /// Copy `extent` texels of one layer between the origins of mip 0.
    pub fn new(extent: Extent3d) -> Self {
        Self {
            src_origin: Origin3d::ZERO,
            src_mip_level: 0,
            src_base_array_layer: 0,
            dst_origin: Origin3d::ZERO,
            dst_mip_level: 0,
            dst_base_array_layer: 0,
            extent,
            layer_count: 1,
        }
    }

    pub fn with_source(mut self, origin: Origin3d, mip_level: u32, base_array_layer: u32) -> Self {
        self.src_origin = origin;
        self.src_mip_level = mip_level;
        self.src_base_array_layer = base_array_layer;
        self
    }

    pub fn with_destination(
        mut self,
        origin: Origin3d,
        mip_level: u32,
        base_array_layer: u32,
    ) -> Self {
        self.dst_origin = origin;
        self.dst_mip_level = mip_level;
        self.dst_base_array_layer = base_array_layer;
        self
    }

    pub fn with_layer_count(mut self, layer_count: u32) -> Self {
        self.layer_count = layer_count;
        self
    }
}

fn check_subresources<B: Backend>(
    texture: &Texture<B>,
    mip_level: u32,
    base_array_layer: u32,
    layer_count: u32,
    role: &str,
) -> Result<()> {
    let desc = texture.description();
    if mip_level >= desc.mip_levels {
        return Err(CmdListError::OutOfBounds(format!(
            "{} mip level {} of {}",
            role, mip_level, desc.mip_levels
        )));
    }
    if base_array_layer as u64 + layer_count as u64 > desc.array_layers as u64 {
        return Err(CmdListError::OutOfBounds(format!(
            "{} layers {}..{} of {}",
            role,
            base_array_layer,
            base_array_layer as u64 + layer_count as u64,
            desc.array_layers
        )));
    }
    Ok(())
}

/// `origin + extent` must lie inside mip level `mip_level`.
fn check_region<B: Backend>(
    texture: &Texture<B>,
    mip_level: u32,
    origin: Origin3d,
    extent: Extent3d,
    role: &str,
) -> Result<()> {
    let mip = texture.mip_extent(mip_level);
    let fits = |start: u32, len: u32, limit: u32| start as u64 + len as u64 <= limit as u64;
    if fits(origin.x, extent.width, mip.width)
        && fits(origin.y, extent.height, mip.height)
        && fits(origin.z, extent.depth, mip.depth)
    {
        return Ok(());
    }
    Err(CmdListError::OutOfBounds(format!(
        "{} region {:?}+{:?} exceeds mip {} extent {:?}",
        role, origin, extent, mip_level, mip
    )))
}

fn check_range<B: Backend>(buffer: &Buffer<B>, offset: u64, size: u64, role: &str) -> Result<()> {
    match offset.checked_add(size) {
        Some(end) if end <= buffer.size() => Ok(()),
        _ => Err(CmdListError::OutOfBounds(format!(
            "{} range {}+{} exceeds buffer size {}",
            role,
            offset,
            size,
            buffer.size()
        ))),
    }
}

impl<B: Backend> CommandList<B> {
    /// Write `data` into `buffer` at `offset` through a staging buffer.
    ///
    /// `offset` must be 4-byte aligned. The length must be too, unless the
    /// write starts at zero or covers the whole buffer. The copy is rounded up
    /// to 4 bytes with zeros, so `buffer` needs an allocation padded as
    /// [`Buffer::from_raw`] requires. The staging buffer is held until the
    /// recording's submission completes.
    pub fn update_buffer(&mut self, buffer: &Buffer<B>, offset: u64, data: &[u8]) -> Result<()> {
        let size = data.len() as u64;
        if offset % COPY_ALIGNMENT != 0 {
            return Err(CmdListError::Alignment(format!(
                "buffer update offset {} is not a multiple of {}",
                offset, COPY_ALIGNMENT
            )));
        }
        if size % COPY_ALIGNMENT != 0 && offset != 0 && size != buffer.size() {
            return Err(CmdListError::Alignment(format!(
                "buffer update size {} at offset {} is not a multiple of {}",
                size, offset, COPY_ALIGNMENT
            )));
        }
        check_range(buffer, offset, size, "update")?;
        self.command_buffer()?;
        if size == 0 {
            return Ok(());
        }

        let copy_size = size.next_multiple_of(COPY_ALIGNMENT);
        let staging = self.staging.acquire(&self.device, copy_size)?;
        // Pooled buffers hold earlier uploads; the rounded tail must not carry them.
        let padding = (copy_size - size) as usize;
        let prepared = self
            .device
            .write_staging_buffer(staging.raw(), 0, data)
            .and_then(|()| {
                self.device
                    .write_staging_buffer(staging.raw(), size, &ZERO_PADDING[..padding])
            })
            .and_then(|()| self.ensure_blit_encoder());
        if let Err(e) = prepared {
            self.staging.release(vec![staging]);
            return Err(e);
        }

        self.encoder
            .blit()?
            .copy_buffer(staging.raw(), 0, buffer.raw(), offset, copy_size);
        tracing::trace!(offset, size, copy_size, "Recorded buffer update");
        self.staging_buffers.push(staging);
        Ok(())
    }

    /// Copy `size` bytes between buffers. Offsets and size must be 4-byte aligned.
    pub fn copy_buffer(
        &mut self,
        source: &Buffer<B>,
        source_offset: u64,
        destination: &Buffer<B>,
        destination_offset: u64,
        size: u64,
    ) -> Result<()> {
        if source_offset % COPY_ALIGNMENT != 0
            || destination_offset % COPY_ALIGNMENT != 0
            || size % COPY_ALIGNMENT != 0
        {
            return Err(CmdListError::Alignment(format!(
                "buffer copy {}->{} of {} bytes is not {}-byte aligned",
                source_offset, destination_offset, size, COPY_ALIGNMENT
            )));
        }
        check_range(source, source_offset, size, "source")?;
        check_range(destination, destination_offset, size, "destination")?;

        self.ensure_blit_encoder()?;
        self.encoder.blit()?.copy_buffer(
            source.raw(),
            source_offset,
            destination.raw(),
            destination_offset,
            size,
        );
        Ok(())
    }

    /// Copy a region between textures where at least one side is a staging texture.
    ///
    /// Device-to-device copies return [`CmdListError::NotImplemented`].
    pub fn copy_texture(
        &mut self,
        source: &Texture<B>,
        destination: &Texture<B>,
        region: &TextureCopy,
    ) -> Result<()> {
        check_subresources(
            source,
            region.src_mip_level,
            region.src_base_array_layer,
            region.layer_count,
            "source",
        )?;
        check_subresources(
            destination,
            region.dst_mip_level,
            region.dst_base_array_layer,
            region.layer_count,
            "destination",
        )?;
        check_region(
            source,
            region.src_mip_level,
            region.src_origin,
            region.extent,
            "source",
        )?;
        check_region(
            destination,
            region.dst_mip_level,
            region.dst_origin,
            region.extent,
            "destination",
        )?;

        match (source.staging_buffer(), destination.staging_buffer()) {
            (Some(src_buffer), None) => {
                let dst_texture = destination
                    .device_texture()
                    .ok_or_else(|| CmdListError::InvalidState("texture has no storage".into()))?;
                self.ensure_blit_encoder()?;
                let encoder = self.encoder.blit()?;
                copy_staging_to_device(
                    encoder,
                    source,
                    src_buffer,
                    destination,
                    dst_texture,
                    region,
                );
            }
            (Some(src_buffer), Some(dst_buffer)) => {
                self.ensure_blit_encoder()?;
                let encoder = self.encoder.blit()?;
                copy_staging_to_staging(
                    encoder,
                    source,
                    src_buffer,
                    destination,
                    dst_buffer,
                    region,
                );
            }
            (None, Some(dst_buffer)) => {
                let src_texture = source
                    .device_texture()
                    .ok_or_else(|| CmdListError::InvalidState("texture has no storage".into()))?;
                self.ensure_blit_encoder()?;
                let encoder = self.encoder.blit()?;
                copy_device_to_staging(
                    encoder,
                    source,
                    src_texture,
                    destination,
                    dst_buffer,
                    region,
                );
            }
            (None, None) => {
                return Err(CmdListError::NotImplemented(
                    "texture copy between two device textures".into(),
                ));
            }
        }
        tracing::trace!(layers = region.layer_count, "Recorded texture copy");
        Ok(())
    }

    /// Resolve multisampled `source` into `destination` with a one-shot render pass.
    ///
    /// The resolve store leaves the contents of `source` undefined.
    pub fn resolve_texture(&mut self, source: &Texture<B>, destination: &Texture<B>) -> Result<()> {
        let (Some(src), Some(dst)) = (source.device_texture(), destination.device_texture()) else {
            return Err(CmdListError::ResourceMismatch(
                "resolve requires device textures".into(),
            ));
        };
        if source.description().sample_count <= 1 {
            return Err(CmdListError::ResourceMismatch(
                "resolve source is not multisampled".into(),
            ));
        }
        if destination.description().sample_count != 1 {
            return Err(CmdListError::ResourceMismatch(
                "resolve destination is multisampled".into(),
            ));
        }
        self.command_buffer()?;

        self.ensure_no_blit_encoder();
        self.ensure_no_render_pass();
        self.ensure_no_compute_encoder();

        let desc = RenderPassDescriptor::resolve(src.clone(), dst.clone());
        let mut encoder = self.command_buffer()?.render_command_encoder(&desc)?;
        encoder.end_encoding();
        tracing::debug!(label = ?self.config.label, "Recorded multisample resolve");
        Ok(())
    }
}

/// Staging row pitches of compressed formats are stored per texel row.
fn block_factor(compressed: bool) -> u64 {
    if compressed {
        COMPRESSED_BLOCK_DIMENSION as u64
    } else {
        1
    }
}

fn copy_staging_to_device<B: Backend>(
    encoder: &mut B::BlitEncoder,
    source: &Texture<B>,
    src_buffer: &B::Buffer,
    destination: &Texture<B>,
    dst_texture: &B::Texture,
    region: &TextureCopy,
) {
    let texel_stride = source.format().texel_stride() as u64;
    let block = block_factor(source.format().is_compressed());
    let origin = region.src_origin;

    for layer in 0..region.layer_count {
        let layout =
            source.subresource_layout(region.src_mip_level, region.src_base_array_layer + layer);
        let src_offset = layout.offset
            + layout.depth_pitch * origin.z as u64
            + layout.row_pitch * origin.y as u64
            + texel_stride * origin.x as u64;
        let bytes_per_image = if destination.kind() == TextureKind::Texture3D {
            layout.depth_pitch
        } else {
            0
        };
        encoder.copy_buffer_to_texture(
            src_buffer,
            src_offset,
            layout.row_pitch * block,
            bytes_per_image,
            region.extent,
            dst_texture,
            region.dst_base_array_layer + layer,
            region.dst_mip_level,
            region.dst_origin,
        );
    }
}

fn copy_staging_to_staging<B: Backend>(
    encoder: &mut B::BlitEncoder,
    source: &Texture<B>,
    src_buffer: &B::Buffer,
    destination: &Texture<B>,
    dst_buffer: &B::Buffer,
    region: &TextureCopy,
) {
    let texel_stride = destination.format().texel_stride() as u64;
    let row_size = region.extent.width as u64 * texel_stride;
    let (src, dst) = (region.src_origin, region.dst_origin);

    for layer in 0..region.layer_count {
        let src_layout =
            source.subresource_layout(region.src_mip_level, region.src_base_array_layer + layer);
        let dst_layout = destination
            .subresource_layout(region.dst_mip_level, region.dst_base_array_layer + layer);

        for z in 0..region.extent.depth as u64 {
            for y in 0..region.extent.height as u64 {
                let src_offset = src_layout.offset
                    + src_layout.depth_pitch * (z + src.z as u64)
                    + src_layout.row_pitch * (y + src.y as u64)
                    + texel_stride * src.x as u64;
                let dst_offset = dst_layout.offset
                    + dst_layout.depth_pitch * (z + dst.z as u64)
                    + dst_layout.row_pitch * (y + dst.y as u64)
                    + texel_stride * dst.x as u64;
                encoder.copy_buffer(src_buffer, src_offset, dst_buffer, dst_offset, row_size);
            }
        }
    }
}

fn copy_device_to_staging<B: Backend>(
    encoder: &mut B::BlitEncoder,
    source: &Texture<B>,
    src_texture: &B::Texture,
    destination: &Texture<B>,
    dst_buffer: &B::Buffer,
    region: &TextureCopy,
) {
    let texel_stride = destination.format().texel_stride() as u64;
    let block = block_factor(destination.format().is_compressed());
    let origin = region.dst_origin;

    for layer in 0..region.layer_count {
        let layout = destination
            .subresource_layout(region.dst_mip_level, region.dst_base_array_layer + layer);
        let dst_offset = layout.offset
            + layout.depth_pitch * origin.z as u64
            + layout.row_pitch * origin.y as u64
            + texel_stride * origin.x as u64;
        let bytes_per_image = if source.kind() == TextureKind::Texture3D {
            layout.depth_pitch
        } else {
            0
        };
        encoder.copy_texture_to_buffer(
            src_texture,
            region.src_base_array_layer + layer,
            region.src_mip_level,
            region.src_origin,
            region.extent,
            dst_buffer,
            dst_offset,
            layout.row_pitch * block,
            bytes_per_image,
        );
    }
}
