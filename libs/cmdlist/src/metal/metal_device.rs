// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Metal device and queue.

use std::sync::Arc;

use metal::{MTLResourceOptions, MTLStorageMode};

use crate::core::rhi::{
    Buffer, BufferUsage, NativeDevice, Sampler, Texture, TextureDescription, TextureUsage,
};
use crate::core::{CmdListError, Result};

use super::metal_format::{pixel_format, texture_type, texture_usage};
use super::{MetalBackend, MetalCommandBuffer};

/// Metal GPU device with the queue its command buffers are drawn from.
#[derive(Debug, Clone)]
pub struct MetalDevice {
    device: metal::Device,
    command_queue: metal::CommandQueue,
}

impl MetalDevice {
    /// Open the system default Metal device.
    pub fn new() -> Result<Self> {
        let device = metal::Device::system_default().ok_or_else(|| {
            CmdListError::Gpu("No Metal device available on this system".into())
        })?;
        Ok(Self::from_raw(device))
    }

    /// Wrap an existing device, creating a new queue on it.
    pub fn from_raw(device: metal::Device) -> Self {
        let command_queue = device.new_command_queue();
        tracing::debug!(device = device.name(), "Opened Metal device");
        Self {
            device,
            command_queue,
        }
    }

    pub fn device(&self) -> &metal::DeviceRef {
        &self.device
    }

    pub fn command_queue(&self) -> &metal::CommandQueueRef {
        &self.command_queue
    }

    pub fn name(&self) -> String {
        self.device.name().to_string()
    }

    /// Create a GPU-private buffer. Staging usage gets shared memory instead.
    ///
    /// Allocations are padded to four bytes so rounded-up copies stay in bounds.
    pub fn create_buffer(&self, size: u64, usage: BufferUsage) -> Arc<Buffer<MetalBackend>> {
        let options = if usage.contains(BufferUsage::STAGING) {
            MTLResourceOptions::StorageModeShared
        } else {
            MTLResourceOptions::StorageModePrivate
        };
        let raw = self.device.new_buffer(size.max(1).next_multiple_of(4), options);
        Arc::new(Buffer::from_raw(raw, size, usage))
    }

    /// Create a device texture, or a staging texture in shared buffer memory
    /// when `desc` has STAGING usage.
    pub fn create_texture(&self, desc: TextureDescription) -> Arc<Texture<MetalBackend>> {
        if desc.usage.contains(TextureUsage::STAGING) {
            let raw = self.device.new_buffer(
                desc.staging_size().max(1),
                MTLResourceOptions::StorageModeShared,
            );
            return Arc::new(Texture::from_staging_buffer(raw, desc));
        }

        let texture_desc = metal::TextureDescriptor::new();
        texture_desc.set_texture_type(texture_type(desc.kind, desc.array_layers, desc.sample_count));
        texture_desc.set_pixel_format(pixel_format(desc.format));
        texture_desc.set_width(desc.width as u64);
        texture_desc.set_height(desc.height as u64);
        texture_desc.set_depth(desc.depth as u64);
        texture_desc.set_mipmap_level_count(desc.mip_levels as u64);
        texture_desc.set_array_length(desc.array_layers as u64);
        texture_desc.set_sample_count(desc.sample_count as u64);
        texture_desc.set_usage(texture_usage(desc.usage));
        texture_desc.set_storage_mode(MTLStorageMode::Private);

        let raw = self.device.new_texture(&texture_desc);
        Arc::new(Texture::from_raw(raw, desc))
    }

    /// Create a sampler with default filtering and addressing.
    pub fn create_sampler(&self) -> Arc<Sampler<MetalBackend>> {
        let desc = metal::SamplerDescriptor::new();
        Arc::new(Sampler::from_raw(self.device.new_sampler(&desc)))
    }
}

impl NativeDevice<MetalBackend> for MetalDevice {
    fn new_command_buffer(&self) -> Result<MetalCommandBuffer> {
        let command_buffer = self.command_queue.new_command_buffer().to_owned();
        Ok(MetalCommandBuffer::new(command_buffer))
    }

    fn new_staging_buffer(&self, size: u64) -> Result<metal::Buffer> {
        Ok(self
            .device
            .new_buffer(size.max(1), MTLResourceOptions::StorageModeShared))
    }

    fn write_staging_buffer(&self, buffer: &metal::Buffer, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset + data.len() as u64;
        if end > buffer.length() {
            return Err(CmdListError::Gpu(format!(
                "write of {} bytes at {} overruns staging buffer of {}",
                data.len(),
                offset,
                buffer.length()
            )));
        }
        let contents = buffer.contents() as *mut u8;
        if contents.is_null() {
            return Err(CmdListError::Gpu("staging buffer is not CPU-visible".into()));
        }
        // SAFETY: shared-storage buffer, range checked against its length above.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), contents.add(offset as usize), data.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rhi::{NativeCommandBuffer, NativeFence, PixelFormat};

    #[test]
    fn test_staging_write_round_trips_through_shared_memory() {
        let device = MetalDevice::new().expect("Metal device");
        let buffer = device.new_staging_buffer(16).unwrap();
        device
            .write_staging_buffer(&buffer, 4, &[1, 2, 3, 4])
            .unwrap();

        let bytes = unsafe { std::slice::from_raw_parts(buffer.contents() as *const u8, 16) };
        assert_eq!(&bytes[4..8], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_staging_write_overrun_fails() {
        let device = MetalDevice::new().expect("Metal device");
        let buffer = device.new_staging_buffer(8).unwrap();
        assert!(device.write_staging_buffer(&buffer, 6, &[0; 4]).is_err());
    }

    #[test]
    fn test_empty_command_buffer_completes() {
        let device = MetalDevice::new().expect("Metal device");
        let command_buffer = device.new_command_buffer().unwrap();
        let fence = command_buffer.commit().unwrap();
        fence.wait();
        assert!(fence.is_complete());
    }

    #[test]
    fn test_staging_texture_is_buffer_backed() {
        let device = MetalDevice::new().expect("Metal device");
        let texture = device.create_texture(TextureDescription::texture_2d(
            8,
            8,
            PixelFormat::Rgba8Unorm,
            TextureUsage::STAGING,
        ));
        assert!(texture.is_staging());
        assert!(texture.staging_buffer().unwrap().length() >= 256);
    }
}
