//! Render-to-buffer readback
//!
//! After a demo finishes its render pass, the color attachment is
//! transitioned to a transfer source, copied into a host-visible buffer
//! and mapped. Results can be dumped raw (little-endian f32, the
//! attachment's native rgba32f texels) or tonemapped to an 8-bit PNG.

use ash::{vk, Device};
use std::path::Path;

use crate::buffer::Buffer;
use crate::commands::CommandPool;
use crate::context::{RenderError, RenderResult};
use crate::image::AttachmentImage;

/// Bytes per rgba32f texel
const TEXEL_SIZE: vk::DeviceSize = 16;

/// Host-visible destination for attachment readback
pub struct Readback {
    buffer: Buffer,
    extent: vk::Extent2D,
}

impl Readback {
    /// Create a readback buffer sized for one rgba32f attachment
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        extent: vk::Extent2D,
    ) -> RenderResult<Self> {
        let size = vk::DeviceSize::from(extent.width) * vk::DeviceSize::from(extent.height)
            * TEXEL_SIZE;
        let buffer = Buffer::new(
            device,
            memory_properties,
            size,
            vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        Ok(Self { buffer, extent })
    }

    /// Copy the color attachment into this buffer and map the texels out
    ///
    /// Records the layout transition and the image-to-buffer copy on a
    /// one-time command buffer, submits it and waits, then returns the
    /// mapped contents as rgba32f components (4 floats per texel).
    pub fn read_attachment(
        &self,
        pool: &CommandPool,
        queue: vk::Queue,
        image: &AttachmentImage,
    ) -> RenderResult<Vec<f32>> {
        let mut recorder = pool.begin_single_time()?;
        recorder.transition_color_attachment(
            image.handle(),
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::AccessFlags::TRANSFER_READ,
        );
        recorder.copy_image_to_buffer(
            image.handle(),
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            self.buffer.handle(),
            self.extent,
        );
        recorder.end()?;
        recorder.submit(queue, true)?;

        let float_count = (self.extent.width * self.extent.height * 4) as usize;
        let mapped = self.buffer.map_memory()?;
        let pixels = unsafe {
            std::slice::from_raw_parts(mapped.cast::<f32>(), float_count).to_vec()
        };
        self.buffer.unmap_memory();

        Ok(pixels)
    }

    /// Dump texels as raw little-endian floats, the attachment's native format
    pub fn save_raw<P: AsRef<Path>>(&self, path: P, pixels: &[f32]) -> RenderResult<()> {
        std::fs::write(path, bytemuck::cast_slice(pixels))?;
        Ok(())
    }

    /// Tonemap texels to 8-bit and save as PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P, pixels: &[f32]) -> RenderResult<()> {
        let rgba = to_rgba8(pixels);
        let image = image::RgbaImage::from_raw(self.extent.width, self.extent.height, rgba)
            .ok_or_else(|| {
                RenderError::ImageOutput("pixel count does not match extent".to_string())
            })?;
        image
            .save(path)
            .map_err(|e| RenderError::ImageOutput(e.to_string()))
    }

    /// Readback extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Texel at (x, y) as rgba components
    pub fn texel(&self, pixels: &[f32], x: u32, y: u32) -> [f32; 4] {
        let base = ((y * self.extent.width + x) * 4) as usize;
        [
            pixels[base],
            pixels[base + 1],
            pixels[base + 2],
            pixels[base + 3],
        ]
    }
}

/// Clamp float components into 8-bit color channels
fn to_rgba8(pixels: &[f32]) -> Vec<u8> {
    pixels
        .iter()
        .map(|component| (component.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tonemap_clamps_out_of_range_components() {
        let rgba = to_rgba8(&[-0.5, 0.0, 0.5, 2.0]);
        assert_eq!(rgba, vec![0, 0, 128, 255]);
    }

    #[test]
    fn tonemap_preserves_length() {
        let pixels = vec![0.25; 4 * 7];
        assert_eq!(to_rgba8(&pixels).len(), 28);
    }
}
