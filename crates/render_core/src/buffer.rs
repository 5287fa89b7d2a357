//! Buffer management for vertex and storage data
//!
//! Memory management following RAII patterns. Buffers either live in
//! host-visible memory (written directly through a map) or in
//! device-local memory (filled through a staging buffer and a one-time
//! transfer submission).

use ash::{vk, Device};
use bytemuck::Pod;
use std::mem;

use crate::commands::CommandPool;
use crate::context::{RenderError, RenderResult};
use crate::memory::find_memory_type;

/// Buffer wrapper with memory management
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and back it with freshly allocated memory
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> RenderResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(RenderError::Api)?
        };

        let mem_requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let memory_type_index = match find_memory_type(
            memory_properties,
            mem_requirements.memory_type_bits,
            properties,
        ) {
            Ok(index) => index,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(mem_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe {
            match device.allocate_memory(&alloc_info, None) {
                Ok(memory) => memory,
                Err(e) => {
                    device.destroy_buffer(buffer, None);
                    return Err(RenderError::Api(e));
                }
            }
        };

        unsafe {
            device
                .bind_buffer_memory(buffer, memory, 0)
                .map_err(RenderError::Api)?;
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
        })
    }

    /// Create a host-visible buffer and write `data` into it
    pub fn host_visible_with_data<T: Pod>(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        usage: vk::BufferUsageFlags,
        data: &[T],
    ) -> RenderResult<Self> {
        let size = mem::size_of_val(data) as vk::DeviceSize;
        let buffer = Self::new(
            device,
            memory_properties,
            size,
            usage,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        buffer.write_data(data)?;
        Ok(buffer)
    }

    /// Create a device-local buffer and fill it through a staging buffer
    ///
    /// Records a one-time transfer on `pool`, submits it to `queue` and
    /// waits for completion before returning.
    pub fn device_local_with_data<T: Pod>(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        pool: &CommandPool,
        queue: vk::Queue,
        usage: vk::BufferUsageFlags,
        data: &[T],
    ) -> RenderResult<Self> {
        let size = mem::size_of_val(data) as vk::DeviceSize;

        let staging = Self::host_visible_with_data(
            device.clone(),
            memory_properties,
            vk::BufferUsageFlags::TRANSFER_SRC,
            data,
        )?;

        let buffer = Self::new(
            device,
            memory_properties,
            size,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        let mut recorder = pool.begin_single_time()?;
        recorder.copy_buffer(staging.handle(), buffer.handle(), size);
        recorder.end()?;
        recorder.submit(queue, true)?;

        Ok(buffer)
    }

    /// Map the whole buffer for host access
    pub fn map_memory(&self) -> RenderResult<*mut std::ffi::c_void> {
        unsafe {
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .map_err(RenderError::Api)
        }
    }

    /// Unmap a previously mapped buffer
    pub fn unmap_memory(&self) {
        unsafe {
            self.device.unmap_memory(self.memory);
        }
    }

    /// Write plain-old-data into a host-visible buffer
    pub fn write_data<T: Pod>(&self, data: &[T]) -> RenderResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let data_ptr = self.map_memory()?;

        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), data_ptr.cast::<u8>(), bytes.len());
        }

        self.unmap_memory();
        Ok(())
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Get size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Vertex buffer in host-visible memory
pub struct VertexBuffer {
    buffer: Buffer,
    vertex_count: u32,
}

impl VertexBuffer {
    /// Create a vertex buffer holding `vertices`
    pub fn new<T: Pod>(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        vertices: &[T],
    ) -> RenderResult<Self> {
        let buffer = Buffer::host_visible_with_data(
            device,
            memory_properties,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            vertices,
        )?;

        Ok(Self {
            buffer,
            vertex_count: vertices.len() as u32,
        })
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Number of vertices in the buffer
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Device-local storage buffer, filled through staging
///
/// Backs the `STORAGE_BUFFER_DYNAMIC` descriptor in the storage-buffer
/// demo: vertex positions are fetched in the shader by `gl_VertexIndex`.
pub struct StorageBuffer {
    buffer: Buffer,
}

impl StorageBuffer {
    /// Create a storage buffer holding `data` in device-local memory
    pub fn new<T: Pod>(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        pool: &CommandPool,
        queue: vk::Queue,
        data: &[T],
    ) -> RenderResult<Self> {
        let buffer = Buffer::device_local_with_data(
            device,
            memory_properties,
            pool,
            queue,
            vk::BufferUsageFlags::STORAGE_BUFFER,
            data,
        )?;

        Ok(Self { buffer })
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Get size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.buffer.size()
    }
}
