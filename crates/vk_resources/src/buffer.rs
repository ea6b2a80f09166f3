//! Device-local GPU buffers
//!
//! Wraps a `vk::Buffer` and its backing `vk::DeviceMemory` with RAII
//! cleanup. Creation follows the standard Vulkan protocol: create the buffer
//! handle, query its memory requirements, select a device-local memory type,
//! allocate the reported size, and bind at offset 0. Contents arrive through
//! [`Buffer::store`], which records a copy from a host-visible source buffer
//! into a caller-supplied recording context.

use ash::vk;
use std::sync::Arc;

use crate::error::{VulkanError, VulkanResult};
use crate::memory::find_memory_type;
use crate::recorder::TransferRecorder;

/// GPU buffer in device-local memory with automatic cleanup
///
/// The buffer and its memory allocation are exclusively owned by this
/// instance and released together on drop. The device handle is shared and
/// must outlive the buffer; the caller must also guarantee no recorded GPU
/// work still references the buffer when it is dropped.
pub struct Buffer {
    device: Arc<ash::Device>,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer in device-local memory
    ///
    /// `create_info` carries the requested size and usage flags; the actual
    /// allocation uses the device-reported requirement size, which may be
    /// larger due to alignment. Fails with [`VulkanError::NoSuitableMemoryType`]
    /// if no device-local memory type is compatible with the buffer; there is
    /// no fallback to another memory domain. On any failure the handles
    /// created so far are destroyed before returning.
    pub fn new(
        device: Arc<ash::Device>,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        create_info: &vk::BufferCreateInfo,
    ) -> VulkanResult<Self> {
        // Create buffer
        let buffer = unsafe {
            device
                .create_buffer(create_info, None)
                .map_err(VulkanError::Api)?
        };

        // Get memory requirements
        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        // Find a device-local memory type
        let memory_type_index = match find_memory_type(
            memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ) {
            Ok(index) => index,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        // Allocate memory
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        let memory = match unsafe { device.allocate_memory(&alloc_info, None) } {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(VulkanError::Api(e));
            }
        };

        // Bind buffer to memory
        if let Err(e) = unsafe { device.bind_buffer_memory(buffer, memory, 0) } {
            unsafe {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
            }
            return Err(VulkanError::Api(e));
        }

        log::debug!(
            "Created GPU buffer: {} bytes requested, {} bytes allocated (memory type {})",
            create_info.size,
            requirements.size,
            memory_type_index
        );

        Ok(Self {
            device,
            buffer,
            memory,
            size: requirements.size,
        })
    }

    /// Record a copy of `size` bytes from a host-visible source buffer
    ///
    /// Appends a single copy instruction (offset 0 on both sides) to the
    /// recording context. No data moves until the caller submits the
    /// recording; the source buffer must stay alive and unmodified until
    /// that submission completes.
    pub fn store<R: TransferRecorder>(
        &self,
        recorder: &mut R,
        src: vk::Buffer,
        size: vk::DeviceSize,
    ) -> VulkanResult<()> {
        Self::check_capacity(size, self.size)?;
        Self::record_copy(recorder, src, self.buffer, size);
        Ok(())
    }

    fn check_capacity(size: vk::DeviceSize, capacity: vk::DeviceSize) -> VulkanResult<()> {
        if size > capacity {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "copy of {} bytes exceeds buffer capacity of {} bytes",
                    size, capacity
                ),
            });
        }
        Ok(())
    }

    fn record_copy<R: TransferRecorder>(
        recorder: &mut R,
        src: vk::Buffer,
        dst: vk::Buffer,
        size: vk::DeviceSize,
    ) {
        let region = vk::BufferCopy::builder()
            .src_offset(0)
            .dst_offset(0)
            .size(size);

        recorder.copy_buffer(src, dst, region.build());
    }

    /// Get the buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Get the allocated capacity in bytes
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
