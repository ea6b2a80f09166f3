//! Device-local GPU images
//!
//! Wraps a `vk::Image`, its backing memory, and a derived 2D view. Creation
//! follows the same protocol as buffers with the image-specific requirement
//! query and bind call, then adds the view so shaders can interpret the raw
//! pixel memory. Sampled textures receive their contents through
//! [`Texture::store`], which records the full upload protocol: a barrier
//! into the transfer-destination layout, the buffer-to-image copy, and a
//! barrier into the shader-read-only layout. Depth and render-target images
//! use the same constructor but are written by rendering commands and never
//! call `store`.

use ash::vk;
use std::sync::Arc;

use crate::error::{VulkanError, VulkanResult};
use crate::memory::find_memory_type;
use crate::recorder::TransferRecorder;

/// GPU image in device-local memory with a derived 2D view
///
/// Supports single-mip, single-layer 2D images only; array textures, cube
/// maps, and mip chains would need a wider subresource range and view type.
/// The view's format and subresource range are fixed at construction and
/// reused verbatim by the upload barriers. Uploaded textures are write-once:
/// after `store` the image is in the shader-read-only layout and there is no
/// transition back.
pub struct Texture {
    device: Arc<ash::Device>,
    image: vk::Image,
    image_view: vk::ImageView,
    memory: vk::DeviceMemory,
    format: vk::Format,
    subresource_range: vk::ImageSubresourceRange,
    uploaded: bool,
}

impl Texture {
    /// Create an image in device-local memory and a 2D view over it
    ///
    /// `aspect` selects what the view exposes (color for sampled textures,
    /// depth for depth attachments). Fails with
    /// [`VulkanError::NoSuitableMemoryType`] if no device-local memory type
    /// is compatible with the image. On any failure the handles created so
    /// far are destroyed before returning.
    pub fn new(
        device: Arc<ash::Device>,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        image_create_info: &vk::ImageCreateInfo,
        aspect: vk::ImageAspectFlags,
    ) -> VulkanResult<Self> {
        // Create image
        let image = unsafe {
            device
                .create_image(image_create_info, None)
                .map_err(VulkanError::Api)?
        };

        // Get memory requirements
        let requirements = unsafe { device.get_image_memory_requirements(image) };

        // Find a device-local memory type
        let memory_type_index = match find_memory_type(
            memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ) {
            Ok(index) => index,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
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
                unsafe { device.destroy_image(image, None) };
                return Err(VulkanError::Api(e));
            }
        };

        // Bind image to memory
        if let Err(e) = unsafe { device.bind_image_memory(image, memory, 0) } {
            unsafe {
                device.destroy_image(image, None);
                device.free_memory(memory, None);
            }
            return Err(VulkanError::Api(e));
        }

        // Create the view; its subresource range is cached for the upload
        // barriers, which must cover exactly the same subresources
        let subresource_range = Self::subresource_range_for(aspect);
        let view_create_info = Self::view_create_info(image, image_create_info.format, aspect);

        let image_view = match unsafe { device.create_image_view(&view_create_info, None) } {
            Ok(view) => view,
            Err(e) => {
                unsafe {
                    device.destroy_image(image, None);
                    device.free_memory(memory, None);
                }
                return Err(VulkanError::Api(e));
            }
        };

        log::debug!(
            "Created GPU image: {}x{} {:?}, {} bytes allocated (memory type {})",
            image_create_info.extent.width,
            image_create_info.extent.height,
            image_create_info.format,
            requirements.size,
            memory_type_index
        );

        Ok(Self {
            device,
            image,
            image_view,
            memory,
            format: image_create_info.format,
            subresource_range,
            uploaded: false,
        })
    }

    /// Record a pixel upload from a host-visible source buffer
    ///
    /// Appends three instructions in order: a barrier transitioning the
    /// image from its pre-initialized state into the transfer-destination
    /// layout, the full `width` x `height` copy, and a barrier into the
    /// shader-read-only layout with write access cleared. Nothing executes
    /// until the caller submits the recording. The upload is write-once;
    /// a second call is rejected because the first barrier's assumed old
    /// layout would no longer hold.
    pub fn store<R: TransferRecorder>(
        &mut self,
        recorder: &mut R,
        src: vk::Buffer,
        width: u32,
        height: u32,
    ) -> VulkanResult<()> {
        Self::check_writable(self.uploaded)?;

        Self::record_upload(recorder, src, self.image, self.subresource_range, width, height);
        self.uploaded = true;

        log::debug!("Recorded {}x{} texture upload", width, height);
        Ok(())
    }

    fn check_writable(uploaded: bool) -> VulkanResult<()> {
        if uploaded {
            return Err(VulkanError::InvalidOperation {
                reason: "texture contents already uploaded; the image is in the \
                         shader-read-only layout and has no transition back"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn record_upload<R: TransferRecorder>(
        recorder: &mut R,
        src: vk::Buffer,
        image: vk::Image,
        range: vk::ImageSubresourceRange,
        width: u32,
        height: u32,
    ) {
        // Transition into the transfer-destination layout so the copy engine
        // may write the subresource
        let barrier = vk::ImageMemoryBarrier::builder()
            .old_layout(vk::ImageLayout::PREINITIALIZED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(range)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);

        recorder.image_barrier(
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            barrier.build(),
        );

        // Full-extent copy, tightly packed rows (no stride support)
        let region = vk::BufferImageCopy::builder()
            .buffer_offset(0)
            .buffer_row_length(width)
            .buffer_image_height(height)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: range.aspect_mask,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            })
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            });

        recorder.copy_buffer_to_image(
            src,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            region.build(),
        );

        // Transition into the shader-read-only layout; transfer writes must
        // complete before fragment shaders sample the image
        let barrier = vk::ImageMemoryBarrier::builder()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(range)
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::empty());

        recorder.image_barrier(
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            barrier.build(),
        );
    }

    fn subresource_range_for(aspect: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        }
    }

    fn view_create_info(
        image: vk::Image,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
    ) -> vk::ImageViewCreateInfo {
        vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(Self::subresource_range_for(aspect))
            .build()
    }

    /// Get the image handle
    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// Get the image view for descriptor set or framebuffer binding
    pub fn view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Get the view format
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Get the subresource range fixed at construction
    pub fn subresource_range(&self) -> vk::ImageSubresourceRange {
        self.subresource_range
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.image_view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
