//! GPU-resident resource management for the Vulkan backend
//!
//! Provides RAII wrappers around device-local buffers and sampled images,
//! covering the full Vulkan resource protocol: create the handle, query its
//! memory requirements, select a device-local memory type, allocate, and
//! bind. Host-to-device uploads are recorded into a caller-supplied command
//! recording context; submission and fencing stay with the caller.
//!
//! Image uploads additionally record the layout transitions required before
//! the image can be sampled: pre-initialized -> transfer destination around
//! the copy, then transfer destination -> shader read-only. Both barriers
//! reuse the subresource range fixed at construction.

/// Error types for resource creation and recording
pub mod error;

/// Memory type selection against the physical device memory properties
pub mod memory;

/// Command recording seam for transfer instructions
pub mod recorder;

/// Device-local linear buffers (vertex, index, uniform storage)
pub mod buffer;

/// Device-local images with a derived 2D view
pub mod texture;

pub use buffer::Buffer;
pub use error::{VulkanError, VulkanResult};
pub use memory::find_memory_type;
pub use recorder::{CommandRecorder, TransferRecorder};
pub use texture::Texture;
