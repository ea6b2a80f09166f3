//! Error types for Vulkan resource management

use ash::vk;
use thiserror::Error;

/// Vulkan resource errors
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// No memory type satisfies both the resource requirements and the
    /// requested property flags
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },
}

/// Result type for Vulkan resource operations
pub type VulkanResult<T> = Result<T, VulkanError>;
