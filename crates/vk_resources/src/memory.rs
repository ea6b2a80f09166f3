//! Memory type selection
//!
//! Maps a resource's memory requirements bitmask plus the requested property
//! flags to a concrete memory type index in the physical device's memory
//! property table. Resource constructors always request `DEVICE_LOCAL`.

use ash::vk;

use crate::error::{VulkanError, VulkanResult};

/// Find a memory type index compatible with `type_filter` that has all of
/// the `required` property flags
///
/// `type_filter` is the `memory_type_bits` mask reported by the resource's
/// memory requirements query. Returns the first matching index in table
/// order. There is no fallback: if no type satisfies both constraints the
/// resource cannot be placed in the requested memory domain and construction
/// must fail.
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    required: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    for i in 0..memory_properties.memory_type_count {
        if (type_filter & (1 << i)) != 0
            && memory_properties.memory_types[i as usize]
                .property_flags
                .contains(required)
        {
            return Ok(i);
        }
    }

    Err(VulkanError::NoSuitableMemoryType)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_properties(types: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut properties = vk::PhysicalDeviceMemoryProperties::default();
        properties.memory_type_count = types.len() as u32;
        for (i, flags) in types.iter().enumerate() {
            properties.memory_types[i] = vk::MemoryType {
                property_flags: *flags,
                heap_index: 0,
            };
        }
        properties
    }

    #[test]
    fn test_selects_device_local_type() {
        let properties = memory_properties(&[
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ]);

        let index = find_memory_type(&properties, 0b11, vk::MemoryPropertyFlags::DEVICE_LOCAL)
            .expect("device-local type should be found");
        assert_eq!(index, 1);
    }

    #[test]
    fn test_type_filter_excludes_incompatible_types() {
        // Index 0 is device-local but the requirements bitmask rules it out
        let properties = memory_properties(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ]);

        let index = find_memory_type(&properties, 0b10, vk::MemoryPropertyFlags::DEVICE_LOCAL)
            .expect("second type should still match");
        assert_eq!(index, 1);
    }

    #[test]
    fn test_first_matching_index_wins() {
        let properties = memory_properties(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ]);

        let index = find_memory_type(&properties, 0b11, vk::MemoryPropertyFlags::DEVICE_LOCAL)
            .expect("first type should match");
        assert_eq!(index, 0);
    }

    #[test]
    fn test_no_device_local_candidate_fails() {
        let properties = memory_properties(&[
            vk::MemoryPropertyFlags::HOST_VISIBLE,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_CACHED,
        ]);

        let result = find_memory_type(&properties, 0b11, vk::MemoryPropertyFlags::DEVICE_LOCAL);
        assert!(matches!(result, Err(VulkanError::NoSuitableMemoryType)));
    }

    #[test]
    fn test_empty_type_filter_fails() {
        let properties = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);

        let result = find_memory_type(&properties, 0, vk::MemoryPropertyFlags::DEVICE_LOCAL);
        assert!(matches!(result, Err(VulkanError::NoSuitableMemoryType)));
    }
}
