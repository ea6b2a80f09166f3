//! Command recording seam for transfer instructions
//!
//! Resources append their transfer and barrier instructions through the
//! [`TransferRecorder`] trait instead of calling `cmd_*` directly, so a test
//! can capture the recorded sequence without a live device.
//! [`CommandRecorder`] is the production implementation over an open command
//! buffer; it only ever appends, never begins, ends, or submits.

use ash::vk;
use std::sync::Arc;

/// An open, appendable sequence of GPU transfer instructions
///
/// Recording is assumed single-threaded per context; instructions execute in
/// recorded order relative to each other on the same resource.
pub trait TransferRecorder {
    /// Record a buffer-to-buffer copy of one region
    fn copy_buffer(&mut self, src: vk::Buffer, dst: vk::Buffer, region: vk::BufferCopy);

    /// Record a buffer-to-image copy of one region, with the image expected
    /// in `dst_layout` at execution time
    fn copy_buffer_to_image(
        &mut self,
        src: vk::Buffer,
        dst: vk::Image,
        dst_layout: vk::ImageLayout,
        region: vk::BufferImageCopy,
    );

    /// Record a pipeline barrier carrying one image memory barrier
    fn image_barrier(
        &mut self,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barrier: vk::ImageMemoryBarrier,
    );
}

/// Transfer recorder over a command buffer the caller has already begun
///
/// The caller owns the command buffer's lifecycle: begin before handing it
/// here, then end, submit, and wait on completion before destroying any
/// resource or source buffer referenced by the recorded instructions.
pub struct CommandRecorder {
    device: Arc<ash::Device>,
    command_buffer: vk::CommandBuffer,
}

impl CommandRecorder {
    /// Wrap an open command buffer for transfer recording
    pub fn new(device: Arc<ash::Device>, command_buffer: vk::CommandBuffer) -> Self {
        Self {
            device,
            command_buffer,
        }
    }
}

impl TransferRecorder for CommandRecorder {
    fn copy_buffer(&mut self, src: vk::Buffer, dst: vk::Buffer, region: vk::BufferCopy) {
        unsafe {
            self.device
                .cmd_copy_buffer(self.command_buffer, src, dst, &[region]);
        }
    }

    fn copy_buffer_to_image(
        &mut self,
        src: vk::Buffer,
        dst: vk::Image,
        dst_layout: vk::ImageLayout,
        region: vk::BufferImageCopy,
    ) {
        unsafe {
            self.device.cmd_copy_buffer_to_image(
                self.command_buffer,
                src,
                dst,
                dst_layout,
                &[region],
            );
        }
    }

    fn image_barrier(
        &mut self,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barrier: vk::ImageMemoryBarrier,
    ) {
        unsafe {
            self.device.cmd_pipeline_barrier(
                self.command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    /// One instruction captured from a recording
    #[derive(Debug)]
    pub(crate) enum Recorded {
        CopyBuffer {
            src: vk::Buffer,
            dst: vk::Buffer,
            region: vk::BufferCopy,
        },
        CopyBufferToImage {
            src: vk::Buffer,
            dst: vk::Image,
            dst_layout: vk::ImageLayout,
            region: vk::BufferImageCopy,
        },
        ImageBarrier {
            src_stage: vk::PipelineStageFlags,
            dst_stage: vk::PipelineStageFlags,
            barrier: vk::ImageMemoryBarrier,
        },
    }

    /// Recorder that captures instructions for inspection
    #[derive(Default)]
    pub(crate) struct RecordingMock {
        pub recorded: Vec<Recorded>,
    }

    impl TransferRecorder for RecordingMock {
        fn copy_buffer(&mut self, src: vk::Buffer, dst: vk::Buffer, region: vk::BufferCopy) {
            self.recorded.push(Recorded::CopyBuffer { src, dst, region });
        }

        fn copy_buffer_to_image(
            &mut self,
            src: vk::Buffer,
            dst: vk::Image,
            dst_layout: vk::ImageLayout,
            region: vk::BufferImageCopy,
        ) {
            self.recorded.push(Recorded::CopyBufferToImage {
                src,
                dst,
                dst_layout,
                region,
            });
        }

        fn image_barrier(
            &mut self,
            src_stage: vk::PipelineStageFlags,
            dst_stage: vk::PipelineStageFlags,
            barrier: vk::ImageMemoryBarrier,
        ) {
            self.recorded.push(Recorded::ImageBarrier {
                src_stage,
                dst_stage,
                barrier,
            });
        }
    }
}
