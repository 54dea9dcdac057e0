//! GPU buffer creation, upload, and staging readback.

use crate::gpu::{RenderError, RenderResult};
use wgpu::{Buffer, BufferUsages, Device, Queue};

/// Create a buffer initialized with the given Pod slice.
pub fn create_buffer_init<T: bytemuck::Pod>(
    device: &Device,
    label: &str,
    data: &[T],
    usage: BufferUsages,
) -> Buffer {
    use wgpu::util::DeviceExt;

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage,
    })
}

/// Create an empty buffer of `size` bytes.
pub fn create_buffer(device: &Device, label: &str, size: u64, usage: BufferUsages) -> Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

/// Read `count` Pod records back from a GPU buffer.
///
/// Copies through a staging buffer, so `buffer` only needs COPY_SRC usage.
/// This is a debugging/testing path; the render loop itself never reads
/// GPU memory back.
pub async fn read_buffer<T: bytemuck::Pod>(
    device: &Device,
    queue: &Queue,
    buffer: &Buffer,
    count: usize,
) -> RenderResult<Vec<T>> {
    let size = (count * std::mem::size_of::<T>()) as u64;
    let staging = create_buffer(
        device,
        "staging buffer",
        size,
        BufferUsages::MAP_READ | BufferUsages::COPY_DST,
    );

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback encoder"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    queue.submit(Some(encoder.finish()));

    let (tx, rx) = futures::channel::oneshot::channel();
    staging
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
    device.poll(wgpu::Maintain::Wait);

    rx.await
        .map_err(|_| RenderError::InvalidState("readback channel closed".into()))?
        .map_err(|e| RenderError::InvalidState(format!("buffer mapping failed: {e:?}")))?;

    let mapped = staging.slice(..).get_mapped_range();
    let result: Vec<T> = bytemuck::cast_slice(&mapped).to_vec();
    drop(mapped);
    staging.unmap();

    Ok(result)
}

/// Blocking wrapper for [`read_buffer`].
pub fn read_buffer_blocking<T: bytemuck::Pod>(
    device: &Device,
    queue: &Queue,
    buffer: &Buffer,
    count: usize,
) -> RenderResult<Vec<T>> {
    pollster::block_on(read_buffer(device, queue, buffer, count))
}
