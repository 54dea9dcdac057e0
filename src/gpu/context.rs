//! GPU context management - wgpu device and queue initialization.

use crate::gpu::{RenderError, RenderResult};
use wgpu::{Device, Features, Instance, Limits, Queue, RequestAdapterOptions};

/// Owns the wgpu device and queue the renderer records against.
///
/// Presentation (surface, swapchain) is deliberately outside this type; the
/// renderer only needs somewhere to allocate buffers and submit work, and
/// headless use (tests, offscreen rendering) should not pay for a window.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Initialize the GPU context asynchronously.
    ///
    /// Selects a high-performance adapter and creates a device with default
    /// limits; the renderer's bind groups fit within default storage-buffer
    /// counts on every primary backend.
    pub async fn new() -> RenderResult<Self> {
        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or(RenderError::AdapterNotFound)?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);
        log::debug!(
            "max storage buffer binding size: {} MiB",
            adapter.limits().max_storage_buffer_binding_size / (1024 * 1024)
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("splatframe device"),
                    required_features: Features::empty(),
                    required_limits: Limits::default(),
                },
                None,
            )
            .await?;

        // Frame recording has no per-call error path; device loss or
        // validation failures during a frame land here and are fatal.
        device.on_uncaptured_error(Box::new(|e| {
            log::error!("uncaptured wgpu error: {e}");
        }));

        Ok(Self { device, queue })
    }

    /// Synchronous wrapper; blocks the current thread until the GPU is up.
    pub fn new_blocking() -> RenderResult<Self> {
        pollster::block_on(Self::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Needs GPU hardware and drivers.
    fn context_initializes() {
        let ctx = GpuContext::new_blocking();
        assert!(ctx.is_ok(), "GPU context initialization failed");
    }
}
