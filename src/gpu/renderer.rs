//! Resource binding and per-frame orchestration for Gaussian splat rendering.
//!
//! `GaussianRenderer` owns every buffer, pipeline, and bind group needed to
//! draw one point cloud. Each frame it records three stages into the
//! caller's command encoder, in this exact order:
//!
//! 1. the external sorter, which reorders indices using the depth keys the
//!    *previous* frame's preprocess wrote (one-frame-stale ordering),
//! 2. the preprocess compute pass, which overwrites the splat buffer and
//!    emits fresh keys for the next frame's sort,
//! 3. the render pass, which draws instanced quads in the order step 1
//!    produced.
//!
//! The stale ordering is load-bearing observable behavior: under continuous
//! camera motion the lag is bounded to one frame and the output for a
//! static camera is stable from the second frame onward.

use crate::gpu::{
    buffers, GpuSorter, PointCloud, RenderError, RenderResult, RenderSettings, SortBuffers, Splat,
};
use wgpu::{
    BindGroup, Buffer, BufferUsages, CommandEncoder, ComputePipeline, Device, Queue,
    RenderPipeline, ShaderStages, TextureFormat, TextureView,
};

/// Threads per preprocess workgroup; must match `preprocess.wgsl`.
pub const PREPROCESS_WORKGROUP_SIZE: u32 = 256;

/// Two triangles per splat quad.
pub const VERTICES_PER_SPLAT: u32 = 6;

/// Bytes per splat record; fixed schema with both WGSL stages.
pub const SPLAT_STRIDE: u64 = std::mem::size_of::<Splat>() as u64;

/// Renderer for one point cloud against one output format.
///
/// All buffers are sized to the cloud's point count at construction and
/// never resized; a different point count means a new renderer.
pub struct GaussianRenderer {
    num_points: u32,
    target_format: TextureFormat,
    sorter: Box<dyn GpuSorter>,
    sort_buffers: SortBuffers,
    splat_buffer: Buffer,
    settings_buffer: Buffer,
    camera_buffer: Buffer,
    preprocess_pipeline: ComputePipeline,
    render_pipeline: RenderPipeline,
    sort_bind_group: BindGroup,
    preprocess_gaussians_bind_group: BindGroup,
    settings_bind_group: BindGroup,
    camera_bind_group: BindGroup,
    render_gaussians_bind_group: BindGroup,
}

impl GaussianRenderer {
    /// Build every buffer, pipeline, and bind group for `point_cloud`.
    ///
    /// Construction is synchronous and atomic: allocation sizes are checked
    /// against device limits up front, and the whole build runs inside
    /// validation/out-of-memory error scopes, so either a fully wired
    /// renderer is returned or an error and nothing else.
    ///
    /// `camera_buffer` must hold a `CameraUniforms` record; it is taken over
    /// but re-exposed through [`camera_buffer`](Self::camera_buffer) so the
    /// caller can keep updating it between frames.
    pub fn new(
        device: &Device,
        point_cloud: &PointCloud,
        target_format: TextureFormat,
        camera_buffer: Buffer,
        sorter: Box<dyn GpuSorter>,
    ) -> RenderResult<Self> {
        let camera_size = std::mem::size_of::<crate::gpu::CameraUniforms>() as u64;
        if camera_buffer.size() < camera_size {
            return Err(RenderError::InvalidState(format!(
                "camera buffer holds {} bytes, uniforms need {}",
                camera_buffer.size(),
                camera_size
            )));
        }

        let num_points = point_cloud.num_points();
        let splat_bytes = u64::from(num_points.max(1)) * SPLAT_STRIDE;
        let limits = device.limits();
        let max_binding = u64::from(limits.max_storage_buffer_binding_size);
        if splat_bytes > max_binding.min(limits.max_buffer_size) {
            return Err(RenderError::Allocation {
                label: "splat buffer",
                size: splat_bytes,
                limit: max_binding.min(limits.max_buffer_size),
            });
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let built = Self::build(
            device,
            point_cloud,
            target_format,
            camera_buffer,
            sorter,
            splat_bytes,
        );
        let validation = pollster::block_on(device.pop_error_scope());
        let oom = pollster::block_on(device.pop_error_scope());

        if let Some(e) = oom {
            return Err(RenderError::OutOfMemory(e.to_string()));
        }
        if let Some(e) = validation {
            return Err(RenderError::Validation(e.to_string()));
        }
        built
    }

    fn build(
        device: &Device,
        point_cloud: &PointCloud,
        target_format: TextureFormat,
        camera_buffer: Buffer,
        sorter: Box<dyn GpuSorter>,
        splat_bytes: u64,
    ) -> RenderResult<Self> {
        let num_points = point_cloud.num_points();
        let sort_buffers = SortBuffers::new(device, num_points)?;

        let splat_buffer = buffers::create_buffer(
            device,
            "splat buffer",
            splat_bytes,
            BufferUsages::STORAGE | BufferUsages::COPY_SRC,
        );
        // The uniform carries the live point count because loader-supplied
        // gaussian buffers may be larger than the cloud; the shader must not
        // derive the count from buffer length.
        let settings_buffer = buffers::create_buffer_init(
            device,
            "render settings buffer",
            &[RenderSettings::new(num_points)],
            BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        );

        // Fixed bind-group schemas; the WGSL stages must match slot for slot.
        let sort_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sort layout"),
            entries: &[
                storage_entry(0, ShaderStages::COMPUTE, false), // SortInfos
                storage_entry(1, ShaderStages::COMPUTE, false), // keys
                storage_entry(2, ShaderStages::COMPUTE, false), // indices
                storage_entry(3, ShaderStages::COMPUTE, false), // DispatchIndirect
            ],
        });
        let preprocess_gaussians_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("preprocess gaussians layout"),
                entries: &[
                    storage_entry(0, ShaderStages::COMPUTE, true),  // gaussians in
                    storage_entry(1, ShaderStages::COMPUTE, false), // splats out
                    storage_entry(2, ShaderStages::COMPUTE, true),  // sh in
                ],
            });
        let settings_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("render settings layout"),
            entries: &[uniform_entry(0, ShaderStages::COMPUTE)],
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera layout"),
            entries: &[uniform_entry(0, ShaderStages::COMPUTE | ShaderStages::VERTEX)],
        });
        let render_gaussians_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("render gaussians layout"),
                entries: &[
                    storage_entry(0, ShaderStages::VERTEX, true), // sorted indices
                    storage_entry(1, ShaderStages::VERTEX, true), // splats
                    storage_entry(2, ShaderStages::VERTEX, true), // sh
                ],
            });

        let preprocess_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("preprocess shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("preprocess.wgsl").into()),
        });
        let render_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gaussian shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("gaussian.wgsl").into()),
        });

        let preprocess_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("preprocess pipeline layout"),
                bind_group_layouts: &[
                    &sort_layout,
                    &preprocess_gaussians_layout,
                    &settings_layout,
                    &camera_layout,
                ],
                push_constant_ranges: &[],
            });
        let preprocess_pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("preprocess pipeline"),
                layout: Some(&preprocess_pipeline_layout),
                module: &preprocess_shader,
                entry_point: "preprocess",
            });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("gaussian render pipeline layout"),
                bind_group_layouts: &[&camera_layout, &render_gaussians_layout],
                push_constant_ranges: &[],
            });
        // Premultiplied "over" in both channels; draw order supplies the
        // back-to-front guarantee this blend mode requires.
        let blend = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        };
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("gaussian render pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &render_shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &render_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState {
                        color: blend,
                        alpha: blend,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let sort_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sort bind group"),
            layout: &sort_layout,
            entries: &[
                buffer_entry(0, sort_buffers.info()),
                buffer_entry(1, sort_buffers.keys(0)),
                buffer_entry(2, sort_buffers.indices(0)),
                buffer_entry(3, sort_buffers.dispatch()),
            ],
        });
        let preprocess_gaussians_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("preprocess gaussians bind group"),
                layout: &preprocess_gaussians_layout,
                entries: &[
                    buffer_entry(0, point_cloud.gaussian_buffer()),
                    buffer_entry(1, &splat_buffer),
                    buffer_entry(2, point_cloud.sh_buffer()),
                ],
            });
        let settings_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("render settings bind group"),
            layout: &settings_layout,
            entries: &[buffer_entry(0, &settings_buffer)],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &camera_layout,
            entries: &[buffer_entry(0, &camera_buffer)],
        });
        let render_gaussians_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("render gaussians bind group"),
                layout: &render_gaussians_layout,
                entries: &[
                    // Slot 1 is the sorter's output slot; slot 0 is rewritten
                    // by preprocess after the sorter runs.
                    buffer_entry(0, sort_buffers.indices(1)),
                    buffer_entry(1, &splat_buffer),
                    buffer_entry(2, point_cloud.sh_buffer()),
                ],
            });

        log::info!(
            "gaussian renderer ready: {} points, {} B splats, target {:?}",
            num_points,
            splat_bytes,
            target_format
        );

        Ok(Self {
            num_points,
            target_format,
            sorter,
            sort_buffers,
            splat_buffer,
            settings_buffer,
            camera_buffer,
            preprocess_pipeline,
            render_pipeline,
            sort_bind_group,
            preprocess_gaussians_bind_group,
            settings_bind_group,
            camera_bind_group,
            render_gaussians_bind_group,
        })
    }

    /// Record one frame into `encoder`: sort, preprocess, render.
    ///
    /// Call at most once per encoder. The draw uses the index ordering the
    /// sorter produced from *last* frame's keys together with the splat
    /// records preprocess writes *this* frame.
    pub fn frame(&self, encoder: &mut CommandEncoder, target: &TextureView) {
        self.sorter.sort(encoder, &self.sort_buffers);

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("gaussian preprocess pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.preprocess_pipeline);
            pass.set_bind_group(0, &self.sort_bind_group, &[]);
            pass.set_bind_group(1, &self.preprocess_gaussians_bind_group, &[]);
            pass.set_bind_group(2, &self.settings_bind_group, &[]);
            pass.set_bind_group(3, &self.camera_bind_group, &[]);
            pass.dispatch_workgroups(preprocess_workgroup_count(self.num_points), 1, 1);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gaussian render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.render_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_bind_group(1, &self.render_gaussians_bind_group, &[]);
            pass.draw(0..VERTICES_PER_SPLAT, 0..self.num_points);
        }
    }

    /// Set the global intensity multiplier.
    ///
    /// Returns immediately; takes effect at the next frame's preprocess
    /// pass. Any finite value is forwarded to the shader unvalidated.
    pub fn set_multiplier(&self, queue: &Queue, value: f32) {
        // Only the multiplier field; the point count behind it stays fixed.
        queue.write_buffer(&self.settings_buffer, 0, bytemuck::bytes_of(&value));
    }

    /// The camera uniform buffer, re-exposed for external updates.
    pub fn camera_buffer(&self) -> &Buffer {
        &self.camera_buffer
    }

    pub fn num_points(&self) -> u32 {
        self.num_points
    }

    pub fn target_format(&self) -> TextureFormat {
        self.target_format
    }

    /// Sort buffer bundle, exposed for sorter implementations and tests.
    pub fn sort_buffers(&self) -> &SortBuffers {
        &self.sort_buffers
    }

    /// Splat buffer, exposed for debugging readback only; the render loop
    /// never reads it on the CPU.
    pub fn splat_buffer(&self) -> &Buffer {
        &self.splat_buffer
    }
}

/// Workgroups needed to cover `num_points`; zero points dispatch nothing.
fn preprocess_workgroup_count(num_points: u32) -> u32 {
    num_points.div_ceil(PREPROCESS_WORKGROUP_SIZE)
}

fn storage_entry(
    binding: u32,
    visibility: ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn buffer_entry<'a>(binding: u32, buffer: &'a Buffer) -> wgpu::BindGroupEntry<'a> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}
