// renderer.rs — 核心渲染器（穹顶 patch 批次 + 轨迹覆盖层 + 状态栏）

use crate::camera::CameraState;
use crate::config::Config;
use crate::mesh::{dome_patches, DomePatch};
use crate::region::{PatchSource, RegionClassifier};
use crate::sources::{PoolSlot, SourcePool};
use crate::trajectory::SceneState;
use anyhow::{Context, Result};
use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::window::Window;

const RED: [f32; 3] = [1.0, 0.0, 0.0];
const YELLOW: [f32; 3] = [1.0, 1.0, 0.0];
const BLACK: [f32; 3] = [0.0, 0.0, 0.0];

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct TexturedVertex {
    position: [f32; 3],
    uv: [f32; 2],
}

impl TexturedVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TexturedVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ColorVertex {
    position: [f32; 3],
    color: [f32; 3],
}

impl ColorVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// 一个素材源对应的穹顶批次：分类在提交前一次性算好，
/// 顶点按源分组，避免逐 quad 切换 GPU 状态。
struct DomeBatch {
    slot: PoolSlot,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    // 管线
    dome_pipeline: wgpu::RenderPipeline,
    blank_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,

    // 纹理与几何批次
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    batches: Vec<DomeBatch>,
    blank_vertex_buffer: Option<wgpu::Buffer>,
    blank_vertex_count: u32,

    // 深度缓冲
    depth_view: wgpu::TextureView,

    // Uniform 资源
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<Window>, app_config: &Config) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }
            .context("failed to create surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await
            .context("failed to acquire device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo, // VSync on
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_texture(&device, &config);

        // --- 1. Uniform Setup ---
        let camera_uniform = CameraUniform {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        // Camera Uniform
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        // Texture
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        // Sampler
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("texture_bind_group_layout"),
            });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // --- 2. Pipeline Setup ---
        let dome_shader = device.create_shader_module(wgpu::include_wgsl!("dome.wgsl"));
        let overlay_shader = device.create_shader_module(wgpu::include_wgsl!("overlay.wgsl"));

        let dome_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Dome Pipeline Layout"),
                bind_group_layouts: &[&texture_bind_group_layout],
                push_constant_ranges: &[],
            });
        let overlay_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Overlay Pipeline Layout"),
                bind_group_layouts: &[&camera_bind_group_layout],
                push_constant_ranges: &[],
            });

        let dome_pipeline = create_pipeline(
            &device,
            "Dome Pipeline",
            &dome_pipeline_layout,
            &dome_shader,
            TexturedVertex::layout(),
            wgpu::PrimitiveTopology::TriangleList,
            config.format,
        );
        let blank_pipeline = create_pipeline(
            &device,
            "Blank Patch Pipeline",
            &overlay_pipeline_layout,
            &overlay_shader,
            ColorVertex::layout(),
            wgpu::PrimitiveTopology::TriangleList,
            config.format,
        );
        let line_pipeline = create_pipeline(
            &device,
            "Trajectory Line Pipeline",
            &overlay_pipeline_layout,
            &overlay_shader,
            ColorVertex::layout(),
            wgpu::PrimitiveTopology::LineList,
            config.format,
        );
        let point_pipeline = create_pipeline(
            &device,
            "Hit Point Pipeline",
            &overlay_pipeline_layout,
            &overlay_shader,
            ColorVertex::layout(),
            wgpu::PrimitiveTopology::PointList,
            config.format,
        );

        // --- 3. Dome Geometry（按素材源分批，一次生成）---
        let video_count = app_config.video_dirs.len();
        let classifier =
            RegionClassifier::new(app_config.region_policy, app_config.slices, video_count)?;

        let mut webcam_verts: Vec<TexturedVertex> = Vec::new();
        let mut video_verts: Vec<Vec<TexturedVertex>> = vec![Vec::new(); video_count];
        let mut blank_verts: Vec<ColorVertex> = Vec::new();

        for (index, patch) in dome_patches(
            app_config.dome_radius,
            app_config.slices,
            app_config.stacks,
        ) {
            match classifier.classify(index, &patch) {
                PatchSource::Webcam => push_textured_quad(&mut webcam_verts, &patch),
                PatchSource::Video(i) => push_textured_quad(&mut video_verts[i], &patch),
                PatchSource::Blank => push_blank_quad(&mut blank_verts, &patch),
            }
        }

        let mut batches = Vec::new();
        let mut make_batch = |slot: PoolSlot, verts: &[TexturedVertex]| {
            if verts.is_empty() {
                return; // 该策略下没引用到的源：不建批次，也永远不上传帧
            }
            let (texture, bind_group) = create_source_texture(
                &device,
                &queue,
                &texture_bind_group_layout,
                &camera_buffer,
                &sampler,
                1,
                1,
            );
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Dome Batch Vertices"),
                contents: bytemuck::cast_slice(verts),
                usage: wgpu::BufferUsages::VERTEX,
            });
            batches.push(DomeBatch {
                slot,
                texture,
                bind_group,
                size: (1, 1),
                vertex_buffer,
                vertex_count: verts.len() as u32,
            });
        };
        make_batch(PoolSlot::Webcam, &webcam_verts);
        for (i, verts) in video_verts.iter().enumerate() {
            make_batch(PoolSlot::Video(i), verts);
        }

        let blank_vertex_count = blank_verts.len() as u32;
        let blank_vertex_buffer = if blank_verts.is_empty() {
            None
        } else {
            Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Blank Patch Vertices"),
                contents: bytemuck::cast_slice(&blank_verts),
                usage: wgpu::BufferUsages::VERTEX,
            }))
        };

        log::info!(
            "dome geometry: {} source batches, {} blank quads",
            batches.len(),
            blank_vertex_count / 6
        );

        // --- 4. Egui Setup ---
        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            dome_pipeline,
            blank_pipeline,
            line_pipeline,
            point_pipeline,
            texture_bind_group_layout,
            sampler,
            batches,
            blank_vertex_buffer,
            blank_vertex_count,
            depth_view,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_texture(&self.device, &self.config);
        }
    }

    /// 逐批拉取各素材源的当前帧并上传。
    /// 解码错误（回绕重试也失败）在这里上抛，调用方按致命处理。
    pub fn upload_frames(&mut self, pool: &mut SourcePool) -> Result<()> {
        for i in 0..self.batches.len() {
            let frame = pool.current_frame(self.batches[i].slot)?;
            self.upload_frame(i, &frame);
        }
        Ok(())
    }

    fn upload_frame(&mut self, i: usize, frame: &RgbaImage) {
        let (width, height) = frame.dimensions();
        if self.batches[i].size != (width, height) {
            // 帧尺寸变化：重建纹理与 bind group
            let (texture, bind_group) = create_source_texture(
                &self.device,
                &self.queue,
                &self.texture_bind_group_layout,
                &self.camera_buffer,
                &self.sampler,
                width,
                height,
            );
            self.batches[i].texture = texture;
            self.batches[i].bind_group = bind_group;
            self.batches[i].size = (width, height);
        }

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.batches[i].texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn update_camera(&mut self, camera: &CameraState, dome_radius: f32) {
        let aspect = self.size.width as f32 / self.size.height.max(1) as f32;
        self.camera_uniform.view_proj = camera.view_proj(dome_radius, aspect).to_cols_array_2d();
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
    }

    /// 绘制顺序固定：穹顶批次 → 黑 patch → 轨迹线 → 命中点，
    /// 深度测试开启，保证正确遮挡。
    pub fn render_with_ui(
        &mut self,
        window: &Window,
        scene: &SceneState,
        run_ui: impl FnOnce(&egui::Context),
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // 覆盖层顶点每帧从 SceneState 重建（全量重绘累积状态）
        let mut line_verts: Vec<ColorVertex> = Vec::with_capacity(scene.trajectories.len() * 2);
        for (start, end) in &scene.trajectories {
            line_verts.push(ColorVertex {
                position: start.to_array(),
                color: RED,
            });
            line_verts.push(ColorVertex {
                position: end.to_array(),
                color: RED,
            });
        }
        let mut point_verts: Vec<ColorVertex> = Vec::with_capacity(
            scene.dome_hits.len() + scene.inside_tracks.len() + scene.base_hits.len(),
        );
        for p in &scene.dome_hits {
            point_verts.push(ColorVertex {
                position: p.to_array(),
                color: RED,
            });
        }
        for p in &scene.inside_tracks {
            point_verts.push(ColorVertex {
                position: p.to_array(),
                color: YELLOW,
            });
        }
        for p in &scene.base_hits {
            point_verts.push(ColorVertex {
                position: p.to_array(),
                color: RED,
            });
        }

        let line_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Trajectory Lines"),
                contents: bytemuck::cast_slice(&line_verts),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let point_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Hit Points"),
                contents: bytemuck::cast_slice(&point_verts),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // 1. Scene Pass
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            render_pass.set_pipeline(&self.dome_pipeline);
            for batch in &self.batches {
                render_pass.set_bind_group(0, &batch.bind_group, &[]);
                render_pass.set_vertex_buffer(0, batch.vertex_buffer.slice(..));
                render_pass.draw(0..batch.vertex_count, 0..1);
            }

            if let Some(buffer) = &self.blank_vertex_buffer {
                render_pass.set_pipeline(&self.blank_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..self.blank_vertex_count, 0..1);
            }

            if !line_verts.is_empty() {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, line_buffer.slice(..));
                render_pass.draw(0..line_verts.len() as u32, 0..1);
            }

            if !point_verts.is_empty() {
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, point_buffer.slice(..));
                render_pass.draw(0..point_verts.len() as u32, 0..1);
            }
        }

        // 2. UI Pass
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[vertex_layout],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None, // 穹顶两面都要可见，不做背面剔除
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn create_source_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    camera_buffer: &wgpu::Buffer,
    sampler: &wgpu::Sampler,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::BindGroup) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        label: Some("source_texture"),
        view_formats: &[],
    });

    // 先写入不透明黑，避免首帧上传前采到未初始化数据
    if (width, height) == (1, 1) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[0, 0, 0, 255],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }

    let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&texture_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("source_bind_group"),
    });

    (texture, bind_group)
}

/// 一个 patch 拆成两个三角形；整幅纹理贴满 quad：
/// (θ0,φ0)→(0,0) (θ1,φ0)→(0,1) (θ1,φ1)→(1,1) (θ0,φ1)→(1,0)
fn push_textured_quad(out: &mut Vec<TexturedVertex>, patch: &DomePatch) {
    let [a, b, c, d] = patch.corners();
    let va = TexturedVertex {
        position: a.to_array(),
        uv: [0.0, 0.0],
    };
    let vb = TexturedVertex {
        position: b.to_array(),
        uv: [0.0, 1.0],
    };
    let vc = TexturedVertex {
        position: c.to_array(),
        uv: [1.0, 1.0],
    };
    let vd = TexturedVertex {
        position: d.to_array(),
        uv: [1.0, 0.0],
    };
    out.extend_from_slice(&[va, vb, vc, va, vc, vd]);
}

fn push_blank_quad(out: &mut Vec<ColorVertex>, patch: &DomePatch) {
    let [a, b, c, d] = patch.corners();
    let quad = [a, b, c, a, c, d].map(|p| ColorVertex {
        position: p.to_array(),
        color: BLACK,
    });
    out.extend_from_slice(&quad);
}
