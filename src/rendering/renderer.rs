use std::sync::Arc;

use anyhow::Context;
use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    configurator::ConfiguratorState,
    rendering::{
        instance::gather_instances,
        passes::forward_pass::{ForwardPass, ForwardTextureViews},
        render_common::RenderCommon,
        render_model::RenderModel,
        texture::DepthTexture,
    },
    scene_graph::Scene,
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: RenderCommon,
    depth_texture: DepthTexture,
    render_models: Arena<RenderModel>,

    clear_color: wgpu::Color,
    forward_pass: ForwardPass,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, state: &ConfiguratorState) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let common = RenderCommon::new(
            &device,
            &adapter,
            &surface,
            size,
            &state.camera,
            &state.config.lighting,
        );

        let depth_texture = DepthTexture::new(&device, size, "Depth Texture");

        let forward_pass = ForwardPass::create(
            &device,
            common.output_surface_config.format,
            &common.camera_uniform_buffer,
            common.global_uniform.buffer(),
        );

        let background = state.config.background;
        let clear_color = wgpu::Color {
            r: background.x as f64,
            g: background.y as f64,
            b: background.z as f64,
            a: 1.0,
        };

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            render_models: Arena::new(),
            clear_color,
            forward_pass,
        })
    }

    /// Uploads scene models that have no GPU counterpart yet. Models arrive
    /// whenever a load completes, so this runs every frame.
    pub fn sync_models(&mut self, scene: &mut Scene) {
        for (_id, scene_model) in scene.models.iter_mut() {
            if scene_model.render_model.is_some() {
                continue;
            }

            let render_model = RenderModel::from_model(&self.device, &scene_model.model);
            scene_model.render_model = Some(self.render_models.alloc(render_model));
            log::debug!(
                "Uploaded model {} with {} primitives",
                scene_model.model.name,
                scene_model.model.primitives.len()
            );
        }
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            let config = &mut self.common.output_surface_config;
            config.width = new_size.width;
            config.height = new_size.height;
            self.depth_texture.resize(&self.device, new_size);
            self.surface.configure(&self.device, config);
        }
    }

    pub fn render(&mut self, state: &mut ConfiguratorState) -> Result<(), wgpu::SurfaceError> {
        self.sync_models(&mut state.scene);

        self.common.camera_uniform.update(self.size, &state.camera);
        self.common
            .camera_uniform
            .update_buffer(&self.queue, &self.common.camera_uniform_buffer);

        gather_instances(&state.scene, &mut self.render_models);
        for (_id, render_model) in self.render_models.iter_mut() {
            render_model
                .instance_buffer
                .write(&self.device, &self.queue, &render_model.instances);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.forward_pass.render(
            &ForwardTextureViews {
                color: &view,
                depth: self.depth_texture.view(),
            },
            &mut encoder,
            self.clear_color,
            &self.render_models,
        );

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}
