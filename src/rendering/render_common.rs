use wgpu::SurfaceConfiguration;
use winit::dpi::PhysicalSize;

use crate::{
    camera::{Camera, CameraUniform},
    config::LightingConfig,
    rendering::global_uniform::{GlobalUniform, GlobalUniformState},
};

/// Surface configuration and the uniforms every pass binds.
pub struct RenderCommon {
    pub output_surface_config: SurfaceConfiguration,
    pub camera_uniform: CameraUniform,
    pub camera_uniform_buffer: wgpu::Buffer,
    pub global_uniform: GlobalUniform,
}

impl RenderCommon {
    pub fn new(
        device: &wgpu::Device,
        adapter: &wgpu::Adapter,
        surface: &wgpu::Surface,
        size: PhysicalSize<u32>,
        camera: &Camera,
        lighting: &LightingConfig,
    ) -> Self {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let output_surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(device, &output_surface_config);

        let mut camera_uniform = CameraUniform::default();
        camera_uniform.update(size, camera);
        let camera_uniform_buffer = camera_uniform.create_buffer(device);

        let global_uniform = GlobalUniform::new(device, GlobalUniformState::from_config(lighting));

        Self {
            output_surface_config,
            camera_uniform,
            camera_uniform_buffer,
            global_uniform,
        }
    }
}
