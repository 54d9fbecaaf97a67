use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::{
    config::CameraConfig,
    math::ray::{screen_to_ndc, Ray},
};

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            eye: config.eye,
            target: config.target,
            up: Vec3::Y,
            fov_degrees: config.fov_degrees,
            near: config.near,
            far: config.far,
        }
    }

    pub fn get_vp_matrix(&self, resolution: Vec2) -> Mat4 {
        let aspect = resolution.x / resolution.y.max(1.0);
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        let projection =
            Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far);
        projection * view
    }

    /// World space ray through a cursor position given in physical pixels.
    pub fn screen_to_ray(&self, cursor: Vec2, viewport: Vec2) -> Option<Ray> {
        let ndc = screen_to_ndc(cursor, viewport)?;
        let inverse = self.get_vp_matrix(viewport).inverse();

        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));

        Some(Ray::new(near, (far - near).normalize()))
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
}

impl CameraUniform {
    pub fn update(&mut self, resolution: winit::dpi::PhysicalSize<u32>, camera: &Camera) {
        self.view_proj =
            camera.get_vp_matrix(Vec2::new(resolution.width as f32, resolution.height as f32));
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

#[cfg(test)]
pub(crate) fn project_to_screen(camera: &Camera, point: Vec3, viewport: Vec2) -> Vec2 {
    let ndc = camera.get_vp_matrix(viewport).project_point3(point);
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.x,
        (1.0 - ndc.y) * 0.5 * viewport.y,
    )
}
