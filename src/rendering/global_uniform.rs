use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use wgpu::util::DeviceExt;

use crate::config::LightingConfig;

/// Scene lighting: one ambient term and one directional sun.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GlobalUniformState {
    pub ambient: Vec4,
    pub sun_color: Vec4,
    /// Direction towards the sun, normalized. `w` is unused.
    pub sun_direction: Vec4,
}

impl GlobalUniformState {
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            ambient: (config.ambient_color * config.ambient_intensity).extend(1.0),
            sun_color: (config.sun_color * config.sun_intensity).extend(1.0),
            sun_direction: config.sun_position.normalize_or_zero().extend(0.0),
        }
    }
}

pub struct GlobalUniform {
    buffer: wgpu::Buffer,
}

impl GlobalUniform {
    pub fn new(device: &wgpu::Device, initial_state: GlobalUniformState) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Global uniform buffer"),
            contents: bytemuck::cast_slice(&[initial_state]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    #[allow(dead_code)]
    pub fn update(&self, queue: &wgpu::Queue, state: GlobalUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[state]));
    }
}
