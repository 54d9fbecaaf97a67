use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use id_arena::Arena;
use wgpu::BufferUsages;

use crate::{rendering::render_model::RenderModel, scene_graph::Scene};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct Instance {
    pub model: Mat4,
    pub normal: Mat4,
    pub color: Vec4,
}

impl Instance {
    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x4,
            10 => Float32x4,
        ];

        wgpu::VertexBufferLayout {
            array_stride: size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

pub struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
    label: String,
}

impl InstanceBuffer {
    const INITIAL_CAPACITY: usize = 16;

    pub fn new(device: &wgpu::Device, name: &str) -> Self {
        let label = format!("Instance buffer ({})", name);
        let buffer = Self::create_buffer(device, &label, Self::INITIAL_CAPACITY);

        Self {
            buffer,
            capacity: Self::INITIAL_CAPACITY,
            label,
        }
    }

    fn create_buffer(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (size_of::<Instance>() * capacity) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Uploads `instances`, growing the buffer when they no longer fit.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[Instance]) {
        if instances.is_empty() {
            return;
        }

        if instances.len() > self.capacity {
            self.capacity = instances.len().next_power_of_two();
            self.buffer = Self::create_buffer(device, &self.label, self.capacity);
            log::debug!("Grew {} to {} instances", self.label, self.capacity);
        }

        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(instances));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// Collects one instance per visible scene object with an uploaded model.
pub fn gather_instances(scene: &Scene, render_models: &mut Arena<RenderModel>) {
    for (_, render_model) in render_models.iter_mut() {
        render_model.instances.clear();
    }

    for (object_id, object) in scene.objects.iter() {
        let Some(scene_model) = object.model_id.and_then(|id| scene.get_model(id)) else {
            continue;
        };
        let Some(render_model) = scene_model
            .render_model
            .and_then(|id| render_models.get_mut(id))
        else {
            continue;
        };

        if !scene.is_visible_in_hierarchy(object_id) {
            continue;
        }

        render_model.instances.push(Instance {
            model: *object.transform.get_world_matrix(),
            normal: *object.transform.get_inverse_transpose_world_matrix(),
            color: scene_model.model.color,
        });
    }
}
