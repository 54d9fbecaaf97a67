//! Orbit navigation around a fixed target, with damped rotation.

use glam::{Vec2, Vec3};

use crate::{camera::Camera, config::OrbitConfig};

const MIN_POLAR_ANGLE: f32 = 1e-3;

pub struct OrbitControls {
    config: OrbitConfig,
    target: Vec3,
    distance: f32,
    /// Angle around the up axis, measured from +Z towards +X.
    azimuth: f32,
    /// Angle from the up axis.
    polar: f32,
    azimuth_delta: f32,
    polar_delta: f32,
}

impl OrbitControls {
    pub fn from_camera(camera: &Camera, config: OrbitConfig) -> Self {
        let offset = camera.eye - camera.target;
        let distance = offset.length().max(f32::EPSILON);

        let mut controls = Self {
            target: camera.target,
            distance: distance.clamp(config.min_distance, config.max_distance),
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1.0, 1.0).acos(),
            azimuth_delta: 0.0,
            polar_delta: 0.0,
            config,
        };
        controls.polar = controls.clamp_polar(controls.polar);
        controls
    }

    /// Queues a rotation for a pointer drag of `delta` pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.azimuth_delta -= delta.x * self.config.rotate_speed;
        self.polar_delta -= delta.y * self.config.rotate_speed;
    }

    /// Positive `lines` zoom in.
    pub fn zoom(&mut self, lines: f32) {
        let factor = (1.0 - self.config.zoom_speed).powf(lines);
        self.distance =
            (self.distance * factor).clamp(self.config.min_distance, self.config.max_distance);
    }

    /// Applies a damped share of the queued rotation and moves the camera.
    pub fn update(&mut self, camera: &mut Camera) {
        let damping = self.config.damping_factor;

        self.azimuth += self.azimuth_delta * damping;
        self.polar = self.clamp_polar(self.polar + self.polar_delta * damping);

        self.azimuth_delta *= 1.0 - damping;
        self.polar_delta *= 1.0 - damping;

        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        let offset = Vec3::new(
            sin_polar * sin_azimuth,
            cos_polar,
            sin_polar * cos_azimuth,
        ) * self.distance;

        camera.target = self.target;
        camera.eye = self.target + offset;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    fn clamp_polar(&self, polar: f32) -> f32 {
        polar.clamp(MIN_POLAR_ANGLE, self.config.max_polar_angle)
    }
}
