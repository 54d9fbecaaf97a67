use std::path::PathBuf;

use glam::{Vec3, Vec4};

const FRAME_ASSET_ENV: &str = "FRAME_CONFIGURATOR_FRAME_ASSET";
const TRANSOM_ASSET_ENV: &str = "FRAME_CONFIGURATOR_TRANSOM_ASSET";

#[derive(Debug, Clone)]
pub struct ConfiguratorConfig {
    pub frame_asset: PathBuf,
    pub transom_asset: PathBuf,
    pub placement: PlacementSettings,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub lighting: LightingConfig,
    /// Linear RGB clear colour.
    pub background: Vec3,
}

#[derive(Debug, Clone)]
pub struct PlacementSettings {
    /// Edge length of the clickable centre cube.
    pub marker_size: f32,
    pub marker_color: Vec4,
    /// Scale applied to every inserted transom, stretching it across the frame depth.
    pub transom_scale: Vec3,
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone)]
pub struct OrbitConfig {
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Largest angle between the up axis and the camera direction.
    pub max_polar_angle: f32,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// Fraction of the distance per wheel line.
    pub zoom_speed: f32,
}

#[derive(Debug, Clone)]
pub struct LightingConfig {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub sun_color: Vec3,
    pub sun_intensity: f32,
    pub sun_position: Vec3,
}

impl Default for ConfiguratorConfig {
    fn default() -> Self {
        Self {
            frame_asset: PathBuf::from("models/shapedFrame.glb"),
            transom_asset: PathBuf::from("models/transomsModel.glb"),
            placement: PlacementSettings::default(),
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            lighting: LightingConfig::default(),
            background: srgb_hex(0xf2fdff),
        }
    }
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            marker_size: 0.1,
            marker_color: srgb_hex(0x00ff00).extend(1.0),
            transom_scale: Vec3::new(1.0, 100.0, 1.0),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, -5.0),
            target: Vec3::ZERO,
            fov_degrees: 35.0,
            near: 1.0,
            far: 100.0,
        }
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.04,
            min_distance: 1.0,
            max_distance: 10.0,
            max_polar_angle: std::f32::consts::FRAC_PI_2,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: srgb_hex(0xa0a0fc),
            ambient_intensity: 1.0,
            sun_color: srgb_hex(0xe8c37b),
            sun_intensity: 1.0,
            sun_position: Vec3::new(3.0, 2.0, 3.0),
        }
    }
}

impl ConfiguratorConfig {
    /// Defaults, with asset paths taken from the environment when set.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(FRAME_ASSET_ENV).filter(|value| !value.is_empty()) {
            self.frame_asset = PathBuf::from(path);
        }

        if let Some(path) = lookup(TRANSOM_ASSET_ENV).filter(|value| !value.is_empty()) {
            self.transom_asset = PathBuf::from(path);
        }

        self
    }
}

/// `0xRRGGBB` in sRGB to linear RGB.
pub fn srgb_hex(hex: u32) -> Vec3 {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };

    Vec3::new(channel(16), channel(8), channel(0))
}
