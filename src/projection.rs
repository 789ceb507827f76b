// src/projection.rs - Surface pixels to normalized device coordinates
use nalgebra::{Vector2, Vector3};

pub const DEFAULT_CAMERA_DISTANCE: f64 = 5.0;

/// Maps a pixel position on a `surface`-sized canvas into [-1, 1] device
/// space. Pixel y grows downward, device y grows upward.
pub fn to_device_coords(pixel: Vector2<f64>, surface: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(
        (pixel.x / surface.x) * 2.0 - 1.0,
        -(pixel.y / surface.y) * 2.0 + 1.0,
    )
}

pub fn from_device_coords(device: Vector2<f64>, surface: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(
        (device.x + 1.0) * 0.5 * surface.x,
        (1.0 - device.y) * 0.5 * surface.y,
    )
}

pub fn is_projectable(surface: Vector2<f64>) -> bool {
    surface.x > 0.0 && surface.y > 0.0 && surface.x.is_finite() && surface.y.is_finite()
}

/// Camera looking down -z from a fixed distance off the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneCamera {
    pub distance: f64,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            distance: DEFAULT_CAMERA_DISTANCE,
        }
    }
}

impl SceneCamera {
    /// World position that keeps an object under `pixel` on the camera-facing depth plane.
    pub fn anchor(&self, pixel: Vector2<f64>, surface: Vector2<f64>) -> Vector3<f64> {
        let device = to_device_coords(pixel, surface);
        Vector3::new(device.x, device.y, -self.distance)
    }
}

/// A scene object whose pose the overlay drives. The scene owns it; the
/// overlay only writes `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub name: String,
    pub position: Vector3<f64>,
    pub asset_bytes: usize,
}

impl TrackedObject {
    pub fn new(name: impl Into<String>, asset_bytes: usize) -> Self {
        Self {
            name: name.into(),
            position: Vector3::zeros(),
            asset_bytes,
        }
    }
}
