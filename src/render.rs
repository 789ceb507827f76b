// src/render.rs - Hand skeleton overlay and tracked object pose update
use egui::{Color32, Painter, Pos2, Rect, Stroke};
use image::{Rgba, RgbaImage};
use nalgebra::{Vector2, Vector3};
use tracing::{debug, warn};

use crate::landmarks::{Prediction, WRIST};
use crate::projection::{is_projectable, SceneCamera, TrackedObject};
use crate::smoothing::SmoothingStore;
use crate::style::{BoneStroke, StyleTable};

/// A 2D canvas the overlay draws on, in pixels with y pointing down.
pub trait DrawSurface {
    fn size(&self) -> Vector2<f64>;
    fn stroke_line(&mut self, from: Vector2<f64>, to: Vector2<f64>, stroke: BoneStroke);
    fn fill_circle(&mut self, center: Vector2<f64>, radius: f32, color: Color32);
}

/// Draws into an egui panel; pixel (0, 0) is the panel's top-left corner.
pub struct PainterSurface<'a> {
    painter: &'a Painter,
    rect: Rect,
}

impl<'a> PainterSurface<'a> {
    pub fn new(painter: &'a Painter, rect: Rect) -> Self {
        Self { painter, rect }
    }

    fn to_screen(&self, p: Vector2<f64>) -> Pos2 {
        Pos2::new(self.rect.left() + p.x as f32, self.rect.top() + p.y as f32)
    }
}

impl DrawSurface for PainterSurface<'_> {
    fn size(&self) -> Vector2<f64> {
        Vector2::new(self.rect.width() as f64, self.rect.height() as f64)
    }

    fn stroke_line(&mut self, from: Vector2<f64>, to: Vector2<f64>, stroke: BoneStroke) {
        self.painter.line_segment(
            [self.to_screen(from), self.to_screen(to)],
            Stroke::new(stroke.width, stroke.color),
        );
    }

    fn fill_circle(&mut self, center: Vector2<f64>, radius: f32, color: Color32) {
        self.painter.circle_filled(self.to_screen(center), radius, color);
    }
}

/// Offscreen canvas used for PNG snapshots of the overlay.
pub struct ImageSurface {
    image: RgbaImage,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32, background: Color32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, to_rgba(background)),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Paints every pixel whose centre satisfies `inside`, within the given bounds.
    fn fill_where(
        &mut self,
        min: Vector2<f64>,
        max: Vector2<f64>,
        color: Color32,
        inside: impl Fn(Vector2<f64>) -> bool,
    ) {
        let (width, height) = self.image.dimensions();
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(height);

        let rgba = to_rgba(color);
        for y in y0..y1 {
            for x in x0..x1 {
                if inside(Vector2::new(x as f64 + 0.5, y as f64 + 0.5)) {
                    self.image.put_pixel(x, y, rgba);
                }
            }
        }
    }
}

impl DrawSurface for ImageSurface {
    fn size(&self) -> Vector2<f64> {
        Vector2::new(self.image.width() as f64, self.image.height() as f64)
    }

    fn stroke_line(&mut self, from: Vector2<f64>, to: Vector2<f64>, stroke: BoneStroke) {
        let half = stroke.width as f64 / 2.0;
        let pad = Vector2::new(half, half);
        let min = from.inf(&to) - pad;
        let max = from.sup(&to) + pad;
        self.fill_where(min, max, stroke.color, |p| distance_to_segment(p, from, to) <= half);
    }

    fn fill_circle(&mut self, center: Vector2<f64>, radius: f32, color: Color32) {
        let r = radius as f64;
        let pad = Vector2::new(r, r);
        self.fill_where(center - pad, center + pad, color, |p| {
            (p - center).norm_squared() <= r * r
        });
    }
}

fn to_rgba(color: Color32) -> Rgba<u8> {
    Rgba([color.r(), color.g(), color.b(), color.a()])
}

fn distance_to_segment(p: Vector2<f64>, a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandFrame {
    pub slot: usize,
    pub raw: Vec<Vector2<f64>>,
    pub smoothed: Vec<Vector2<f64>>,
}

/// What happened while drawing one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub hands: Vec<HandFrame>,
    pub rejected: usize,
    pub anchor: Option<Vector3<f64>>,
}

pub struct FrameRenderer {
    style: StyleTable,
}

impl FrameRenderer {
    pub fn new(style: StyleTable) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &StyleTable {
        &self.style
    }

    /// Draws every predicted hand, in order, and moves `tracked` (when the
    /// scene has one) onto the last hand's wrist, on `camera`'s depth plane.
    pub fn draw_hands(
        &self,
        predictions: &[Prediction],
        store: &mut SmoothingStore,
        surface: &mut dyn DrawSurface,
        camera: SceneCamera,
        mut tracked: Option<&mut TrackedObject>,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        let surface_size = surface.size();

        for (slot, prediction) in predictions.iter().enumerate() {
            let raw = match prediction.samples() {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Rejected hand {} this frame: {}", slot, e);
                    report.rejected += 1;
                    continue;
                }
            };

            let smoothed = match store.smooth(slot, &raw) {
                Ok(smoothed) => smoothed,
                Err(e) => {
                    warn!("Smoothing failed for hand {}: {}", slot, e);
                    report.rejected += 1;
                    continue;
                }
            };

            self.draw_skeleton(&smoothed, surface);

            if let Some(object) = tracked.as_deref_mut() {
                if is_projectable(surface_size) {
                    object.position = camera.anchor(smoothed[WRIST], surface_size);
                    report.anchor = Some(object.position);
                } else {
                    warn!(
                        "Surface is {}x{}, not moving '{}'",
                        surface_size.x, surface_size.y, object.name
                    );
                }
            }

            report.hands.push(HandFrame { slot, raw, smoothed });
        }

        if report.anchor.is_none() && tracked.is_none() && !report.hands.is_empty() {
            debug!("Tracked object not loaded yet, pose update skipped");
        }

        report
    }

    /// Bones first, then markers, so markers always sit on top of this hand's bones.
    pub fn draw_skeleton(&self, landmarks: &[Vector2<f64>], surface: &mut dyn DrawSurface) {
        let bone = self.style.bone();
        for (_, chain) in self.style.chains() {
            for pair in chain.windows(2) {
                surface.stroke_line(landmarks[pair[0]], landmarks[pair[1]], bone);
            }
        }

        for (joint, point) in landmarks.iter().enumerate() {
            let style = self.style.style_of(joint);
            surface.fill_circle(*point, style.radius, style.color);
        }
    }
}
