// src/app.rs
use crate::config::AppConfig;
use crate::data::{save_snapshot, SessionExporter};
use crate::landmarks::{SimulatedDetector, JOINT_COUNT};
use crate::projection::{from_device_coords, SceneCamera};
use crate::render::{FrameReport, FrameRenderer, ImageSurface, PainterSurface};
use crate::scene::Scene;
use crate::smoothing::SmoothingStore;
use crate::style::StyleTable;

use chrono::{DateTime, Local};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use nalgebra::Vector2;
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(20, 20, 25);
const MAX_SIMULATED_HANDS: usize = 4;

pub struct HandOverlayApp {
    runtime: Runtime,
    config: AppConfig,

    // Per-frame pipeline
    store: SmoothingStore,
    renderer: FrameRenderer,
    scene: Scene,
    detector: SimulatedDetector,

    // UI state
    paused: bool,
    capacity_setting: usize,
    canvas_size: Vector2<f64>,
    last_report: FrameReport,
    status: Option<String>,

    // Recording
    exporter: Option<SessionExporter>,
    recording_start: Option<DateTime<Local>>,
}

impl HandOverlayApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, runtime: Runtime, config: AppConfig) -> Self {
        let store = SmoothingStore::new(config.smoothing_capacity, config.hand_slots)
            .unwrap_or_else(|e| {
                warn!("Invalid smoothing settings ({}), using defaults", e);
                SmoothingStore::default()
            });

        let style = match &config.style_path {
            Some(path) => StyleTable::load(path).unwrap_or_else(|e| {
                error!("{:#}", e);
                StyleTable::default()
            }),
            None => StyleTable::default(),
        };

        let mut scene = Scene::new(SceneCamera {
            distance: config.camera_distance,
        });
        if let Some(path) = &config.model_path {
            scene.begin_load(runtime.handle(), path);
        }

        Self {
            capacity_setting: store.capacity(),
            detector: SimulatedDetector::new(config.simulated_hands),
            renderer: FrameRenderer::new(style),
            runtime,
            config,
            store,
            scene,
            paused: false,
            canvas_size: Vector2::zeros(),
            last_report: FrameReport::default(),
            status: None,
            exporter: None,
            recording_start: None,
        }
    }

    fn render_overlay(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(BACKGROUND))
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::hover());
                let mut surface = PainterSurface::new(&painter, response.rect);
                self.canvas_size = Vector2::new(
                    response.rect.width() as f64,
                    response.rect.height() as f64,
                );

                if self.paused {
                    // Keep showing the last smoothed pose without feeding the store
                    for hand in &self.last_report.hands {
                        self.renderer.draw_skeleton(&hand.smoothed, &mut surface);
                    }
                    return;
                }

                let predictions = self.detector.next_frame(self.canvas_size);
                let camera = self.scene.camera();
                let report = self.renderer.draw_hands(
                    &predictions,
                    &mut self.store,
                    &mut surface,
                    camera,
                    self.scene.tracked_mut(),
                );

                if let (Some(exporter), Some(start)) =
                    (self.exporter.as_mut(), self.recording_start)
                {
                    let elapsed = Local::now().signed_duration_since(start);
                    exporter.add_frame(elapsed.num_milliseconds() as f64 / 1000.0, report.clone());
                }
                self.last_report = report;
            });
    }

    fn render_control_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("controls")
            .resizable(false)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.add_space(10.0);
                ui.heading("Smoothing");

                let slider = ui.add(
                    egui::Slider::new(&mut self.capacity_setting, 1..=30).text("Window (frames)"),
                );
                if slider.changed() {
                    if let Err(e) = self.store.set_capacity(self.capacity_setting) {
                        warn!("{}", e);
                    } else {
                        self.config.smoothing_capacity = self.capacity_setting;
                    }
                }

                ui.horizontal(|ui| {
                    if ui.button("Reset smoothing").clicked() {
                        self.store.reset();
                    }
                    ui.checkbox(&mut self.paused, "Pause");
                });

                let mut hands = self.detector.hands();
                let hands_slider =
                    egui::Slider::new(&mut hands, 0..=MAX_SIMULATED_HANDS).text("Simulated hands");
                if ui.add(hands_slider).changed() {
                    self.detector.set_hands(hands);
                    self.config.simulated_hands = hands;
                }

                ui.separator();
                self.render_model_section(ui);

                ui.separator();
                self.render_recording_section(ui);

                ui.separator();
                ui.heading("Landmarks");
                self.render_joint_table(ui);

                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status.as_str());
                }
            });
    }

    fn render_model_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Tracked Model");

        match self.scene.tracked() {
            Some(object) => {
                ui.label(format!("{} ({} bytes)", object.name, object.asset_bytes));
                ui.label(format!(
                    "Position: ({:.3}, {:.3}, {:.3})",
                    object.position.x, object.position.y, object.position.z
                ));
            }
            None if self.scene.is_loading() => {
                ui.spinner();
            }
            None => {
                ui.colored_label(egui::Color32::GRAY, "No model loaded");
            }
        }
        if let Some(err) = self.scene.last_error() {
            ui.colored_label(egui::Color32::from_rgb(244, 67, 54), err);
        }

        if ui.button("Load model…").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("glTF", &["glb", "gltf"])
                .pick_file()
            {
                self.scene.begin_load(self.runtime.handle(), &path);
                self.config.model_path = Some(path);
            }
        }
    }

    fn render_recording_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Session");

        ui.label("Output Directory:");
        ui.label(self.config.output_directory.display().to_string());
        if ui.button("Browse…").clicked() {
            if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                self.config.output_directory = dir;
            }
        }

        ui.horizontal(|ui| {
            let label = if self.exporter.is_some() { "⏹ Stop" } else { "⏺ Record" };
            if ui.button(label).clicked() {
                self.toggle_recording();
            }
            if ui.button("📷 Snapshot").clicked() {
                self.take_snapshot();
            }
        });

        if let Some(exporter) = &self.exporter {
            ui.label(
                egui::RichText::new(format!("Recording: {} frame(s)", exporter.frame_count()))
                    .color(egui::Color32::from_rgb(244, 67, 54)),
            );
        }

        if ui.button("Save settings").clicked() {
            let path = AppConfig::config_path();
            match self.config.save_to(&path) {
                Ok(()) => self.status = Some(format!("Settings saved to {}", path.display())),
                Err(e) => self.status = Some(format!("Could not save settings: {}", e)),
            }
        }
    }

    fn render_joint_table(&self, ui: &mut egui::Ui) {
        let Some(hand) = self.last_report.hands.first() else {
            ui.colored_label(egui::Color32::GRAY, "No hand detected");
            return;
        };

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::exact(40.0))
            .column(Column::remainder())
            .column(Column::remainder())
            .header(18.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Joint");
                });
                header.col(|ui| {
                    ui.strong("Raw");
                });
                header.col(|ui| {
                    ui.strong("Smoothed");
                });
            })
            .body(|mut body| {
                for joint in 0..JOINT_COUNT.min(hand.smoothed.len()) {
                    let raw = hand.raw[joint];
                    let smoothed = hand.smoothed[joint];
                    body.row(16.0, |mut row| {
                        row.col(|ui| {
                            ui.label(joint.to_string());
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.0}, {:.0}", raw.x, raw.y));
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.0}, {:.0}", smoothed.x, smoothed.y));
                        });
                    });
                }
            });
    }

    fn render_scene_preview(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("scene_preview")
            .exact_height(140.0)
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::hover());
                let rect = response.rect;
                painter.rect_filled(
                    rect,
                    egui::Rounding::same(4.0),
                    egui::Color32::from_rgb(30, 30, 35),
                );

                let Some(object) = self.scene.tracked() else {
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        if self.scene.is_loading() { "Loading model…" } else { "Scene empty" },
                        egui::FontId::proportional(16.0),
                        egui::Color32::from_rgb(150, 150, 155),
                    );
                    return;
                };

                let size = Vector2::new(rect.width() as f64, rect.height() as f64);
                let pixel = from_device_coords(object.position.xy(), size);
                let center =
                    egui::Pos2::new(rect.left() + pixel.x as f32, rect.top() + pixel.y as f32);
                let ring = egui::Stroke::new(3.0, egui::Color32::from_rgb(255, 215, 0));
                painter.circle_stroke(center, 12.0, ring);
                painter.text(
                    rect.left_top() + egui::vec2(8.0, 8.0),
                    egui::Align2::LEFT_TOP,
                    format!("{}  z = {:.2}", object.name, object.position.z),
                    egui::FontId::proportional(14.0),
                    egui::Color32::WHITE,
                );
            });
    }

    fn toggle_recording(&mut self) {
        match self.exporter.take() {
            Some(exporter) => {
                self.recording_start = None;
                match exporter.export_csv() {
                    Ok(path) => self.status = Some(format!("Saved {}", path.display())),
                    Err(e) => {
                        error!("Export failed: {:#}", e);
                        self.status = Some(format!("Export failed: {}", e));
                    }
                }
            }
            None => {
                info!("Recording started");
                self.exporter = Some(SessionExporter::new(&self.config.output_directory, None));
                self.recording_start = Some(Local::now());
            }
        }
    }

    fn take_snapshot(&mut self) {
        let width = self.canvas_size.x.max(1.0) as u32;
        let height = self.canvas_size.y.max(1.0) as u32;
        let mut surface = ImageSurface::new(width, height, BACKGROUND);
        for hand in &self.last_report.hands {
            self.renderer.draw_skeleton(&hand.smoothed, &mut surface);
        }

        match save_snapshot(&surface, &self.config.output_directory) {
            Ok(path) => self.status = Some(format!("Saved {}", path.display())),
            Err(e) => {
                error!("Snapshot failed: {:#}", e);
                self.status = Some(format!("Snapshot failed: {}", e));
            }
        }
    }
}

impl eframe::App for HandOverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // The model load is the only thing that ever assigns the tracked object
        self.scene.poll_load();

        self.render_control_panel(ctx);
        self.render_scene_preview(ctx);
        self.render_overlay(ctx);

        ctx.request_repaint();
    }
}
