// src/data.rs
use crate::render::{FrameReport, ImageSurface};
use csv::Writer;
use std::path::{Path, PathBuf};
use std::fs::File;
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
struct LandmarkRecord {
    frame: usize,
    timestamp: f64,
    hand: usize,
    joint: usize,
    raw_x: f64,
    raw_y: f64,
    smoothed_x: f64,
    smoothed_y: f64,
}

#[derive(Debug, Serialize)]
struct AnchorRecord {
    frame: usize,
    timestamp: f64,
    x: f64,
    y: f64,
    z: f64,
}

/// Collects frame reports during a recording and writes them out as CSV.
pub struct SessionExporter {
    output_dir: PathBuf,
    session_name: String,
    frames: Vec<(f64, FrameReport)>,
}

impl SessionExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            format!("session_{}_{}", Local::now().format("%Y%m%d_%H%M%S"), &suffix[..8])
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            frames: Vec::new(),
        }
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn add_frame(&mut self, timestamp: f64, report: FrameReport) {
        self.frames.push((timestamp, report));
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Writes `landmarks.csv` and `anchor.csv` into the session directory.
    pub fn export_csv(&self) -> Result<PathBuf> {
        let dir = self.session_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let landmarks_path = dir.join("landmarks.csv");
        let mut writer = Writer::from_writer(File::create(&landmarks_path)?);
        for (frame, (timestamp, report)) in self.frames.iter().enumerate() {
            for hand in &report.hands {
                for (joint, (raw, smoothed)) in hand.raw.iter().zip(&hand.smoothed).enumerate() {
                    writer.serialize(LandmarkRecord {
                        frame,
                        timestamp: *timestamp,
                        hand: hand.slot,
                        joint,
                        raw_x: raw.x,
                        raw_y: raw.y,
                        smoothed_x: smoothed.x,
                        smoothed_y: smoothed.y,
                    })?;
                }
            }
        }
        writer.flush()?;

        let anchor_path = dir.join("anchor.csv");
        let mut writer = Writer::from_writer(File::create(&anchor_path)?);
        for (frame, (timestamp, report)) in self.frames.iter().enumerate() {
            if let Some(anchor) = report.anchor {
                writer.serialize(AnchorRecord {
                    frame,
                    timestamp: *timestamp,
                    x: anchor.x,
                    y: anchor.y,
                    z: anchor.z,
                })?;
            }
        }
        writer.flush()?;

        info!("Exported {} frame(s) to {}", self.frames.len(), dir.display());
        Ok(landmarks_path)
    }
}

/// Saves an offscreen overlay as PNG next to the session data.
pub fn save_snapshot(surface: &ImageSurface, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("snapshot_{}.png", Local::now().format("%Y%m%d_%H%M%S%.3f")));
    surface
        .image()
        .save(&path)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    info!("Saved overlay snapshot to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HandFrame;
    use egui::Color32;
    use nalgebra::{Vector2, Vector3};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("hand_overlay_test_{}", uuid::Uuid::new_v4()))
    }

    fn report(anchor: Option<Vector3<f64>>) -> FrameReport {
        FrameReport {
            hands: vec![HandFrame {
                slot: 0,
                raw: vec![Vector2::new(1.0, 2.0), Vector2::new(3.0, 4.0)],
                smoothed: vec![Vector2::new(1.5, 2.5), Vector2::new(3.5, 4.5)],
            }],
            rejected: 0,
            anchor,
        }
    }

    #[test]
    fn test_export_writes_one_row_per_joint() {
        let dir = temp_dir();
        let mut exporter = SessionExporter::new(&dir, Some("unit".to_string()));
        exporter.add_frame(0.0, report(None));
        exporter.add_frame(0.033, report(Some(Vector3::new(0.1, -0.2, -5.0))));

        let path = exporter.export_csv().unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[3][0], "1");
        assert_eq!(&rows[3][7], "4.5");

        let anchors = std::fs::read_to_string(exporter.session_dir().join("anchor.csv")).unwrap();
        assert_eq!(anchors.lines().count(), 2);
        assert!(anchors.contains("-5.0"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_default_session_name_is_unique() {
        let a = SessionExporter::new("/tmp", None);
        let b = SessionExporter::new("/tmp", None);
        assert_ne!(a.session_dir(), b.session_dir());
    }

    #[test]
    fn test_snapshot_written_as_png() {
        let dir = temp_dir();
        let surface = ImageSurface::new(8, 8, Color32::BLACK);
        let path = save_snapshot(&surface, &dir).unwrap();

        let image = image::open(&path).unwrap();
        assert_eq!(image.width(), 8);
        std::fs::remove_dir_all(dir).ok();
    }
}
