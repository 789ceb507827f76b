// src/landmarks.rs - Hand landmark indices, detector predictions, simulated source
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, Result};

pub const JOINT_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// One detected hand in one frame, as handed over by the pose detector.
///
/// Each sample is `[x, y]` or `[x, y, z, ...]` in surface pixels; anything
/// past the second coordinate is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub landmarks: Vec<Vec<f64>>,
}

impl Prediction {
    /// Checks the prediction and returns its 21 samples as 2D points.
    pub fn samples(&self) -> Result<Vec<Vector2<f64>>> {
        if self.landmarks.len() != JOINT_COUNT {
            return Err(OverlayError::LandmarkCount {
                expected: JOINT_COUNT,
                found: self.landmarks.len(),
            });
        }

        self.landmarks
            .iter()
            .enumerate()
            .map(|(index, lm)| {
                if lm.len() < 2 {
                    return Err(OverlayError::MalformedLandmark { index, arity: lm.len() });
                }
                if !lm[0].is_finite() || !lm[1].is_finite() {
                    return Err(OverlayError::NonFiniteLandmark(index));
                }
                Ok(Vector2::new(lm[0], lm[1]))
            })
            .collect()
    }
}

/// Stand-in detector that produces a waving, slightly jittery hand so the
/// overlay can run without a camera or model.
pub struct SimulatedDetector {
    sim_time: f64,
    hands: usize,
    jitter: f64,
}

impl SimulatedDetector {
    pub fn new(hands: usize) -> Self {
        Self {
            sim_time: 0.0,
            hands,
            jitter: 4.0,
        }
    }

    pub fn set_hands(&mut self, hands: usize) {
        self.hands = hands;
    }

    pub fn hands(&self) -> usize {
        self.hands
    }

    /// Advances the simulation by one tick and returns this frame's predictions.
    pub fn next_frame(&mut self, surface: Vector2<f64>) -> Vec<Prediction> {
        let t = self.sim_time;
        self.sim_time += 0.033;

        (0..self.hands)
            .map(|hand| {
                let side = if hand % 2 == 0 { -1.0 } else { 1.0 };
                let phase = hand as f64 * 1.5;
                let wrist = Vector2::new(
                    surface.x * (0.5 + side * 0.2) + surface.x * 0.08 * (t * 0.7 + phase).cos(),
                    surface.y * 0.75 + surface.y * 0.05 * (t + phase).sin(),
                );
                let scale = surface.y.min(surface.x) / 480.0;
                let points = self.hand_points(wrist, scale, side, t);
                Prediction {
                    landmarks: points.iter().map(|p| vec![p.x, p.y, 0.0]).collect(),
                }
            })
            .collect()
    }

    fn hand_points(&self, wrist: Vector2<f64>, scale: f64, side: f64, t: f64) -> Vec<Vector2<f64>> {
        // Distance of each joint along its finger, wrist outwards
        const SEGMENTS: [[f64; 4]; 5] = [
            [35.0, 65.0, 90.0, 110.0],
            [85.0, 120.0, 142.0, 160.0],
            [88.0, 128.0, 152.0, 172.0],
            [84.0, 120.0, 142.0, 160.0],
            [78.0, 104.0, 120.0, 135.0],
        ];
        const SPREAD: [f64; 5] = [-0.95, -0.32, -0.08, 0.16, 0.40];

        let curl = 0.15 * (t * 1.3).sin();
        let mut points = vec![wrist];
        for (finger, lengths) in SEGMENTS.iter().enumerate() {
            let angle = -std::f64::consts::FRAC_PI_2 + side * SPREAD[finger] + curl;
            for (k, length) in lengths.iter().copied().enumerate() {
                let index = points.len();
                let noise = Vector2::new(
                    (t * 17.0 + index as f64 * 2.3).sin(),
                    (t * 13.0 + index as f64 * 1.7).cos(),
                ) * self.jitter;
                let bend = angle + curl * k as f64 * 0.5;
                points.push(wrist + Vector2::new(bend.cos(), bend.sin()) * length * scale + noise);
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_accepts_three_component_landmarks() {
        let prediction = Prediction {
            landmarks: (0..JOINT_COUNT).map(|i| vec![i as f64, 2.0 * i as f64, -0.5]).collect(),
        };

        let samples = prediction.samples().unwrap();
        assert_eq!(samples.len(), JOINT_COUNT);
        assert_eq!(samples[PINKY_TIP], Vector2::new(20.0, 40.0));
    }

    #[test]
    fn test_samples_rejects_short_landmark() {
        let mut landmarks: Vec<Vec<f64>> = (0..JOINT_COUNT).map(|_| vec![1.0, 1.0]).collect();
        landmarks[7] = vec![3.0];

        let err = Prediction { landmarks }.samples().unwrap_err();
        assert_eq!(err, OverlayError::MalformedLandmark { index: 7, arity: 1 });
    }

    #[test]
    fn test_samples_rejects_nan() {
        let mut landmarks: Vec<Vec<f64>> = (0..JOINT_COUNT).map(|_| vec![1.0, 1.0]).collect();
        landmarks[3][1] = f64::NAN;

        let err = Prediction { landmarks }.samples().unwrap_err();
        assert_eq!(err, OverlayError::NonFiniteLandmark(3));
    }

    #[test]
    fn test_samples_rejects_wrong_count() {
        let prediction = Prediction {
            landmarks: vec![vec![0.0, 0.0]; 20],
        };
        assert_eq!(
            prediction.samples().unwrap_err(),
            OverlayError::LandmarkCount { expected: 21, found: 20 }
        );
    }

    #[test]
    fn test_parse_predictions_from_detector_json() {
        let json = r#"[{"landmarks": [[1.0, 2.0, 0.1], [3.0, 4.0]]}]"#;
        let predictions: Vec<Prediction> = serde_json::from_str(json).unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].landmarks[1], vec![3.0, 4.0]);
    }

    #[test]
    fn test_simulated_detector_produces_valid_hands() {
        let mut detector = SimulatedDetector::new(2);
        let surface = Vector2::new(1280.0, 720.0);

        for _ in 0..10 {
            let frame = detector.next_frame(surface);
            assert_eq!(frame.len(), 2);
            for prediction in &frame {
                assert!(prediction.samples().is_ok());
            }
        }
    }
}
