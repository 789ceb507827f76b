// src/smoothing.rs - Rolling-window landmark smoothing
use std::collections::VecDeque;

use nalgebra::Vector2;
use tracing::debug;

use crate::error::{OverlayError, Result};
use crate::landmarks::JOINT_COUNT;

pub const DEFAULT_CAPACITY: usize = 5;
pub const DEFAULT_HAND_SLOTS: usize = 2;

/// Recent raw samples of one joint, oldest first.
#[derive(Debug, Clone, Default)]
pub struct SmoothingWindow {
    samples: VecDeque<Vector2<f64>>,
}

impl SmoothingWindow {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
        }
    }

    fn push(&mut self, sample: Vector2<f64>, capacity: usize) {
        self.samples.push_back(sample);
        while self.samples.len() > capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &Vector2<f64>> {
        self.samples.iter()
    }

    pub fn mean(&self) -> Option<Vector2<f64>> {
        if self.samples.is_empty() {
            return None;
        }
        let sum = self.samples.iter().fold(Vector2::zeros(), |acc, p| acc + p);
        Some(sum / self.samples.len() as f64)
    }

    fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Per-hand-slot, per-joint sample history that survives across frames.
///
/// Slots are the position of a prediction within a frame's list, so two
/// hands tracked at once never share a window. A slot past the preallocated
/// ones gets its 21 windows the first time a sample is recorded for it.
#[derive(Debug, Clone)]
pub struct SmoothingStore {
    capacity: usize,
    hands: Vec<[SmoothingWindow; JOINT_COUNT]>,
}

impl Default for SmoothingStore {
    fn default() -> Self {
        Self::build(DEFAULT_CAPACITY, DEFAULT_HAND_SLOTS)
    }
}

impl SmoothingStore {
    pub fn new(capacity: usize, hand_slots: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(OverlayError::InvalidCapacity);
        }
        Ok(Self::build(capacity, hand_slots))
    }

    fn build(capacity: usize, hand_slots: usize) -> Self {
        let hands = (0..hand_slots).map(|_| Self::new_hand(capacity)).collect();
        Self { capacity, hands }
    }

    fn new_hand(capacity: usize) -> [SmoothingWindow; JOINT_COUNT] {
        std::array::from_fn(|_| SmoothingWindow::with_capacity(capacity))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hand_slots(&self) -> usize {
        self.hands.len()
    }

    /// Changes the default capacity. Longer windows are trimmed on their next record.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(OverlayError::InvalidCapacity);
        }
        self.capacity = capacity;
        Ok(())
    }

    pub fn record(&mut self, slot: usize, joint: usize, sample: Vector2<f64>) -> Result<()> {
        self.record_with_capacity(slot, joint, sample, self.capacity)
    }

    pub fn record_with_capacity(
        &mut self,
        slot: usize,
        joint: usize,
        sample: Vector2<f64>,
        capacity: usize,
    ) -> Result<()> {
        if capacity == 0 {
            return Err(OverlayError::InvalidCapacity);
        }
        self.window_mut(slot, joint)?.push(sample, capacity);
        Ok(())
    }

    pub fn average(&self, slot: usize, joint: usize) -> Result<Vector2<f64>> {
        self.window(slot, joint)?
            .mean()
            .ok_or(OverlayError::EmptyWindow(joint))
    }

    pub fn window(&self, slot: usize, joint: usize) -> Result<&SmoothingWindow> {
        let slots = self.hands.len();
        let hand = self
            .hands
            .get(slot)
            .ok_or(OverlayError::HandSlotOutOfRange { slot, slots })?;
        hand.get(joint).ok_or(OverlayError::JointOutOfRange(joint))
    }

    fn window_mut(&mut self, slot: usize, joint: usize) -> Result<&mut SmoothingWindow> {
        if joint >= JOINT_COUNT {
            return Err(OverlayError::JointOutOfRange(joint));
        }
        if slot >= self.hands.len() {
            debug!("Adding smoothing history for hand slot {}", slot);
            let capacity = self.capacity;
            self.hands.resize_with(slot + 1, || Self::new_hand(capacity));
        }
        Ok(&mut self.hands[slot][joint])
    }

    /// Folds one hand's raw samples into the store and returns the rolling
    /// average of every joint, in input order.
    pub fn smooth(&mut self, slot: usize, raw: &[Vector2<f64>]) -> Result<Vec<Vector2<f64>>> {
        self.smooth_with_capacity(slot, raw, self.capacity)
    }

    pub fn smooth_with_capacity(
        &mut self,
        slot: usize,
        raw: &[Vector2<f64>],
        capacity: usize,
    ) -> Result<Vec<Vector2<f64>>> {
        if raw.len() > JOINT_COUNT {
            return Err(OverlayError::JointOutOfRange(raw.len() - 1));
        }

        let mut smoothed = Vec::with_capacity(raw.len());
        for (joint, sample) in raw.iter().enumerate() {
            self.record_with_capacity(slot, joint, *sample, capacity)?;
            smoothed.push(self.average(slot, joint)?);
        }
        Ok(smoothed)
    }

    pub fn reset(&mut self) {
        debug!("Clearing smoothing history for {} hand slot(s)", self.hands.len());
        for hand in &mut self.hands {
            for window in hand.iter_mut() {
                window.clear();
            }
        }
    }
}
