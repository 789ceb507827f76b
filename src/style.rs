// src/style.rs - Joint marker styles and finger bone chains
use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use egui::Color32;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{OverlayError, Result};
use crate::landmarks::*;

pub const CHAIN_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// Declaration order, which is also the order bones are drawn in.
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "thumb" => Ok(Finger::Thumb),
            "index" | "indexfinger" => Ok(Finger::Index),
            "middle" | "middlefinger" => Ok(Finger::Middle),
            "ring" | "ringfinger" => Ok(Finger::Ring),
            "pinky" | "little" => Ok(Finger::Pinky),
            _ => Err(OverlayError::UnknownFinger(name.to_string())),
        }
    }

    fn position(self) -> usize {
        self as usize
    }
}

pub const DEFAULT_CHAINS: [[usize; CHAIN_LENGTH]; 5] = [
    [WRIST, THUMB_CMC, THUMB_MCP, THUMB_IP, THUMB_TIP],
    [WRIST, INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP],
    [WRIST, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP],
    [WRIST, RING_MCP, RING_PIP, RING_DIP, RING_TIP],
    [WRIST, PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointStyle {
    pub color: Color32,
    pub radius: f32,
}

/// Stroke used for every bone segment, regardless of joint styles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneStroke {
    pub color: Color32,
    pub width: f32,
}

impl Default for BoneStroke {
    fn default() -> Self {
        Self {
            color: named_color("plum").unwrap_or(Color32::WHITE),
            width: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    joints: [JointStyle; JOINT_COUNT],
    chains: [[usize; CHAIN_LENGTH]; 5],
    bone: BoneStroke,
}

pub static DEFAULT_STYLE: Lazy<StyleTable> = Lazy::new(StyleTable::gauntlet);

impl Default for StyleTable {
    fn default() -> Self {
        DEFAULT_STYLE.clone()
    }
}

impl StyleTable {
    fn gauntlet() -> Self {
        let gold = JointStyle { color: Color32::from_rgb(255, 215, 0), radius: 6.0 };
        let knuckle = |color| JointStyle { color, radius: 10.0 };

        let mut joints = [gold; JOINT_COUNT];
        joints[WRIST] = JointStyle { color: Color32::from_rgb(255, 255, 0), radius: 15.0 };
        joints[THUMB_MCP] = knuckle(Color32::from_rgb(0, 128, 0));
        joints[INDEX_MCP] = knuckle(Color32::from_rgb(128, 0, 128));
        joints[MIDDLE_MCP] = knuckle(Color32::from_rgb(0, 0, 255));
        joints[RING_MCP] = knuckle(Color32::from_rgb(255, 0, 0));
        joints[PINKY_MCP] = knuckle(Color32::from_rgb(255, 165, 0));

        Self {
            joints,
            chains: DEFAULT_CHAINS,
            bone: BoneStroke::default(),
        }
    }

    /// Style of a landmark marker.
    ///
    /// # Panics
    /// If `joint` is not a landmark index (0..=20).
    pub fn style_of(&self, joint: usize) -> JointStyle {
        self.joints[joint]
    }

    pub fn chain_of(&self, finger: Finger) -> &[usize; CHAIN_LENGTH] {
        &self.chains[finger.position()]
    }

    /// Chains in drawing order.
    pub fn chains(&self) -> impl Iterator<Item = (Finger, &[usize; CHAIN_LENGTH])> {
        Finger::ALL.into_iter().zip(self.chains.iter())
    }

    pub fn bone(&self) -> BoneStroke {
        self.bone
    }

    /// Applies a set of overrides on top of this table and checks the result.
    pub fn with_overrides(&self, config: &StyleConfig) -> Result<Self> {
        let mut table = self.clone();

        for (&joint, style) in &config.joints {
            if joint >= JOINT_COUNT {
                return Err(OverlayError::JointOutOfRange(joint));
            }
            table.joints[joint] = JointStyle {
                color: parse_color(&style.color)?,
                radius: style.radius,
            };
        }

        for (name, indices) in &config.chains {
            let finger = Finger::from_name(name)?;
            let chain: [usize; CHAIN_LENGTH] = indices.as_slice().try_into().map_err(|_| {
                OverlayError::InvalidChains(format!(
                    "{} chain has {} joints, expected {}",
                    finger.name(),
                    indices.len(),
                    CHAIN_LENGTH
                ))
            })?;
            table.chains[finger.position()] = chain;
        }

        if let Some(bone) = &config.bone {
            table.bone = BoneStroke {
                color: parse_color(&bone.color)?,
                width: bone.width,
            };
        }

        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        for (joint, style) in self.joints.iter().enumerate() {
            if !style.radius.is_finite() || style.radius <= 0.0 {
                return Err(OverlayError::InvalidStyle(format!(
                    "joint {} has radius {}",
                    joint, style.radius
                )));
            }
        }
        if !self.bone.width.is_finite() || self.bone.width <= 0.0 {
            return Err(OverlayError::InvalidStyle(format!(
                "bone width {}",
                self.bone.width
            )));
        }

        let mut seen = HashSet::new();
        for (finger, chain) in self.chains() {
            if chain[0] != WRIST {
                return Err(OverlayError::InvalidChains(format!(
                    "{} chain starts at {} instead of the wrist",
                    finger.name(),
                    chain[0]
                )));
            }
            for &joint in &chain[1..] {
                if joint == WRIST || joint >= JOINT_COUNT {
                    return Err(OverlayError::InvalidChains(format!(
                        "{} chain contains joint {}",
                        finger.name(),
                        joint
                    )));
                }
                if !seen.insert(joint) {
                    return Err(OverlayError::InvalidChains(format!(
                        "joint {} appears in more than one chain",
                        joint
                    )));
                }
            }
        }
        // 5 chains of 4 distinct non-wrist joints in 1..=20 cover all of them
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read style file {}", path.display()))?;
        let config: StyleConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse style file {}", path.display()))?;
        let table = DEFAULT_STYLE.with_overrides(&config)?;
        info!(
            "Loaded style overrides from {} ({} joint(s), {} chain(s))",
            path.display(),
            config.joints.len(),
            config.chains.len()
        );
        Ok(table)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    pub joints: HashMap<usize, JointStyleConfig>,
    #[serde(default)]
    pub chains: HashMap<String, Vec<usize>>,
    #[serde(default)]
    pub bone: Option<BoneConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointStyleConfig {
    pub color: String,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneConfig {
    pub color: String,
    pub width: f32,
}

fn named_color(name: &str) -> Option<Color32> {
    let color = match name {
        "yellow" => Color32::from_rgb(255, 255, 0),
        "gold" => Color32::from_rgb(255, 215, 0),
        "green" => Color32::from_rgb(0, 128, 0),
        "purple" => Color32::from_rgb(128, 0, 128),
        "blue" => Color32::from_rgb(0, 0, 255),
        "red" => Color32::from_rgb(255, 0, 0),
        "orange" => Color32::from_rgb(255, 165, 0),
        "plum" => Color32::from_rgb(221, 160, 221),
        "white" => Color32::WHITE,
        "black" => Color32::BLACK,
        _ => return None,
    };
    Some(color)
}

/// Parses a colour name from the palette above or a `#rrggbb` hex string.
pub fn parse_color(value: &str) -> Result<Color32> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                return Ok(Color32::from_rgb(r, g, b));
            }
        }
        return Err(OverlayError::UnknownColor(value.to_string()));
    }

    named_color(&value.to_ascii_lowercase())
        .ok_or_else(|| OverlayError::UnknownColor(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_joint_has_a_style() {
        let table = StyleTable::default();
        for joint in 0..JOINT_COUNT {
            let style = table.style_of(joint);
            assert!(style.radius > 0.0);
            assert_ne!(style.color, Color32::TRANSPARENT);
        }
    }

    #[test]
    fn test_gauntlet_palette() {
        let table = StyleTable::default();
        assert_eq!(table.style_of(WRIST).radius, 15.0);
        assert_eq!(table.style_of(WRIST).color, parse_color("yellow").unwrap());
        assert_eq!(table.style_of(MIDDLE_MCP).color, parse_color("blue").unwrap());
        assert_eq!(table.style_of(THUMB_MCP).radius, 10.0);
        assert_eq!(table.style_of(INDEX_TIP).color, parse_color("gold").unwrap());
        assert_eq!(table.bone().width, 4.0);
        assert_eq!(table.bone().color, parse_color("plum").unwrap());
    }

    #[test]
    fn test_chains_partition_the_hand() {
        let table = StyleTable::default();
        let mut covered: Vec<usize> = Vec::new();
        for (_, chain) in table.chains() {
            assert_eq!(chain[0], WRIST);
            covered.extend_from_slice(&chain[1..]);
        }
        covered.sort_unstable();
        assert_eq!(covered, (1..JOINT_COUNT).collect::<Vec<_>>());
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_chain_order_is_declaration_order() {
        let table = StyleTable::default();
        let fingers: Vec<Finger> = table.chains().map(|(finger, _)| finger).collect();
        assert_eq!(fingers, Finger::ALL.to_vec());
        assert_eq!(table.chain_of(Finger::Ring), &[0, 13, 14, 15, 16]);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#10ff00").unwrap(), Color32::from_rgb(16, 255, 0));
        assert_eq!(parse_color("Gold").unwrap(), Color32::from_rgb(255, 215, 0));
        assert!(matches!(parse_color("#12"), Err(OverlayError::UnknownColor(_))));
        assert!(matches!(parse_color("chartreuse"), Err(OverlayError::UnknownColor(_))));
    }

    #[test]
    fn test_overrides_from_json() {
        let json = r##"{
            "joints": { "4": { "color": "#ff0000", "radius": 9.5 } },
            "bone": { "color": "white", "width": 2.0 }
        }"##;
        let config: StyleConfig = serde_json::from_str(json).unwrap();
        let table = StyleTable::default().with_overrides(&config).unwrap();

        assert_eq!(table.style_of(THUMB_TIP).color, Color32::from_rgb(255, 0, 0));
        assert_eq!(table.style_of(THUMB_TIP).radius, 9.5);
        assert_eq!(table.bone().color, Color32::WHITE);
        assert_eq!(table.style_of(WRIST), StyleTable::default().style_of(WRIST));
    }

    #[test]
    fn test_overlapping_chain_rejected() {
        let mut config = StyleConfig::default();
        config.chains.insert("indexFinger".to_string(), vec![0, 1, 6, 7, 8]);

        let err = StyleTable::default().with_overrides(&config).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidChains(_)));
    }

    #[test]
    fn test_chain_not_rooted_at_wrist_rejected() {
        let mut config = StyleConfig::default();
        config.chains.insert("pinky".to_string(), vec![17, 18, 19, 20, 0]);

        let err = StyleTable::default().with_overrides(&config).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidChains(_)));
    }

    #[test]
    fn test_bad_radius_and_joint_rejected() {
        let mut config = StyleConfig::default();
        config.joints.insert(2, JointStyleConfig { color: "red".into(), radius: 0.0 });
        assert!(matches!(
            StyleTable::default().with_overrides(&config),
            Err(OverlayError::InvalidStyle(_))
        ));

        let mut config = StyleConfig::default();
        config.joints.insert(21, JointStyleConfig { color: "red".into(), radius: 3.0 });
        assert_eq!(
            StyleTable::default().with_overrides(&config),
            Err(OverlayError::JointOutOfRange(21))
        );
    }
}
