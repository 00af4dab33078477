use anyhow::{Context, Result};
use std::env;

/// Tunables for the recognition pipeline, loaded from the environment
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Characters the OCR engine may emit
    pub char_whitelist: String,

    /// Minimum per-token confidence (0-100) for a token to count
    pub min_token_confidence: i32,

    /// Maximum number of candidate regions tried per image
    pub max_candidates: usize,

    /// Confidence assigned to hypotheses obtained via whole-line OCR
    pub line_confidence: f32,

    /// Detector classes accepted as vehicles
    pub vehicle_classes: Vec<String>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            char_whitelist: "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-".to_string(),
            min_token_confidence: 30,
            max_candidates: 6,
            line_confidence: 0.60,
            vehicle_classes: vec![
                "car".to_string(),
                "truck".to_string(),
                "bus".to_string(),
                "motorcycle".to_string(),
                "bicycle".to_string(),
            ],
        }
    }
}

impl VisionConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let char_whitelist =
            env::var("VISION_CHAR_WHITELIST").unwrap_or(defaults.char_whitelist);

        let min_token_confidence = match env::var("VISION_MIN_TOKEN_CONFIDENCE") {
            Ok(raw) => raw
                .parse()
                .context("Invalid VISION_MIN_TOKEN_CONFIDENCE")?,
            Err(_) => defaults.min_token_confidence,
        };

        let max_candidates = match env::var("VISION_MAX_CANDIDATES") {
            Ok(raw) => raw.parse().context("Invalid VISION_MAX_CANDIDATES")?,
            Err(_) => defaults.max_candidates,
        };

        let vehicle_classes = match env::var("VISION_VEHICLE_CLASSES") {
            Ok(raw) => raw
                .split(',')
                .map(|class| class.trim().to_string())
                .filter(|class| !class.is_empty())
                .collect(),
            Err(_) => defaults.vehicle_classes,
        };

        Ok(Self {
            char_whitelist,
            min_token_confidence,
            max_candidates,
            line_confidence: defaults.line_confidence,
            vehicle_classes,
        })
    }
}
