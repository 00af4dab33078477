//! Shared contracts for the gate-vision recognition pipeline.
//!
//! This module defines the types exchanged between the vision pipeline, its
//! external engines (vehicle detector, OCR) and the calling layer. The
//! outcome payload keeps the Spanish field names expected by the access-gate
//! backend that consumes it.

use serde::{Deserialize, Serialize};

/// Bounding box coordinates in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Area of the box in pixels
    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// One object reported by a vehicle detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Object class/label as reported by the detector (e.g. "car")
    pub class: String,

    /// Detection confidence (0.0 to 1.0)
    pub confidence: f32,

    /// Bounding box of the detected object
    pub bbox: BoundingBox,

    /// Additional metadata (detector-specific)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Named color bucket for the dominant-color classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorLabel {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    White,
    Black,
    Gray,
    Unidentified,
}

impl ColorLabel {
    /// Display name used in the outcome payload (Spanish, matching the
    /// access-gate backend's color catalog)
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorLabel::Red => "Rojo",
            ColorLabel::Orange => "Naranja",
            ColorLabel::Yellow => "Amarillo",
            ColorLabel::Green => "Verde",
            ColorLabel::Blue => "Azul",
            ColorLabel::Purple => "Morado",
            ColorLabel::White => "Blanco",
            ColorLabel::Black => "Negro",
            ColorLabel::Gray => "Gris",
            ColorLabel::Unidentified => "No identificado",
        }
    }
}

/// Top-level result of one `process` call.
///
/// Always structurally complete: a failed or degraded run still carries
/// every field, with empty/false defaults plus an error note in `metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionOutcome {
    /// Whether a vehicle was found in the image
    #[serde(rename = "vehiculo_detectado")]
    pub vehicle_detected: bool,

    /// Vehicle class label (Spanish display name)
    #[serde(rename = "clase_detectada")]
    pub detected_class: String,

    /// Detector confidence (0.0 to 1.0)
    #[serde(rename = "confianza_deteccion")]
    pub detection_confidence: f32,

    /// Normalized plate string, empty when nothing plausible was read
    #[serde(rename = "placa_detectada")]
    pub plate: String,

    /// OCR confidence for the plate string (0.0 to 1.0)
    #[serde(rename = "confianza_ocr")]
    pub ocr_confidence: f32,

    /// Dominant body color display name
    #[serde(rename = "color_detectado")]
    pub color: String,

    /// End-to-end processing latency in milliseconds
    #[serde(rename = "tiempo_procesamiento_ms")]
    pub processing_time_ms: u64,

    /// Free-form metadata: bounding box, error notes
    #[serde(rename = "metadatos")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Default for VisionOutcome {
    fn default() -> Self {
        Self {
            vehicle_detected: false,
            detected_class: String::new(),
            detection_confidence: 0.0,
            plate: String::new(),
            ocr_confidence: 0.0,
            color: ColorLabel::Unidentified.as_str().to_string(),
            processing_time_ms: 0,
            metadata: serde_json::Map::new(),
        }
    }
}

/// Availability of the optional external dependencies, reported without
/// performing any recognition work
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthReport {
    pub detector_available: bool,
    pub ocr_available: bool,
    pub codec_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_spanish_keys() {
        let outcome = VisionOutcome::default();
        let value = serde_json::to_value(&outcome).unwrap();
        let obj = value.as_object().unwrap();

        for key in [
            "vehiculo_detectado",
            "clase_detectada",
            "confianza_deteccion",
            "placa_detectada",
            "confianza_ocr",
            "color_detectado",
            "tiempo_procesamiento_ms",
            "metadatos",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj["vehiculo_detectado"], serde_json::json!(false));
        assert_eq!(obj["color_detectado"], serde_json::json!("No identificado"));
    }

    #[test]
    fn test_default_outcome_is_structurally_complete() {
        let outcome = VisionOutcome::default();
        assert!(!outcome.vehicle_detected);
        assert!(outcome.plate.is_empty());
        assert_eq!(outcome.color, "No identificado");
        assert_eq!(outcome.processing_time_ms, 0);
    }

    #[test]
    fn test_bounding_box_area() {
        let bbox = BoundingBox {
            x: 10,
            y: 20,
            width: 120,
            height: 40,
        };
        assert_eq!(bbox.area(), 4800);
    }

    #[test]
    fn test_color_label_display_names() {
        assert_eq!(ColorLabel::Red.as_str(), "Rojo");
        assert_eq!(ColorLabel::White.as_str(), "Blanco");
        assert_eq!(ColorLabel::Unidentified.as_str(), "No identificado");
    }
}
