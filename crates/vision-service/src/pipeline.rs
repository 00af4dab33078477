//! End-to-end recognition pipeline.
//!
//! Sequences decode, vehicle detection, plate extraction and color
//! classification into a single outcome. The three signal sources are
//! isolated: a missing or failing engine degrades its own fields and the
//! rest of the pipeline still runs. `process` never fails; elapsed time is
//! recorded on every path.

use crate::color;
use crate::config::VisionConfig;
use crate::engine::EngineContext;
use crate::reconcile;
use crate::regions;
use common::vision::{Detection, HealthReport, VisionOutcome};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Spanish display names for the accepted detector classes
fn class_display_name(class: &str) -> &str {
    match class {
        "car" => "Automóvil",
        "truck" => "Camioneta",
        "bus" => "Bus",
        "motorcycle" => "Motocicleta",
        "bicycle" => "Bicicleta",
        other => other,
    }
}

/// Synchronous single-image recognition pipeline.
///
/// Holds no per-call state; one instance may serve concurrent callers as
/// long as the engines are safe for concurrent read-only use.
pub struct VisionPipeline {
    config: VisionConfig,
    engines: Arc<EngineContext>,
}

impl VisionPipeline {
    pub fn new(config: VisionConfig, engines: Arc<EngineContext>) -> Self {
        Self { config, engines }
    }

    /// Process one still image and return a structurally complete outcome.
    ///
    /// Undecodable input short-circuits to an empty outcome with an error
    /// note; every other failure degrades only its own signal.
    pub fn process(&self, image_bytes: &[u8]) -> VisionOutcome {
        let start = Instant::now();
        let mut outcome = VisionOutcome::default();

        let decoded = match image::load_from_memory(image_bytes) {
            Ok(decoded) => decoded,
            Err(decode_error) => {
                error!(%decode_error, "could not decode input image");
                outcome.metadata.insert(
                    "error".to_string(),
                    json!(format!("no se pudo decodificar la imagen: {decode_error}")),
                );
                outcome.processing_time_ms = start.elapsed().as_millis() as u64;
                return outcome;
            }
        };
        let rgb = decoded.to_rgb8();

        // 1. Vehicle detection
        if let Some(detector) = self.engines.detector() {
            match detector.detect(&decoded) {
                Ok(detections) => {
                    if let Some(vehicle) = self.first_vehicle(&detections) {
                        outcome.vehicle_detected = true;
                        outcome.detected_class =
                            class_display_name(&vehicle.class).to_string();
                        outcome.detection_confidence = vehicle.confidence;
                        if let Ok(bbox) = serde_json::to_value(vehicle.bbox) {
                            outcome.metadata.insert("bbox".to_string(), bbox);
                        }
                    }
                }
                Err(detect_error) => {
                    warn!(%detect_error, "vehicle detection failed");
                    outcome.metadata.insert(
                        "error_deteccion".to_string(),
                        json!(detect_error.to_string()),
                    );
                }
            }
        } else {
            debug!("vehicle detector unavailable, skipping detection");
        }

        // 2. Plate extraction
        if let Some(ocr) = self.engines.ocr() {
            let candidates = regions::find(&rgb, self.config.max_candidates);
            if let Some(hypothesis) =
                reconcile::reconcile(&candidates, ocr.as_ref(), &self.config)
            {
                outcome.plate = hypothesis.cleaned_text;
                outcome.ocr_confidence = hypothesis.confidence;
            }
        } else {
            debug!("OCR engine unavailable, skipping plate extraction");
        }

        // 3. Dominant color, independent of the other two signals
        outcome.color = color::dominant_color(&rgb).as_str().to_string();

        outcome.processing_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            vehicle = outcome.vehicle_detected,
            plate = %outcome.plate,
            color = %outcome.color,
            elapsed_ms = outcome.processing_time_ms,
            "image processed"
        );
        outcome
    }

    /// Availability of the optional external dependencies; performs no
    /// recognition work
    pub fn health(&self) -> HealthReport {
        HealthReport {
            detector_available: self.engines.detector().is_some(),
            ocr_available: self.engines.ocr().is_some(),
            // The image codec is linked statically into the binary
            codec_available: true,
        }
    }

    fn first_vehicle<'a>(&self, detections: &'a [Detection]) -> Option<&'a Detection> {
        detections
            .iter()
            .find(|detection| self.config.vehicle_classes.iter().any(|c| c == &detection.class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stub::{ScriptedOcr, StubDetector};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode_png(image: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn dark_scene() -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(320, 240, Rgb([25, 25, 25])))
    }

    #[test]
    fn test_garbage_bytes_produce_complete_outcome() {
        let pipeline =
            VisionPipeline::new(VisionConfig::default(), Arc::new(EngineContext::disconnected()));
        let outcome = pipeline.process(b"definitely not an image");

        assert!(!outcome.vehicle_detected);
        assert!(outcome.plate.is_empty());
        assert_eq!(outcome.color, "No identificado");
        assert!(outcome.metadata.contains_key("error"));
    }

    #[test]
    fn test_disconnected_engines_still_classify_color() {
        let pipeline =
            VisionPipeline::new(VisionConfig::default(), Arc::new(EngineContext::disconnected()));
        let outcome = pipeline.process(&dark_scene());

        assert!(!outcome.vehicle_detected);
        assert!(outcome.plate.is_empty());
        assert_eq!(outcome.color, "Negro");
        assert!(!outcome.metadata.contains_key("error"));
    }

    #[test]
    fn test_full_pipeline_with_stub_engines() {
        let ocr = Arc::new(ScriptedOcr::new());
        ocr.push_tokens(&[("5011", 92), ("KAN", 86)]);

        let engines = EngineContext::new(
            Some(Arc::new(StubDetector::vehicle("car", 0.91))),
            Some(ocr.clone()),
        );
        let pipeline = VisionPipeline::new(VisionConfig::default(), Arc::new(engines));
        let outcome = pipeline.process(&dark_scene());

        assert!(outcome.vehicle_detected);
        assert_eq!(outcome.detected_class, "Automóvil");
        assert!((outcome.detection_confidence - 0.91).abs() < 1e-6);
        assert_eq!(outcome.plate, "5011KAN");
        assert!((outcome.ocr_confidence - 0.89).abs() < 1e-4);
        assert!(outcome.metadata.contains_key("bbox"));
    }

    #[test]
    fn test_non_vehicle_classes_are_ignored() {
        let engines = EngineContext::new(
            Some(Arc::new(StubDetector::vehicle("person", 0.99))),
            None,
        );
        let pipeline = VisionPipeline::new(VisionConfig::default(), Arc::new(engines));
        let outcome = pipeline.process(&dark_scene());

        assert!(!outcome.vehicle_detected);
        assert!(outcome.detected_class.is_empty());
    }

    #[test]
    fn test_health_reports_engine_availability() {
        let pipeline =
            VisionPipeline::new(VisionConfig::default(), Arc::new(EngineContext::disconnected()));
        let health = pipeline.health();
        assert!(!health.detector_available);
        assert!(!health.ocr_available);
        assert!(health.codec_available);
    }
}
