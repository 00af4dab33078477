//! OCR hypothesis collection and reconciliation.
//!
//! Runs OCR against preprocessed variants of each candidate region and
//! selects the single best hypothesis. A cleaned read of five or more
//! characters is accepted immediately; such strings are almost always
//! genuine plates in the supported grammars, and stopping early keeps the
//! latency budget.

use crate::config::VisionConfig;
use crate::engine::{OcrEngine, OcrOptions};
use crate::normalize::normalize;
use crate::preprocess::{prepare, PrepStrategy};
use crate::regions::RegionCandidate;
use image::{imageops, imageops::FilterType, RgbImage};
use tracing::debug;

/// One OCR attempt's raw text, cleaned text and confidence
#[derive(Debug, Clone)]
pub struct OcrHypothesis {
    pub raw_text: String,
    pub cleaned_text: String,
    /// 0.0 to 1.0
    pub confidence: f32,
}

/// Preprocessing strategies in trial order
const STRATEGY_ORDER: [PrepStrategy; 3] = [
    PrepStrategy::Otsu,
    PrepStrategy::BlueExtract,
    PrepStrategy::Clahe,
];

/// Cleaned-text length that triggers immediate acceptance
const EARLY_ACCEPT_LEN: usize = 5;

/// OCR engines are tuned to a text-height band; regions outside it are
/// rescaled into it before preprocessing.
const MIN_OCR_HEIGHT: u32 = 40;
const MIN_OCR_WIDTH: u32 = 100;
const TARGET_UPSCALE_HEIGHT: f32 = 50.0;
const TARGET_UPSCALE_WIDTH: f32 = 120.0;
const MIN_UPSCALE: f32 = 2.0;
const MAX_OCR_HEIGHT: u32 = 100;
const TARGET_DOWNSCALE_HEIGHT: f32 = 70.0;

/// Try every candidate x strategy pair in rank order and return the best
/// hypothesis, or `None` when no attempt produced non-empty cleaned text.
pub fn reconcile(
    candidates: &[RegionCandidate],
    ocr: &dyn OcrEngine,
    config: &VisionConfig,
) -> Option<OcrHypothesis> {
    let options = OcrOptions {
        char_whitelist: config.char_whitelist.clone(),
        single_line: true,
    };

    let mut best: Option<OcrHypothesis> = None;

    for candidate in candidates {
        let scaled = rescale_for_ocr(&candidate.pixels);

        for strategy in STRATEGY_ORDER {
            let binary = prepare(&scaled, strategy);

            let Some(hypothesis) = run_ocr(&binary, ocr, &options, config) else {
                continue;
            };

            if hypothesis.cleaned_text.len() >= EARLY_ACCEPT_LEN {
                debug!(
                    plate = %hypothesis.cleaned_text,
                    strategy = ?strategy,
                    source = ?candidate.source,
                    "early-accepted plate hypothesis"
                );
                return Some(hypothesis);
            }

            if hypothesis.cleaned_text.is_empty() {
                continue;
            }

            // Longest cleaned text wins; ties keep the first seen
            let better = match &best {
                None => true,
                Some(current) => hypothesis.cleaned_text.len() > current.cleaned_text.len(),
            };
            if better {
                best = Some(hypothesis);
            }
        }
    }

    best
}

/// One OCR invocation against a binarized region: token-level first, whole
/// line as fallback when no token clears the confidence floor.
fn run_ocr(
    binary: &image::GrayImage,
    ocr: &dyn OcrEngine,
    options: &OcrOptions,
    config: &VisionConfig,
) -> Option<OcrHypothesis> {
    match ocr.recognize_tokens(binary, options) {
        Ok(tokens) => {
            let kept: Vec<_> = tokens
                .iter()
                .filter(|token| {
                    token.confidence > config.min_token_confidence
                        && !token.text.trim().is_empty()
                })
                .collect();

            if !kept.is_empty() {
                let raw_text: String = kept.iter().map(|token| token.text.trim()).collect();
                let confidence = kept
                    .iter()
                    .map(|token| token.confidence as f32)
                    .sum::<f32>()
                    / kept.len() as f32
                    / 100.0;
                let cleaned_text = normalize(&raw_text);
                return Some(OcrHypothesis {
                    raw_text,
                    cleaned_text,
                    confidence,
                });
            }
        }
        Err(error) => {
            debug!(%error, "token-level OCR failed, falling back to whole line");
        }
    }

    match ocr.recognize_line(binary, options) {
        Ok(line) if !line.trim().is_empty() => {
            let cleaned_text = normalize(&line);
            Some(OcrHypothesis {
                raw_text: line,
                cleaned_text,
                confidence: config.line_confidence,
            })
        }
        Ok(_) => None,
        Err(error) => {
            debug!(%error, "whole-line OCR failed");
            None
        }
    }
}

/// Bring the region into the OCR-effective size band: cubic upscale for
/// small regions (2x floor), area-style downscale for tall ones.
fn rescale_for_ocr(region: &RgbImage) -> RgbImage {
    let (width, height) = region.dimensions();
    if width == 0 || height == 0 {
        return region.clone();
    }
    let (w, h) = (width as f32, height as f32);

    if height < MIN_OCR_HEIGHT || width < MIN_OCR_WIDTH {
        let scale = (TARGET_UPSCALE_HEIGHT / h)
            .max(TARGET_UPSCALE_WIDTH / w)
            .max(MIN_UPSCALE);
        let new_width = (w * scale).round() as u32;
        let new_height = (h * scale).round() as u32;
        return imageops::resize(region, new_width, new_height, FilterType::CatmullRom);
    }

    if height > MAX_OCR_HEIGHT {
        let scale = TARGET_DOWNSCALE_HEIGHT / h;
        let new_width = ((w * scale).round() as u32).max(1);
        let new_height = ((h * scale).round() as u32).max(1);
        return imageops::resize(region, new_width, new_height, FilterType::Triangle);
    }

    region.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stub::ScriptedOcr;
    use crate::regions;
    use image::Rgb;

    fn test_candidates(count: usize) -> Vec<RegionCandidate> {
        let image = RgbImage::from_pixel(640, 480, Rgb([40, 40, 40]));
        let mut candidates = regions::find(&image, 6);
        candidates.truncate(count);
        candidates
    }

    #[test]
    fn test_early_accept_stops_after_first_hit() {
        let ocr = ScriptedOcr::new();
        ocr.push_tokens(&[("5011", 90), ("KAN", 88)]);

        let candidates = test_candidates(4);
        let config = VisionConfig::default();
        let hypothesis = reconcile(&candidates, &ocr, &config).expect("hypothesis");

        assert_eq!(hypothesis.cleaned_text, "5011KAN");
        assert!((hypothesis.confidence - 0.89).abs() < 1e-4);
        // One token call, no fallback, no further candidate/strategy pairs
        assert_eq!(ocr.token_calls(), 1);
        assert_eq!(ocr.line_calls(), 0);
    }

    #[test]
    fn test_short_reads_reconcile_to_none() {
        let ocr = ScriptedOcr::new();
        // Short reads only; none survives normalization
        ocr.push_tokens(&[("51KA", 80)]);
        ocr.push_tokens(&[("501K", 70)]);
        ocr.push_tokens(&[("5011", 95)]);

        let candidates = test_candidates(1);
        let config = VisionConfig::default();
        let result = reconcile(&candidates, &ocr, &config);

        // All cleaned texts are empty (length-4 strings match no grammar),
        // so nothing is reconciled
        assert!(result.is_none());
        // Every strategy was tried; nothing triggered the early accept
        assert_eq!(ocr.token_calls(), 3);
    }

    #[test]
    fn test_low_confidence_tokens_fall_back_to_line() {
        let ocr = ScriptedOcr::new();
        ocr.push_tokens(&[("5011", 10), ("KAN", 12)]); // below the floor
        ocr.push_line("5011-KAN");

        let candidates = test_candidates(1);
        let config = VisionConfig::default();
        let hypothesis = reconcile(&candidates, &ocr, &config).expect("hypothesis");

        assert_eq!(hypothesis.cleaned_text, "5011KAN");
        assert!((hypothesis.confidence - config.line_confidence).abs() < 1e-6);
        assert_eq!(ocr.line_calls(), 1);
    }

    #[test]
    fn test_no_text_anywhere_returns_none() {
        let ocr = ScriptedOcr::new();
        let candidates = test_candidates(2);
        let config = VisionConfig::default();
        assert!(reconcile(&candidates, &ocr, &config).is_none());
        // Two candidates x three strategies, all empty
        assert_eq!(ocr.token_calls(), 6);
    }

    #[test]
    fn test_rescale_upscales_small_regions() {
        let region = RgbImage::from_pixel(80, 24, Rgb([128, 128, 128]));
        let scaled = rescale_for_ocr(&region);
        assert!(scaled.height() >= 50);
        assert!(scaled.width() >= 120);
        // 2x floor applies even when targets are closer
        let region = RgbImage::from_pixel(90, 38, Rgb([128, 128, 128]));
        let scaled = rescale_for_ocr(&region);
        assert_eq!(scaled.dimensions(), (180, 76));
    }

    #[test]
    fn test_rescale_downscales_tall_regions() {
        let region = RgbImage::from_pixel(300, 140, Rgb([128, 128, 128]));
        let scaled = rescale_for_ocr(&region);
        assert_eq!(scaled.height(), 70);
        assert_eq!(scaled.width(), 150);
    }

    #[test]
    fn test_rescale_leaves_in_band_regions_alone() {
        let region = RgbImage::from_pixel(200, 60, Rgb([128, 128, 128]));
        let scaled = rescale_for_ocr(&region);
        assert_eq!(scaled.dimensions(), (200, 60));
    }
}
