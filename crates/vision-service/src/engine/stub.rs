//! Stub engines for tests and demonstration runs.
//!
//! `StubDetector` returns a fixed detection list; `ScriptedOcr` replays a
//! queue of scripted responses and counts invocations so tests can assert
//! how many candidate/strategy pairs were actually tried.

use super::{OcrEngine, OcrOptions, OcrToken, VehicleDetector};
use anyhow::Result;
use common::vision::{BoundingBox, Detection};
use image::{DynamicImage, GrayImage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Detector that always reports the same detections
pub struct StubDetector {
    detections: Vec<Detection>,
}

impl StubDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Detector that never sees anything
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Detector reporting a single vehicle of the given class
    pub fn vehicle(class: &str, confidence: f32) -> Self {
        Self::new(vec![Detection {
            class: class.to_string(),
            confidence,
            bbox: BoundingBox {
                x: 120,
                y: 80,
                width: 320,
                height: 240,
            },
            metadata: None,
        }])
    }
}

impl VehicleDetector for StubDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }
}

/// OCR engine that replays scripted token and line responses.
///
/// Each `recognize_tokens` call pops the next scripted token batch (empty
/// once the script runs out); same for `recognize_line`. Call counters are
/// cumulative for the engine's lifetime.
#[derive(Default)]
pub struct ScriptedOcr {
    token_script: Mutex<VecDeque<Vec<OcrToken>>>,
    line_script: Mutex<VecDeque<String>>,
    token_calls: AtomicUsize,
    line_calls: AtomicUsize,
}

impl ScriptedOcr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a token-level response made of (text, confidence) pairs
    pub fn push_tokens(&self, tokens: &[(&str, i32)]) {
        let batch = tokens
            .iter()
            .map(|(text, confidence)| OcrToken {
                text: (*text).to_string(),
                confidence: *confidence,
            })
            .collect();
        if let Ok(mut script) = self.token_script.lock() {
            script.push_back(batch);
        }
    }

    /// Queue a whole-line response
    pub fn push_line(&self, line: &str) {
        if let Ok(mut script) = self.line_script.lock() {
            script.push_back(line.to_string());
        }
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn line_calls(&self) -> usize {
        self.line_calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize_line(&self, _image: &GrayImage, _options: &OcrOptions) -> Result<String> {
        self.line_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .line_script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_default();
        Ok(next)
    }

    fn recognize_tokens(
        &self,
        _image: &GrayImage,
        _options: &OcrOptions,
    ) -> Result<Vec<OcrToken>> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .token_script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_default();
        Ok(next)
    }
}
