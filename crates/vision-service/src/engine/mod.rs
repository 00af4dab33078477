//! External recognition engines and their process-wide context.
//!
//! The vehicle detector and the OCR engine are collaborators supplied by
//! the embedding process. `EngineContext` replaces the old hidden global
//! singleton: it is built once at process start, passed by reference into
//! the pipeline, and initializes each engine at most once even under
//! concurrent first use.

pub mod stub;

use anyhow::Result;
use common::vision::Detection;
use image::{DynamicImage, GrayImage};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Options passed to every OCR invocation
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Characters the engine may emit (plate alphabet)
    pub char_whitelist: String,
    /// Treat the input as a single text line
    pub single_line: bool,
}

/// One token from a token-level OCR pass
#[derive(Debug, Clone)]
pub struct OcrToken {
    pub text: String,
    /// Per-token confidence, 0 to 100
    pub confidence: i32,
}

/// Object detector returning class labels, confidences and boxes
pub trait VehicleDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;
}

/// OCR engine with two call shapes: whole-line text extraction and
/// token-level extraction with per-token confidence
pub trait OcrEngine: Send + Sync {
    fn recognize_line(&self, image: &GrayImage, options: &OcrOptions) -> Result<String>;
    fn recognize_tokens(&self, image: &GrayImage, options: &OcrOptions)
        -> Result<Vec<OcrToken>>;
}

type DetectorFactory = Box<dyn Fn() -> Option<Arc<dyn VehicleDetector>> + Send + Sync>;
type OcrFactory = Box<dyn Fn() -> Option<Arc<dyn OcrEngine>> + Send + Sync>;

/// Read-only handles to the external engines, initialized at most once per
/// process lifetime
pub struct EngineContext {
    detector_factory: DetectorFactory,
    ocr_factory: OcrFactory,
    detector: OnceCell<Option<Arc<dyn VehicleDetector>>>,
    ocr: OnceCell<Option<Arc<dyn OcrEngine>>>,
}

impl EngineContext {
    /// Context with engines supplied up front
    pub fn new(
        detector: Option<Arc<dyn VehicleDetector>>,
        ocr: Option<Arc<dyn OcrEngine>>,
    ) -> Self {
        let context = Self::with_factories(Box::new(|| None), Box::new(|| None));
        let _ = context.detector.set(detector);
        let _ = context.ocr.set(ocr);
        context
    }

    /// Context without any engines; every signal degrades gracefully
    pub fn disconnected() -> Self {
        Self::new(None, None)
    }

    /// Context whose engines are constructed lazily on first use. The
    /// `OnceCell` guard makes first-use idempotent across threads.
    pub fn with_factories(detector_factory: DetectorFactory, ocr_factory: OcrFactory) -> Self {
        Self {
            detector_factory,
            ocr_factory,
            detector: OnceCell::new(),
            ocr: OnceCell::new(),
        }
    }

    /// Detector handle, or `None` when the dependency is unavailable
    pub fn detector(&self) -> Option<Arc<dyn VehicleDetector>> {
        self.detector
            .get_or_init(|| (self.detector_factory)())
            .clone()
    }

    /// OCR handle, or `None` when the dependency is unavailable
    pub fn ocr(&self) -> Option<Arc<dyn OcrEngine>> {
        self.ocr.get_or_init(|| (self.ocr_factory)()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_disconnected_context_has_no_engines() {
        let context = EngineContext::disconnected();
        assert!(context.detector().is_none());
        assert!(context.ocr().is_none());
    }

    #[test]
    fn test_factory_runs_at_most_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let context = EngineContext::with_factories(
            Box::new(|| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                None
            }),
            Box::new(|| None),
        );

        assert!(context.detector().is_none());
        assert!(context.detector().is_none());
        assert!(context.detector().is_none());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_eager_context_keeps_supplied_engine() {
        let detector: Arc<dyn VehicleDetector> = Arc::new(stub::StubDetector::empty());
        let context = EngineContext::new(Some(detector), None);
        assert!(context.detector().is_some());
        assert!(context.ocr().is_none());
    }
}
