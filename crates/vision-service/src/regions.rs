//! Plate candidate-region search.
//!
//! Two independent strategies propose sub-rectangles likely to hold the
//! plate: a constant set of fractional zones (plates sit low and centered
//! in this camera setup) and a white-rectangle contour detector. Contour
//! hits are ranked above the generic zones; the zones guarantee the result
//! is never empty when glare or dirt defeats the contour pass.

use crate::color::rgb_to_hsv;
use crate::preprocess::close_rect;
use common::vision::BoundingBox;
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};

/// Which strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    FixedZone,
    WhiteContour,
}

/// A rectangular sub-image hypothesized to contain the plate
pub struct RegionCandidate {
    pub pixels: RgbImage,
    pub origin: BoundingBox,
    pub source: RegionSource,
    pub priority: u8,
    pub area: u32,
}

/// Fixed zones as (x, y, width, height) fractions of the image
const FIXED_ZONES: [(f32, f32, f32, f32); 4] = [
    (0.25, 0.55, 0.50, 0.35), // center-bottom band
    (0.15, 0.50, 0.70, 0.45), // wider center-bottom band
    (0.00, 0.50, 0.50, 0.50), // bottom-left quadrant
    (0.50, 0.50, 0.50, 0.50), // bottom-right quadrant
];

const FIXED_ZONE_PRIORITY: u8 = 1;
const CONTOUR_PRIORITY: u8 = 0;

/// Near-white mask thresholds (OpenCV HSV scale)
const WHITE_MAX_SATURATION: u8 = 60;
const WHITE_MIN_VALUE: u8 = 160;

/// Contour bounding-rectangle filters
const MIN_PLATE_HEIGHT: u32 = 20;
const MAX_PLATE_HEIGHT: u32 = 150;
const MIN_PLATE_WIDTH: u32 = 60;
const MAX_PLATE_WIDTH: u32 = 400;
const MIN_ASPECT: f32 = 2.0;
const MAX_ASPECT: f32 = 4.5;
const MIN_AREA_FRACTION: f32 = 0.001;
const MAX_AREA_FRACTION: f32 = 0.05;

/// Margin added around an accepted contour rectangle before cropping
const EXPANSION_MARGIN: u32 = 5;

/// Propose ranked candidate regions, best first.
///
/// Contour detections (priority 0) outrank fixed zones (priority 1); within
/// a priority, larger rectangles come first. Returns at most
/// `max_candidates` entries and never an empty list.
pub fn find(image: &RgbImage, max_candidates: usize) -> Vec<RegionCandidate> {
    let mut candidates = white_contour_candidates(image);
    candidates.extend(fixed_zone_candidates(image));

    candidates.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.area.cmp(&a.area))
    });
    candidates.truncate(max_candidates);
    candidates
}

fn fixed_zone_candidates(image: &RgbImage) -> Vec<RegionCandidate> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut candidates = Vec::with_capacity(FIXED_ZONES.len());
    for &(fx, fy, fw, fh) in &FIXED_ZONES {
        let x = ((fx * width as f32) as u32).min(width.saturating_sub(1));
        let y = ((fy * height as f32) as u32).min(height.saturating_sub(1));
        let w = ((fw * width as f32) as u32).clamp(1, width - x);
        let h = ((fh * height as f32) as u32).clamp(1, height - y);

        let origin = BoundingBox {
            x,
            y,
            width: w,
            height: h,
        };
        candidates.push(RegionCandidate {
            pixels: imageops::crop_imm(image, x, y, w, h).to_image(),
            area: origin.area(),
            origin,
            source: RegionSource::FixedZone,
            priority: FIXED_ZONE_PRIORITY,
        });
    }
    candidates
}

fn white_contour_candidates(image: &RgbImage) -> Vec<RegionCandidate> {
    let (width, height) = image.dimensions();
    if width < MIN_PLATE_WIDTH || height < MIN_PLATE_HEIGHT {
        return Vec::new();
    }

    let mut mask = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let (_, s, v) = rgb_to_hsv(pixel.0[0], pixel.0[1], pixel.0[2]);
        if s <= WHITE_MAX_SATURATION && v >= WHITE_MIN_VALUE {
            mask.put_pixel(x, y, Luma([255]));
        }
    }

    // Wide-short kernel: plates are wide rectangles broken up by lettering
    let mask = close_rect(&mask, 7, 2);

    let image_area = (width * height) as f32;
    let mut candidates = Vec::new();

    for contour in find_contours::<u32>(&mask) {
        if contour.border_type != BorderType::Outer {
            continue;
        }
        let Some(rect) = bounding_rect(&contour.points) else {
            continue;
        };

        let aspect = rect.width as f32 / rect.height as f32;
        let area_fraction = rect.area() as f32 / image_area;
        let plausible = (MIN_PLATE_HEIGHT..=MAX_PLATE_HEIGHT).contains(&rect.height)
            && (MIN_PLATE_WIDTH..=MAX_PLATE_WIDTH).contains(&rect.width)
            && (MIN_ASPECT..=MAX_ASPECT).contains(&aspect)
            && (MIN_AREA_FRACTION..=MAX_AREA_FRACTION).contains(&area_fraction);
        if !plausible {
            continue;
        }

        let expanded = expand_clamped(rect, EXPANSION_MARGIN, width, height);
        candidates.push(RegionCandidate {
            pixels: imageops::crop_imm(
                image,
                expanded.x,
                expanded.y,
                expanded.width,
                expanded.height,
            )
            .to_image(),
            area: expanded.area(),
            origin: expanded,
            source: RegionSource::WhiteContour,
            priority: CONTOUR_PRIORITY,
        });
    }
    candidates
}

fn bounding_rect(points: &[imageproc::point::Point<u32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

fn expand_clamped(rect: BoundingBox, margin: u32, width: u32, height: u32) -> BoundingBox {
    let x = rect.x.saturating_sub(margin);
    let y = rect.y.saturating_sub(margin);
    let w = (rect.width + 2 * margin).min(width - x);
    let h = (rect.height + 2 * margin).min(height - y);
    BoundingBox {
        x,
        y,
        width: w,
        height: h,
    }
}
