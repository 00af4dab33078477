//! Plate-region binarization strategies.
//!
//! Each strategy turns a raw color region into a single-channel binary image
//! tuned for one visual hypothesis about the plate (contrast-equalized
//! grayscale, blue-ink extraction, Otsu, inverted polarity). Strategy choice
//! belongs to the OCR reconciler; this module never mutates its input.

use crate::color::rgb_to_hsv;
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::contrast::{adaptive_threshold, equalize_histogram, otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;

/// One specific binarization recipe applied before OCR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepStrategy {
    /// Contrast equalization followed by an adaptive threshold
    Clahe,
    /// Light blur followed by a global Otsu threshold
    Otsu,
    /// Contrast equalization followed by an inverted Otsu threshold
    Invert,
    /// Blue-ink hue mask, morphologically cleaned, polarity inverted
    BlueExtract,
    /// Fixed global threshold at 127
    Simple,
}

const ADAPTIVE_BLOCK_RADIUS: u32 = 5;
const BLUR_SIGMA: f32 = 1.0;
const SIMPLE_THRESHOLD: u8 = 127;

/// Binarize `region` with the given strategy. Output pixels are 0 or 255.
pub fn prepare(region: &RgbImage, strategy: PrepStrategy) -> GrayImage {
    match strategy {
        PrepStrategy::Clahe => {
            let gray = imageops::grayscale(region);
            let equalized = equalize_histogram(&gray);
            adaptive_threshold(&equalized, ADAPTIVE_BLOCK_RADIUS)
        }
        PrepStrategy::Otsu => {
            let gray = imageops::grayscale(region);
            let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
            let level = otsu_level(&blurred);
            threshold(&blurred, level, ThresholdType::Binary)
        }
        PrepStrategy::Invert => {
            let gray = imageops::grayscale(region);
            let equalized = equalize_histogram(&gray);
            let level = otsu_level(&equalized);
            threshold(&equalized, level, ThresholdType::BinaryInverted)
        }
        PrepStrategy::BlueExtract => blue_extract(region),
        PrepStrategy::Simple => {
            let gray = imageops::grayscale(region);
            threshold(&gray, SIMPLE_THRESHOLD, ThresholdType::Binary)
        }
    }
}

/// Extract blue plate ink via two HSV hue sub-ranges, clean the mask with a
/// close/open pair and invert it so the ink reads as dark text on a light
/// background.
fn blue_extract(region: &RgbImage) -> GrayImage {
    let (width, height) = region.dimensions();
    let mut mask = GrayImage::new(width, height);

    for (x, y, pixel) in region.enumerate_pixels() {
        let (h, s, v) = rgb_to_hsv(pixel.0[0], pixel.0[1], pixel.0[2]);
        let broad_blue = (90..=130).contains(&h) && s >= 80 && v >= 60;
        let dark_blue = (100..=125).contains(&h) && s >= 60 && (40..=150).contains(&v);
        if broad_blue || dark_blue {
            mask.put_pixel(x, y, Luma([255]));
        }
    }

    let closed = close_rect(&mask, 2, 2);
    let opened = open_rect(&closed, 1, 1);

    let mut inverted = opened;
    for pixel in inverted.pixels_mut() {
        pixel.0[0] = 255 - pixel.0[0];
    }
    inverted
}

/// Dilate with a rectangular kernel of half-extents (`rx`, `ry`)
pub(crate) fn dilate_rect(mask: &GrayImage, rx: u32, ry: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let x_lo = x.saturating_sub(rx);
            let x_hi = (x + rx).min(width.saturating_sub(1));
            let y_lo = y.saturating_sub(ry);
            let y_hi = (y + ry).min(height.saturating_sub(1));
            let mut max = 0u8;
            'window: for wy in y_lo..=y_hi {
                for wx in x_lo..=x_hi {
                    let v = mask.get_pixel(wx, wy).0[0];
                    if v > max {
                        max = v;
                        if max == 255 {
                            break 'window;
                        }
                    }
                }
            }
            out.put_pixel(x, y, Luma([max]));
        }
    }
    out
}

/// Erode with a rectangular kernel of half-extents (`rx`, `ry`)
pub(crate) fn erode_rect(mask: &GrayImage, rx: u32, ry: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let x_lo = x.saturating_sub(rx);
            let x_hi = (x + rx).min(width.saturating_sub(1));
            let y_lo = y.saturating_sub(ry);
            let y_hi = (y + ry).min(height.saturating_sub(1));
            let mut min = 255u8;
            'window: for wy in y_lo..=y_hi {
                for wx in x_lo..=x_hi {
                    let v = mask.get_pixel(wx, wy).0[0];
                    if v < min {
                        min = v;
                        if min == 0 {
                            break 'window;
                        }
                    }
                }
            }
            out.put_pixel(x, y, Luma([min]));
        }
    }
    out
}

/// Morphological close (dilate then erode) with a rectangular kernel
pub(crate) fn close_rect(mask: &GrayImage, rx: u32, ry: u32) -> GrayImage {
    erode_rect(&dilate_rect(mask, rx, ry), rx, ry)
}

/// Morphological open (erode then dilate) with a rectangular kernel
pub(crate) fn open_rect(mask: &GrayImage, rx: u32, ry: u32) -> GrayImage {
    dilate_rect(&erode_rect(mask, rx, ry), rx, ry)
}
