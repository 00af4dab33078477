//! Dominant body-color classification.
//!
//! Works in the OpenCV HSV scale (H in [0,179], S and V in [0,255]) because
//! the color bands were calibrated against footage processed in that scale.

use common::vision::ColorLabel;
use image::RgbImage;

/// Saturation below which a sample is treated as achromatic
const ACHROMATIC_SATURATION: f32 = 30.0;

/// Map a hue/saturation/value sample to a named color bucket.
///
/// Achromatic colors are resolved first; the chromatic branch walks ordered
/// hue bands with a wraparound at the red boundary. Always returns a label.
pub fn classify(hue: u32, saturation: f32, value: f32) -> ColorLabel {
    if saturation < ACHROMATIC_SATURATION {
        return if value < 50.0 {
            ColorLabel::Black
        } else if value > 200.0 {
            ColorLabel::White
        } else {
            ColorLabel::Gray
        };
    }

    if hue < 10 || hue > 160 {
        ColorLabel::Red
    } else if hue < 25 {
        ColorLabel::Orange
    } else if hue < 35 {
        ColorLabel::Yellow
    } else if hue < 85 {
        ColorLabel::Green
    } else if hue < 130 {
        ColorLabel::Blue
    } else if hue < 160 {
        ColorLabel::Purple
    } else {
        ColorLabel::Unidentified
    }
}

/// Classify the dominant color over the central 50%x50% crop of the image.
///
/// The crop is where the vehicle body most likely sits. The dominant hue is
/// the argmax of a 180-bin hue histogram; saturation and value are averaged
/// over the same crop.
pub fn dominant_color(image: &RgbImage) -> ColorLabel {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return ColorLabel::Unidentified;
    }

    let x0 = width / 4;
    let y0 = height / 4;
    let x1 = (3 * width / 4).max(x0 + 1).min(width);
    let y1 = (3 * height / 4).max(y0 + 1).min(height);

    let mut hue_histogram = [0u32; 180];
    let mut saturation_sum = 0u64;
    let mut value_sum = 0u64;
    let mut samples = 0u64;

    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = image.get_pixel(x, y);
            let (h, s, v) = rgb_to_hsv(pixel.0[0], pixel.0[1], pixel.0[2]);
            hue_histogram[h as usize] += 1;
            saturation_sum += u64::from(s);
            value_sum += u64::from(v);
            samples += 1;
        }
    }

    if samples == 0 {
        return ColorLabel::Unidentified;
    }

    let dominant_hue = hue_histogram
        .iter()
        .enumerate()
        .max_by_key(|(_, count)| **count)
        .map(|(hue, _)| hue as u32)
        .unwrap_or(0);
    let mean_saturation = saturation_sum as f32 / samples as f32;
    let mean_value = value_sum as f32 / samples as f32;

    classify(dominant_hue, mean_saturation, mean_value)
}

/// RGB to HSV in the OpenCV scale: H in [0,179], S and V in [0,255]
pub(crate) fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r_n = f32::from(r) / 255.0;
    let g_n = f32::from(g) / 255.0;
    let b_n = f32::from(b) / 255.0;

    let max = r_n.max(g_n).max(b_n);
    let min = r_n.min(g_n).min(b_n);
    let delta = max - min;

    let hue_degrees = if delta < 1e-6 {
        0.0
    } else if (max - r_n).abs() < 1e-6 {
        60.0 * (((g_n - b_n) / delta) % 6.0)
    } else if (max - g_n).abs() < 1e-6 {
        60.0 * (((b_n - r_n) / delta) + 2.0)
    } else {
        60.0 * (((r_n - g_n) / delta) + 4.0)
    };
    let hue_degrees = if hue_degrees < 0.0 {
        hue_degrees + 360.0
    } else {
        hue_degrees
    };

    let saturation = if max < 1e-6 { 0.0 } else { delta / max };

    let h = ((hue_degrees / 2.0).round() as u32).min(179) as u8;
    let s = (saturation * 255.0).round().min(255.0) as u8;
    let v = (max * 255.0).round().min(255.0) as u8;

    (h, s, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_achromatic_branch_any_hue() {
        for hue in (0..180).step_by(7) {
            assert_eq!(classify(hue, 10.0, 30.0), ColorLabel::Black);
            assert_eq!(classify(hue, 29.9, 230.0), ColorLabel::White);
            assert_eq!(classify(hue, 0.0, 120.0), ColorLabel::Gray);
        }
    }

    #[test]
    fn test_red_wraparound() {
        for hue in 0..10 {
            assert_eq!(classify(hue, 200.0, 200.0), ColorLabel::Red);
        }
        for hue in 161..180 {
            assert_eq!(classify(hue, 200.0, 200.0), ColorLabel::Red);
        }
    }

    #[test]
    fn test_hue_band_boundaries() {
        assert_eq!(classify(9, 100.0, 100.0), ColorLabel::Red);
        assert_eq!(classify(10, 100.0, 100.0), ColorLabel::Orange);
        assert_eq!(classify(24, 100.0, 100.0), ColorLabel::Orange);
        assert_eq!(classify(25, 100.0, 100.0), ColorLabel::Yellow);
        assert_eq!(classify(34, 100.0, 100.0), ColorLabel::Yellow);
        assert_eq!(classify(35, 100.0, 100.0), ColorLabel::Green);
        assert_eq!(classify(84, 100.0, 100.0), ColorLabel::Green);
        assert_eq!(classify(85, 100.0, 100.0), ColorLabel::Blue);
        assert_eq!(classify(129, 100.0, 100.0), ColorLabel::Blue);
        assert_eq!(classify(130, 100.0, 100.0), ColorLabel::Purple);
        assert_eq!(classify(159, 100.0, 100.0), ColorLabel::Purple);
        // 160 falls outside every chromatic band
        assert_eq!(classify(160, 100.0, 100.0), ColorLabel::Unidentified);
        assert_eq!(classify(161, 100.0, 100.0), ColorLabel::Red);
    }

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0, 255, 255));
        let (h, s, v) = rgb_to_hsv(0, 255, 0);
        assert_eq!((h, s, v), (60, 255, 255));
        let (h, _, _) = rgb_to_hsv(0, 0, 255);
        assert_eq!(h, 120);
        assert_eq!(rgb_to_hsv(0, 0, 0), (0, 0, 0));
        assert_eq!(rgb_to_hsv(255, 255, 255), (0, 0, 255));
    }

    #[test]
    fn test_dominant_color_solid_red_image() {
        let image = RgbImage::from_pixel(64, 48, image::Rgb([200, 10, 10]));
        assert_eq!(dominant_color(&image), ColorLabel::Red);
    }

    #[test]
    fn test_dominant_color_solid_white_image() {
        let image = RgbImage::from_pixel(64, 48, image::Rgb([240, 240, 240]));
        assert_eq!(dominant_color(&image), ColorLabel::White);
    }

    #[test]
    fn test_dominant_color_tiny_image_does_not_panic() {
        let image = RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 0]));
        assert_eq!(dominant_color(&image), ColorLabel::Black);
    }
}
