// OCR preprocessing - grayscale, adaptive threshold, denoise, sharpen
use image::{DynamicImage, GrayImage, Luma};

/// Side length of the adaptive threshold neighbourhood.
pub const THRESHOLD_WINDOW: u32 = 11;
/// Subtracted from the local mean before comparing.
pub const THRESHOLD_BIAS: i64 = 2;

const GAUSSIAN_3X3: [i32; 9] = [1, 2, 1, 2, 4, 2, 1, 2, 1];
const GAUSSIAN_SUM: i32 = 16;
const SHARPEN_3X3: [i32; 9] = [-1, -1, -1, -1, 9, -1, -1, -1, -1];

/// Clean a rendered page for character recognition.
///
/// Every step runs unconditionally and uses integer arithmetic only, so the
/// same input always yields a byte-identical output of the same size.
pub fn sanitize(image: &DynamicImage) -> GrayImage {
    let gray = to_grayscale(image);
    let binary = adaptive_threshold(&gray, THRESHOLD_WINDOW, THRESHOLD_BIAS);
    let smoothed = convolve3x3(&binary, &GAUSSIAN_3X3, GAUSSIAN_SUM);
    convolve3x3(&smoothed, &SHARPEN_3X3, 1)
}

pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

/// Binarize against the mean of a `window`×`window` neighbourhood minus `bias`.
///
/// The window is cut at the image border, so edge pixels average over fewer
/// neighbours instead of reading padding.
pub fn adaptive_threshold(image: &GrayImage, window: u32, bias: i64) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let integral = integral_image(image);
    let stride = width as usize + 1;
    let radius = window / 2;

    for y in 0..height {
        let y0 = y.saturating_sub(radius) as usize;
        let y1 = (y + radius).min(height - 1) as usize + 1;
        for x in 0..width {
            let x0 = x.saturating_sub(radius) as usize;
            let x1 = (x + radius).min(width - 1) as usize + 1;

            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((x1 - x0) * (y1 - y0)) as i64;
            let value = image.get_pixel(x, y)[0] as i64;

            // value > sum / count - bias, kept in integers
            let level = if value * count > sum - bias * count { 255 } else { 0 };
            out.put_pixel(x, y, Luma([level]));
        }
    }
    out
}

/// Summed-area table with a zero first row and column.
fn integral_image(image: &GrayImage) -> Vec<i64> {
    let (width, height) = image.dimensions();
    let stride = width as usize + 1;
    let mut table = vec![0i64; stride * (height as usize + 1)];
    for y in 0..height as usize {
        let mut row_sum = 0i64;
        for x in 0..width as usize {
            row_sum += image.get_pixel(x as u32, y as u32)[0] as i64;
            table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
        }
    }
    table
}

/// 3×3 convolution with replicated edges, rounded and clamped to `0..=255`.
pub fn convolve3x3(image: &GrayImage, kernel: &[i32; 9], divisor: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let clamp_x = |x: i64| x.clamp(0, width as i64 - 1) as u32;
    let clamp_y = |y: i64| y.clamp(0, height as i64 - 1) as u32;

    for y in 0..height {
        for x in 0..width {
            let mut acc = 0i32;
            for (i, weight) in kernel.iter().enumerate() {
                let dx = (i % 3) as i64 - 1;
                let dy = (i / 3) as i64 - 1;
                let sample = image.get_pixel(clamp_x(x as i64 + dx), clamp_y(y as i64 + dy))[0];
                acc += weight * sample as i32;
            }
            let value = if divisor > 1 {
                (acc + divisor / 2).div_euclid(divisor)
            } else {
                acc
            };
            out.put_pixel(x, y, Luma([value.clamp(0, 255) as u8]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 7 + y * 13) % 256) as u8;
            Rgb([v, v.wrapping_add(40), 255 - v])
        })
    }

    #[test]
    fn output_is_single_channel_and_same_size() {
        let input = DynamicImage::ImageRgb8(gradient(37, 23));
        let out = sanitize(&input);
        assert_eq!(out.dimensions(), (37, 23));
    }

    #[test]
    fn sanitize_is_deterministic() {
        let input = DynamicImage::ImageRgb8(gradient(64, 48));
        let first = sanitize(&input);
        let second = sanitize(&input);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn grayscale_input_passes_through_conversion() {
        let gray = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 50 + y) as u8]));
        let converted = to_grayscale(&DynamicImage::ImageLuma8(gray.clone()));
        assert_eq!(converted, gray);
    }

    #[test]
    fn degenerate_images_are_handled() {
        for (w, h) in [(0, 0), (1, 1), (1, 9), (9, 1), (2, 2)] {
            let input = DynamicImage::ImageLuma8(GrayImage::new(w, h));
            assert_eq!(sanitize(&input).dimensions(), (w, h));
        }
    }

    #[test]
    fn threshold_uses_local_mean_not_global_cutoff() {
        // Left half dark, right half bright, with a darker stroke in each half.
        let image = GrayImage::from_fn(40, 11, |x, _| {
            let base = if x < 20 { 40 } else { 200 };
            if x == 10 || x == 30 {
                Luma([base - 30])
            } else {
                Luma([base])
            }
        });
        let binary = adaptive_threshold(&image, 11, 2);
        // The stroke is below its neighbourhood in both halves.
        assert_eq!(binary.get_pixel(10, 5)[0], 0);
        assert_eq!(binary.get_pixel(30, 5)[0], 0);
        // Flat background sits above mean - bias in both halves.
        assert_eq!(binary.get_pixel(3, 5)[0], 255);
        assert_eq!(binary.get_pixel(36, 5)[0], 255);
    }

    #[test]
    fn flat_image_stays_flat() {
        let image = GrayImage::from_pixel(16, 16, Luma([255]));
        let out = sanitize(&DynamicImage::ImageLuma8(image));
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn sharpen_clamps_instead_of_wrapping() {
        let mut image = GrayImage::from_pixel(3, 3, Luma([0]));
        image.put_pixel(1, 1, Luma([255]));
        let out = convolve3x3(&image, &SHARPEN_3X3, 1);
        assert_eq!(out.get_pixel(1, 1)[0], 255);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn gaussian_preserves_constant_regions() {
        let image = GrayImage::from_pixel(4, 4, Luma([128]));
        let out = convolve3x3(&image, &GAUSSIAN_3X3, GAUSSIAN_SUM);
        assert!(out.pixels().all(|p| p[0] == 128));
    }
}
