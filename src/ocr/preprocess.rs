use image::DynamicImage;

const MAX_SCALED_WIDTH: u32 = 6000;

/// Flattens alpha onto white, converts to grayscale, upscales small images
/// and stretches contrast before the engine sees the page.
pub(super) fn prepare_for_ocr(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut luma = image::GrayImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let r = r as f32 * alpha + 255.0 * (1.0 - alpha);
        let g = g as f32 * alpha + 255.0 * (1.0 - alpha);
        let b = b as f32 * alpha + 255.0 * (1.0 - alpha);
        let value = (0.299 * r + 0.587 * g + 0.114 * b).round() as u8;
        luma.put_pixel(x, y, image::Luma([value]));
    }

    let scale = ocr_scale(width);
    let scaled = if scale > 1 {
        image::imageops::resize(
            &luma,
            width.saturating_mul(scale),
            height.saturating_mul(scale),
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        luma
    };

    DynamicImage::ImageLuma8(contrast_stretch(&scaled))
}

fn ocr_scale(width: u32) -> u32 {
    let mut scale = 3u32;
    while width.saturating_mul(scale) > MAX_SCALED_WIDTH && scale > 1 {
        scale -= 1;
    }
    scale.max(1)
}

fn contrast_stretch(image: &image::GrayImage) -> image::GrayImage {
    let mut min = 255u8;
    let mut max = 0u8;
    for pixel in image.pixels() {
        let value = pixel[0];
        min = min.min(value);
        max = max.max(value);
    }

    if max <= min {
        return image.clone();
    }

    let scale = 255.0 / (max as f32 - min as f32);
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let value = pixel[0];
        let stretched = ((value.saturating_sub(min)) as f32 * scale).round() as u8;
        pixel[0] = stretched;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::{contrast_stretch, ocr_scale, prepare_for_ocr};

    #[test]
    fn small_images_are_upscaled_three_times() {
        assert_eq!(ocr_scale(400), 3);
        assert_eq!(ocr_scale(1999), 3);
    }

    #[test]
    fn large_images_keep_the_scaled_width_bounded() {
        assert_eq!(ocr_scale(2500), 2);
        assert_eq!(ocr_scale(7000), 1);
    }

    #[test]
    fn contrast_stretch_expands_to_full_range() {
        let image = image::GrayImage::from_fn(2, 1, |x, _| image::Luma([100 + x as u8 * 50]));
        let stretched = contrast_stretch(&image);
        assert_eq!(stretched.get_pixel(0, 0)[0], 0);
        assert_eq!(stretched.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn contrast_stretch_leaves_flat_images_alone() {
        let image = image::GrayImage::from_pixel(3, 3, image::Luma([128]));
        assert_eq!(contrast_stretch(&image), image);
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let bitmap = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            2,
            image::Rgba([0, 0, 0, 0]),
        ));
        let prepared = prepare_for_ocr(&bitmap);
        // Fully transparent black reads as background, not text.
        assert_eq!(prepared.to_luma8().get_pixel(0, 0)[0], 255);
    }
}
