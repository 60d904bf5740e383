use image::{GrayImage, ImageBuffer, Luma, RgbaImage, imageops};

use crate::layout::ScreenRegion;

/// Binarizes a capture and softens the edges for single-value digit fields.
///
/// Pixels whose luma is at or above `threshold` are treated as text and
/// become black; everything else becomes white background. A light
/// gaussian blur afterwards closes the jagged glyph edges that Tesseract
/// tends to misread.
///
/// Recommended values for the profile and kill statistics screens:
/// threshold 210, sigma 0.75.
pub fn binarize_and_blur(img: &RgbaImage, threshold: u8, sigma: f32) -> GrayImage {
    let gray = imageops::grayscale(img);
    let (width, height) = gray.dimensions();
    let mut output: GrayImage = ImageBuffer::new(width, height);

    // Inverted polarity: a plain `threshold` keeps bright text white on
    // black, this emits black text on white. Tune `threshold` for that.
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel[0] >= threshold { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    if sigma > 0.0 {
        imageops::blur(&output, sigma)
    } else {
        output
    }
}

/// Plain grayscale conversion, used for the governor id and more-info panel
/// where thresholding drops thin glyphs.
pub fn to_grayscale(img: &RgbaImage) -> GrayImage {
    imageops::grayscale(img)
}

/// Crops a sub-region from an image, clamping the rectangle to the image
/// bounds.
pub fn crop_region(img: &GrayImage, region: &ScreenRegion) -> GrayImage {
    let (w, h) = img.dimensions();

    let x0 = region.left.min(w);
    let y0 = region.top.min(h);
    let rw = region.width.min(w - x0);
    let rh = region.height.min(h - y0);

    imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}
