use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use canopycore::model::ImageAnalysis;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

/// Uploads are analysed at this square resolution.
pub const MASK_EDGE: u32 = 256;

/// Minimum excess-green index (2G - R - B) for a pixel to count as vegetation.
pub const GREENNESS_THRESHOLD: i32 = 20;

/// Pixel classification of one uploaded image.
pub struct VegetationMask {
    /// 255 where vegetation is missing, 0 where it is present.
    pub pixels: Vec<u8>,
    pub cleared: usize,
    /// Mean distance of each pixel from the threshold, mapped to [0.7, 0.95].
    pub confidence: f64,
}

impl VegetationMask {
    pub fn percentage(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let ratio = self.cleared as f64 / self.pixels.len() as f64;
        (ratio * 100.0 * 100.0).round() / 100.0
    }

    pub fn to_png(&self) -> anyhow::Result<Vec<u8>> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(&self.pixels, MASK_EDGE, MASK_EDGE, ExtendedColorType::L8)
            .context("encoding mask as PNG")?;
        Ok(png)
    }

    pub fn into_analysis(self) -> anyhow::Result<ImageAnalysis> {
        let mask_base64 = BASE64.encode(self.to_png()?);
        Ok(ImageAnalysis {
            deforestation_percentage: self.percentage(),
            confidence: Some(self.confidence),
            mask_base64,
        })
    }
}

fn excess_green(pixel: &image::Rgb<u8>) -> i32 {
    let [r, g, b] = pixel.0;
    2 * g as i32 - r as i32 - b as i32
}

/// Decodes `bytes`, resizes to [`MASK_EDGE`]² and classifies each pixel.
pub fn vegetation_mask(bytes: &[u8]) -> anyhow::Result<VegetationMask> {
    let decoded = image::load_from_memory(bytes).context("decoding uploaded image")?;
    let resized: RgbImage = decoded
        .resize_exact(MASK_EDGE, MASK_EDGE, FilterType::Triangle)
        .into_rgb8();

    let mut pixels = Vec::with_capacity((MASK_EDGE * MASK_EDGE) as usize);
    let mut cleared = 0usize;
    let mut margin = 0.0f64;
    for pixel in resized.pixels() {
        let exg = excess_green(pixel);
        if exg >= GREENNESS_THRESHOLD {
            pixels.push(0);
        } else {
            pixels.push(255);
            cleared += 1;
        }
        margin += ((exg - GREENNESS_THRESHOLD).abs() as f64 / 64.0).min(1.0);
    }
    let certainty = margin / pixels.len().max(1) as f64;

    Ok(VegetationMask {
        pixels,
        cleared,
        confidence: 0.7 + 0.25 * certainty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn encode_png(image: &RgbImage) -> Vec<u8> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgb8,
            )
            .unwrap();
        png
    }

    #[test]
    fn half_cleared_image_reports_half() {
        let image = RgbImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([30, 160, 40])
            } else {
                Rgb([150, 120, 90])
            }
        });
        let mask = vegetation_mask(&encode_png(&image)).unwrap();
        assert_eq!(mask.pixels.len(), (MASK_EDGE * MASK_EDGE) as usize);
        let percentage = mask.percentage();
        assert!((45.0..=55.0).contains(&percentage), "got {}", percentage);
        assert!((0.7..=0.95).contains(&mask.confidence));
    }

    #[test]
    fn mask_round_trips_through_base64_png() {
        let forest = RgbImage::from_pixel(10, 10, Rgb([20, 200, 30]));
        let analysis = vegetation_mask(&encode_png(&forest))
            .unwrap()
            .into_analysis()
            .unwrap();
        assert_eq!(analysis.deforestation_percentage, 0.0);
        let png = analysis.mask_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), MASK_EDGE);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(vegetation_mask(b"not an image").is_err());
    }
}
