//! Image codec and blur filter collaborator

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use crate::config::{BlurConfig, BlurKind};
use crate::error::{Result, BlurBatchError, ErrorContext};

/// 3x3 mean kernel
const BOX_KERNEL: [f32; 9] = [1.0 / 9.0; 9];

/// The image operations a worker needs: decode, blur, encode.
///
/// Implementations must be shareable across worker threads.
pub trait ImageTransform: Send + Sync {
    /// Decode the image at `path`
    fn open(&self, path: &Path) -> Result<DynamicImage>;

    /// Apply the blur filter
    fn apply_blur(&self, image: DynamicImage) -> Result<DynamicImage>;

    /// Encode `image` to `path`, format chosen by extension
    fn save(&self, image: &DynamicImage, path: &Path) -> Result<()>;
}

/// Blur transform backed by the `image` and `imageproc` crates
#[derive(Debug, Clone)]
pub struct BlurTransform {
    kind: BlurKind,
    sigma: f32,
    quality: u8,
}

impl BlurTransform {
    pub fn new(kind: BlurKind, sigma: f32, quality: u8) -> Self {
        Self { kind, sigma, quality }
    }

    pub fn from_config(blur: &BlurConfig, quality: u8) -> Self {
        Self::new(blur.kind, blur.sigma, quality)
    }
}

impl Default for BlurTransform {
    fn default() -> Self {
        Self::from_config(&BlurConfig::default(), 90)
    }
}

impl ImageTransform for BlurTransform {
    fn open(&self, path: &Path) -> Result<DynamicImage> {
        // Content decides the decoder; the extension is only a fallback
        let image = image::io::Reader::open(path)
            .with_file_context(path.to_path_buf())?
            .with_guessed_format()
            .with_file_context(path.to_path_buf())?
            .decode()
            .with_file_context(path.to_path_buf())?;

        debug!("Decoded {:?}: {}x{}", path, image.width(), image.height());

        Ok(image)
    }

    fn apply_blur(&self, image: DynamicImage) -> Result<DynamicImage> {
        if self.kind == BlurKind::Gaussian && (!self.sigma.is_finite() || self.sigma <= 0.0) {
            return Err(BlurBatchError::config(format!(
                "Blur sigma must be positive, got {}",
                self.sigma
            )));
        }

        let blurred = match self.kind {
            BlurKind::Gaussian => match image {
                DynamicImage::ImageLuma8(gray) => {
                    DynamicImage::ImageLuma8(gaussian_blur_f32(&gray, self.sigma))
                }
                DynamicImage::ImageRgba8(rgba) => {
                    DynamicImage::ImageRgba8(gaussian_blur_f32(&rgba, self.sigma))
                }
                other => DynamicImage::ImageRgb8(gaussian_blur_f32(&other.to_rgb8(), self.sigma)),
            },
            BlurKind::Box => image.filter3x3(&BOX_KERNEL),
        };

        Ok(blurred)
    }

    fn save(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let format = image::ImageFormat::from_path(path).with_file_context(path.to_path_buf())?;

        if format != image::ImageFormat::Jpeg {
            return image
                .save_with_format(path, format)
                .with_file_context(path.to_path_buf());
        }

        let file = File::create(path).with_file_context(path.to_path_buf())?;
        let mut writer = BufWriter::new(file);

        {
            // JPEG has no alpha channel
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, self.quality);
            encoder
                .encode_image(&image.to_rgb8())
                .with_file_context(path.to_path_buf())?;
        }

        writer.flush().with_file_context(path.to_path_buf())?;

        Ok(())
    }
}
