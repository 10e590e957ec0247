//! Image decoding and center-cropped resizing.

use std::io::Cursor;

use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, ImageFormat};

use super::error::ThumbnailError;

/// Produces encoded thumbnail bytes from source payload bytes.
///
/// Implementations are synchronous and CPU bound; the cache runs them on the
/// blocking pool.
pub trait ThumbnailDeriver: Send + Sync + 'static {
    /// Encoded format of the produced artifact.
    fn content_type(&self) -> &'static str;

    /// Derives a `width` x `height` preview from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::Derivation`] when the source cannot be
    /// decoded, resized or re-encoded.
    fn derive(&self, source: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ThumbnailError>;
}

/// Default deriver: `image` for codecs, `fast_image_resize` for scaling.
///
/// The source is scaled to cover the target box and the overflow is cropped
/// evenly from both sides, so the output is always exactly the requested
/// size. Output is PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDeriver;

impl ThumbnailDeriver for ImageDeriver {
    fn content_type(&self) -> &'static str {
        "image/png"
    }

    fn derive(&self, source: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ThumbnailError> {
        if width == 0 || height == 0 {
            return Err(ThumbnailError::derivation("thumbnail dimensions must be non-zero"));
        }

        let src_image = image::load_from_memory(source)?;
        let mut dst_image = DynamicImage::new(width, height, src_image.color());

        let options = ResizeOptions::new()
            .resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3))
            .fit_into_destination(Some((0.5, 0.5)));
        Resizer::new().resize(&src_image, &mut dst_image, Some(&options))?;

        let mut encoded = Vec::new();
        dst_image.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;
        Ok(encoded)
    }
}
