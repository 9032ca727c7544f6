//! Off-screen drawing surface used by the re-encode strategies.
//!
//! A canvas is filled with opaque white before the source is drawn so that
//! transparent pixels never turn black after JPEG encoding. Because of that
//! fill, an all-white result almost always means the draw silently failed.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, Rgba, RgbaImage};

use crate::data_uri;
use crate::error::MediaError;

/// Background fill colour.
pub const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

const SAMPLE_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// Scale `(width, height)` down so neither side exceeds `max`, keeping the
/// aspect ratio. Images already within bounds are returned unchanged.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let (w, h) = (width as f64, height as f64);
    let (nw, nh) = if width > height {
        (max as f64, h * max as f64 / w)
    } else {
        (w * max as f64 / h, max as f64)
    };
    ((nw.round() as u32).max(1), (nh.round() as u32).max(1))
}

/// 3x3 grid of sample coordinates at 25/50/75% of each axis.
pub fn sample_points(width: u32, height: u32) -> Vec<(u32, u32)> {
    let mut points = Vec::with_capacity(9);
    for fy in SAMPLE_FRACTIONS {
        for fx in SAMPLE_FRACTIONS {
            let x = ((width as f64 * fx).floor() as u32).min(width.saturating_sub(1));
            let y = ((height as f64 * fy).floor() as u32).min(height.saturating_sub(1));
            points.push((x, y));
        }
    }
    points
}

/// True when every sampled pixel is the fill colour.
pub fn is_blank(image: &DynamicImage) -> bool {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return true;
    }
    sample_points(width, height).into_iter().all(|(x, y)| {
        let Rgba([r, g, b, _]) = image.get_pixel(x, y);
        r == FILL[0] && g == FILL[1] && b == FILL[2]
    })
}

/// Read dimensions from the header without decoding pixels.
pub fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32), MediaError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MediaError::Decode(e.to_string()))?;
    Ok(reader.into_dimensions()?)
}

/// Fully decode an encoded image.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, MediaError> {
    Ok(image::load_from_memory(bytes)?)
}

/// An opaque RGBA drawing surface.
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// A `width` x `height` surface pre-filled with [`FILL`].
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, FILL),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Draw `source` stretched to fill the whole surface, alpha-blended over
    /// the background.
    pub fn draw(&mut self, source: &DynamicImage) {
        let (width, height) = self.dimensions();
        let scaled = if source.dimensions() == (width, height) {
            source.to_rgba8()
        } else {
            source
                .resize_exact(width, height, FilterType::Triangle)
                .to_rgba8()
        };
        image::imageops::overlay(&mut self.pixels, &scaled, 0, 0);
    }

    /// Whether anything other than the background ended up on the surface.
    pub fn has_content(&self) -> bool {
        let (width, height) = self.dimensions();
        sample_points(width, height).into_iter().any(|(x, y)| {
            let Rgba([r, g, b, _]) = *self.pixels.get_pixel(x, y);
            r != FILL[0] || g != FILL[1] || b != FILL[2]
        })
    }

    /// Encode as a JPEG data URI.
    pub fn to_jpeg_data_uri(&self, quality: u8) -> Result<String, MediaError> {
        let rgb = DynamicImage::ImageRgba8(self.pixels.clone()).to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|e| MediaError::Encode(e.to_string()))?;
        Ok(data_uri::encode("image/jpeg", &buf))
    }
}

/// Decode `bytes`, redraw on a white canvas (downsampled to `max_dimension`
/// when given) and return `(data_uri, width, height)`.
pub fn render_jpeg(
    bytes: &[u8],
    max_dimension: Option<u32>,
    quality: u8,
) -> Result<(String, u32, u32), MediaError> {
    let source = decode(bytes)?;
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(MediaError::ZeroDimensions);
    }
    let (width, height) = match max_dimension {
        Some(max) => fit_within(src_w, src_h, max),
        None => (src_w, src_h),
    };

    let mut canvas = Canvas::new(width, height);
    canvas.draw(&source);
    if !canvas.has_content() {
        return Err(MediaError::EmptyCanvas);
    }
    let url = canvas.to_jpeg_data_uri(quality)?;
    Ok((url, width, height))
}
