//! Turning a payload into pixels: PNG, data URLs, SVG and terminal art.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{GrayImage, ImageBuffer, ImageFormat, Luma};
use qrcode::{Color, QrCode};

use crate::ecc::EccLevel;
use crate::error::{Error, Result};

/// Largest image side, in pixels, that [`to_image_buffer`] will allocate.
pub const MAX_IMAGE_SIDE: u32 = 1 << 15;

/// How a QR code is laid out as an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Quiet zone around the symbol, in modules.
    pub margin: u32,
    /// Pixels per module.
    pub scale: u32,
    pub ecc: EccLevel,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            margin: 2,
            scale: 9,
            ecc: EccLevel::default(),
        }
    }
}

/// A payload that has been encoded and drawn.
#[derive(Clone)]
pub struct Rendered {
    pub payload: String,
    pub ecc: EccLevel,
    pub code: QrCode,
    pub image: GrayImage,
}

impl std::fmt::Debug for Rendered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rendered")
            .field("payload", &self.payload)
            .field("ecc", &self.ecc)
            .field("modules", &self.code.width())
            .field("pixels", &self.image.width())
            .finish()
    }
}

impl Rendered {
    /// Number of modules along one side of the symbol, without the quiet zone.
    pub fn modules(&self) -> usize {
        self.code.width()
    }
}

/// Encodes `payload` as UTF-8 bytes at the given error correction level.
///
/// The smallest version that fits is chosen. Fails with
/// [`Error::Encode`](crate::error::Error::Encode) when the payload does not fit
/// in a version 40 symbol.
pub fn encode(payload: &str, ecc: EccLevel) -> Result<QrCode> {
    Ok(QrCode::with_error_correction_level(
        payload.as_bytes(),
        ecc.into(),
    )?)
}

/// Encodes and draws `payload` in one step.
///
/// # Example
///
/// ```
/// use zzqr::render::{render, RenderOptions};
///
/// let out = render("https://example.com", &RenderOptions::default()).unwrap();
/// assert_eq!(out.image.width(), out.image.height());
/// ```
pub fn render(payload: &str, opts: &RenderOptions) -> Result<Rendered> {
    let code = encode(payload, opts.ecc)?;
    let image = to_image_buffer(&code, opts)?;
    tracing::debug!(
        modules = code.width(),
        pixels = image.width(),
        ecc = %opts.ecc,
        "rendered QR code"
    );
    Ok(Rendered {
        payload: payload.to_string(),
        ecc: opts.ecc,
        code,
        image,
    })
}

// Out-of-range coordinates are light, so callers can walk the quiet zone freely.
fn is_dark(qr: &QrCode, x: i64, y: i64) -> bool {
    let width = qr.width() as i64;
    if x < 0 || y < 0 || x >= width || y >= width {
        return false;
    }
    qr[(x as usize, y as usize)] == Color::Dark
}

/// Side length in pixels of the image for `modules` modules, if it stays within
/// [`MAX_IMAGE_SIDE`].
pub fn image_side(modules: usize, opts: &RenderOptions) -> Result<u32> {
    let scale = u64::from(opts.scale.max(1));
    let side = (modules as u64)
        .checked_add(2 * u64::from(opts.margin))
        .and_then(|m| m.checked_mul(scale));
    match side {
        Some(side) if side <= u64::from(MAX_IMAGE_SIDE) => Ok(side as u32),
        _ => Err(Error::ImageTooLarge {
            side: side.unwrap_or(u64::MAX),
            limit: MAX_IMAGE_SIDE,
        }),
    }
}

/// Draws the symbol as a grayscale image with a `margin`-module quiet zone,
/// each module `scale` pixels square.
pub fn to_image_buffer(qr: &QrCode, opts: &RenderOptions) -> Result<GrayImage> {
    let size = image_side(qr.width(), opts)?;
    let scale = opts.scale.max(1);
    let border = opts.margin as i64;
    let mut img = ImageBuffer::new(size, size);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let qr_x = (x / scale) as i64 - border;
        let qr_y = (y / scale) as i64 - border;
        *pixel = if is_dark(qr, qr_x, qr_y) {
            Luma([0u8])
        } else {
            Luma([255u8])
        };
    }

    Ok(img)
}

/// Encodes the image as PNG.
pub fn to_png_bytes(img: &GrayImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Encodes the image as a `data:image/png;base64,...` URL.
pub fn to_data_url(img: &GrayImage) -> Result<String> {
    let png = to_png_bytes(img)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Saves the image as PNG under `directory`, creating it when missing.
///
/// A `.png` extension is added when `filename` has none. Returns the path
/// written.
pub fn save_png(img: &GrayImage, directory: &Path, filename: &str) -> Result<PathBuf> {
    let mut path = directory.join(filename);
    if path.extension().is_none() {
        path.set_extension("png");
    }

    if !directory.as_os_str().is_empty() && !directory.exists() {
        fs::create_dir_all(directory)?;
    }

    img.save_with_format(&path, ImageFormat::Png)?;
    tracing::info!(path = %path.display(), "saved QR code");
    Ok(path)
}

// Returns a string of SVG code for an image depicting
// the given QR Code, with the given number of border modules.
// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(qr: &QrCode, border: u32) -> String {
    let border = border as usize;
    let dimension = qr.width() + border * 2;
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        dimension
    );
    result += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";
    result += "\t<path d=\"";
    let mut first = true;
    for y in 0..qr.width() {
        for x in 0..qr.width() {
            if qr[(x, y)] == Color::Dark {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!("M{},{}h1v1h-1z", x + border, y + border);
            }
        }
    }
    result += "\" fill=\"#000000\"/>\n";
    result += "</svg>\n";
    result
}

/// Draws the symbol with full-block characters, two per module so it stays square.
pub fn to_terminal_string(qr: &QrCode, border: u32) -> String {
    let border = border as i64;
    let width = qr.width() as i64;
    let mut out = String::new();
    for y in -border..width + border {
        for x in -border..width + border {
            let c = if is_dark(qr, x, y) { '█' } else { ' ' };
            out.push(c);
            out.push(c);
        }
        out.push('\n');
    }
    out
}
