//! Raster image handling: format sniffing, data URLs and recompression.

use crate::config::ImagePolicy;
use base64::{Engine, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

/// Errors from decoding or re-encoding an image.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("not a data URL")]
    NotDataUrl,
    #[error("data URL is not base64 encoded")]
    NotBase64,
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from a MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// An image re-encoded for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    /// `data:image/jpeg;base64,...`
    pub data_url: String,
    /// Pixel size after downscaling.
    pub width: u32,
    pub height: u32,
}

pub fn is_data_url(url: &str) -> bool {
    url.starts_with("data:")
}

/// Encode raw bytes as a base64 data URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode a base64 data URL into its MIME type and bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), MediaError> {
    let rest = url.strip_prefix("data:").ok_or(MediaError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(MediaError::NotDataUrl)?;
    let mime = header.strip_suffix(";base64").ok_or(MediaError::NotBase64)?;
    Ok((mime.to_string(), STANDARD.decode(payload.trim())?))
}

/// Decode any supported image, shrink it so its longest edge fits the
/// policy, and re-encode it as JPEG.
///
/// Images already within bounds are re-encoded without resizing.
pub fn recompress(bytes: &[u8], policy: ImagePolicy) -> Result<EncodedImage, MediaError> {
    let decoded = image::load_from_memory(bytes)?;
    let max_edge = policy.max_edge.max(1);
    let resized = if decoded.width() > max_edge || decoded.height() > max_edge {
        decoded.resize(max_edge, max_edge, FilterType::Triangle)
    } else {
        decoded
    };
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, policy.quality.clamp(1, 100)))?;
    Ok(EncodedImage {
        data_url: encode_data_url(ImageFormat::Jpeg.mime_type(), &buf),
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// Recompress an embedded data URL.
pub fn recompress_data_url(url: &str, policy: ImagePolicy) -> Result<EncodedImage, MediaError> {
    let (_, bytes) = decode_data_url(url)?;
    recompress(&bytes, policy)
}
