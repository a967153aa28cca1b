//! Decode gate: a payload only counts as an asset if it decodes as an image.

use assetfetch_core::{Asset, Error};
use bytes::Bytes;
use chrono::Utc;

/// Decode `bytes` and wrap them as an [`Asset`].
///
/// The returned asset keeps the original bytes; the decoded image is only
/// used for validation and metadata.
pub fn decode_asset(bytes: Bytes) -> Result<Asset, Error> {
    if bytes.is_empty() {
        return Err(Error::DecodeFailed("empty payload".into()));
    }

    let format = image::guess_format(&bytes).map_err(|e| Error::DecodeFailed(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|e| Error::DecodeFailed(e.to_string()))?;

    let format = format.extensions_str().first().copied().unwrap_or("unknown").to_string();

    Ok(Asset { format, width: decoded.width(), height: decoded.height(), bytes, fetched_at: Utc::now() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn encode(format: ImageFormat) -> Bytes {
        let mut buf = Vec::new();
        DynamicImage::new_rgb8(3, 2).write_to(&mut Cursor::new(&mut buf), format).unwrap();
        Bytes::from(buf)
    }

    #[test]
    fn test_decode_png() {
        let bytes = encode(ImageFormat::Png);
        let asset = decode_asset(bytes.clone()).unwrap();
        assert_eq!(asset.format, "png");
        assert_eq!((asset.width, asset.height), (3, 2));
        assert_eq!(asset.bytes, bytes);
    }

    #[test]
    fn test_decode_jpeg() {
        let asset = decode_asset(encode(ImageFormat::Jpeg)).unwrap();
        assert_eq!(asset.format, "jpg");
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(decode_asset(Bytes::new()), Err(Error::DecodeFailed(_))));
    }

    #[test]
    fn test_decode_html_payload() {
        let html = Bytes::from_static(b"<!doctype html><html><body>Access denied</body></html>");
        assert!(matches!(decode_asset(html), Err(Error::DecodeFailed(_))));
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = encode(ImageFormat::Png);
        let truncated = bytes.slice(..bytes.len() / 2);
        assert!(matches!(decode_asset(truncated), Err(Error::DecodeFailed(_))));
    }
}
