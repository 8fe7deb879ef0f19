use anyhow::{Context, Result, anyhow};
use image::GenericImageView;

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";
pub const MP3_MIME: &str = "audio/mpeg";

/// One uploaded image, decoded for the duration of a single action request.
/// The raw bytes are kept alongside the bitmap so downstream calls that want
/// the original encoding (the language model) do not have to re-encode.
#[derive(Debug)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub bitmap: image::DynamicImage,
    pub width: u32,
    pub height: u32,
}

/// Maps a client-supplied content type onto the accepted set, or rejects it.
pub fn accepted_mime(mime: &str) -> Option<&'static str> {
    match mime.trim().to_lowercase().as_str() {
        "image/png" => Some(PNG_MIME),
        "image/jpeg" | "image/jpg" => Some(JPEG_MIME),
        _ => None,
    }
}

/// Decodes an upload into an [`UploadedImage`]. The content type is sniffed
/// from the bytes; a client hint is only cross-checked against the accepted
/// set, never trusted over the sniff. Anything other than JPEG/PNG is
/// rejected before decoding starts.
pub fn load_upload(bytes: Vec<u8>, mime_hint: Option<&str>) -> Result<UploadedImage> {
    let mime = resolve_mime(&bytes, mime_hint)?;
    let format = match mime.as_str() {
        PNG_MIME => image::ImageFormat::Png,
        _ => image::ImageFormat::Jpeg,
    };
    let bitmap = image::load_from_memory_with_format(&bytes, format)
        .with_context(|| format!("failed to decode {} upload", mime))?;
    let (width, height) = bitmap.dimensions();
    Ok(UploadedImage {
        bytes,
        mime,
        bitmap,
        width,
        height,
    })
}

fn resolve_mime(bytes: &[u8], mime_hint: Option<&str>) -> Result<String> {
    if let Some(hint) = mime_hint {
        let trimmed = hint.trim();
        if !trimmed.is_empty()
            && !trimmed.eq_ignore_ascii_case("auto")
            && accepted_mime(trimmed).is_none()
        {
            return Err(anyhow!(
                "unsupported image type '{}' (accepted: image/jpeg, image/png)",
                trimmed
            ));
        }
    }
    let Some(kind) = infer::get(bytes) else {
        return Err(anyhow!(
            "unable to detect image type (accepted: image/jpeg, image/png)"
        ));
    };
    let Some(mime) = accepted_mime(kind.mime_type()) else {
        return Err(anyhow!(
            "unsupported image type '{}' (accepted: image/jpeg, image/png)",
            kind.mime_type()
        ));
    };
    Ok(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::{JPEG_MIME, PNG_MIME, load_upload};
    use std::io::Cursor;

    fn encoded_image(format: image::ImageFormat, width: u32, height: u32) -> Vec<u8> {
        let bitmap = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 80, 200]),
        ));
        let mut bytes = Vec::new();
        bitmap
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    #[test]
    fn png_upload_decodes_with_header_dimensions() {
        let bytes = encoded_image(image::ImageFormat::Png, 17, 9);
        let upload = load_upload(bytes, None).unwrap();
        assert_eq!(upload.mime, PNG_MIME);
        assert_eq!((upload.width, upload.height), (17, 9));
    }

    #[test]
    fn jpeg_upload_decodes_with_header_dimensions() {
        let bytes = encoded_image(image::ImageFormat::Jpeg, 32, 24);
        let upload = load_upload(bytes, Some("image/jpeg")).unwrap();
        assert_eq!(upload.mime, JPEG_MIME);
        assert_eq!((upload.width, upload.height), (32, 24));
    }

    #[test]
    fn jpg_hint_is_accepted_as_jpeg() {
        let bytes = encoded_image(image::ImageFormat::Jpeg, 4, 4);
        let upload = load_upload(bytes, Some("image/jpg")).unwrap();
        assert_eq!(upload.mime, JPEG_MIME);
    }

    #[test]
    fn unsupported_format_is_rejected_before_decoding() {
        // A real GIF header; infer identifies it, and the boundary refuses it.
        let bytes = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;".to_vec();
        let err = load_upload(bytes, None).unwrap_err();
        assert!(err.to_string().contains("unsupported image type"));
    }

    #[test]
    fn unsupported_hint_is_rejected() {
        let bytes = encoded_image(image::ImageFormat::Png, 4, 4);
        let err = load_upload(bytes, Some("image/gif")).unwrap_err();
        assert!(err.to_string().contains("image/gif"));
    }

    #[test]
    fn undetectable_bytes_are_rejected() {
        let err = load_upload(b"not an image at all".to_vec(), None).unwrap_err();
        assert!(err.to_string().contains("unable to detect image type"));
    }

    #[test]
    fn truncated_png_fails_decoding() {
        let mut bytes = encoded_image(image::ImageFormat::Png, 16, 16);
        bytes.truncate(20);
        let err = load_upload(bytes, None).unwrap_err();
        assert!(err.to_string().contains("failed to decode image/png upload"));
    }
}
