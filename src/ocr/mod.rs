mod preprocess;
mod tesseract;

pub use tesseract::list_tesseract_languages;

use anyhow::{Context, Result};
use std::io::Write;

use crate::data::UploadedImage;

/// Runs the external OCR engine over an uploaded image and returns the
/// recovered plain text. The bitmap is preprocessed (alpha flattened,
/// upscaled, contrast stretched) before the engine sees it; the output is
/// returned as-is apart from whitespace cleanup, so a blank page yields an
/// empty string rather than an error.
pub fn extract_text(image: &UploadedImage, languages: &str) -> Result<String> {
    let languages = tesseract::normalize_ocr_languages(languages)?;
    let prepared = preprocess::prepare_for_ocr(&image.bitmap);

    let mut tmp = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .with_context(|| "failed to create temp file for OCR")?;
    prepared
        .write_to(&mut tmp, image::ImageFormat::Png)
        .with_context(|| "failed to write temp image for OCR")?;
    tmp.flush().ok();

    let raw = tesseract::run_tesseract_text(tmp.path(), &languages)?;
    Ok(cleanup_text(&raw))
}

fn cleanup_text(raw: &str) -> String {
    let mut lines = Vec::new();
    for line in raw.lines() {
        let collapsed = collapse_whitespace(line);
        if !collapsed.is_empty() {
            lines.push(collapsed);
        }
    }
    lines.join("\n")
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::cleanup_text;

    #[test]
    fn cleanup_collapses_runs_and_drops_blank_lines() {
        let raw = "EXIT\n\n  only   way\t out \n\n\n";
        assert_eq!(cleanup_text(raw), "EXIT\nonly way out");
    }

    #[test]
    fn cleanup_of_whitespace_only_output_is_empty() {
        assert_eq!(cleanup_text(" \n\t \n"), "");
        assert_eq!(cleanup_text(""), "");
    }
}
