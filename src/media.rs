use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Name used in the bucket: upload time in milliseconds plus the original extension
pub fn image_file_name(original: &str, uploaded_at: DateTime<Utc>) -> String {
    let millis = uploaded_at.timestamp_millis();

    match extension_of(original) {
        Some(extension) => format!("{millis}.{extension}"),
        None => millis.to_string(),
    }
}

pub fn content_type_for(file_name: &str) -> &'static str {
    match extension_of(file_name)
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Inline `data:` URL shown while the file is staged. Never uploaded.
pub fn preview_data_url(file_name: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        content_type_for(file_name),
        STANDARD.encode(bytes)
    )
}

fn extension_of(file_name: &str) -> Option<&str> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test_log::test]
    fn file_name_keeps_only_the_last_extension() {
        let at = Utc.timestamp_millis_opt(1_735_689_600_123).unwrap();

        assert_eq!(image_file_name("poster.final.PNG", at), "1735689600123.PNG");
    }

    #[test_log::test]
    fn file_without_extension_is_named_by_timestamp_only() {
        let at = Utc.timestamp_millis_opt(42).unwrap();

        assert_eq!(image_file_name("poster", at), "42");
    }

    #[test_log::test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(content_type_for("flyer.JPG"), "image/jpeg");
        assert_eq!(content_type_for("flyer.tiff"), "application/octet-stream");
    }

    #[test_log::test]
    fn preview_is_a_base64_data_url() {
        assert_eq!(
            preview_data_url("dot.png", b"abc"),
            "data:image/png;base64,YWJj"
        );
    }
}
