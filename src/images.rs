use crate::error::ApiError;
use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Splits a `data:image/<ext>;base64,<payload>` URI into extension and
/// payload. Anything else is rejected before decoding starts.
pub fn parse_data_uri(data: &str) -> Result<(&str, &str), ApiError> {
    let rest = data
        .strip_prefix("data:image/")
        .ok_or_else(|| ApiError::validation("image must be a base64-encoded data URI"))?;
    let (ext, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| ApiError::validation("image must be a base64-encoded data URI"))?;
    if ext.is_empty() || payload.is_empty() {
        return Err(ApiError::validation(
            "image must be a base64-encoded data URI",
        ));
    }
    Ok((ext, payload))
}

/// Decodes a data URI and materializes it as a file under the media root.
/// Returns the stored path relative to the media root.
pub fn save_base64_image(data: &str, media_root: &str) -> Result<String, ApiError> {
    let (ext, payload) = parse_data_uri(data)?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| ApiError::validation("image payload is not valid base64"))?;

    let relative = format!("recipes/images/{}.{}", Uuid::new_v4(), ext);
    let full = Path::new(media_root).join(&relative);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating media directory {}", parent.display()))?;
    }
    fs::write(&full, bytes).with_context(|| format!("writing image {}", full.display()))?;

    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    #[test]
    fn parses_png_data_uri() {
        let (ext, payload) = parse_data_uri(PNG_URI).unwrap();
        assert_eq!(ext, "png");
        assert!(payload.starts_with("iVBOR"));
    }

    #[test]
    fn rejects_non_image_uri() {
        assert!(parse_data_uri("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(parse_data_uri("plain string").is_err());
        assert!(parse_data_uri("data:image/png;base64,").is_err());
    }

    #[test]
    fn rejects_bad_base64() {
        let root = std::env::temp_dir().join(format!("media-{}", Uuid::new_v4()));
        let err = save_base64_image(
            "data:image/png;base64,@@not-base64@@",
            root.to_str().unwrap(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn saves_image_under_media_root() {
        let root = std::env::temp_dir().join(format!("media-{}", Uuid::new_v4()));
        let relative = save_base64_image(PNG_URI, root.to_str().unwrap()).unwrap();
        assert!(relative.starts_with("recipes/images/"));
        assert!(relative.ends_with(".png"));
        let stored = root.join(&relative);
        assert!(stored.exists());
        fs::remove_dir_all(&root).unwrap();
    }
}
