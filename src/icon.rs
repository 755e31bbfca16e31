//! Icon handling for incoming notifications.
//!
//! The daemon treats icons as opaque strings for the renderer to resolve;
//! the one transformation it performs is materializing raw pixel hints
//! (`image-data` / `icon_data`) into temporary PNG files, since a file path
//! is the only form a file-driven renderer can consume.

use std::path::PathBuf;

use tracing::warn;

use crate::dbus::{Hints, ImageData};

/// Pick the effective icon string for a notification.
///
/// Precedence follows the freedesktop spec: `image-data` hint, then
/// `image-path` hint, then the `app_icon` argument, then `icon_data`.
/// `file://` prefixes are stripped; everything else passes through opaque.
pub fn resolve(app_icon: &str, hints: &Hints) -> String {
    if let Some(data) = hints.image_data.as_ref().or(hints.image_data_deprecated.as_ref()) {
        if let Some(path) = tmp_image_from_data(data) {
            return path.display().to_string();
        }
    }

    if let Some(path) = &hints.image_path {
        return strip_file_scheme(&path.display().to_string());
    }
    if let Some(path) = &hints.image_path_deprecated {
        return strip_file_scheme(path);
    }

    if !app_icon.is_empty() {
        return strip_file_scheme(app_icon);
    }

    if let Some(data) = &hints.icon_data {
        if let Some(path) = tmp_image_from_data(data) {
            return path.display().to_string();
        }
    }

    String::new()
}

// Paths are supposed to be prefixed with "file://" but in practice many are not.
fn strip_file_scheme(icon: &str) -> String {
    icon.strip_prefix("file://").unwrap_or(icon).to_string()
}

/// Write raw image-data pixels to a temporary PNG and return its path.
pub fn tmp_image_from_data(image_data: &ImageData) -> Option<PathBuf> {
    let width = u32::try_from(image_data.width).ok()?;
    let height = u32::try_from(image_data.height).ok()?;

    let tmp = match tempfile::Builder::new()
        .prefix("notifyd-")
        .suffix(".png")
        .tempfile()
    {
        Ok(tmp) => tmp,
        Err(e) => {
            warn!("unable to create temporary image file: {e}");
            return None;
        }
    };

    let save_result = if image_data.has_alpha {
        let Some(image) =
            image::RgbaImage::from_raw(width, height, image_data.data.clone())
        else {
            warn!("image-data hint does not hold a {width}x{height} RGBA image");
            return None;
        };
        image.save(tmp.path())
    } else {
        let Some(image) = image::RgbImage::from_raw(width, height, image_data.data.clone())
        else {
            warn!("image-data hint does not hold a {width}x{height} RGB image");
            return None;
        };
        image.save(tmp.path())
    };

    if let Err(e) = save_result {
        warn!("failed to save image to {}: {e}", tmp.path().display());
        return None;
    }

    // Keep the file past this scope; the renderer reads it later.
    match tmp.into_temp_path().keep() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("failed to keep temporary image: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(width: i32, height: i32) -> ImageData {
        ImageData {
            width,
            height,
            rowstride: width * 4,
            has_alpha: true,
            bits_per_sample: 8,
            channels: 4,
            data: vec![0xAA; (width * height * 4) as usize],
        }
    }

    #[test]
    fn test_file_scheme_is_stripped() {
        let hints = Hints::default();
        assert_eq!(resolve("file:///usr/share/icons/mail.png", &hints), "/usr/share/icons/mail.png");
        assert_eq!(resolve("mail-unread", &hints), "mail-unread");
    }

    #[test]
    fn test_image_path_hint_beats_app_icon() {
        let hints = Hints {
            image_path: Some("/tmp/override.png".into()),
            ..Hints::default()
        };
        assert_eq!(resolve("mail-unread", &hints), "/tmp/override.png");
    }

    #[test]
    fn test_empty_inputs_resolve_to_empty() {
        assert_eq!(resolve("", &Hints::default()), "");
    }

    #[test]
    fn test_tmp_image_written_from_pixels() {
        let path = tmp_image_from_data(&rgba(2, 2)).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "png");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_truncated_pixel_data_is_rejected() {
        let mut data = rgba(4, 4);
        data.data.truncate(3);
        assert!(tmp_image_from_data(&data).is_none());
    }
}
