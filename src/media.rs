use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{
    constants::{IMAGE_DIRECTORY, IMAGE_EXTENSIONS},
    error::ApiResult,
};

/// An image received as a `data:image/<ext>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    pub fn from_data_uri(value: &str) -> Option<Self> {
        let rest = value.trim().strip_prefix("data:image/")?;
        let (format, payload) = rest.split_once(";base64,")?;

        let extension = format.to_ascii_lowercase();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }

        let bytes = STANDARD.decode(payload.trim()).ok()?;
        if bytes.is_empty() {
            return None;
        }

        Some(Self { extension, bytes })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub url: String,
}

/// Writes the image under `media_root` with a fresh name and returns both the
/// file path and the public reference stored on the recipe.
pub async fn store_image(
    media_root: &Path,
    media_url: &str,
    image: &DecodedImage,
) -> ApiResult<StoredImage> {
    let file_name = format!("{}.{}", uuid::Uuid::new_v4(), image.extension);
    let directory = media_root.join(IMAGE_DIRECTORY);
    tokio::fs::create_dir_all(&directory).await?;

    let path = directory.join(&file_name);
    tokio::fs::write(&path, &image.bytes).await?;
    log::info!("Stored recipe image {}", path.display());

    Ok(StoredImage {
        path,
        url: format!(
            "{}/{IMAGE_DIRECTORY}/{file_name}",
            media_url.trim_end_matches('/')
        ),
    })
}

/// Best-effort cleanup after a failed write.
pub async fn discard_image(image: &StoredImage) {
    if let Err(e) = tokio::fs::remove_file(&image.path).await {
        log::warn!("Failed to remove {}: {e}", image.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent png
    const PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn decodes_png_data_uri() {
        let image = DecodedImage::from_data_uri(&format!("data:image/png;base64,{PNG}")).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn rejects_non_images() {
        assert_eq!(DecodedImage::from_data_uri("http://example.com/cake.png"), None);
        assert_eq!(
            DecodedImage::from_data_uri(&format!("data:text/plain;base64,{PNG}")),
            None
        );
        assert_eq!(
            DecodedImage::from_data_uri(&format!("data:image/tiff;base64,{PNG}")),
            None
        );
        assert_eq!(DecodedImage::from_data_uri("data:image/png;base64,***"), None);
        assert_eq!(DecodedImage::from_data_uri("data:image/png;base64,"), None);
    }

    #[tokio::test]
    async fn stores_under_media_root() {
        let root = std::env::temp_dir().join(format!("foodgram-media-{}", uuid::Uuid::new_v4()));
        let image = DecodedImage::from_data_uri(&format!("data:image/png;base64,{PNG}")).unwrap();

        let stored = store_image(&root, "/media/", &image).await.unwrap();

        assert!(stored.url.starts_with("/media/recipes/images/"));
        assert!(stored.url.ends_with(".png"));
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), image.bytes);

        discard_image(&stored).await;
        assert!(!stored.path.exists());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
