//! Image asset resolution for add-image.
//!
//! Resolving an asset yields the source the image object will reference and
//! its natural pixel size. Resolution is asynchronous; the editor stays busy
//! until it completes.

use crate::error::{EngineError, EngineResult};
use crate::shapes::{ImageFormat, decode_data_url};
use crate::storage::BoxFuture;
use reqwest::Client;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// A loaded image ready to be placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    /// Source stored on the image object (URL or data URL).
    pub src: String,
    pub width: u32,
    pub height: u32,
}

/// Loads image sources.
pub trait AssetResolver {
    fn resolve(&self, src: &str) -> BoxFuture<'_, EngineResult<ResolvedAsset>>;
}

/// Measure encoded image bytes.
pub fn probe_dimensions(bytes: &[u8]) -> EngineResult<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| EngineError::AssetUnavailable(e.to_string()))?
        .into_dimensions()
        .map_err(|e| EngineError::AssetUnavailable(e.to_string()))
}

/// Resolves local file paths and `data:` URLs.
///
/// Files are embedded as base64 data URLs so the saved document does not
/// depend on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalAssetResolver;

impl LocalAssetResolver {
    pub fn new() -> Self {
        Self
    }

    fn resolve_now(src: &str) -> EngineResult<ResolvedAsset> {
        if src.starts_with("data:") {
            let bytes = decode_data_url(src)
                .ok_or_else(|| EngineError::AssetUnavailable("unsupported data URL".to_string()))?;
            let (width, height) = probe_dimensions(&bytes)?;
            return Ok(ResolvedAsset {
                src: src.to_string(),
                width,
                height,
            });
        }

        let path = Path::new(src);
        let bytes = std::fs::read(path)
            .map_err(|e| EngineError::AssetUnavailable(format!("{}: {}", path.display(), e)))?;
        let format = ImageFormat::from_magic_bytes(&bytes)
            .or_else(|| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .ok_or_else(|| {
                EngineError::AssetUnavailable(format!("{}: unsupported image format", path.display()))
            })?;
        let (width, height) = probe_dimensions(&bytes)?;
        Ok(ResolvedAsset {
            src: format.data_url(&bytes),
            width,
            height,
        })
    }
}

impl AssetResolver for LocalAssetResolver {
    fn resolve(&self, src: &str) -> BoxFuture<'_, EngineResult<ResolvedAsset>> {
        let src = src.to_string();
        Box::pin(async move { Self::resolve_now(&src) })
    }
}

/// Downloads remote images and keeps their URL as the source.
#[derive(Debug, Clone, Default)]
pub struct HttpAssetResolver {
    client: Client,
}

impl HttpAssetResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AssetResolver for HttpAssetResolver {
    fn resolve(&self, src: &str) -> BoxFuture<'_, EngineResult<ResolvedAsset>> {
        let src = src.to_string();
        Box::pin(async move {
            let unavailable = |e: reqwest::Error| EngineError::AssetUnavailable(e.to_string());
            let response = self
                .client
                .get(&src)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(unavailable)?;
            let bytes = response.bytes().await.map_err(unavailable)?;
            let (width, height) = probe_dimensions(&bytes)?;
            Ok(ResolvedAsset { src, width, height })
        })
    }
}

/// A fixed table of known sources, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetResolver {
    assets: HashMap<String, (u32, u32)>,
}

impl MemoryAssetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, src: impl Into<String>, width: u32, height: u32) -> Self {
        self.assets.insert(src.into(), (width, height));
        self
    }
}

impl AssetResolver for MemoryAssetResolver {
    fn resolve(&self, src: &str) -> BoxFuture<'_, EngineResult<ResolvedAsset>> {
        let result = self
            .assets
            .get(src)
            .map(|&(width, height)| ResolvedAsset {
                src: src.to_string(),
                width,
                height,
            })
            .ok_or_else(|| EngineError::AssetUnavailable(format!("{src}: not found")));
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    /// Encode a tiny RGBA image as PNG.
    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_probe_dimensions() {
        assert_eq!(probe_dimensions(&png_bytes(3, 2)).unwrap(), (3, 2));
        assert!(probe_dimensions(b"definitely not an image").is_err());
    }

    #[test]
    fn test_local_file_becomes_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.png");
        std::fs::write(&path, png_bytes(4, 5)).unwrap();

        let asset = block_on(LocalAssetResolver::new().resolve(path.to_str().unwrap())).unwrap();
        assert!(asset.src.starts_with("data:image/png;base64,"));
        assert_eq!((asset.width, asset.height), (4, 5));
    }

    #[test]
    fn test_data_url_is_kept() {
        let url = ImageFormat::Png.data_url(&png_bytes(2, 2));
        let asset = block_on(LocalAssetResolver::new().resolve(&url)).unwrap();
        assert_eq!(asset.src, url);
        assert_eq!(asset.width, 2);
    }

    #[test]
    fn test_missing_file() {
        let result = block_on(LocalAssetResolver::new().resolve("/nonexistent/avatar.png"));
        assert!(matches!(result, Err(EngineError::AssetUnavailable(_))));
    }

    #[test]
    fn test_memory_resolver() {
        let resolver = MemoryAssetResolver::new().with_asset("me.png", 300, 300);
        assert_eq!(block_on(resolver.resolve("me.png")).unwrap().width, 300);
        assert!(block_on(resolver.resolve("other.png")).is_err());
    }
}
