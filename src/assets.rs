use rust_embed::RustEmbed;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Embedded placeholder template and default logo
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct PlaceholderAssets;

/// Packaged wrapper template path
pub const TEMPLATE_ASSET: &str = "placeholder-template.svg";

/// Packaged default logo path
pub const DEFAULT_LOGO_ASSET: &str = "default-logo.svg";

/// Template used when the packaged one is unavailable
pub const BUILT_IN_TEMPLATE: &str = concat!(
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="${width}" height="${height}">"#,
    r##"<rect x="0" y="0" width="100%" height="100%" fill="#e3e8ee"/>"##,
    r#"<g transform="translate(${positionX} ${positionY}) scale(${scalingFactor})">"#,
    r#"<g id="Logo"/></g></svg>"#
);

/// Where a startup asset was loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum AssetOrigin {
    /// File configured by the operator
    File(PathBuf),
    /// Embedded in the binary
    Packaged,
    /// Compiled-in constant
    BuiltIn,
    /// Nothing available
    Empty,
}

impl fmt::Display for AssetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Packaged => f.write_str("packaged asset"),
            Self::BuiltIn => f.write_str("built-in constant"),
            Self::Empty => f.write_str("empty"),
        }
    }
}

impl PlaceholderAssets {
    /// Get an embedded asset as UTF-8 text
    pub fn get_text(path: &str) -> Option<String> {
        let file = Self::get(path)?;
        match String::from_utf8(file.data.into_owned()) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Packaged asset {} is not valid UTF-8: {}", path, e);
                None
            }
        }
    }
}

/// Read the wrapper template: configured file, then packaged asset, then
/// the built-in constant
pub fn load_template_source(override_path: Option<&Path>) -> (String, AssetOrigin) {
    if let Some((source, origin)) = override_path.and_then(read_file) {
        return (source, origin);
    }
    if let Some(source) = PlaceholderAssets::get_text(TEMPLATE_ASSET) {
        return (source, AssetOrigin::Packaged);
    }
    warn!("Packaged placeholder template missing, using built-in template");
    (BUILT_IN_TEMPLATE.to_string(), AssetOrigin::BuiltIn)
}

/// Read the logo: configured file, then packaged default, then nothing
pub fn load_logo_source(custom_path: Option<&Path>) -> (String, AssetOrigin) {
    if let Some((source, origin)) = custom_path.and_then(read_file) {
        return (source, origin);
    }
    if let Some(source) = PlaceholderAssets::get_text(DEFAULT_LOGO_ASSET) {
        return (source, AssetOrigin::Packaged);
    }
    warn!("No placeholder logo available, rendering placeholders without a logo");
    (String::new(), AssetOrigin::Empty)
}

fn read_file(path: &Path) -> Option<(String, AssetOrigin)> {
    match std::fs::read_to_string(path) {
        Ok(source) => {
            info!("Loaded {} ({} bytes)", path.display(), source.len());
            Some((source, AssetOrigin::File(path.to_path_buf())))
        }
        Err(e) => {
            warn!("Unable to read {}: {}, falling back", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_packaged_assets_exist() {
        let assets: Vec<_> = PlaceholderAssets::iter().collect();
        assert!(assets.iter().any(|a| a == TEMPLATE_ASSET), "{assets:?}");
        assert!(assets.iter().any(|a| a == DEFAULT_LOGO_ASSET), "{assets:?}");

        let template = PlaceholderAssets::get_text(TEMPLATE_ASSET).unwrap();
        assert!(template.contains(r#"id="Logo""#));
        assert!(template.contains("${scalingFactor}"));
    }

    #[test]
    fn test_nonexistent_assets() {
        assert!(PlaceholderAssets::get_text("does/not/exist.svg").is_none());
    }

    #[test]
    fn test_template_defaults_to_packaged() {
        let (source, origin) = load_template_source(None);
        assert_eq!(origin, AssetOrigin::Packaged);
        assert!(source.contains("placeholder-background"));
    }

    #[test]
    fn test_missing_custom_logo_falls_back_to_packaged() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.svg");
        let (source, origin) = load_logo_source(Some(&missing));
        assert_eq!(origin, AssetOrigin::Packaged);
        assert!(source.contains("<svg"));
    }

    #[test]
    fn test_custom_logo_file_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"<svg width="2" height="1"/>"#).unwrap();

        let (source, origin) = load_logo_source(Some(file.path()));
        assert_eq!(source, r#"<svg width="2" height="1"/>"#);
        assert_eq!(origin, AssetOrigin::File(file.path().to_path_buf()));
        assert_eq!(origin.to_string(), format!("file {}", file.path().display()));
    }
}
