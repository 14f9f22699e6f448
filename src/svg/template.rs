//! Logo ingestion and wrapper template compilation
//!
//! Both run once at startup. The logo is reduced to its inner markup plus its
//! intrinsic size; the wrapper template has its logo container emptied and a
//! marker token put in its place so rendering is plain string work.

use tracing::debug;

use crate::errors::{TemplateError, TemplateResult};
use crate::svg::dimension::{Axis, resolve_dimension};
use crate::svg::secure_xml::SecureXmlParser;

/// Token spliced into the compiled template where the logo markup goes
pub const LOGO_MARKER: &str = "@@placeholder-svg:logo-marker:5f0c2e7a@@";

/// `id` of the `<g>` element that receives the logo
pub const LOGO_CONTAINER_ID: &str = "Logo";

/// A logo with its root `<svg>` removed
#[derive(Debug, Clone, PartialEq)]
pub struct LogoDocument {
    inner_markup: String,
    width: f64,
    height: f64,
}

impl LogoDocument {
    /// Build a logo from parts. Dimensions must be positive and finite.
    pub fn new(inner_markup: String, width: f64, height: f64) -> TemplateResult<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(TemplateError::InvalidLogoSize { width, height });
        }
        Ok(Self {
            inner_markup,
            width,
            height,
        })
    }

    pub fn inner_markup(&self) -> &str {
        &self.inner_markup
    }

    /// Intrinsic width in pixels
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Intrinsic height in pixels
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Wrapper template markup holding exactly one [`LOGO_MARKER`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    markup: String,
}

impl CompiledTemplate {
    pub fn as_str(&self) -> &str {
        &self.markup
    }
}

/// Compiles logo and wrapper template sources with a shared secure parser
#[derive(Debug, Clone, Default)]
pub struct TemplateCompiler {
    parser: SecureXmlParser,
}

impl TemplateCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a logo SVG, measure it and strip its root element
    pub fn compile_logo(&self, source: &str) -> TemplateResult<LogoDocument> {
        let document = self.parser.parse(source, true).map_err(TemplateError::logo)?;
        let root = document.root();
        if root.local_name() != "svg" {
            return Err(TemplateError::logo(format!(
                "root element is <{}>, expected <svg>",
                root.name()
            )));
        }

        let width = resolve_dimension(&root, Axis::Width)?;
        let height = resolve_dimension(&root, Axis::Height)?;
        let inner_markup = root.inner_xml().map_err(TemplateError::logo)?;

        debug!(
            "Compiled logo: {}x{} px, {} bytes of markup",
            width,
            height,
            inner_markup.len()
        );
        LogoDocument::new(inner_markup, width, height)
    }

    /// Replace the children of `<g id="Logo">` with [`LOGO_MARKER`]
    pub fn compile_template(&self, source: &str) -> TemplateResult<CompiledTemplate> {
        if source.contains(LOGO_MARKER) {
            return Err(TemplateError::MarkerCollision);
        }

        let mut document = self
            .parser
            .parse(source, false)
            .map_err(TemplateError::template)?;

        let container = document
            .find_element(|element| {
                element.local_name() == "g"
                    && matches!(element.attribute("id"), Ok(Some(id)) if id == LOGO_CONTAINER_ID)
            })
            .map(|element| element.start_index())
            .ok_or_else(|| TemplateError::ContainerNotFound {
                id: LOGO_CONTAINER_ID.to_string(),
            })?;

        document.replace_children_with_text(container, LOGO_MARKER);
        let markup = document.to_xml_string().map_err(TemplateError::template)?;

        debug!("Compiled placeholder template: {} bytes", markup.len());
        Ok(CompiledTemplate { markup })
    }
}
