//! Placeholder geometry and rendering
//!
//! The logo is scaled to fit within half of each target dimension, keeping
//! its aspect ratio, and centered on the canvas. Rendering is a pure function
//! of the request and the immutable compiled state.

use std::fmt;
use std::num::NonZeroU32;

use crate::errors::{AppError, AppResult};
use crate::svg::template::{CompiledTemplate, LOGO_MARKER, LogoDocument};

/// Share of each target dimension the logo may occupy, in percent
pub const MAX_LOGO_PERCENT: u64 = 50;

/// Requested canvas size; both sides are at least one pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderRequest {
    width: NonZeroU32,
    height: NonZeroU32,
}

impl RenderRequest {
    pub fn new(width: u32, height: u32) -> AppResult<Self> {
        match (NonZeroU32::new(width), NonZeroU32::new(height)) {
            (Some(width), Some(height)) => Ok(Self { width, height }),
            _ => Err(AppError::validation(format!(
                "placeholder size must be positive, got {width}x{height}"
            ))),
        }
    }

    pub fn width(&self) -> u32 {
        self.width.get()
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }
}

impl fmt::Display for RenderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Scaled size and position of the logo on a canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoGeometry {
    pub logo_height: f64,
    pub scaling_factor: f64,
    pub position_x: f64,
    pub position_y: f64,
}

impl LogoGeometry {
    /// Fit `logo` into `request`.
    ///
    /// The height-bound size wins whenever its derived width fits; otherwise
    /// the width-bound height is taken as is, without checking it against the
    /// height bound.
    pub fn compute(logo: &LogoDocument, request: RenderRequest) -> Self {
        let target_width = u64::from(request.width());
        let target_height = u64::from(request.height());
        let max_logo_height = target_height * MAX_LOGO_PERCENT / 100;
        let max_logo_width = target_width * MAX_LOGO_PERCENT / 100;

        let ratio = logo.aspect_ratio();
        let logo_width_by_height = (max_logo_height as f64 * ratio).round();
        let logo_height_by_width = (max_logo_width as f64 / ratio).round();

        let logo_height = if logo_width_by_height <= max_logo_width as f64 {
            max_logo_height as f64
        } else {
            logo_height_by_width
        };

        let scaling_factor = logo_height / logo.height();
        Self {
            logo_height,
            scaling_factor,
            position_x: (target_width as f64 - scaling_factor * logo.width()) / 2.0,
            position_y: (target_height as f64 - scaling_factor * logo.height()) / 2.0,
        }
    }

    /// Geometry used when no logo is configured: nothing drawn, origin centered
    pub fn without_logo(request: RenderRequest) -> Self {
        Self {
            logo_height: 0.0,
            scaling_factor: 0.0,
            position_x: f64::from(request.width()) / 2.0,
            position_y: f64::from(request.height()) / 2.0,
        }
    }
}

/// Renders placeholders from a compiled template and an optional logo
#[derive(Debug, Clone)]
pub struct PlaceholderRenderer {
    template: CompiledTemplate,
    logo: Option<LogoDocument>,
}

impl PlaceholderRenderer {
    pub fn new(template: CompiledTemplate, logo: Option<LogoDocument>) -> Self {
        Self { template, logo }
    }

    pub fn logo(&self) -> Option<&LogoDocument> {
        self.logo.as_ref()
    }

    pub fn template(&self) -> &CompiledTemplate {
        &self.template
    }

    pub fn geometry(&self, request: RenderRequest) -> LogoGeometry {
        match &self.logo {
            Some(logo) => LogoGeometry::compute(logo, request),
            None => LogoGeometry::without_logo(request),
        }
    }

    /// Produce the final SVG markup for a canvas size
    pub fn render(&self, request: RenderRequest) -> String {
        let geometry = self.geometry(request);
        let values = [
            ("width", request.width().to_string()),
            ("height", request.height().to_string()),
            ("positionX", geometry.position_x.to_string()),
            ("positionY", geometry.position_y.to_string()),
            ("scalingFactor", geometry.scaling_factor.to_string()),
        ];

        let substituted = substitute(self.template.as_str(), &values);
        let logo_markup = self.logo.as_ref().map_or("", LogoDocument::inner_markup);
        substituted.replacen(LOGO_MARKER, logo_markup, 1)
    }
}

/// Replace `${name}` placeholders in a single left-to-right pass.
/// Inserted values are not scanned again; unknown names are kept verbatim.
pub fn substitute(template: &str, values: &[(&str, String)]) -> String {
    let mut output = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(open) = rest.find("${") {
        output.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find('}') else {
            output.push_str(&rest[open..]);
            return output;
        };

        let name = &after[..close];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => output.push_str(value),
            None => output.push_str(&rest[open..open + 2 + close + 1]),
        }
        rest = &after[close + 1..];
    }

    output.push_str(rest);
    output
}
