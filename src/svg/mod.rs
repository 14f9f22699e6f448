//! SVG placeholder pipeline
//!
//! # Architecture
//!
//! - **secure_xml**: hardened parsing and fragment serialization
//! - **dimension**: intrinsic size resolution for the logo root
//! - **template**: one-off compilation of the logo and wrapper template
//! - **renderer**: per-size geometry and string substitution
//! - **cache**: bounded memoization of rendered output

pub mod cache;
pub mod dimension;
pub mod renderer;
pub mod secure_xml;
pub mod template;

pub use cache::{CacheStats, RenderCache};
pub use dimension::{Axis, LengthUnit};
pub use renderer::{LogoGeometry, PlaceholderRenderer, RenderRequest};
pub use secure_xml::{SecureXmlParser, XmlDocument, XmlLimits};
pub use template::{CompiledTemplate, LogoDocument, TemplateCompiler};
