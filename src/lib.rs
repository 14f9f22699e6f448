//! Placeholder SVG generator
//!
//! Composites a logo into a wrapper SVG template at arbitrary canvas sizes.
//! The logo is scaled to fit within half of each dimension and centered.

pub mod assets;
pub mod config;
pub mod errors;
pub mod services;
pub mod svg;
pub mod web;
