//! Centralized error handling for the placeholder renderer
//!
//! Errors are split by the layer that produces them so callers can tell a
//! broken startup configuration apart from a bad per-call input.
//!
//! # Error Categories
//!
//! - **XML Errors**: malformed documents or exceeded parser limits
//! - **Dimension Errors**: unparseable lengths, missing or malformed viewBox
//! - **Template Errors**: fatal initialization failures of the logo/template
//! - **Application Errors**: caller validation and configuration at the edges
//!
//! # Usage
//!
//! ```rust
//! use placeholder_svg::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::validation("width must be greater than zero"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for template compilation Results
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Convenience type alias for dimension resolution Results
pub type DimensionResult<T> = Result<T, DimensionError>;
