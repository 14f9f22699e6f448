//! Error type definitions for the placeholder renderer
//!
//! The hierarchy mirrors the pipeline: the XML layer reports [`XmlError`],
//! length parsing reports [`DimensionError`], and the compiler wraps both
//! into [`TemplateError`] so no parser-specific error escapes startup.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Logo or wrapper template could not be compiled
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Validation errors for caller supplied input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Errors raised while parsing or serializing XML
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XmlError {
    /// Document is not well-formed
    #[error("Malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// A secure processing limit was exceeded
    #[error("XML limit exceeded: {limit} (max {max})")]
    LimitExceeded { limit: &'static str, max: usize },

    /// An attribute value could not be unescaped
    #[error("Invalid value for attribute '{name}': {message}")]
    InvalidAttribute { name: String, message: String },

    /// Input bytes were not valid UTF-8
    #[error("XML input is not valid UTF-8: {message}")]
    Encoding { message: String },

    /// Serializing the event tree failed
    #[error("XML serialization failed: {message}")]
    Serialization { message: String },
}

/// Errors raised when converting an SVG length into pixels
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DimensionError {
    /// Value is neither a plain number nor a number with a known unit
    #[error("Invalid {attribute} value: '{value}'")]
    InvalidNumber { attribute: String, value: String },

    /// Unit suffix is not one of px, in, mm, cm, pt, pc
    #[error("Unsupported unit '{unit}' in {attribute} value '{value}'")]
    UnsupportedUnit {
        attribute: String,
        value: String,
        unit: String,
    },

    /// Neither the attribute nor a viewBox is present
    #[error("No viewBox or dimensions found for {attribute}")]
    MissingViewBox { attribute: String },

    /// viewBox does not have four components
    #[error("Malformed viewBox '{value}': expected 4 components, found {found}")]
    MalformedViewBox { value: String, found: usize },

    /// Attribute value could not be read
    #[error(transparent)]
    Xml(#[from] XmlError),
}

/// Fatal errors raised while compiling the logo or wrapper template
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// Logo SVG could not be parsed or serialized
    #[error("Unable to load logo SVG: {message}")]
    Logo { message: String },

    /// Logo intrinsic size could not be determined
    #[error("Unable to determine logo dimensions: {0}")]
    LogoDimensions(#[from] DimensionError),

    /// Logo intrinsic size is zero, negative or not finite
    #[error("Invalid logo size {width}x{height}: dimensions must be positive")]
    InvalidLogoSize { width: f64, height: f64 },

    /// Wrapper template could not be parsed or serialized
    #[error("Unable to compile placeholder template: {message}")]
    Template { message: String },

    /// Wrapper template has no <g id="..."> container
    #[error("Container element <g id=\"{id}\"> not found in placeholder template")]
    ContainerNotFound { id: String },

    /// Marker token already present in the wrapper template source
    #[error("Placeholder template already contains the logo marker token")]
    MarkerCollision,
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl XmlError {
    pub(crate) fn malformed<S: Into<String>>(position: u64, message: S) -> Self {
        Self::Malformed {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_attribute<E: std::fmt::Display>(name: &[u8], error: E) -> Self {
        Self::InvalidAttribute {
            name: String::from_utf8_lossy(name).into_owned(),
            message: error.to_string(),
        }
    }

    pub(crate) fn serialization<E: std::fmt::Display>(error: E) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}

impl TemplateError {
    pub(crate) fn logo<E: std::fmt::Display>(cause: E) -> Self {
        Self::Logo {
            message: cause.to_string(),
        }
    }

    pub(crate) fn template<E: std::fmt::Display>(cause: E) -> Self {
        Self::Template {
            message: cause.to_string(),
        }
    }
}
