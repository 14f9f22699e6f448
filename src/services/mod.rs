//! Service layer for placeholder generation
//!
//! Services own the startup-compiled rendering state and are the only entry
//! point the web layer and the CLI use.
//!
//! # Usage
//!
//! ```rust,no_run
//! use placeholder_svg::config::PlaceholderConfig;
//! use placeholder_svg::services::PlaceholderService;
//!
//! let service = PlaceholderService::from_config(&PlaceholderConfig::default())?;
//! let svg = service.render(640, 360)?;
//! assert!(svg.contains("width=\"640\""));
//! # Ok::<(), placeholder_svg::errors::AppError>(())
//! ```

pub mod placeholder;

pub use placeholder::PlaceholderService;
