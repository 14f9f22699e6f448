//! Placeholder rendering service
//!
//! Loads the wrapper template and logo once, compiles them, and serves
//! rendered placeholders through a size-keyed cache. The service is cheap to
//! clone and safe to share across request handlers.

use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::assets::{AssetOrigin, load_logo_source, load_template_source};
use crate::config::PlaceholderConfig;
use crate::errors::{AppError, AppResult};
use crate::svg::cache::{CacheStats, RenderCache};
use crate::svg::renderer::{PlaceholderRenderer, RenderRequest};
use crate::svg::template::TemplateCompiler;

/// Where the compiled state came from, reported by the health endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceholderSources {
    pub template: AssetOrigin,
    pub logo: AssetOrigin,
    pub logo_width: Option<f64>,
    pub logo_height: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PlaceholderService {
    renderer: Arc<PlaceholderRenderer>,
    cache: Arc<RenderCache>,
    sources: Arc<PlaceholderSources>,
}

impl PlaceholderService {
    /// Load sources with their fallbacks and compile them
    pub fn from_config(config: &PlaceholderConfig) -> AppResult<Self> {
        let capacity = config
            .cache_capacity()
            .map_err(|e| AppError::configuration(e.to_string()))?;
        let (template_source, template_origin) = load_template_source(config.template_path.as_deref());
        let (logo_source, logo_origin) = load_logo_source(config.logo_path.as_deref());

        Self::from_sources(
            &template_source,
            template_origin,
            &logo_source,
            logo_origin,
            capacity,
        )
    }

    /// Compile already loaded sources. An empty logo source yields
    /// placeholders without a logo; anything else must compile.
    pub fn from_sources(
        template_source: &str,
        template_origin: AssetOrigin,
        logo_source: &str,
        logo_origin: AssetOrigin,
        cache_capacity: NonZeroUsize,
    ) -> AppResult<Self> {
        let compiler = TemplateCompiler::new();
        let template = compiler.compile_template(template_source)?;

        let logo = if logo_source.trim().is_empty() {
            warn!("Logo source from {} is empty, placeholders will have no logo", logo_origin);
            None
        } else {
            Some(compiler.compile_logo(logo_source)?)
        };

        let sources = PlaceholderSources {
            template: template_origin,
            logo: logo_origin,
            logo_width: logo.as_ref().map(|l| l.width()),
            logo_height: logo.as_ref().map(|l| l.height()),
        };
        info!(
            "Placeholder renderer ready: template from {}, logo from {} ({}x{} px), cache capacity {}",
            sources.template,
            sources.logo,
            sources.logo_width.unwrap_or_default(),
            sources.logo_height.unwrap_or_default(),
            cache_capacity
        );

        Ok(Self {
            renderer: Arc::new(PlaceholderRenderer::new(template, logo)),
            cache: Arc::new(RenderCache::new(cache_capacity)),
            sources: Arc::new(sources),
        })
    }

    /// Render a placeholder; zero dimensions are rejected
    pub fn render(&self, width: u32, height: u32) -> AppResult<Arc<str>> {
        let request = RenderRequest::new(width, height)?;
        Ok(self.render_request(request))
    }

    pub fn render_request(&self, request: RenderRequest) -> Arc<str> {
        self.cache
            .get_or_render(request, |request| self.renderer.render(request))
    }

    pub fn renderer(&self) -> &PlaceholderRenderer {
        &self.renderer
    }

    pub fn sources(&self) -> &PlaceholderSources {
        &self.sources
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
