use anyhow::{Context, Result};
use std::sync::Arc;
use wkpdf_core::{AppConfig, PdfRenderer, SiteConfig};

use crate::site::{SiteResolver, StaticSite};

/// Global application state shared by all views.
///
/// Holds only read-only configuration and shared collaborators; per-request
/// data (output mode, command options, context) never lives here.
pub struct AppState {
    /// Template rendering and PDF conversion
    pub renderer: PdfRenderer,
    /// Static/media URL settings
    pub site_config: SiteConfig,
    /// Current-site lookup for absolute URLs
    pub site: Arc<dyn SiteResolver>,
}

impl AppState {
    pub fn new(renderer: PdfRenderer, site_config: SiteConfig) -> Self {
        let site = Arc::new(StaticSite::new(site_config.domain.clone()));
        Self {
            renderer,
            site_config,
            site,
        }
    }

    /// Build state from configuration: Tera templates from
    /// `config.template_dir` and the real wkhtmltopdf binary.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let renderer = wkpdf_core::renderer_from_config(config).with_context(|| {
            format!("Failed to load templates from {}", config.template_dir.display())
        })?;
        Ok(Self::new(renderer, config.site.clone()))
    }

    /// Replace the site resolver (e.g. to look up the domain per tenant).
    #[must_use]
    pub fn with_site_resolver(mut self, site: Arc<dyn SiteResolver>) -> Self {
        self.site = site;
        self
    }
}
