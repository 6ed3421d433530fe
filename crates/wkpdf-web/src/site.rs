//! Current-site lookup and absolute asset URLs.
//!
//! wkhtmltopdf loads the rendered HTML from a file, so relative links to
//! static files and media would resolve against the filesystem. When the
//! configured base URLs are relative they are rewritten to absolute URLs on
//! the current site's domain.

use serde_json::Value;
use wkpdf_core::util::is_absolute_url;
use wkpdf_core::{Result, SiteConfig, TemplateContext};

/// Context key for the static files base URL.
pub const STATIC_URL: &str = "STATIC_URL";
/// Context key for the media base URL.
pub const MEDIA_URL: &str = "MEDIA_URL";

/// Trait for looking up the site a request is served from
pub trait SiteResolver: Send + Sync {
    /// Domain (host and optional port) of the current site.
    fn current_domain(&self) -> Result<String>;
}

/// A site with a fixed, configured domain.
#[derive(Debug, Clone)]
pub struct StaticSite {
    domain: String,
}

impl StaticSite {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl SiteResolver for StaticSite {
    fn current_domain(&self) -> Result<String> {
        Ok(self.domain.clone())
    }
}

/// Join a domain and a site-relative URL.
pub fn absolute_url(domain: &str, url: &str) -> String {
    format!("http://{domain}{url}")
}

/// The configured asset URLs, verbatim.
pub fn settings_context(site: &SiteConfig) -> TemplateContext {
    let mut context = TemplateContext::new();
    context.insert(STATIC_URL.to_string(), Value::String(site.static_url.clone()));
    context.insert(MEDIA_URL.to_string(), Value::String(site.media_url.clone()));
    context
}

/// Overwrite `STATIC_URL`/`MEDIA_URL` in `context` with absolute URLs when
/// the configured values are relative.
///
/// The resolver is only consulted if at least one value is relative.
pub fn absolutize_asset_urls(
    context: &mut TemplateContext,
    site: &SiteConfig,
    resolver: &dyn SiteResolver,
) -> Result<()> {
    let relative: Vec<_> = [(STATIC_URL, &site.static_url), (MEDIA_URL, &site.media_url)]
        .into_iter()
        .filter(|(_, url)| !is_absolute_url(url))
        .collect();

    if relative.is_empty() {
        return Ok(());
    }

    let domain = resolver.current_domain()?;
    for (key, url) in relative {
        context.insert(key.to_string(), Value::String(absolute_url(&domain, url)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wkpdf_core::Error;

    /// Counts lookups so tests can check the resolver is only used when needed.
    #[derive(Default)]
    struct CountingSite {
        lookups: AtomicUsize,
    }

    impl SiteResolver for CountingSite {
        fn current_domain(&self) -> Result<String> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok("example.com".to_string())
        }
    }

    struct BrokenSite;

    impl SiteResolver for BrokenSite {
        fn current_domain(&self) -> Result<String> {
            Err(Error::SiteLookup("no site configured".to_string()))
        }
    }

    fn site(static_url: &str, media_url: &str) -> SiteConfig {
        SiteConfig {
            static_url: static_url.to_string(),
            media_url: media_url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_relative_urls_rewritten() {
        let site = site("/static/", "/media/");
        let resolver = CountingSite::default();
        let mut context = settings_context(&site);

        absolutize_asset_urls(&mut context, &site, &resolver).unwrap();

        assert_eq!(context[STATIC_URL], "http://example.com/static/");
        assert_eq!(context[MEDIA_URL], "http://example.com/media/");
        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_absolute_urls_untouched_without_lookup() {
        let site = site("https://cdn.example.net/static/", "http://media.example.net/");
        let mut context = settings_context(&site);

        absolutize_asset_urls(&mut context, &site, &BrokenSite).unwrap();

        assert_eq!(context[STATIC_URL], "https://cdn.example.net/static/");
        assert_eq!(context[MEDIA_URL], "http://media.example.net/");
    }

    #[test]
    fn test_mixed_urls() {
        let site = site("https://cdn.example.net/static/", "/uploads/");
        let resolver = CountingSite::default();
        let mut context = TemplateContext::new();

        absolutize_asset_urls(&mut context, &site, &resolver).unwrap();

        assert!(!context.contains_key(STATIC_URL));
        assert_eq!(context[MEDIA_URL], "http://example.com/uploads/");
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let site = site("/static/", "/media/");
        let mut context = TemplateContext::new();

        let err = absolutize_asset_urls(&mut context, &site, &BrokenSite).unwrap_err();
        assert!(matches!(err, Error::SiteLookup(_)));
    }
}
