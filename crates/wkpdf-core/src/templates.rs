//! Template lookup and rendering.
//!
//! The conversion pipeline only needs "give me the text for this template
//! name and context", so the templating engine sits behind the
//! [`TemplateSource`] trait. [`TeraTemplates`] is the stock implementation.

use serde_json::{Map, Value};
use std::path::Path;
use tera::Tera;
use tracing::debug;

use crate::error::{Error, Result};

/// Context passed to templates: string keys, arbitrary JSON values.
pub type TemplateContext = Map<String, Value>;

/// Trait for template backends
pub trait TemplateSource: Send + Sync {
    /// Render the named template with the given context.
    fn render(&self, name: &str, context: &TemplateContext) -> Result<String>;

    /// Check whether a template with this name exists.
    fn has_template(&self, name: &str) -> bool;
}

/// Tera-backed template source.
#[derive(Debug, Default)]
pub struct TeraTemplates {
    tera: Tera,
}

impl TeraTemplates {
    /// Load every `.html` template below `dir`.
    ///
    /// Templates are named by their path relative to `dir`
    /// (e.g. `reports/summary.html`).
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let glob = dir.as_ref().join("**").join("*.html");
        let tera = Tera::new(&glob.to_string_lossy())?;
        debug!(
            "Loaded {} templates from {}",
            tera.get_template_names().count(),
            dir.as_ref().display()
        );
        Ok(Self { tera })
    }

    /// Build a template source from in-memory `(name, source)` pairs.
    pub fn from_raw<'a>(templates: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        Ok(Self { tera })
    }

    /// Wrap an already configured Tera instance (custom filters etc.).
    pub const fn from_tera(tera: Tera) -> Self {
        Self { tera }
    }

    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }
}

impl TemplateSource for TeraTemplates {
    fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        if !self.has_template(name) {
            return Err(Error::TemplateNotFound(name.to_string()));
        }

        let context = tera::Context::from_serialize(context).map_err(|source| Error::Template {
            name: name.to_string(),
            source,
        })?;

        self.tera.render(name, &context).map_err(|source| Error::Template {
            name: name.to_string(),
            source,
        })
    }

    fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> TemplateContext {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test contexts are objects"),
        }
    }

    #[test]
    fn test_render_raw_template() {
        let templates =
            TeraTemplates::from_raw([("hello.html", "<p>Hello {{ name }}</p>")]).unwrap();

        let html = templates
            .render("hello.html", &context(json!({ "name": "world" })))
            .unwrap();
        assert_eq!(html, "<p>Hello world</p>");
    }

    #[test]
    fn test_html_is_autoescaped() {
        let templates = TeraTemplates::from_raw([("x.html", "{{ v }}")]).unwrap();

        let html = templates
            .render("x.html", &context(json!({ "v": "<b>&</b>" })))
            .unwrap();
        assert_eq!(html, "&lt;b&gt;&amp;&lt;&#x2F;b&gt;");
    }

    #[test]
    fn test_missing_template() {
        let templates = TeraTemplates::from_raw([("a.html", "a")]).unwrap();

        let err = templates.render("b.html", &TemplateContext::new()).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(name) if name == "b.html"));
    }

    #[test]
    fn test_render_error_propagates() {
        let templates = TeraTemplates::from_raw([("a.html", "{{ missing.field }}")]).unwrap();

        let err = templates.render("a.html", &TemplateContext::new()).unwrap_err();
        assert!(matches!(err, Error::Template { name, .. } if name == "a.html"));
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("reports")).unwrap();
        std::fs::write(dir.path().join("base.html"), "base").unwrap();
        std::fs::write(dir.path().join("reports/summary.html"), "{{ n }} rows").unwrap();

        let templates = TeraTemplates::from_dir(dir.path()).unwrap();
        assert_eq!(templates.template_names(), vec!["base.html", "reports/summary.html"]);
        assert_eq!(
            templates
                .render("reports/summary.html", &context(json!({ "n": 3 })))
                .unwrap(),
            "3 rows"
        );
    }
}
