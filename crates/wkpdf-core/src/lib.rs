//! wkpdf Core Library
//!
//! This library provides the pieces needed to turn HTML templates into PDFs
//! with the external `wkhtmltopdf` binary:
//! - Template rendering behind a pluggable [`TemplateSource`]
//! - Temporary files for each rendered template, removed after use
//! - Command options and the conversion process itself
//! - `Content-Disposition` filename sanitizing

pub mod artifact;
pub mod config;
pub mod error;
pub mod filename;
pub mod options;
pub mod render;
pub mod templates;
pub mod util;
pub mod wkhtmltopdf;

pub use artifact::{RenderedFile, TempFileOptions, render_to_temporary_file};
pub use config::{AppConfig, SiteConfig, WkhtmltopdfConfig};
pub use error::{Error, Result};
pub use filename::{content_disposition, content_disposition_filename};
pub use options::{CmdOptions, OptionValue};
pub use render::{FOOTER_HTML, HEADER_HTML, PdfRenderer, RenderRequest};
pub use templates::{TemplateContext, TemplateSource, TeraTemplates};
pub use wkhtmltopdf::{PdfConverter, Wkhtmltopdf};

use std::sync::Arc;

/// Build a renderer backed by Tera templates from `config.template_dir`
/// and the real `wkhtmltopdf` binary.
pub fn renderer_from_config(config: &AppConfig) -> Result<PdfRenderer> {
    let templates = TeraTemplates::from_dir(&config.template_dir)?;
    let converter = Wkhtmltopdf::from_config(&config.wkhtmltopdf);

    Ok(PdfRenderer::new(Arc::new(templates), Arc::new(converter))
        .with_temp_files(config.wkhtmltopdf.temp_file_options()))
}
