//! The PDF rendering pipeline: templates to temporary files to PDF bytes.

use std::sync::Arc;
use tracing::{debug, info};

use crate::artifact::{RenderedFile, TempFileOptions, render_to_temporary_file};
use crate::error::Result;
use crate::options::CmdOptions;
use crate::templates::{TemplateContext, TemplateSource};
use crate::wkhtmltopdf::PdfConverter;

/// Option that carries the header HTML path.
pub const HEADER_HTML: &str = "header_html";
/// Option that carries the footer HTML path.
pub const FOOTER_HTML: &str = "footer_html";

/// Everything needed to produce one PDF.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub template: String,
    pub context: TemplateContext,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    pub cmd_options: CmdOptions,
}

impl RenderRequest {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: TemplateContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_header(mut self, template: impl Into<String>) -> Self {
        self.header_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_footer(mut self, template: impl Into<String>) -> Self {
        self.footer_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_cmd_options(mut self, cmd_options: CmdOptions) -> Self {
        self.cmd_options = cmd_options;
        self
    }

    /// Number of templates (body, header, footer) this request renders.
    pub fn template_count(&self) -> usize {
        1 + usize::from(self.header_template.is_some()) + usize::from(self.footer_template.is_some())
    }
}

/// Renders [`RenderRequest`]s to PDF bytes.
///
/// Cheap to clone; shares the template source and converter.
#[derive(Clone)]
pub struct PdfRenderer {
    templates: Arc<dyn TemplateSource>,
    converter: Arc<dyn PdfConverter>,
    temp_files: TempFileOptions,
}

impl PdfRenderer {
    pub fn new(templates: Arc<dyn TemplateSource>, converter: Arc<dyn PdfConverter>) -> Self {
        Self {
            templates,
            converter,
            temp_files: TempFileOptions::default(),
        }
    }

    /// Use custom temporary file settings (directory, debug retention).
    #[must_use]
    pub fn with_temp_files(mut self, temp_files: TempFileOptions) -> Self {
        self.temp_files = temp_files;
        self
    }

    pub fn templates(&self) -> &dyn TemplateSource {
        self.templates.as_ref()
    }

    pub const fn temp_files(&self) -> &TempFileOptions {
        &self.temp_files
    }

    fn render_file(&self, template: &str, context: &TemplateContext) -> Result<RenderedFile> {
        let file =
            render_to_temporary_file(self.templates.as_ref(), template, context, &self.temp_files)?;
        debug!("Rendered {} to {}", template, file.path().display());
        Ok(file)
    }

    /// Render the request and run the converter.
    ///
    /// Header and footer files are passed as `header_html`/`footer_html`
    /// unless the request already sets those options. All rendered files
    /// live until this function returns and are dropped on every path.
    pub fn render(&self, request: &RenderRequest) -> Result<Vec<u8>> {
        let mut cmd_options = request.cmd_options.clone();

        let body = self.render_file(&request.template, &request.context)?;

        let header = match &request.header_template {
            Some(template) => {
                let file = self.render_file(template, &request.context)?;
                cmd_options.set_default(HEADER_HTML, file.path());
                Some(file)
            }
            None => None,
        };

        let footer = match &request.footer_template {
            Some(template) => {
                let file = self.render_file(template, &request.context)?;
                cmd_options.set_default(FOOTER_HTML, file.path());
                Some(file)
            }
            None => None,
        };

        let pdf = self.converter.convert(&[body.path()], &cmd_options)?;

        info!(
            "Rendered {} to PDF ({} bytes, header: {}, footer: {})",
            request.template,
            pdf.len(),
            header.is_some(),
            footer.is_some()
        );

        Ok(pdf)
    }
}
