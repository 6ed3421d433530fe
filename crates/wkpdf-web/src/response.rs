//! HTTP responses for PDF and HTML output.
//!
//! [`PdfTemplateResponse`] is a composition of two steps: rendering a
//! [`RenderRequest`] to PDF bytes, and decorating those bytes with headers
//! via [`PdfResponse`].

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;
use wkpdf_core::{PdfRenderer, RenderRequest, TemplateContext, TemplateSource, content_disposition};

/// Content type of PDF responses.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
/// Content type of HTML responses.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// PDF bytes plus the headers that describe them.
#[derive(Debug, Clone)]
pub struct PdfResponse {
    content: Vec<u8>,
    status: StatusCode,
    content_type: String,
    filename: Option<String>,
}

impl PdfResponse {
    /// A 200 `application/pdf` response displayed inline.
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            status: StatusCode::OK,
            content_type: PDF_CONTENT_TYPE.to_string(),
            filename: None,
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.set_filename(filename);
        self
    }

    /// Set the download filename; `None` or an empty name means inline.
    pub fn set_filename(&mut self, filename: Option<String>) {
        self.filename = filename.filter(|f| !f.is_empty());
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Value of the `Content-Disposition` header, if one should be sent.
    pub fn content_disposition(&self) -> Option<String> {
        self.filename.as_deref().and_then(content_disposition)
    }
}

impl IntoResponse for PdfResponse {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();

        let mut builder = Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, self.content_type);
        if let Some(disposition) = disposition {
            builder = builder.header(header::CONTENT_DISPOSITION, disposition);
        }

        builder
            .body(Body::from(self.content))
            .unwrap_or_else(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response())
    }
}

/// A template rendered to HTML.
#[derive(Debug, Clone)]
pub struct TemplateResponse {
    pub template: String,
    pub context: TemplateContext,
    pub status: StatusCode,
}

impl TemplateResponse {
    pub fn new(template: impl Into<String>, context: TemplateContext) -> Self {
        Self {
            template: template.into(),
            context,
            status: StatusCode::OK,
        }
    }

    /// Render the template into an HTML response.
    pub fn render(&self, templates: &dyn TemplateSource) -> Result<Response> {
        let html = templates.render(&self.template, &self.context)?;
        debug!("Rendered {} as HTML ({} bytes)", self.template, html.len());

        let mut response = (self.status, html).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        Ok(response)
    }
}

/// A template rendered to PDF through wkhtmltopdf.
#[derive(Debug, Clone)]
pub struct PdfTemplateResponse {
    pub request: RenderRequest,
    pub filename: Option<String>,
    pub status: StatusCode,
}

impl PdfTemplateResponse {
    pub fn new(request: RenderRequest) -> Self {
        Self {
            request,
            filename: None,
            status: StatusCode::OK,
        }
    }

    #[must_use]
    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename;
        self
    }

    /// Render to PDF on a blocking thread and wrap the bytes.
    ///
    /// The conversion process blocks until it exits, so it runs on the
    /// blocking pool rather than an async worker.
    pub async fn render(self, renderer: &PdfRenderer) -> Result<PdfResponse> {
        let renderer = renderer.clone();
        let Self {
            request,
            filename,
            status,
        } = self;

        let content = tokio::task::spawn_blocking(move || renderer.render(&request))
            .await
            .context("PDF rendering task failed")??;

        Ok(PdfResponse::new(content)
            .with_status(status)
            .with_filename(filename))
    }
}
