//! A view that serves one template as either PDF or HTML.
//!
//! PDF is the default output. Adding `?as=html` to the request returns the
//! same template rendered as HTML, which is handy while designing a
//! template. The mode is derived from each request's query string and never
//! stored on the view, so concurrent requests are independent.

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{MethodRouter, get},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use wkpdf_core::{CmdOptions, RenderRequest, TemplateContext};

use crate::helpers::{ResultExt, RouteResult};
use crate::response::{PdfTemplateResponse, TemplateResponse};
use crate::site::{absolutize_asset_urls, settings_context};
use crate::state::AppState;

/// Download filename used unless a view sets its own.
pub const DEFAULT_FILENAME: &str = "rendered_pdf.pdf";

/// Query parameter that selects the output mode.
pub const OUTPUT_PARAM: &str = "as";

/// Output produced for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Pdf,
    Html,
}

impl OutputMode {
    /// `Html` when the query string has `as=html`, otherwise `Pdf`.
    ///
    /// Only the `as` parameter is read; other parameters never fail the
    /// request, whatever their encoding.
    pub fn from_query(query: Option<&str>) -> Self {
        let html = query
            .into_iter()
            .flat_map(|q| q.split('&'))
            .filter_map(|pair| pair.split_once('='))
            .filter(|(name, _)| decode_component(name).as_deref() == Some(OUTPUT_PARAM))
            .any(|(_, value)| decode_component(value).as_deref() == Some("html"));

        if html { Self::Html } else { Self::Pdf }
    }
}

/// Decode one `application/x-www-form-urlencoded` component.
fn decode_component(component: &str) -> Option<String> {
    urlencoding::decode(&component.replace('+', " "))
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// Per-call replacements for the view defaults.
#[derive(Debug, Clone, Default)]
pub struct ResponseOverrides {
    /// `Some(None)` forces inline display
    pub filename: Option<Option<String>>,
    pub cmd_options: Option<CmdOptions>,
    pub status: Option<StatusCode>,
}

fn default_filename() -> Option<String> {
    Some(DEFAULT_FILENAME.to_string())
}

/// Configuration of a PDF view.
///
/// Shared between requests; every request works on copies of the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfTemplateView {
    /// Body template
    #[serde(rename = "template")]
    pub template_name: String,

    /// Template rendered to the header HTML
    #[serde(default)]
    pub header_template: Option<String>,

    /// Template rendered to the footer HTML
    #[serde(default)]
    pub footer_template: Option<String>,

    /// Download filename; `None` displays the PDF inline
    #[serde(default = "default_filename")]
    pub filename: Option<String>,

    /// Default wkhtmltopdf options for this view
    #[serde(default)]
    pub cmd_options: CmdOptions,

    /// Extra values added to every template context
    #[serde(default)]
    pub extra_context: TemplateContext,
}

impl PdfTemplateView {
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            header_template: None,
            footer_template: None,
            filename: default_filename(),
            cmd_options: CmdOptions::new(),
            extra_context: TemplateContext::new(),
        }
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
    pub fn with_filename(mut self, filename: Option<&str>) -> Self {
        self.filename = filename.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_cmd_options(mut self, cmd_options: CmdOptions) -> Self {
        self.cmd_options = cmd_options;
        self
    }

    #[must_use]
    pub fn with_context_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_context.insert(key.into(), value.into());
        self
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// A fresh copy of the view's default command options.
    pub fn cmd_options(&self) -> CmdOptions {
        self.cmd_options.clone()
    }

    /// Context for one request: extra context, the configured asset URLs,
    /// then absolute asset URLs when the configured ones are relative.
    pub fn get_context_data(&self, state: &AppState) -> wkpdf_core::Result<TemplateContext> {
        let mut context = self.extra_context.clone();
        context.extend(settings_context(&state.site_config));
        absolutize_asset_urls(&mut context, &state.site_config, state.site.as_ref())?;
        Ok(context)
    }

    /// Build the PDF response for `context`, applying `overrides`.
    pub fn pdf_response(
        &self,
        context: TemplateContext,
        overrides: ResponseOverrides,
    ) -> PdfTemplateResponse {
        let filename = overrides
            .filename
            .unwrap_or_else(|| self.filename().map(str::to_string));
        let cmd_options = overrides.cmd_options.unwrap_or_else(|| self.cmd_options());

        let mut request = RenderRequest::new(self.template_name.clone())
            .with_context(context)
            .with_cmd_options(cmd_options);
        request.header_template.clone_from(&self.header_template);
        request.footer_template.clone_from(&self.footer_template);

        let mut response = PdfTemplateResponse::new(request).with_filename(filename);
        if let Some(status) = overrides.status {
            response.status = status;
        }
        response
    }

    /// Build the HTML response for `context`.
    pub fn html_response(
        &self,
        context: TemplateContext,
        overrides: &ResponseOverrides,
    ) -> TemplateResponse {
        let mut response = TemplateResponse::new(self.template_name.clone(), context);
        if let Some(status) = overrides.status {
            response.status = status;
        }
        response
    }

    /// Render `context` in the given mode.
    pub async fn render_to_response(
        &self,
        state: &AppState,
        mode: OutputMode,
        context: TemplateContext,
        overrides: ResponseOverrides,
    ) -> anyhow::Result<Response> {
        match mode {
            OutputMode::Html => self
                .html_response(context, &overrides)
                .render(state.renderer.templates()),
            OutputMode::Pdf => {
                let pdf = self
                    .pdf_response(context, overrides)
                    .render(&state.renderer)
                    .await?;
                Ok(pdf.into_response())
            }
        }
    }

    /// Handle a GET request.
    pub async fn get(&self, state: &AppState, mode: OutputMode) -> RouteResult<Response> {
        let context = self.get_context_data(state).or_internal_error()?;
        self.render_to_response(state, mode, context, ResponseOverrides::default())
            .await
            .or_internal_error()
    }

    /// Mount this view as a GET route.
    pub fn into_route(self) -> MethodRouter<Arc<AppState>> {
        let view = Arc::new(self);
        get(
            move |State(state): State<Arc<AppState>>, RawQuery(query): RawQuery| {
                let view = Arc::clone(&view);
                async move {
                    view.get(&state, OutputMode::from_query(query.as_deref()))
                        .await
                }
            },
        )
    }
}
