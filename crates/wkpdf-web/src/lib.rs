//! wkpdf-web - axum integration for wkhtmltopdf rendering.
//!
//! Serve templates as PDF downloads (or inline PDFs) and, with `?as=html`,
//! as plain HTML for template development.

pub mod helpers;
pub mod response;
pub mod site;
pub mod state;
pub mod view;

use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub use response::{PdfResponse, PdfTemplateResponse, TemplateResponse};
pub use site::{SiteResolver, StaticSite};
pub use state::AppState;
pub use view::{OutputMode, PdfTemplateView, ResponseOverrides};

/// A view mounted at a URL path.
#[derive(Debug, Clone, Deserialize)]
pub struct MountedView {
    /// Route path, e.g. `/invoice`
    pub path: String,

    #[serde(flatten)]
    pub view: PdfTemplateView,
}

impl MountedView {
    pub fn new(path: impl Into<String>, view: PdfTemplateView) -> Self {
        Self {
            path: path.into(),
            view,
        }
    }
}

/// Build a router serving `views` over `state`.
pub fn router(state: Arc<AppState>, views: impl IntoIterator<Item = MountedView>) -> Router {
    let app = views.into_iter().fold(Router::new(), |app, mounted| {
        debug!("Mounting {} at {}", mounted.view.template_name, mounted.path);
        app.route(&mounted.path, mounted.view.into_route())
    });

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
