//! Integration tests for the PDF views
//!
//! Requests go through the axum router with a converter that echoes its
//! input, so responses can be checked without wkhtmltopdf installed.

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::State,
    http::{Request, StatusCode, header},
    response::Response,
    routing::get,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tower::ServiceExt;

use wkpdf_core::{
    CmdOptions, Error, PdfConverter, PdfRenderer, Result, TempFileOptions, TeraTemplates,
};
use wkpdf_web::helpers::{ResultExt, RouteResult};
use wkpdf_web::response::{HTML_CONTENT_TYPE, PDF_CONTENT_TYPE};
use wkpdf_web::{
    AppState, MountedView, OutputMode, PdfTemplateView, ResponseOverrides, SiteResolver,
};

// =============================================================================
// Test Doubles
// =============================================================================

/// Returns a fake PDF made of the body HTML followed by the command line.
struct EchoConverter {
    fail: bool,
}

impl PdfConverter for EchoConverter {
    fn convert(&self, pages: &[&Path], options: &CmdOptions) -> Result<Vec<u8>> {
        if self.fail {
            return Err(Error::ConversionFailed {
                status: Some(1),
                stderr: "Exit with code 1 due to network error".to_string(),
            });
        }

        let mut out = String::from("%PDF-echo\n");
        for page in pages {
            out.push_str(&std::fs::read_to_string(page)?);
            out.push('\n');
        }
        out.push_str(&options.to_args().join(" "));
        Ok(out.into_bytes())
    }
}

/// Site resolver that counts lookups.
struct CountingSite {
    lookups: AtomicUsize,
}

impl SiteResolver for CountingSite {
    fn current_domain(&self) -> Result<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok("testserver".to_string())
    }
}

// =============================================================================
// Helpers
// =============================================================================

const REPORT: &str = r#"<h1>{{ title | default(value="Report") }}</h1>
<img src="{{ STATIC_URL | safe }}logo.png">
<a href="{{ MEDIA_URL | safe }}doc.txt">doc</a>"#;

struct Harness {
    state: Arc<AppState>,
    site: Arc<CountingSite>,
    tmp: TempDir,
}

fn harness(static_url: &str, media_url: &str, fail: bool) -> Harness {
    let tmp = TempDir::new().unwrap();
    let templates = TeraTemplates::from_raw([
        ("report.html", REPORT),
        ("header.html", "<div>header</div>"),
    ])
    .unwrap();

    let renderer = PdfRenderer::new(Arc::new(templates), Arc::new(EchoConverter { fail }))
        .with_temp_files(TempFileOptions {
            dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        });

    let site_config = wkpdf_core::SiteConfig {
        domain: "unused.example".to_string(),
        static_url: static_url.to_string(),
        media_url: media_url.to_string(),
    };
    let site = Arc::new(CountingSite {
        lookups: AtomicUsize::new(0),
    });
    let state = AppState::new(renderer, site_config)
        .with_site_resolver(Arc::clone(&site) as Arc<dyn SiteResolver>);

    Harness {
        state: Arc::new(state),
        site,
        tmp,
    }
}

fn app(h: &Harness, view: PdfTemplateView) -> Router {
    wkpdf_web::router(Arc::clone(&h.state), [MountedView::new("/report", view)])
}

async fn send(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

// =============================================================================
// Output Mode
// =============================================================================

#[tokio::test]
async fn test_default_is_pdf_attachment() {
    let h = harness("/static/", "/media/", false);
    let response = send(app(&h, PdfTemplateView::new("report.html")), "/report").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], PDF_CONTENT_TYPE);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"rendered_pdf.pdf\""
    );
    assert!(body_text(response).await.starts_with("%PDF-echo"));
}

#[tokio::test]
async fn test_as_html_renders_template() {
    let h = harness("/static/", "/media/", false);
    let response = send(app(&h, PdfTemplateView::new("report.html")), "/report?as=html").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], HTML_CONTENT_TYPE);
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());

    let body = body_text(response).await;
    assert!(body.starts_with("<h1>Report</h1>"));
    assert!(!body.contains("%PDF"));
}

#[tokio::test]
async fn test_other_as_values_render_pdf() {
    let h = harness("/static/", "/media/", false);
    let response = send(app(&h, PdfTemplateView::new("report.html")), "/report?as=pdf").await;

    assert_eq!(response.headers()[header::CONTENT_TYPE], PDF_CONTENT_TYPE);
}

#[tokio::test]
async fn test_unrelated_bad_parameters_do_not_fail_request() {
    let h = harness("/static/", "/media/", false);

    let response = send(
        app(&h, PdfTemplateView::new("report.html")),
        "/report?x=%ff%fe&as=html",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], HTML_CONTENT_TYPE);

    let response = send(app(&h, PdfTemplateView::new("report.html")), "/report?x=%ff&y").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], PDF_CONTENT_TYPE);
}

#[tokio::test]
async fn test_inline_view_has_no_disposition() {
    let h = harness("/static/", "/media/", false);
    let view = PdfTemplateView::new("report.html").with_filename(None);
    let response = send(app(&h, view), "/report").await;

    assert_eq!(response.headers()[header::CONTENT_TYPE], PDF_CONTENT_TYPE);
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
}

// =============================================================================
// Context
// =============================================================================

#[tokio::test]
async fn test_relative_asset_urls_made_absolute() {
    let h = harness("/static/", "/media/", false);
    let response = send(app(&h, PdfTemplateView::new("report.html")), "/report").await;
    let body = body_text(response).await;

    assert!(body.contains(r#"src="http://testserver/static/logo.png""#));
    assert!(body.contains(r#"href="http://testserver/media/doc.txt""#));
    assert_eq!(h.site.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_absolute_asset_urls_untouched() {
    let h = harness("https://cdn.example.net/s/", "http://media.example.net/", false);
    let response = send(app(&h, PdfTemplateView::new("report.html")), "/report").await;
    let body = body_text(response).await;

    assert!(body.contains(r#"src="https://cdn.example.net/s/logo.png""#));
    assert!(body.contains(r#"href="http://media.example.net/doc.txt""#));
    assert_eq!(h.site.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_extra_context_reaches_template() {
    let h = harness("/static/", "/media/", false);
    let view = PdfTemplateView::new("report.html").with_context_value("title", "Quarterly");
    let response = send(app(&h, view), "/report?as=html").await;

    assert!(body_text(response).await.contains("<h1>Quarterly</h1>"));
}

// =============================================================================
// Options and Artifacts
// =============================================================================

#[tokio::test]
async fn test_view_options_and_header_reach_converter() {
    let h = harness("/static/", "/media/", false);
    let view = PdfTemplateView::new("report.html")
        .with_header("header.html")
        .with_cmd_options(CmdOptions::new().with("page_size", "A4"));
    let body = body_text(send(app(&h, view), "/report").await).await;

    assert!(body.contains("--page-size A4"));
    assert!(body.contains("--header-html "));
    assert!(files_in(h.tmp.path()).is_empty());
}

#[tokio::test]
async fn test_converter_failure_is_500_without_html_fallback() {
    let h = harness("/static/", "/media/", true);
    let response = send(app(&h, PdfTemplateView::new("report.html")), "/report").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    let body = body_text(response).await;
    assert!(body.contains("network error"));
    assert!(!body.contains("<h1>"));
    assert!(files_in(h.tmp.path()).is_empty());
}

#[tokio::test]
async fn test_missing_template_is_500() {
    let h = harness("/static/", "/media/", false);
    let response = send(app(&h, PdfTemplateView::new("missing.html")), "/report?as=html").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_modes_are_independent() {
    let h = harness("/static/", "/media/", false);
    let app = app(&h, PdfTemplateView::new("report.html"));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            let html = i % 2 == 0;
            tokio::spawn(async move {
                let uri = if html { "/report?as=html" } else { "/report" };
                let response = send(app, uri).await;
                (html, response.headers()[header::CONTENT_TYPE].clone())
            })
        })
        .collect();

    for handle in handles {
        let (html, content_type) = handle.await.unwrap();
        let expected = if html { HTML_CONTENT_TYPE } else { PDF_CONTENT_TYPE };
        assert_eq!(content_type, expected);
    }
    assert!(files_in(h.tmp.path()).is_empty());
}

/// Handler that adds a per-request option on top of the view defaults.
async fn landscape(
    State((state, view)): State<(Arc<AppState>, Arc<PdfTemplateView>)>,
) -> RouteResult<Response> {
    let mut options = view.cmd_options();
    options.set("orientation", "landscape");

    let context = view.get_context_data(&state).or_internal_error()?;
    let overrides = ResponseOverrides {
        filename: Some(Some("landscape.pdf".to_string())),
        cmd_options: Some(options),
        status: None,
    };
    view.render_to_response(&state, OutputMode::Pdf, context, overrides)
        .await
        .or_internal_error()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_request_overrides_do_not_leak() {
    let h = harness("/static/", "/media/", false);
    let view = Arc::new(
        PdfTemplateView::new("report.html")
            .with_cmd_options(CmdOptions::new().with("page_size", "A4")),
    );
    let app = Router::new()
        .route("/landscape", get(landscape))
        .with_state((Arc::clone(&h.state), Arc::clone(&view)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { send(app, "/landscape").await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"landscape.pdf\""
        );
        let body = body_text(response).await;
        assert!(body.contains("--orientation landscape"));
        assert!(body.contains("--page-size A4"));
    }

    assert!(!view.cmd_options().contains("orientation"));
    assert_eq!(view.filename(), Some("rendered_pdf.pdf"));
}

#[tokio::test]
async fn test_render_to_response_with_view_context() {
    let h = harness("https://cdn.example.net/", "https://cdn.example.net/m/", false);
    let view = PdfTemplateView::new("report.html").with_context_value("title", "Direct");

    let context = view.get_context_data(&h.state).unwrap();
    let overrides = ResponseOverrides {
        status: Some(StatusCode::ACCEPTED),
        ..Default::default()
    };
    let response = view
        .render_to_response(&h.state, OutputMode::Html, context, overrides)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()[header::CONTENT_TYPE], HTML_CONTENT_TYPE);
    let body = body_text(response).await;
    assert!(body.starts_with("<h1>Direct</h1>"));
    assert!(body.contains(r#"src="https://cdn.example.net/logo.png""#));
    assert!(body.contains(r#"href="https://cdn.example.net/m/doc.txt""#));
    assert_eq!(h.site.lookups.load(Ordering::SeqCst), 0);
}
