//! wkpdf-web - serve templates as PDF documents.

use anyhow::{Context, Result, bail};
use axum::http::{HeaderValue, header};
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wkpdf_core::AppConfig;
use wkpdf_core::util::{config_dir, is_absolute_url};
use wkpdf_web::{AppState, MountedView, PdfTemplateView};

#[derive(Parser, Debug)]
#[command(name = "wkpdf-web")]
#[command(author, version, about = "Serve templates as PDF documents", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Config file (defaults to ~/.config/wkpdf/config.toml or ./config.toml)
    #[arg(short, long, env = "WKPDF_CONFIG")]
    config: Option<PathBuf>,

    /// Template directory (overrides the config file)
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// Directory served under the static URL
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Keep rendered HTML files on disk
    #[arg(long)]
    debug: bool,

    /// Mount a view, e.g. `--view /invoice=invoice.html`
    #[arg(long = "view", value_name = "PATH=TEMPLATE", value_parser = parse_view)]
    views: Vec<MountedView>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Server configuration: the shared settings plus the mounted views.
#[derive(Debug, Deserialize)]
struct WebConfig {
    #[serde(flatten)]
    app: AppConfig,

    #[serde(default)]
    views: Vec<MountedView>,
}

fn parse_view(s: &str) -> Result<MountedView, String> {
    let (path, template) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=TEMPLATE, got '{s}'"))?;
    if !path.starts_with('/') {
        return Err(format!("view path must start with '/': '{path}'"));
    }
    if template.is_empty() {
        return Err(format!("missing template for '{path}'"));
    }
    Ok(MountedView::new(path, PdfTemplateView::new(template)))
}

fn load_config(path: Option<&Path>) -> Result<WebConfig> {
    match path {
        Some(path) => read_config(path),
        None => Ok(load_default_config(&default_config_paths())),
    }
}

fn read_config(path: &Path) -> Result<WebConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: WebConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    // Validate the shared part the same way the library does
    AppConfig::from_toml(&content)?;
    Ok(config)
}

/// ~/.config/wkpdf/config.toml, then ./config.toml
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(config_dir) = config_dir() {
        paths.push(config_dir.join("wkpdf").join("config.toml"));
    }
    paths.push(PathBuf::from("config.toml"));
    paths
}

/// First readable config among `candidates`, or defaults with no views.
fn load_default_config(candidates: &[PathBuf]) -> WebConfig {
    for path in candidates.iter().filter(|p| p.exists()) {
        match read_config(path) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                return config;
            }
            Err(e) => tracing::warn!("Failed to load {}: {:#}", path.display(), e),
        }
    }

    tracing::debug!("No config file found, using defaults");
    WebConfig {
        app: AppConfig::default(),
        views: Vec::new(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},tower_http=info")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let WebConfig { app, mut views } = load_config(args.config.as_deref())?;
    let mut app = app.with_env_overrides()?;
    if let Some(dir) = args.template_dir {
        app.template_dir = dir;
    }
    if args.debug {
        app.wkhtmltopdf.debug = true;
    }
    views.extend(args.views);

    if views.is_empty() {
        bail!("No views configured; pass --view PATH=TEMPLATE or add [[views]] to the config");
    }

    let state = Arc::new(
        AppState::from_config(&app).context("Failed to initialize application state")?,
    );

    for mounted in &views {
        info!("Serving {} at {}", mounted.view.template_name, mounted.path);
    }

    let mut router = wkpdf_web::router(state, views);

    // Relative static URLs are rewritten to this server, so serve them too
    if let Some(dir) = args.static_dir {
        let static_url = app.site.static_url.trim_end_matches('/');
        if is_absolute_url(static_url) || static_url.is_empty() {
            tracing::warn!(
                "Static URL {} is not a local path; not serving {}",
                app.site.static_url,
                dir.display()
            );
        } else {
            info!("Serving {} at {}", dir.display(), static_url);
            router = router.nest_service(
                static_url,
                ServiceBuilder::new()
                    .layer(SetResponseHeaderLayer::if_not_present(
                        header::CACHE_CONTROL,
                        HeaderValue::from_static("no-cache"),
                    ))
                    .service(ServeDir::new(dir)),
            );
        }
    }

    let router = router.layer(SetResponseHeaderLayer::if_not_present(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, max-age=0"),
    ));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
