//! wkpdf - render a template to PDF from the command line.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;
use wkpdf_core::{AppConfig, CmdOptions, OptionValue, RenderRequest, TemplateContext};

#[derive(Parser, Debug)]
#[command(name = "wkpdf")]
#[command(author, version, about = "Render templates to PDF with wkhtmltopdf", long_about = None)]
struct Args {
    /// Template to render, relative to the template directory
    #[arg(required = true)]
    template: String,

    /// Output file (default: <template stem>.pdf, or .html with --html)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Template directory (overrides the config file)
    #[arg(long = "templates")]
    template_dir: Option<PathBuf>,

    /// JSON file with the template context (must hold an object)
    #[arg(long)]
    context: Option<PathBuf>,

    /// Template for the page header
    #[arg(long)]
    header_template: Option<String>,

    /// Template for the page footer
    #[arg(long)]
    footer_template: Option<String>,

    /// wkhtmltopdf option, e.g. `-O page-size=A4` or `-O grayscale`
    #[arg(short = 'O', long = "option", value_name = "NAME[=VALUE]", value_parser = parse_option)]
    options: Vec<(String, OptionValue)>,

    /// Render HTML instead of PDF
    #[arg(long)]
    html: bool,

    /// Keep the rendered HTML files on disk
    #[arg(long)]
    debug: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_option(s: &str) -> Result<(String, OptionValue), String> {
    let (name, value) = CmdOptions::parse_pair(s);
    if name.is_empty() {
        return Err(format!("missing option name in '{s}'"));
    }
    Ok((name, value))
}

fn load_context(path: &Path) -> Result<TemplateContext> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file {}", path.display()))?;
    parse_context(&content).with_context(|| format!("Invalid context file {}", path.display()))
}

fn parse_context(content: &str) -> Result<TemplateContext> {
    match serde_json::from_str(content)? {
        Value::Object(map) => Ok(map),
        other => bail!("expected a JSON object, got {other}"),
    }
}

fn default_output(template: &str, html: bool) -> PathBuf {
    let stem = Path::new(template)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    PathBuf::from(format!("{stem}.{}", if html { "html" } else { "pdf" }))
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    let mut config = config
        .with_env_overrides()
        .context("Failed to apply environment overrides")?;

    if let Some(dir) = args.template_dir {
        config.template_dir = dir;
    }
    if args.debug {
        config.wkhtmltopdf.debug = true;
    }

    let context = match &args.context {
        Some(path) => load_context(path)?,
        None => TemplateContext::new(),
    };

    let renderer = wkpdf_core::renderer_from_config(&config).with_context(|| {
        format!("Failed to load templates from {}", config.template_dir.display())
    })?;

    let output_path = args
        .output
        .unwrap_or_else(|| default_output(&args.template, args.html));

    if args.html {
        let html = renderer
            .templates()
            .render(&args.template, &context)
            .with_context(|| format!("Failed to render {}", args.template))?;
        std::fs::write(&output_path, html)
            .with_context(|| format!("Failed to write output: {}", output_path.display()))?;
    } else {
        let mut request = RenderRequest::new(&args.template)
            .with_context(context)
            .with_cmd_options(args.options.into_iter().collect());
        request.header_template = args.header_template;
        request.footer_template = args.footer_template;

        info!("Rendering {} ({} templates)", args.template, request.template_count());
        let pdf = renderer
            .render(&request)
            .with_context(|| format!("Failed to render {} to PDF", args.template))?;
        std::fs::write(&output_path, pdf)
            .with_context(|| format!("Failed to write output: {}", output_path.display()))?;
    }

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Saved to: {}", output_path.display());
    }

    Ok(())
}
