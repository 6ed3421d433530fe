//! Rendering templates into temporary files.
//!
//! wkhtmltopdf reads its input from paths, so every template role (body,
//! header, footer) is rendered into its own named temporary file. The file
//! is removed when its [`RenderedFile`] is dropped, unless it was created
//! with retention enabled for debugging.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;
use crate::templates::{TemplateContext, TemplateSource};

/// Prefix of every temporary file created by the renderer.
pub const TEMP_PREFIX: &str = "wkhtmltopdf";
/// Suffix of every temporary file; wkhtmltopdf sniffs the type from it.
pub const TEMP_SUFFIX: &str = ".html";

/// Where and how temporary files are created.
#[derive(Debug, Clone)]
pub struct TempFileOptions {
    pub prefix: String,
    pub suffix: String,
    /// Directory for the files (system temp dir if `None`)
    pub dir: Option<PathBuf>,
    /// Keep the file on disk after it is dropped
    pub retain: bool,
}

impl Default for TempFileOptions {
    fn default() -> Self {
        Self {
            prefix: TEMP_PREFIX.to_string(),
            suffix: TEMP_SUFFIX.to_string(),
            dir: None,
            retain: false,
        }
    }
}

impl TempFileOptions {
    fn create(&self) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder
            .prefix(&self.prefix)
            .suffix(&self.suffix)
            .keep(self.retain);
        match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

/// A rendered template on disk.
#[derive(Debug)]
pub struct RenderedFile {
    file: NamedTempFile,
    retained: bool,
}

impl RenderedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub const fn is_retained(&self) -> bool {
        self.retained
    }
}

impl Drop for RenderedFile {
    fn drop(&mut self) {
        if self.retained {
            warn!("Keeping rendered template at {}", self.file.path().display());
        } else {
            debug!("Removing rendered template {}", self.file.path().display());
        }
    }
}

/// Render `template_name` with `context` into a new temporary file.
///
/// The content is flushed before returning, so the path can be handed to
/// another process right away. If writing fails the partial file is dropped
/// (and removed, unless retained) before the error is returned.
pub fn render_to_temporary_file(
    templates: &dyn TemplateSource,
    template_name: &str,
    context: &TemplateContext,
    options: &TempFileOptions,
) -> Result<RenderedFile> {
    let content = templates.render(template_name, context)?;
    write_temporary_file(content.as_bytes(), options)
}

/// Write `content` into a new temporary file.
pub fn write_temporary_file(content: &[u8], options: &TempFileOptions) -> Result<RenderedFile> {
    let rendered = fill_temporary_file(options, |file| {
        file.write_all(content)?;
        file.flush()
    })?;

    debug!("Wrote {} bytes to {}", content.len(), rendered.path().display());
    Ok(rendered)
}

/// Create a temporary file and fill it with `write`.
fn fill_temporary_file<F>(options: &TempFileOptions, write: F) -> Result<RenderedFile>
where
    F: FnOnce(&mut NamedTempFile) -> std::io::Result<()>,
{
    let mut file = options.create()?;

    // `file` is dropped on the error path, which removes it unless retained.
    write(&mut file)?;

    Ok(RenderedFile {
        file,
        retained: options.retain,
    })
}
