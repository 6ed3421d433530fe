//! The external conversion process.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::config::WkhtmltopdfConfig;
use crate::error::{Error, Result};
use crate::options::CmdOptions;

/// Output target meaning "write the PDF to stdout".
const STDOUT: &str = "-";

/// Trait for HTML to PDF converters
pub trait PdfConverter: Send + Sync {
    /// Convert the given HTML pages into a single PDF and return its bytes.
    fn convert(&self, pages: &[&Path], options: &CmdOptions) -> Result<Vec<u8>>;
}

/// Runs the `wkhtmltopdf` binary.
#[derive(Debug, Clone)]
pub struct Wkhtmltopdf {
    /// Program followed by any fixed arguments
    cmd: Vec<String>,
    /// Options applied to every call, overridden per call
    default_options: CmdOptions,
    /// Extra environment for the child process
    env: BTreeMap<String, String>,
}

impl Default for Wkhtmltopdf {
    fn default() -> Self {
        Self::from_config(&WkhtmltopdfConfig::default())
    }
}

impl Wkhtmltopdf {
    pub fn new(cmd: &str) -> Self {
        Self {
            cmd: cmd.split_whitespace().map(str::to_string).collect(),
            default_options: CmdOptions::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &WkhtmltopdfConfig) -> Self {
        Self {
            default_options: config.cmd_options.clone(),
            env: config.env.clone(),
            ..Self::new(&config.cmd)
        }
    }

    #[must_use]
    pub fn with_default_options(mut self, options: CmdOptions) -> Self {
        self.default_options = options;
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Full argument list (excluding the program) for a conversion.
    pub fn args(&self, pages: &[&Path], options: &CmdOptions, output: &OsString) -> Vec<OsString> {
        let options = self.default_options.merged(options);

        self.cmd
            .iter()
            .skip(1)
            .map(OsString::from)
            .chain(options.to_args().into_iter().map(OsString::from))
            .chain(pages.iter().map(|p| p.as_os_str().to_os_string()))
            .chain(std::iter::once(output.clone()))
            .collect()
    }

    /// Build the process invocation without running it.
    pub fn command(&self, pages: &[&Path], options: &CmdOptions, output: &OsString) -> Result<Command> {
        let program = self.cmd.first().ok_or(Error::ConversionMissingCommand)?;

        let mut command = Command::new(program);
        command
            .args(self.args(pages, options, output))
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(command)
    }

    fn run(&self, pages: &[&Path], options: &CmdOptions, output: &OsString) -> Result<Vec<u8>> {
        let mut command = self.command(pages, options, output)?;
        debug!("Running {:?}", command);

        let output = command.output().map_err(|source| Error::ConversionSpawn {
            cmd: self.cmd.join(" "),
            source,
        })?;

        if !output.status.success() {
            return Err(Error::ConversionFailed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        if !output.stderr.is_empty() {
            debug!("wkhtmltopdf: {}", String::from_utf8_lossy(&output.stderr).trim_end());
        }

        Ok(output.stdout)
    }

    /// Convert `pages` and write the PDF to `output` instead of stdout.
    pub fn convert_to_file(
        &self,
        pages: &[&Path],
        options: &CmdOptions,
        output: impl Into<PathBuf>,
    ) -> Result<()> {
        let output: PathBuf = output.into();
        self.run(pages, options, &output.into_os_string())?;
        Ok(())
    }
}

impl PdfConverter for Wkhtmltopdf {
    fn convert(&self, pages: &[&Path], options: &CmdOptions) -> Result<Vec<u8>> {
        self.run(pages, options, &OsString::from(STDOUT))
    }
}
