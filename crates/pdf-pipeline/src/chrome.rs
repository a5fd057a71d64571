//! Headless Chromium renderer
//!
//! Every session gets a private scratch directory holding the markup, the
//! printed PDF and the browser profile. The directory is removed when the
//! session is dropped and a browser still running at that point is killed.

use crate::options::DEFAULT_VIRTUAL_TIME_BUDGET_MS;
use crate::render::{RenderSession, Renderer};
use crate::types::*;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;

/// Binaries tried by [`ChromeRenderer::detect`], in order
const CANDIDATE_BINARIES: [&str; 5] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

const MARKUP_FILE: &str = "document.html";
const OUTPUT_FILE: &str = "document.pdf";
const PROFILE_DIR: &str = "profile";

#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    binary: PathBuf,
    virtual_time_budget_ms: u64,
    extra_args: Vec<String>,
}

impl ChromeRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            virtual_time_budget_ms: DEFAULT_VIRTUAL_TIME_BUDGET_MS,
            extra_args: Vec::new(),
        }
    }

    /// Find a Chromium-family browser on `PATH`
    pub fn detect() -> Option<Self> {
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .flat_map(|dir| CANDIDATE_BINARIES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
            .map(Self::new)
    }

    /// Extra command line flags, e.g. `--no-sandbox` inside containers
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_virtual_time_budget_ms(mut self, budget_ms: u64) -> Self {
        self.virtual_time_budget_ms = budget_ms;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn virtual_time_budget_ms(&self) -> u64 {
        self.virtual_time_budget_ms
    }
}

impl Renderer for ChromeRenderer {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        let workdir = tempfile::Builder::new()
            .prefix("pdf-pipeline-")
            .tempdir()?;
        log::debug!("Render session in {}", workdir.path().display());
        Ok(ChromeSession {
            workdir,
            renderer: self.clone(),
        })
    }
}

pub struct ChromeSession {
    workdir: TempDir,
    renderer: ChromeRenderer,
}

impl ChromeSession {
    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    fn command(&self, markup_url: &str, output_path: &Path) -> Command {
        let mut cmd = Command::new(&self.renderer.binary);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-pdf-header-footer")
            .arg("--run-all-compositor-stages-before-draw")
            .arg(format!(
                "--virtual-time-budget={}",
                self.renderer.virtual_time_budget_ms
            ))
            .arg(format!(
                "--user-data-dir={}",
                self.workdir.path().join(PROFILE_DIR).display()
            ))
            .arg(format!("--print-to-pdf={}", output_path.display()))
            .args(&self.renderer.extra_args)
            .arg(markup_url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl RenderSession for ChromeSession {
    async fn render(&mut self, markup: &str, format: &PageFormat) -> Result<Vec<u8>> {
        let markup_path = self.workdir.path().join(MARKUP_FILE);
        let output_path = self.workdir.path().join(OUTPUT_FILE);
        tokio::fs::write(&markup_path, with_page_style(markup, format)).await?;
        let url = markup_url(&markup_path)?;

        let output = self
            .command(&url, &output_path)
            .output()
            .await
            .map_err(|e| {
                PipelineError::RenderFailure(format!(
                    "cannot start {}: {}",
                    self.renderer.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::RenderFailure(format!(
                "{} exited with {}: {}",
                self.renderer.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
            PipelineError::RenderFailure(format!("browser produced no PDF: {}", e))
        })?;
        tokio::fs::remove_file(&output_path).await?;

        log::debug!("Rendered {} bytes of PDF", bytes.len());
        Ok(bytes)
    }
}

/// `file://` URL for the markup file, percent-encoded
fn markup_url(path: &Path) -> Result<String> {
    url::Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| {
            PipelineError::RenderFailure(format!(
                "cannot build a file URL for {}",
                path.display()
            ))
        })
}

/// Insert the `@page` rule for `format` at the start of the document head
fn with_page_style(markup: &str, format: &PageFormat) -> String {
    let mut style = format!(
        "<style>@page {{ size: {}; }}",
        format.css_page_size()
    );
    if format.print_background {
        style.push_str(
            " html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }",
        );
    }
    style.push_str("</style>");

    match find_head_end(markup) {
        Some(pos) => {
            let mut out = String::with_capacity(markup.len() + style.len());
            out.push_str(&markup[..pos]);
            out.push_str(&style);
            out.push_str(&markup[pos..]);
            out
        }
        None => format!("{}{}", style, markup),
    }
}

/// Byte offset just past the opening `<head ...>` tag
fn find_head_end(markup: &str) -> Option<usize> {
    let lower = markup.to_ascii_lowercase();
    let mut from = 0;
    while let Some(offset) = lower[from..].find("<head") {
        let start = from + offset;
        let after = start + "<head".len();
        match lower.as_bytes().get(after) {
            Some(b'>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() => {
                return lower[after..].find('>').map(|end| after + end + 1);
            }
            _ => from = after,
        }
    }
    None
}
