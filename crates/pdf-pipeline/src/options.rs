use crate::types::*;
use pdf_template::{ImageBox, SubstitutionOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where templates and the addendum live unless configured otherwise
pub const DEFAULT_RESOURCE_DIR: &str = "public/templates";

/// File name of the addendum inside the resource directory
pub const ADDENDUM_FILE: &str = "addendum.pdf";

/// Virtual time the browser may spend loading before printing (ms)
pub const DEFAULT_VIRTUAL_TIME_BUDGET_MS: u64 = 10_000;

/// Predefined document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Profile {
    /// Contract: `finalLast.html`, 550×400 images
    #[default]
    Contract,
    /// Invoice: `facture.html`, 700×500 images
    Invoice,
}

impl Profile {
    pub fn template_file(self) -> &'static str {
        match self {
            Profile::Contract => "finalLast.html",
            Profile::Invoice => "facture.html",
        }
    }

    pub fn output_filename(self) -> &'static str {
        match self {
            Profile::Contract => "contrat.pdf",
            Profile::Invoice => "facture.pdf",
        }
    }

    pub fn image_box(self) -> ImageBox {
        match self {
            Profile::Contract => ImageBox::new(550, 400),
            Profile::Invoice => ImageBox::new(700, 500),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Markup template with tokens
    pub template: PathBuf,
    /// PDF whose first page is appended to every document
    pub addendum: PathBuf,
    /// Suggested download name for the result
    pub output_filename: String,
    pub substitution: SubstitutionOptions,
    pub page_format: PageFormat,
    /// Upper bound for launching the renderer and rendering
    pub render_timeout_secs: u64,
    /// Browser binary; found on `PATH` when unset
    pub chrome_binary: Option<PathBuf>,
    /// Extra browser flags
    pub chrome_args: Vec<String>,
    /// Virtual time the browser may spend loading the page before printing
    pub chrome_virtual_time_budget_ms: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::for_profile(Profile::default(), DEFAULT_RESOURCE_DIR)
    }
}

impl PipelineOptions {
    /// Options for a profile with its resources under `resource_dir`
    pub fn for_profile(profile: Profile, resource_dir: impl AsRef<Path>) -> Self {
        let resource_dir = resource_dir.as_ref();
        Self {
            template: resource_dir.join(profile.template_file()),
            addendum: resource_dir.join(ADDENDUM_FILE),
            output_filename: profile.output_filename().to_string(),
            substitution: SubstitutionOptions {
                image: profile.image_box(),
                ..Default::default()
            },
            page_format: PageFormat::default(),
            render_timeout_secs: 60,
            chrome_binary: None,
            chrome_args: Vec::new(),
            chrome_virtual_time_budget_ms: DEFAULT_VIRTUAL_TIME_BUDGET_MS,
        }
    }

    /// Load options from JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.template.as_os_str().is_empty() {
            return Err(PipelineError::Config("No template specified".to_string()));
        }
        if self.addendum.as_os_str().is_empty() {
            return Err(PipelineError::Config("No addendum specified".to_string()));
        }
        if self.output_filename.is_empty() || self.output_filename.contains(['/', '\\', '"']) {
            return Err(PipelineError::Config(format!(
                "Invalid output filename: {:?}",
                self.output_filename
            )));
        }
        if self.render_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "Render timeout must be at least one second".to_string(),
            ));
        }

        if self.chrome_virtual_time_budget_ms == 0 {
            return Err(PipelineError::Config(
                "Browser virtual time budget must be non-zero".to_string(),
            ));
        }

        let substitution = &self.substitution;
        for (name, size) in [
            ("image", substitution.image),
            ("stamp image", substitution.stamp_image),
        ] {
            if size.width_px == 0 || size.height_px == 0 {
                return Err(PipelineError::Config(format!(
                    "{} size must be non-zero",
                    name
                )));
            }
        }

        let (w, h) = self.page_format.paper.dimensions_mm();
        if w <= 0.0 || h <= 0.0 {
            return Err(PipelineError::Config(
                "Paper dimensions must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
