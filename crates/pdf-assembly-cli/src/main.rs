use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_pipeline::{ChromeRenderer, PipelineError, PipelineOptions, Profile};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pdfa", about = "Template to PDF document assembly", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the template, render it and append the addendum page
    Assemble {
        /// Request body JSON: {"replacements": [{"searchWord", "replaceWord"}, ...]}
        #[arg(short, long)]
        request: PathBuf,

        /// Output PDF file (defaults to the profile's file name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document profile
        #[arg(long, default_value = "contract", value_enum, conflicts_with = "config")]
        profile: ProfileArg,

        /// Directory holding templates and the addendum
        #[arg(long, default_value = pdf_pipeline::DEFAULT_RESOURCE_DIR, conflicts_with = "config")]
        resources: PathBuf,

        /// JSON options file (replaces --profile and --resources)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Template file
        #[arg(long)]
        template: Option<PathBuf>,

        /// Addendum PDF
        #[arg(long)]
        addendum: Option<PathBuf>,

        /// Output paper size
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,

        /// Chromium-family browser binary
        #[arg(long)]
        chrome: Option<PathBuf>,

        /// Extra browser flag (repeatable)
        #[arg(long = "chrome-arg", allow_hyphen_values = true)]
        chrome_args: Vec<String>,

        /// Render timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Time the browser may spend loading the page before printing, in milliseconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        virtual_time_budget_ms: Option<u64>,
    },

    /// Resolve tokens only and write the markup
    Resolve {
        /// Template file
        #[arg(short, long)]
        template: PathBuf,

        /// Request body JSON
        #[arg(short, long)]
        request: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Profile whose image sizes apply
        #[arg(long, default_value = "contract", value_enum)]
        profile: ProfileArg,
    },

    /// Drop trailing blank pages from a rendered PDF and append the addendum page
    Finish {
        /// Rendered PDF
        #[arg(short, long)]
        input: PathBuf,

        /// Addendum PDF
        #[arg(short, long)]
        addendum: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Contract,
    Invoice,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Contract => Self::Contract,
            ProfileArg::Invoice => Self::Invoice,
        }
    }
}

impl From<PaperArg> for pdf_pipeline::PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A4 => Self::A4,
            PaperArg::A5 => Self::A5,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
            PaperArg::Tabloid => Self::Tabloid,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            if is_client_error(&err) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn is_client_error(err: &anyhow::Error) -> bool {
    if let Some(err) = err.downcast_ref::<PipelineError>() {
        return err.is_client_error();
    }
    if let Some(err) = err.downcast_ref::<pdf_template::TemplateError>() {
        return err.is_client_error();
    }
    false
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Assemble {
            request,
            output,
            profile,
            resources,
            config,
            template,
            addendum,
            paper,
            chrome,
            chrome_args,
            timeout_secs,
            virtual_time_budget_ms,
        } => {
            let mut options = match config {
                Some(path) => PipelineOptions::load(&path)
                    .await
                    .with_context(|| format!("loading {}", path.display()))?,
                None => PipelineOptions::for_profile(profile.into(), &resources),
            };
            if let Some(template) = template {
                options.template = template;
            }
            if let Some(addendum) = addendum {
                options.addendum = addendum;
            }
            if let Some(paper) = paper {
                options.page_format.paper = paper.into();
            }
            if let Some(chrome) = chrome {
                options.chrome_binary = Some(chrome);
            }
            if let Some(timeout_secs) = timeout_secs {
                options.render_timeout_secs = timeout_secs;
            }
            if let Some(budget_ms) = virtual_time_budget_ms {
                options.chrome_virtual_time_budget_ms = budget_ms;
            }
            options.chrome_args.extend(chrome_args);

            let body = read_request(&request).await?;
            let renderer = chrome_renderer(&options)?;
            log::info!("Rendering with {}", renderer.binary().display());

            let document = pdf_pipeline::run_request(&renderer, &options, &body).await?;
            let output = output.unwrap_or_else(|| PathBuf::from(&document.filename));
            tokio::fs::write(&output, &document.bytes).await?;
            println!(
                "Assembled {} page(s) → {}",
                document.page_count,
                output.display()
            );
        }

        Commands::Resolve {
            template,
            request,
            output,
            profile,
        } => {
            let options = PipelineOptions::for_profile(profile.into(), ".");
            let body = read_request(&request).await?;
            let replacements = pdf_template::parse_request(&body)?;
            let source = tokio::fs::read_to_string(&template)
                .await
                .with_context(|| format!("reading {}", template.display()))?;
            let markup = pdf_template::resolve_with(&source, &replacements, &options.substitution)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, markup).await?;
                    println!("Resolved {} token(s) → {}", replacements.len(), path.display());
                }
                None => print!("{}", markup),
            }
        }

        Commands::Finish {
            input,
            addendum,
            output,
        } => {
            let rendered = tokio::fs::read(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            let addendum = tokio::fs::read(&addendum)
                .await
                .with_context(|| format!("reading {}", addendum.display()))?;

            let assembled = pdf_assemble::assemble(rendered, addendum).await?;
            tokio::fs::write(&output, &assembled.bytes).await?;
            println!(
                "Removed {} trailing blank page(s), {} page(s) → {}",
                assembled.blank_pages_removed,
                assembled.page_count,
                output.display()
            );
        }
    }

    Ok(())
}

async fn read_request(path: &Path) -> Result<serde_json::Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| {
        anyhow!(PipelineError::InvalidInput(format!(
            "{} is not JSON: {}",
            path.display(),
            e
        )))
    })
}

fn chrome_renderer(options: &PipelineOptions) -> Result<ChromeRenderer> {
    let renderer = match &options.chrome_binary {
        Some(binary) => ChromeRenderer::new(binary),
        None => ChromeRenderer::detect()
            .ok_or_else(|| anyhow!("no Chromium-family browser on PATH; pass --chrome"))?,
    };
    Ok(renderer
        .with_args(options.chrome_args.iter().cloned())
        .with_virtual_time_budget_ms(options.chrome_virtual_time_budget_ms))
}
