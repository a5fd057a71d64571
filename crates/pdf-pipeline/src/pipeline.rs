//! End-to-end request handling
//!
//! 1. Read the template and resolve tokens
//! 2. Render the markup in a fresh session, bounded by the render timeout
//! 3. Read the addendum and assemble
//!
//! Resources are read per request and never modified. Nothing partial is
//! ever returned: any stage failing fails the request.

use crate::options::PipelineOptions;
use crate::render::{RenderSession, Renderer};
use crate::types::*;
use pdf_template::{ReplacementSet, parse_request, resolve_with};
use std::path::Path;
use std::time::Duration;

/// Run the pipeline for a raw `{"replacements": [...]}` request body
pub async fn run_request<R: Renderer>(
    renderer: &R,
    options: &PipelineOptions,
    body: &serde_json::Value,
) -> Result<AssembledDocument> {
    let replacements = parse_request(body)?;
    run(renderer, options, &replacements).await
}

/// Run the pipeline for an already validated replacement set
pub async fn run<R: Renderer>(
    renderer: &R,
    options: &PipelineOptions,
    replacements: &ReplacementSet,
) -> Result<AssembledDocument> {
    options.validate()?;

    let template = read_resource(&options.template).await?;
    let template = String::from_utf8(template).map_err(|e| PipelineError::Resource {
        path: options.template.clone(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    let markup = resolve_with(&template, replacements, &options.substitution)?;
    log::info!(
        "Resolved {} replacement(s) into {} bytes of markup",
        replacements.len(),
        markup.len()
    );

    let rendered = render_markup(
        renderer,
        &markup,
        &options.page_format,
        options.render_timeout(),
    )
    .await?;

    let addendum = tokio::fs::read(&options.addendum).await.map_err(|e| {
        PipelineError::MissingAddendum(format!("{}: {}", options.addendum.display(), e))
    })?;

    let assembled = pdf_assemble::assemble(rendered, addendum).await?;

    Ok(AssembledDocument {
        bytes: assembled.bytes,
        filename: options.output_filename.clone(),
        page_count: assembled.page_count,
    })
}

/// Launch a session, render, and release the session.
///
/// The timeout covers both launching and rendering. The session is dropped
/// before this returns on every path, including the timeout.
pub async fn render_markup<R: Renderer>(
    renderer: &R,
    markup: &str,
    format: &PageFormat,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let render = async {
        let mut session = renderer.launch().await?;
        session.render(markup, format).await
    };

    match tokio::time::timeout(timeout, render).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("Renderer exceeded {:?}", timeout);
            Err(PipelineError::RenderTimeout(timeout))
        }
    }
}

async fn read_resource(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| PipelineError::Resource {
            path: path.to_owned(),
            source,
        })
}
