//! Renderer capability
//!
//! A renderer lays resolved markup out into a paginated PDF. Each request
//! launches its own session; a session owns whatever the engine needs
//! (processes, scratch files) and releases it when dropped, so an error or a
//! timeout anywhere in the request still cleans up.

use crate::types::{PageFormat, Result};
use std::future::Future;

pub trait Renderer {
    type Session: RenderSession;

    /// Acquire a session for one request
    fn launch(&self) -> impl Future<Output = Result<Self::Session>> + Send;
}

pub trait RenderSession: Send {
    /// Render `markup` into PDF bytes.
    ///
    /// Must not resolve before layout is complete, including images fetched
    /// from the network.
    fn render(
        &mut self,
        markup: &str,
        format: &PageFormat,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
