//! Report error types
//!
//! Layout never fails on content: oversized cells are clipped, not rejected.
//! `LayoutError` therefore only covers programming defects (illegal page
//! state transitions) and unusable configuration. `ReportError` is the
//! generation-level failure surfaced to callers; any output produced before
//! it occurred must be discarded.

use std::io;
use std::path::PathBuf;

use dossier_core::CoreError;
use thiserror::Error;

use crate::document::PageState;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Illegal page state transition on page {page}: {from:?} -> {to:?}")]
    IllegalTransition {
        page: usize,
        from: PageState,
        to: PageState,
    },

    #[error("Page {page} is {state:?}; content may not be placed on it")]
    NotWritable { page: usize, state: PageState },

    #[error("Invalid layout configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("No suitable fonts found. Searched: {searched:?}. Please install Liberation fonts.")]
    FontsNotFound { searched: Vec<PathBuf> },

    #[error("Laid-out document has no pages")]
    EmptyDocument,

    #[error("PDF rendering failed: {0}")]
    Render(#[from] genpdf::error::Error),

    #[error("Sink write failed: {0}")]
    Sink(#[from] io::Error),
}
