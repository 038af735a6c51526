//! Lazy, memoized dataset loading.
//!
//! A [`LazyDataset`] wraps a [`DatasetSource`] and parses its JSON at most
//! once until it is marked dirty. Object-storage or network sources plug in
//! by implementing the trait.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::dataset::{Dataset, DatasetError};

/// Errors raised while loading a dataset.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source failed to produce raw text.
    #[error("failed to read dataset from {location}: {message}")]
    Read {
        /// Where the source attempted to read.
        location: String,
        /// Failure description.
        message: String,
    },

    /// The raw text is not a valid dataset.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl SourceError {
    /// Create a read error.
    pub fn read(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Provider of raw dataset JSON.
pub trait DatasetSource {
    /// Human-readable location, used in logs and errors.
    fn location(&self) -> &str;

    /// Read the raw JSON text.
    ///
    /// `Ok(None)` means no location is configured; the loader then yields an
    /// empty dataset rather than an error.
    fn read(&self) -> Result<Option<String>, SourceError>;
}

/// In-memory source holding JSON text.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    location: String,
    text: Option<String>,
}

impl StaticSource {
    /// Create a source serving the given JSON text.
    pub fn new(location: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            text: Some(text.into()),
        }
    }

    /// Create a source with nothing configured.
    pub fn unset() -> Self {
        Self::default()
    }

    /// Replace the served text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }
}

impl DatasetSource for StaticSource {
    fn location(&self) -> &str {
        &self.location
    }

    fn read(&self) -> Result<Option<String>, SourceError> {
        Ok(self.text.clone())
    }
}

/// Memoizing wrapper that parses a source on demand.
#[derive(Debug)]
pub struct LazyDataset<S> {
    source: S,
    cached: Option<Arc<Dataset>>,
    dirty: bool,
}

impl<S: DatasetSource> LazyDataset<S> {
    /// Wrap a source. Nothing is read until [`LazyDataset::get`].
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: None,
            dirty: false,
        }
    }

    /// Return the cached dataset, loading it if absent, dirty, or empty.
    pub fn get(&mut self) -> Result<Arc<Dataset>, SourceError> {
        if let Some(cached) = &self.cached {
            if !self.dirty && cached.total_points() > 0 {
                trace!(location = self.source.location(), "dataset cache hit");
                return Ok(Arc::clone(cached));
            }
        }

        debug!(
            location = self.source.location(),
            dirty = self.dirty,
            "loading dataset"
        );
        let dataset = match self.source.read()? {
            Some(text) => Dataset::from_json_str(&text)?,
            None => Dataset::empty(),
        };
        let dataset = Arc::new(dataset);
        self.cached = Some(Arc::clone(&dataset));
        self.dirty = false;
        Ok(dataset)
    }

    /// Force the next [`LazyDataset::get`] to reload.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the next access reloads.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Access the wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Access the wrapped source mutably. Marks the cache dirty.
    pub fn source_mut(&mut self) -> &mut S {
        self.dirty = true;
        &mut self.source
    }
}
