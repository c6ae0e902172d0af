//! EnmlService - options-holding entry point for both directions.

use crate::options::ConvertOptions;
use crate::{forward, reverse, Result};

/// Converter bound to one validated set of options
#[derive(Debug, Clone, Default)]
pub struct EnmlService {
    options: ConvertOptions,
}

impl EnmlService {
    /// Create an EnmlService with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an EnmlService with custom options
    pub fn with_options(options: ConvertOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Convert HTML to ENML
    pub fn to_storage_format(&self, markup: impl AsRef<[u8]>) -> Result<String> {
        forward::to_storage_format(markup, &self.options)
    }

    /// Convert ENML to HTML, indenting when the options ask for it
    pub fn to_markup_format(&self, storage: impl AsRef<[u8]>) -> Result<String> {
        reverse::to_markup_format(storage, self.options.pretty, &self.options)
    }

    /// Get the current options
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }
}
