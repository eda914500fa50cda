//! Changelog formatters

mod json;
mod markdown;
mod registry;
mod slack;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use registry::FormatterRegistry;
pub use slack::SlackFormatter;

use ticketlog_core::config::ChangelogConfig;
use ticketlog_core::error::Result;

use crate::template::TemplateData;

/// Trait for changelog formatters
pub trait ChangelogFormatter: Send + Sync {
    /// Render template data to a document
    fn format(&self, data: &TemplateData, config: &ChangelogConfig) -> Result<String>;

    /// Format name as used in configuration
    fn name(&self) -> &'static str;

    /// Get the file extension for this format
    fn extension(&self) -> &'static str;
}

/// Document heading, with the release label when set
pub(crate) fn document_heading(data: &TemplateData) -> String {
    match &data.release {
        Some(release) => format!("{} - {}", data.title, release),
        None => data.title.clone(),
    }
}
