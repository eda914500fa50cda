//! JSON changelog formatter

use ticketlog_core::config::ChangelogConfig;
use ticketlog_core::error::Result;

use super::ChangelogFormatter;
use crate::template::TemplateData;

/// Pretty-printed JSON of the template data
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

impl ChangelogFormatter for JsonFormatter {
    fn format(&self, data: &TemplateData, _config: &ChangelogConfig) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    fn name(&self) -> &'static str {
        "json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
