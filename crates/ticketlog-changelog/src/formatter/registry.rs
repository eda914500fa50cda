//! Formatter registry

use std::sync::Arc;

use super::{ChangelogFormatter, JsonFormatter, MarkdownFormatter, SlackFormatter};

/// Registry of available changelog formatters
pub struct FormatterRegistry {
    formatters: Vec<Arc<dyn ChangelogFormatter>>,
}

impl FormatterRegistry {
    /// Create a new registry with all built-in formatters
    pub fn new() -> Self {
        Self {
            formatters: vec![
                Arc::new(MarkdownFormatter::new()),
                Arc::new(SlackFormatter::new()),
                Arc::new(JsonFormatter::new()),
            ],
        }
    }

    /// Get formatter by name or file extension
    pub fn get(&self, format: &str) -> Option<Arc<dyn ChangelogFormatter>> {
        self.formatters
            .iter()
            .find(|f| f.name() == format || f.extension() == format)
            .cloned()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
