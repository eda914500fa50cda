//! Ticketlog Changelog - Ticket extraction and changelog assembly
//!
//! This crate finds ticket references in commit messages, groups commits
//! under their resolved tickets and renders the result.

pub mod assembler;
pub mod extractor;
pub mod formatter;
pub mod template;
pub mod types;

pub use assembler::ChangelogAssembler;
pub use extractor::TicketExtractor;
pub use formatter::{ChangelogFormatter, FormatterRegistry};
pub use template::{generate_template_data, render_template, TemplateData};
pub use types::{Changelog, CommitRefs, TicketGroup};
