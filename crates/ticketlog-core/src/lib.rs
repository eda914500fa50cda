//! Ticketlog Core - Core library for ticket-correlated changelogs
//!
//! This crate provides the foundational types, error handling, configuration,
//! range resolution, release assignment and command hooks shared by the other
//! ticketlog crates.

pub mod config;
pub mod error;
pub mod hooks;
pub mod range;
pub mod release;
pub mod types;

pub use error::{ConfigError, HookError, Result, TicketlogError};
pub use hooks::{CommandReleaseGenerator, CommandTransform, Hooks, MessageTransform};
pub use range::{resolve_range, Range};
pub use release::{ReleaseAssigner, ReleaseInput, ReleaseNameGenerator};
pub use types::{ReleaseVersion, RunConfig, Ticket};
