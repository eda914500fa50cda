//! Ticketlog Git - Commit log source for ticket-correlated changelogs
//!
//! This crate reads commit history for a [`Range`](ticketlog_core::Range)
//! using libgit2 and exposes it through the [`CommitSource`] trait.

mod commits;
mod repository;
mod source;
pub mod types;

pub use repository::{GitRepo, Result};
pub use source::CommitSource;
pub use types::RawCommit;
