//! Commit and date range resolution
//!
//! Turns the `--range` / `--date` arguments and the configured default into a
//! single [`Range`]. Nothing here touches git or the network, so an
//! unresolvable range fails before any I/O happens.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DefaultRange;
use crate::error::{ConfigError, Result};

/// Separator between the two bounds of a range token
pub const RANGE_SEPARATOR: &str = "...";

/// Revision used when a commit range has no upper bound
pub const DEFAULT_TO: &str = "HEAD";

/// The set of commits a changelog covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Range {
    /// Commits reachable from `to` but not from `from`
    Commits { from: String, to: String },
    /// Commits made after `after` (and before `before`, if set)
    Dates {
        after: DateTime<Utc>,
        before: Option<DateTime<Utc>>,
    },
}

impl Range {
    /// Create a commit range
    pub fn commits(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Commits {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a date range
    pub fn dates(after: DateTime<Utc>, before: Option<DateTime<Utc>>) -> Self {
        Self::Dates { after, before }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commits { from, to } => write!(f, "{}{}{}", from, RANGE_SEPARATOR, to),
            Self::Dates { after, before } => match before {
                Some(before) => write!(
                    f,
                    "after {} before {}",
                    after.to_rfc3339(),
                    before.to_rfc3339()
                ),
                None => write!(f, "after {}", after.to_rfc3339()),
            },
        }
    }
}

/// Resolve the range for this run.
///
/// Precedence: explicit commit range, then date range, then the configured
/// default. Fails with [`ConfigError::NoRange`] when none of them yields a
/// bound.
pub fn resolve_range(
    cli_range: Option<&str>,
    cli_dates: Option<&str>,
    default: Option<&DefaultRange>,
) -> Result<Range> {
    if let Some(token) = non_empty(cli_range) {
        let (from, to) = split_token(token);
        let range = commit_range(token, from, to)?;
        debug!(%range, "using explicit commit range");
        return Ok(range);
    }

    if let Some(token) = non_empty(cli_dates) {
        let (after, before) = split_token(token);
        let range = date_range(token, after, before)?;
        debug!(%range, "using explicit date range");
        return Ok(range);
    }

    if let Some(default) = default.filter(|d| !d.is_empty()) {
        let range = if default.from.is_some() || default.to.is_some() {
            commit_range(
                "source_control.default_range",
                default.from.as_deref(),
                default.to.as_deref(),
            )?
        } else {
            date_range(
                "source_control.default_range",
                default.after.as_deref(),
                default.before.as_deref(),
            )?
        };
        debug!(%range, "using configured default range");
        return Ok(range);
    }

    Err(ConfigError::NoRange.into())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Split `a...b` into its bounds. A token without a separator is a lower
/// bound only.
fn split_token(token: &str) -> (Option<&str>, Option<&str>) {
    match token.split_once(RANGE_SEPARATOR) {
        Some((lower, upper)) => (non_empty(Some(lower)), non_empty(Some(upper))),
        None => (non_empty(Some(token)), None),
    }
}

fn commit_range(input: &str, from: Option<&str>, to: Option<&str>) -> Result<Range> {
    let from = from.ok_or_else(|| ConfigError::InvalidRange {
        input: input.to_string(),
        reason: "a commit range needs a starting revision".to_string(),
    })?;
    Ok(Range::commits(from, to.unwrap_or(DEFAULT_TO)))
}

fn date_range(input: &str, after: Option<&str>, before: Option<&str>) -> Result<Range> {
    let after = after.ok_or_else(|| ConfigError::InvalidRange {
        input: input.to_string(),
        reason: "a date range needs an 'after' date".to_string(),
    })?;
    let after = parse_date(input, after)?;
    let before = before.map(|b| parse_date(input, b)).transpose()?;

    if let Some(before) = before {
        if before <= after {
            return Err(ConfigError::InvalidRange {
                input: input.to_string(),
                reason: "the 'before' date must be later than the 'after' date".to_string(),
            }
            .into());
        }
    }

    Ok(Range::dates(after, before))
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp
pub fn parse_date(input: &str, value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ConfigError::InvalidRange {
                input: input.to_string(),
                reason: format!("'{}' is not a date (expected YYYY-MM-DD or RFC 3339): {}", value, e),
            }
            .into()
        })
}
