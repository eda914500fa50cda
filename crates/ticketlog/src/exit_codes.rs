//! Exit codes for the CLI

/// Any failure
pub const ERROR: i32 = 1;
