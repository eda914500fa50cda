//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{GenerateCommand, InitCommand};

/// Ticketlog - changelogs grouped by issue-tracker ticket
///
/// Without a subcommand, generates the changelog for the given repository.
#[derive(Debug, Parser)]
#[command(name = "ticketlog")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub generate: GenerateCommand,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Rendered changelog
    #[default]
    Text,
    /// Template data as JSON
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a starter configuration file
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        match &self.command {
            Some(Commands::Init(cmd)) => cmd.execute(self),
            None => self.generate.execute(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_flags() {
        let cli = Cli::try_parse_from([
            "ticketlog",
            "repo",
            "-r",
            "v1.0.0...v1.1.0",
            "--release",
            "1.1.0",
            "-t",
            "REL-4",
            "-s",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.generate.path.to_str(), Some("repo"));
        assert_eq!(cli.generate.range.as_deref(), Some("v1.0.0...v1.1.0"));
        assert_eq!(cli.generate.release, Some(Some("1.1.0".to_string())));
        assert_eq!(cli.generate.ticket.as_deref(), Some("REL-4"));
        assert!(cli.generate.slack);
    }

    #[test]
    fn test_release_without_value() {
        let cli = Cli::try_parse_from(["ticketlog", "-d", "2024-01-01", "--release"]).unwrap();
        assert_eq!(cli.generate.release, Some(None));
        assert_eq!(cli.generate.dates.as_deref(), Some("2024-01-01"));
        assert_eq!(cli.generate.path.to_str(), Some("."));
    }

    #[test]
    fn test_init_subcommand() {
        let cli = Cli::try_parse_from(["ticketlog", "init", "--toml", "-q"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Init(ref cmd)) if cmd.toml));
        assert!(cli.quiet);
    }

    #[test]
    fn test_json_format() {
        let cli = Cli::try_parse_from(["ticketlog", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
