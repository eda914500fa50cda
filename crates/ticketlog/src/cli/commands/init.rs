//! Init command

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use ticketlog_core::config::{Config, DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_YAML};

use crate::cli::{output, Cli};

/// Write a starter configuration file
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Write TOML instead of YAML
    #[arg(long)]
    pub toml: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, toml = self.toml, "executing init command");
        let cwd = std::env::current_dir()?;
        let config_path = self.output.clone().unwrap_or_else(|| {
            cwd.join(if self.toml {
                DEFAULT_CONFIG_TOML
            } else {
                DEFAULT_CONFIG_YAML
            })
        });

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Configuration file already exists at {}. Use --force to overwrite.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, self.render()?)?;

        if !cli.quiet {
            output::success(&format!(
                "Created configuration at {}",
                style(config_path.display()).cyan()
            ));
            eprintln!();
            eprintln!("Next steps:");
            eprintln!("  1. Set JIRA_EMAIL and JIRA_API_TOKEN (and SLACK_API_TOKEN for --slack)");
            eprintln!(
                "  2. Run {} to preview a changelog",
                style("ticketlog -r FROM...TO").cyan()
            );
        }

        Ok(())
    }

    fn render(&self) -> anyhow::Result<String> {
        if !self.toml {
            return Ok(DEFAULT_CONFIG_TEMPLATE.to_string());
        }
        let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE)?;
        Ok(toml::to_string_pretty(&config)?)
    }
}
