//! Changelog generation, the default command

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::info;

use ticketlog_core::config::load_run_config;
use ticketlog_core::{resolve_range, Hooks, ReleaseInput, RunConfig};
use ticketlog_git::GitRepo;
use ticketlog_notify::{NotificationSink, SlackClient};
use ticketlog_tracker::{IssueTracker, JiraClient};

use crate::cli::{output, Cli, OutputFormat};
use crate::pipeline::{ChangelogPipeline, PipelineOutput};

/// Generate a changelog for a commit or date range
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Repository path
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Configuration file (default: searched from the repository upward)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Commit range, FROM...TO (TO defaults to HEAD)
    #[arg(short, long, value_name = "FROM...TO")]
    pub range: Option<String>,

    /// Date range, AFTER[...BEFORE]
    #[arg(short = 'd', long = "date", value_name = "AFTER...BEFORE")]
    pub dates: Option<String>,

    /// Post the changelog to Slack
    #[arg(short, long)]
    pub slack: bool,

    /// Label the changelog with a release; without a value the configured
    /// generator picks the name
    #[arg(long, value_name = "NAME")]
    pub release: Option<Option<String>>,

    /// Write the changelog into this ticket's description
    #[arg(short = 't', long, value_name = "TICKET")]
    pub ticket: Option<String>,
}

impl GenerateCommand {
    /// Execute the generate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            path = %self.path.display(),
            range = ?self.range,
            dates = ?self.dates,
            slack = self.slack,
            release = ?self.release,
            ticket = ?self.ticket,
            "executing generate command"
        );
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let (config, config_path) = load_run_config(self.config.as_deref(), &self.path)?;
        if cli.verbose {
            match &config_path {
                Some(path) => output::info(&format!("Using configuration {}", path.display())),
                None => output::info("No configuration file found, using defaults"),
            }
        }

        // A run without a range fails before the repository is touched
        let range = resolve_range(
            self.range.as_deref(),
            self.dates.as_deref(),
            config.source_control.default_range.as_ref(),
        )?;

        let repo = GitRepo::discover(&self.path)?;
        let root = repo.path().to_path_buf();

        let mut run = RunConfig::new(&root, range)
            .with_release(ReleaseInput::from_flag(self.release.clone()))
            .with_slack(self.slack);
        if let Some(ticket) = &self.ticket {
            run = run.with_release_ticket(ticket);
        }

        let tracker: Arc<dyn IssueTracker> =
            Arc::new(JiraClient::from_tracker_config(&config.tracker)?);
        let base_dir = config_path
            .as_deref()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| root.clone());
        let hooks = Hooks::from_config(&config, Some(&base_dir));
        let slack_config = config.slack.clone();

        let pipeline =
            ChangelogPipeline::new(config, Box::new(repo), tracker).with_hooks(hooks);
        let result = pipeline.run(&run).await?;

        self.print(cli, &run, &result)?;

        // Side effects only after the changelog is on screen
        let notifier = if run.post_to_slack {
            Some(Arc::new(SlackClient::from_config(&slack_config)?) as Arc<dyn NotificationSink>)
        } else {
            None
        };
        let pipeline = pipeline.with_notifier(notifier);
        pipeline.publish(&run, &result).await?;

        if !cli.quiet {
            if run.post_to_slack {
                output::success("Posted changelog to Slack");
            }
            if let Some(ticket) = &run.release_ticket {
                output::success(&format!("Updated {}", ticket));
            }
        }

        Ok(())
    }

    fn print(&self, cli: &Cli, run: &RunConfig, result: &PipelineOutput) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result.data)?),
            OutputFormat::Text => {
                println!("{}", html_escape::decode_html_entities(&result.document))
            }
        }

        if cli.quiet {
            return Ok(());
        }

        for warning in &result.warnings {
            output::warning(warning);
        }

        if cli.verbose {
            output::info("Summary");
            eprintln!("{}", output::key_value("range", &run.range.to_string()));
            eprintln!(
                "{}",
                output::key_value("commits", &result.commit_count.to_string())
            );
            eprintln!(
                "{}",
                output::key_value("tickets", &result.changelog.ticket_count().to_string())
            );
            eprintln!(
                "{}",
                output::key_value("untracked", &result.changelog.untracked.len().to_string())
            );
            if let Some(release) = &result.changelog.release {
                eprintln!("{}", output::key_value("release", release));
            }
        }

        Ok(())
    }
}
