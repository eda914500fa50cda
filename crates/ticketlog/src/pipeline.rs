//! The changelog run: commits in, rendered document out

use std::sync::Arc;

use tracing::{info, instrument, warn};

use ticketlog_changelog::{
    generate_template_data, render_template, Changelog, ChangelogAssembler, TemplateData,
    TicketExtractor,
};
use ticketlog_core::config::Config;
use ticketlog_core::hooks::TransformContext;
use ticketlog_core::{Hooks, ReleaseAssigner, ReleaseVersion, RunConfig};
use ticketlog_git::CommitSource;
use ticketlog_notify::{NotificationSink, NotifyError};
use ticketlog_tracker::{IssueTracker, ResolverOptions, TicketResolver, TicketWriteback};

/// Result of a changelog run, before any side effects
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Assembled changelog
    pub changelog: Changelog,
    /// Data handed to the formatter
    pub data: TemplateData,
    /// Rendered document
    pub document: String,
    /// Tickets that could not be resolved and similar notes
    pub warnings: Vec<String>,
    /// Number of commits read
    pub commit_count: usize,
}

/// Wires the commit source, tracker and hooks together for one run
pub struct ChangelogPipeline {
    config: Config,
    source: Box<dyn CommitSource>,
    tracker: Arc<dyn IssueTracker>,
    hooks: Hooks,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl ChangelogPipeline {
    /// Create a pipeline without hooks or notification sink
    pub fn new(config: Config, source: Box<dyn CommitSource>, tracker: Arc<dyn IssueTracker>) -> Self {
        Self {
            config,
            source,
            tracker,
            hooks: Hooks::default(),
            notifier: None,
        }
    }

    /// Use the given hooks
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Post to this sink when the run asks for it
    pub fn with_notifier(mut self, notifier: Option<Arc<dyn NotificationSink>>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Build the changelog for `run` and render it
    #[instrument(skip(self, run), fields(range = %run.range))]
    pub async fn run(&self, run: &RunConfig) -> anyhow::Result<PipelineOutput> {
        let extractor = TicketExtractor::new(self.config.tracker.ticket_pattern.as_deref())?;

        // Release problems are reported before any commit is read
        let assigner = ReleaseAssigner::new(self.hooks.release_generator.clone());
        assigner.validate(&run.release)?;
        let release = assigner.assign(&run.release).await?;

        let commits = self.source.commit_logs(&run.range)?;
        info!(commits = commits.len(), "commit log read");

        let refs = extractor.extract_all(&commits);

        let resolver = TicketResolver::new(
            self.tracker.clone(),
            ResolverOptions::from_config(&self.config.tracker),
        );
        let resolution = resolver.resolve(&refs.all_keys()).await?;
        let mut warnings = resolution.warnings;

        let assembler = ChangelogAssembler::from_config(&self.config.changelog);
        let changelog = assembler.assemble(&commits, &resolution.tickets, &refs, release);

        let release_versions = self.release_versions(&changelog, &mut warnings).await;
        let data = generate_template_data(&self.config, &changelog, release_versions);
        let document = render_template(&self.config.changelog, &data)?;

        Ok(PipelineOutput {
            changelog,
            data,
            document,
            warnings,
            commit_count: commits.len(),
        })
    }

    /// Look up tracker versions named after the release, per project
    async fn release_versions(
        &self,
        changelog: &Changelog,
        warnings: &mut Vec<String>,
    ) -> Vec<ReleaseVersion> {
        if changelog.release.is_none() {
            return Vec::new();
        }

        let mut versions = Vec::new();
        for project in changelog.projects() {
            match self.tracker.project_versions(&project).await {
                Ok(found) => versions.extend(found),
                Err(e) => {
                    warn!(project = %project, error = %e, "could not load project versions");
                    warnings.push(format!("Could not load versions of {} ({})", project, e));
                }
            }
        }
        versions
    }

    /// Run the optional side effects: post to Slack, then update the release ticket
    #[instrument(skip(self, run, output))]
    pub async fn publish(&self, run: &RunConfig, output: &PipelineOutput) -> anyhow::Result<()> {
        if run.post_to_slack {
            self.notify(output).await?;
        }

        if let Some(ticket) = &run.release_ticket {
            TicketWriteback::new(self.tracker.clone())
                .writeback(ticket, &output.document)
                .await?;
        }

        Ok(())
    }

    async fn notify(&self, output: &PipelineOutput) -> anyhow::Result<()> {
        let channel = self
            .config
            .slack
            .channel
            .as_deref()
            .ok_or_else(|| NotifyError::NotConfigured("slack.channel is not set".to_string()))?;
        let notifier = self
            .notifier
            .as_ref()
            .ok_or_else(|| NotifyError::NotConfigured("no Slack client".to_string()))?;

        let message = match &self.hooks.slack_transform {
            Some(transform) => {
                let context = TransformContext {
                    release: output.changelog.release.clone(),
                    ticket_count: output.changelog.ticket_count(),
                    untracked_count: output.changelog.untracked.len(),
                };
                transform.transform(&output.document, &context).await?
            }
            None => output.document.clone(),
        };

        notifier.post_message(&message, channel).await?;
        Ok(())
    }
}
