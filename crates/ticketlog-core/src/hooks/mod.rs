//! Command hooks - user-supplied shell commands that plug into the run
//!
//! Two hook points exist:
//! - `release.generator`: prints the release name on stdout
//! - `slack.transform`: receives the rendered changelog on stdin and prints
//!   the message that should be posted instead
//!
//! Hooks are resolved once from configuration into [`Hooks`]; the rest of the
//! program only sees optional trait objects.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::config::{Config, HookConfig};
use crate::error::{HookError, Result};
use crate::release::ReleaseNameGenerator;

/// Default hook timeout in seconds
pub const DEFAULT_HOOK_TIMEOUT_SECS: u64 = 60;

/// Rewrites a rendered changelog before it is posted
#[async_trait]
pub trait MessageTransform: Send + Sync {
    /// Transform the message
    async fn transform(&self, message: &str, context: &TransformContext) -> Result<String>;
}

/// Facts about the run exposed to transform hooks
#[derive(Debug, Clone, Default)]
pub struct TransformContext {
    /// Release label, if any
    pub release: Option<String>,
    /// Number of ticket groups in the changelog
    pub ticket_count: usize,
    /// Number of commits without a ticket
    pub untracked_count: usize,
}

impl TransformContext {
    /// Convert context to environment variables
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        if let Some(ref release) = self.release {
            env.insert("TICKETLOG_RELEASE".to_string(), release.clone());
        }
        env.insert(
            "TICKETLOG_TICKET_COUNT".to_string(),
            self.ticket_count.to_string(),
        );
        env.insert(
            "TICKETLOG_UNTRACKED_COUNT".to_string(),
            self.untracked_count.to_string(),
        );
        env
    }
}

/// A shell command run through `sh -c` (or `cmd /C` on Windows)
#[derive(Debug, Clone)]
pub struct CommandHook {
    /// Hook name used in logs and errors
    pub name: String,
    /// The command to run
    pub command: String,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Environment variables to set
    pub env: HashMap<String, String>,
    /// Timeout
    pub timeout: Duration,
}

impl CommandHook {
    /// Create a hook from its configuration
    pub fn new(name: impl Into<String>, config: &HookConfig, base_dir: Option<&Path>) -> Self {
        let cwd = match (&config.cwd, base_dir) {
            (Some(cwd), Some(base)) => Some(base.join(cwd)),
            (Some(cwd), None) => Some(cwd.clone()),
            (None, base) => base.map(Path::to_path_buf),
        };

        Self {
            name: name.into(),
            command: config.command.clone(),
            cwd,
            env: config.env.clone(),
            timeout: Duration::from_secs(config.timeout.unwrap_or(DEFAULT_HOOK_TIMEOUT_SECS)),
        }
    }

    /// Run the command, optionally feeding `stdin`, and return its stdout
    #[instrument(skip(self, stdin, extra_env), fields(hook = %self.name))]
    pub async fn run(
        &self,
        stdin: Option<&str>,
        extra_env: &HashMap<String, String>,
    ) -> Result<String> {
        let start = Instant::now();

        let shell = if cfg!(windows) { "cmd" } else { "sh" };
        let shell_arg = if cfg!(windows) { "/C" } else { "-c" };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg).arg(&self.command);

        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in extra_env {
            cmd.env(k, v);
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| self.failed(e.to_string()))?;

        // Feed stdin while stdout is drained, or a chatty child fills its
        // pipe and both sides block
        let pipe = child.stdin.take();
        let input = stdin.unwrap_or_default().as_bytes();
        let write_stdin = async move {
            let Some(mut pipe) = pipe else {
                return Ok(());
            };
            match pipe.write_all(input).await {
                // The child may exit without reading all of its input
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };

        let (written, output) = tokio::time::timeout(self.timeout, async {
            tokio::join!(write_stdin, child.wait_with_output())
        })
        .await
        .map_err(|_| self.failed(format!("timed out after {:?}", self.timeout)))?;

        written.map_err(|e| self.failed(format!("failed to write stdin: {}", e)))?;
        let output = output.map_err(|e| self.failed(e.to_string()))?;

        debug!(
            hook = %self.name,
            duration_ms = start.elapsed().as_millis() as u64,
            exit_code = ?output.status.code(),
            "hook finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failed(format!(
                "exited with {}: {}",
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn failed(&self, message: String) -> crate::error::TicketlogError {
        HookError::ExecutionFailed {
            name: self.name.clone(),
            command: self.command.clone(),
            message,
        }
        .into()
    }
}

/// Release generator backed by a shell command
pub struct CommandReleaseGenerator {
    hook: CommandHook,
}

impl CommandReleaseGenerator {
    /// Create a generator from a hook
    pub fn new(hook: CommandHook) -> Self {
        Self { hook }
    }
}

#[async_trait]
impl ReleaseNameGenerator for CommandReleaseGenerator {
    async fn generate(&self) -> Result<String> {
        info!(command = %self.hook.command, "running release name generator");
        self.hook.run(None, &HashMap::new()).await
    }
}

/// Message transform backed by a shell command
pub struct CommandTransform {
    hook: CommandHook,
}

impl CommandTransform {
    /// Create a transform from a hook
    pub fn new(hook: CommandHook) -> Self {
        Self { hook }
    }
}

#[async_trait]
impl MessageTransform for CommandTransform {
    async fn transform(&self, message: &str, context: &TransformContext) -> Result<String> {
        info!(command = %self.hook.command, "running message transform");
        let output = self.hook.run(Some(message), &context.to_env()).await?;
        if output.trim().is_empty() {
            return Err(HookError::EmptyOutput {
                name: self.hook.name.clone(),
            }
            .into());
        }
        Ok(output)
    }
}

/// Optional capabilities resolved from configuration
#[derive(Clone, Default)]
pub struct Hooks {
    /// Generates a release name for `--release` without a value
    pub release_generator: Option<Arc<dyn ReleaseNameGenerator>>,
    /// Rewrites the changelog before posting to Slack
    pub slack_transform: Option<Arc<dyn MessageTransform>>,
}

impl Hooks {
    /// Build hooks from configuration
    pub fn from_config(config: &Config, base_dir: Option<&Path>) -> Self {
        let release_generator = config.release.generator.as_ref().map(|hook| {
            Arc::new(CommandReleaseGenerator::new(CommandHook::new(
                "release.generator",
                hook,
                base_dir,
            ))) as Arc<dyn ReleaseNameGenerator>
        });

        let slack_transform = config.slack.transform.as_ref().map(|hook| {
            Arc::new(CommandTransform::new(CommandHook::new(
                "slack.transform",
                hook,
                base_dir,
            ))) as Arc<dyn MessageTransform>
        });

        debug!(
            release_generator = release_generator.is_some(),
            slack_transform = slack_transform.is_some(),
            "hooks configured"
        );

        Self {
            release_generator,
            slack_transform,
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("release_generator", &self.release_generator.is_some())
            .field("slack_transform", &self.slack_transform.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TicketlogError;

    fn hook(command: &str) -> CommandHook {
        CommandHook::new("test", &HookConfig::from(command), None)
    }

    #[test]
    fn test_transform_context_to_env() {
        let ctx = TransformContext {
            release: Some("1.4.0".to_string()),
            ticket_count: 3,
            untracked_count: 1,
        };
        let env = ctx.to_env();
        assert_eq!(env.get("TICKETLOG_RELEASE"), Some(&"1.4.0".to_string()));
        assert_eq!(env.get("TICKETLOG_TICKET_COUNT"), Some(&"3".to_string()));
        assert_eq!(env.get("TICKETLOG_UNTRACKED_COUNT"), Some(&"1".to_string()));
    }

    #[test]
    fn test_hooks_from_config() {
        let mut config = Config::default();
        assert!(Hooks::from_config(&config, None).release_generator.is_none());

        config.release.generator = Some(HookConfig::from("echo 1.0.0"));
        let hooks = Hooks::from_config(&config, None);
        assert!(hooks.release_generator.is_some());
        assert!(hooks.slack_transform.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_release_generator_command() {
        let generator = CommandReleaseGenerator::new(hook("echo web-2024.06"));
        let name = generator.generate().await.unwrap();
        assert_eq!(name.trim(), "web-2024.06");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transform_reads_stdin_and_env() {
        let transform =
            CommandTransform::new(hook("printf '%s|' \"$TICKETLOG_RELEASE\"; cat"));
        let ctx = TransformContext {
            release: Some("R1".to_string()),
            ..Default::default()
        };
        let out = transform.transform("hello", &ctx).await.unwrap();
        assert_eq!(out, "R1|hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transform_large_document() {
        let mut cat = hook("cat");
        cat.timeout = Duration::from_secs(10);
        let document = "PROJ-1 fix\n".repeat(100_000);

        let out = cat.run(Some(&document), &HashMap::new()).await.unwrap();
        assert_eq!(out.len(), document.len());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hook_timeout_covers_stdin() {
        let mut stuck = hook("sleep 5");
        stuck.timeout = Duration::from_millis(200);
        let document = "x".repeat(1 << 20);

        let started = Instant::now();
        let err = stuck
            .run(Some(&document), &HashMap::new())
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        match err {
            TicketlogError::Hook(HookError::ExecutionFailed { message, .. }) => {
                assert!(message.contains("timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_hook() {
        let err = hook("echo boom >&2; exit 3")
            .run(None, &HashMap::new())
            .await
            .unwrap_err();
        match err {
            TicketlogError::Hook(HookError::ExecutionFailed { message, .. }) => {
                assert!(message.contains('3'));
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transform_empty_output() {
        let transform = CommandTransform::new(hook("cat >/dev/null"));
        let result = transform
            .transform("ignored", &TransformContext::default())
            .await;
        assert!(matches!(
            result,
            Err(TicketlogError::Hook(HookError::EmptyOutput { .. }))
        ));
    }
}
