//! Sequential batch runner with fixed pacing.

use crate::error::FailureReason;
use crate::image::{GenerationRequest, GenerationResult, ImageProvider};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Delay between consecutive requests when none is configured.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

const PROMPT_PREVIEW_CHARS: usize = 80;

/// One named item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    /// Display name, usually the output file name.
    pub name: String,
    /// Section the item belongs to, used for progress output.
    pub group: Option<String>,
    /// What to generate and where to put it.
    pub request: GenerationRequest,
}

impl BatchJob {
    /// Creates a job outside of any group.
    pub fn new(name: impl Into<String>, request: GenerationRequest) -> Self {
        Self {
            name: name.into(),
            group: None,
            request,
        }
    }

    /// Sets the group title.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A batch item that was written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSuccess {
    /// Job name.
    pub name: String,
    /// Where the image was written.
    pub path: PathBuf,
    /// Bytes written.
    pub size_bytes: usize,
}

/// A batch item that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Job name.
    pub name: String,
    /// Failure class.
    pub reason: FailureReason,
    /// Error message.
    pub detail: String,
}

/// Aggregated outcome of a batch, in job order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Items written to disk.
    pub succeeded: Vec<BatchSuccess>,
    /// Items that failed.
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    /// Total number of items attempted.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Returns true when no item failed.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs jobs one after another through a provider.
///
/// The runner owns the pacing: it sleeps for the configured delay between
/// two requests, never before the first or after the last. Failures are
/// recorded and the batch moves on.
pub struct BatchRunner<P> {
    provider: P,
    delay: Duration,
}

impl<P: ImageProvider> BatchRunner<P> {
    /// Creates a runner with the default 2s pacing.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            delay: DEFAULT_DELAY,
        }
    }

    /// Sets the delay between consecutive requests. Zero disables pacing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs every job in order and collects the results.
    pub async fn run(&self, jobs: &[BatchJob]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut current_group: Option<&str> = None;

        tracing::info!(
            provider = self.provider.name(),
            total = jobs.len(),
            delay_ms = self.delay.as_millis() as u64,
            "starting batch"
        );

        for (idx, job) in jobs.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if job.group.is_some() && job.group.as_deref() != current_group {
                current_group = job.group.as_deref();
                tracing::info!(group = current_group.unwrap_or_default(), "generating group");
            }

            tracing::info!(
                item = %job.name,
                index = idx + 1,
                total = jobs.len(),
                prompt = %prompt_preview(job.request.prompt()),
                "generating"
            );

            match self.provider.fetch(&job.request).await {
                GenerationResult::Success(saved) => {
                    tracing::info!(item = %job.name, path = %saved.path.display(), "saved");
                    report.succeeded.push(BatchSuccess {
                        name: job.name.clone(),
                        path: saved.path,
                        size_bytes: saved.size_bytes,
                    });
                }
                GenerationResult::Failure(failure) => {
                    tracing::warn!(
                        item = %job.name,
                        reason = %failure.reason,
                        "failed: {}",
                        failure.detail
                    );
                    report.failed.push(BatchFailure {
                        name: job.name.clone(),
                        reason: failure.reason,
                        detail: failure.detail,
                    });
                }
            }
        }

        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch complete"
        );

        report
    }
}

fn prompt_preview(prompt: &str) -> String {
    let flat = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(PROMPT_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}
