use crate::domain::format::ExportFormat;
use crate::utils::error::ExportError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Lifecycle of one format's export:
/// `Pending -> Serializing -> Writing -> Committed`, or `Failed` from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Pending,
    Serializing,
    Writing,
    Committed,
    Failed,
}

#[derive(Debug)]
pub enum ExportOutcome {
    Committed { path: PathBuf, bytes: usize },
    /// `stage` is where the export was when `error` happened.
    Failed { stage: ExportStage, error: ExportError },
}

#[derive(Debug)]
pub struct FormatReport {
    pub format: ExportFormat,
    pub outcome: ExportOutcome,
    pub elapsed: Duration,
}

impl FormatReport {
    pub fn stage(&self) -> ExportStage {
        match self.outcome {
            ExportOutcome::Committed { .. } => ExportStage::Committed,
            ExportOutcome::Failed { .. } => ExportStage::Failed,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self.outcome, ExportOutcome::Committed { .. })
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.outcome {
            ExportOutcome::Committed { path, .. } => Some(path),
            ExportOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ExportError> {
        match &self.outcome {
            ExportOutcome::Committed { .. } => None,
            ExportOutcome::Failed { error, .. } => Some(error),
        }
    }
}

impl fmt::Display for FormatReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            ExportOutcome::Committed { path, bytes } => write!(
                f,
                "{}: Committed -> {} ({} bytes)",
                self.format,
                path.display(),
                bytes
            ),
            ExportOutcome::Failed { error, .. } => {
                write!(f, "{}: Failed({}): {}", self.format, error.kind(), error)
            }
        }
    }
}

/// Per-format results of one request, in export order.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub results: Vec<FormatReport>,
    pub elapsed: Duration,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.results.iter().all(FormatReport::is_committed)
    }

    pub fn get(&self, format: ExportFormat) -> Option<&FormatReport> {
        self.results.iter().find(|r| r.format == format)
    }

    pub fn written_paths(&self) -> Vec<&Path> {
        self.results.iter().filter_map(FormatReport::path).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (ExportFormat, &ExportError)> {
        self.results
            .iter()
            .filter_map(|r| r.error().map(|e| (r.format, e)))
    }
}

/// Tracks one format through its stages and logs each transition.
pub(crate) struct FormatExport {
    format: ExportFormat,
    stage: ExportStage,
    started: Instant,
}

impl FormatExport {
    pub(crate) fn start(format: ExportFormat) -> Self {
        Self {
            format,
            stage: ExportStage::Pending,
            started: Instant::now(),
        }
    }

    pub(crate) fn advance(&mut self, next: ExportStage) {
        tracing::debug!(format = %self.format, from = ?self.stage, to = ?next, "export stage");
        self.stage = next;
    }

    pub(crate) fn fail(self, error: ExportError) -> FormatReport {
        tracing::warn!(
            format = %self.format,
            stage = ?self.stage,
            "❌ {} export failed: {}",
            self.format,
            error
        );
        FormatReport {
            format: self.format,
            outcome: ExportOutcome::Failed {
                stage: self.stage,
                error,
            },
            elapsed: self.started.elapsed(),
        }
    }

    pub(crate) fn commit(self, path: PathBuf, bytes: usize) -> FormatReport {
        tracing::info!("✅ {} export written to {}", self.format, path.display());
        FormatReport {
            format: self.format,
            outcome: ExportOutcome::Committed { path, bytes },
            elapsed: self.started.elapsed(),
        }
    }
}
