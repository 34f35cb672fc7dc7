use crate::config::ExportSettings;
use crate::domain::format::ExportFormat;
use crate::domain::model::Batch;
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// How output files are named: `<base>.<ext>` or `<base>_<stamp>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    base_name: String,
    stamp: Option<String>,
}

impl NamingPolicy {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            stamp: None,
        }
    }

    /// Stamps the current local time. All formats of one request share the stamp.
    pub fn timestamped(base_name: impl Into<String>) -> Self {
        Self::stamped_at(base_name, Local::now())
    }

    pub fn stamped_at(base_name: impl Into<String>, at: DateTime<Local>) -> Self {
        Self {
            base_name: base_name.into(),
            stamp: Some(at.format("%Y%m%d_%H%M%S").to_string()),
        }
    }

    pub fn file_name(&self, format: ExportFormat) -> String {
        match &self.stamp {
            Some(stamp) => format!("{}_{}.{}", self.base_name, stamp, format.extension()),
            None => format!("{}.{}", self.base_name, format.extension()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub dir: PathBuf,
    pub naming: NamingPolicy,
}

impl OutputTarget {
    pub fn new(dir: impl Into<PathBuf>, naming: NamingPolicy) -> Self {
        Self {
            dir: dir.into(),
            naming,
        }
    }

    pub fn path_for(&self, format: ExportFormat) -> PathBuf {
        self.dir.join(self.naming.file_name(format))
    }
}

/// One export invocation: which formats, where to, and what.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub(crate) formats: BTreeSet<ExportFormat>,
    pub(crate) target: OutputTarget,
    pub(crate) batch: Batch,
    pub(crate) header_only: bool,
}

impl ExportRequest {
    pub fn new(
        formats: impl IntoIterator<Item = ExportFormat>,
        target: OutputTarget,
        batch: Batch,
    ) -> Self {
        Self {
            formats: formats.into_iter().collect(),
            target,
            batch,
            header_only: false,
        }
    }

    pub fn from_settings(settings: &ExportSettings, batch: Batch) -> Self {
        let naming = if settings.timestamped {
            NamingPolicy::timestamped(&settings.base_name)
        } else {
            NamingPolicy::new(&settings.base_name)
        };
        Self::new(
            settings.formats.iter().copied(),
            OutputTarget::new(&settings.output_dir, naming),
            batch,
        )
        .with_header_only(settings.header_only)
    }

    pub fn with_header_only(mut self, header_only: bool) -> Self {
        self.header_only = header_only;
        self
    }

    /// Requested formats, deduplicated, in export order.
    pub fn formats(&self) -> impl Iterator<Item = ExportFormat> + '_ {
        self.formats.iter().copied()
    }

    pub fn target(&self) -> &OutputTarget {
        &self.target
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }
}
