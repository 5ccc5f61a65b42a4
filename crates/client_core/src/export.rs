use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::protocol::{EXPORT_FILENAME, XLSX_CONTENT_TYPE};
use tracing::{debug, info, warn};

use crate::{bindings::TableBindings, directory::EmployeeDirectory, query_state::ExportParams};

const EXPORT_FAILURE_FALLBACK: &str = "Export failed";

#[async_trait]
pub trait FileSaver: Send + Sync {
    async fn save(&self, payload: &[u8], filename: &str, content_type: &str) -> Result<()>;
}

pub struct DirectoryFileSaver {
    dir: PathBuf,
}

impl DirectoryFileSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl FileSaver for DirectoryFileSaver {
    async fn save(&self, payload: &[u8], filename: &str, content_type: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create export dir '{}'", self.dir.display()))?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, payload)
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        info!(
            path = %path.display(),
            bytes = payload.len(),
            content_type,
            "export: saved file"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved { bytes: usize },
    Failed(String),
    /// Another export was still running.
    Skipped,
}

pub struct ExportOrchestrator {
    directory: Arc<dyn EmployeeDirectory>,
    saver: Arc<dyn FileSaver>,
    bindings: Arc<TableBindings>,
}

impl ExportOrchestrator {
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        saver: Arc<dyn FileSaver>,
        bindings: Arc<TableBindings>,
    ) -> Self {
        Self {
            directory,
            saver,
            bindings,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.bindings.is_loading() && self.bindings.total() > 0
    }

    pub async fn export(&self, params: ExportParams) -> ExportOutcome {
        if !self.bindings.begin_export() {
            debug!("export: already running, ignoring trigger");
            return ExportOutcome::Skipped;
        }

        debug!(export_type = params.export_type.as_wire(), "export: requesting spreadsheet");

        let outcome = match self.directory.export_employees(&params).await {
            Ok(payload) => match self
                .saver
                .save(&payload, EXPORT_FILENAME, XLSX_CONTENT_TYPE)
                .await
            {
                Ok(()) => ExportOutcome::Saved {
                    bytes: payload.len(),
                },
                Err(err) => {
                    warn!("export: saving failed: {err:#}");
                    ExportOutcome::Failed(format!("{err:#}"))
                }
            },
            Err(err) => {
                warn!("export: query failed: {err}");
                ExportOutcome::Failed(err.user_message(EXPORT_FAILURE_FALLBACK))
            }
        };

        let error = match &outcome {
            ExportOutcome::Failed(message) => Some(message.clone()),
            _ => None,
        };
        self.bindings.finish_export(error);
        outcome
    }
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
