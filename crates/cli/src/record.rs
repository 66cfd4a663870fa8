//! Install record persistence.
//!
//! The record is an append-only list of the stages whose external side
//! effects completed, kept as a best-effort audit trail under the log
//! directory. It is never reconciled against actual system state, and
//! teardown deletes it without consulting it.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Identifiers of the recordable pipeline stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// NVIDIA kernel driver install.
    Driver,
    /// CUDA toolkit install plus the persisted environment file.
    CudaToolkit,
    /// Docker engine install plus group membership.
    ContainerEngine,
    /// NVIDIA container toolkit install, registration and probe.
    ContainerToolkit,
}

impl StageId {
    /// Stable identifier used in the record file.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::CudaToolkit => "cuda_toolkit",
            Self::ContainerEngine => "container_engine",
            Self::ContainerToolkit => "container_toolkit",
        }
    }

    /// Human-readable description for banners.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Driver => "NVIDIA kernel driver",
            Self::CudaToolkit => "CUDA toolkit",
            Self::ContainerEngine => "Docker engine",
            Self::ContainerToolkit => "NVIDIA container toolkit",
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only record of completed stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallRecord {
    /// Completed stage identifiers, in completion order.
    pub stages: Vec<StageId>,
    /// Timestamp of the last append.
    pub updated_at: String,
}

impl InstallRecord {
    /// Load the record if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).context("Failed to read install record")?;
        let record: Self =
            serde_json::from_str(&content).context("Failed to parse install record")?;
        Ok(Some(record))
    }

    /// Append a completed stage and persist.
    ///
    /// Re-appending an already-recorded stage is a no-op apart from the
    /// timestamp refresh, which keeps re-runs from duplicating entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn append(&mut self, path: &Path, stage: StageId) -> Result<()> {
        if !self.stages.contains(&stage) {
            self.stages.push(stage);
        }
        info!(stage = stage.as_str(), "stage recorded");
        self.save(path)
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        self.updated_at = chrono::Utc::now().to_rfc3339();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create record directory")?;
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize install record")?;
        std::fs::write(path, content).context("Failed to write install record")
    }
}

/// Delete the install record. Succeeds when no record exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn remove(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    std::fs::remove_file(path).context("Failed to remove install record")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_pipeline_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("install-record.json");

        let mut record = InstallRecord::default();
        record.append(&path, StageId::Driver).unwrap();
        record.append(&path, StageId::CudaToolkit).unwrap();
        record.append(&path, StageId::ContainerEngine).unwrap();
        record.append(&path, StageId::ContainerToolkit).unwrap();

        let loaded = InstallRecord::load(&path).unwrap().unwrap();
        assert_eq!(
            loaded.stages,
            vec![
                StageId::Driver,
                StageId::CudaToolkit,
                StageId::ContainerEngine,
                StageId::ContainerToolkit,
            ]
        );
    }

    #[test]
    fn test_append_deduplicates_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("install-record.json");

        let mut record = InstallRecord::default();
        record.append(&path, StageId::Driver).unwrap();
        record.append(&path, StageId::Driver).unwrap();

        let loaded = InstallRecord::load(&path).unwrap().unwrap();
        assert_eq!(loaded.stages, vec![StageId::Driver]);
    }

    #[test]
    fn test_load_missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("install-record.json");
        assert!(InstallRecord::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("install-record.json");

        let mut record = InstallRecord::default();
        record.append(&path, StageId::Driver).unwrap();

        remove(&path).unwrap();
        assert!(!path.exists());
        remove(&path).unwrap();
    }

    #[test]
    fn test_stage_ids_are_snake_case_on_disk() {
        let json = serde_json::to_string(&StageId::ContainerToolkit).unwrap();
        assert_eq!(json, "\"container_toolkit\"");
    }
}
