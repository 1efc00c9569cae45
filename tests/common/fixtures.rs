//! Scan workspaces and configurations for pipeline tests

use adscan::persist::record_path;
use adscan::{ConcurrencyMode, ScanConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory holding a run's input, record store and error logs
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path("output")
    }

    pub fn error_dir(&self) -> PathBuf {
        self.path("errors")
    }

    /// Write an input file and return its path
    pub fn input(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Config reading `source_file`, writing into this workspace
    pub fn config(&self, source_file: &Path, mode: ConcurrencyMode) -> ScanConfig {
        let mut config = ScanConfig::default();
        config.source.file = Some(source_file.to_path_buf());
        config.execution.mode = mode;
        config.execution.max_parallelism = 3;
        config.execution.visit_timeout_ms = 2_000;
        config.output.output_dir = self.output_dir();
        config.output.error_dir = self.error_dir();
        config
    }

    /// Records in today's record file
    pub fn records(&self) -> Vec<serde_json::Value> {
        let path = record_path(&self.output_dir(), chrono::Local::now().date_naive());
        let body = std::fs::read_to_string(path).unwrap();
        serde_json::from_str(&body).unwrap()
    }

    /// Lines of a file in this workspace, or nothing if it does not exist
    pub fn lines(&self, path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .map(|body| body.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Lines of one category log under the error directory
    pub fn error_log(&self, file_name: &str) -> Vec<String> {
        self.lines(&self.error_dir().join(file_name))
    }
}
