//! Request-scoped analysis session.
//!
//! A `Session` owns the upload directory and the currently active data file.
//! Uploading or saving entered rows activates a file; `analyze` always runs
//! against the active one. There is no process-wide state: two sessions never
//! see each other's files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::app::pipeline::{AnalysisResult, analyze};
use crate::domain::{AnalysisConfig, EntryRow};
use crate::error::{AppError, ErrorKind};
use crate::io::{SourceFormat, write_entry_rows};

/// Environment variable overriding the upload directory.
pub const UPLOAD_DIR_ENV: &str = "DATAMIND_UPLOAD_DIR";
/// Environment variable overriding the root for timestamped report directories.
pub const REPORT_ROOT_ENV: &str = "DATAMIND_REPORT_ROOT";

#[derive(Debug, Clone)]
pub struct Session {
    upload_dir: PathBuf,
    report_root: PathBuf,
    active: Option<PathBuf>,
    seq: u32,
}

impl Session {
    pub fn new(upload_dir: impl Into<PathBuf>, report_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            report_root: report_root.into(),
            active: None,
            seq: 0,
        }
    }

    /// Directories from `.env`/environment, defaulting to `uploads` and `reports`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let upload_dir = std::env::var(UPLOAD_DIR_ENV).unwrap_or_else(|_| "uploads".to_string());
        Self::new(upload_dir, default_report_root())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn active_source(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    /// A fresh `<report root>/<timestamp>` directory path.
    pub fn next_report_dir(&self) -> PathBuf {
        timestamped_dir(&self.report_root)
    }

    /// Copy `path` into the upload directory under a unique name and make it
    /// the active source.
    pub fn upload(&mut self, path: &Path) -> Result<PathBuf, AppError> {
        if !path.is_file() {
            return Err(AppError::new(
                ErrorKind::SourceNotFound,
                format!("Upload source not found: '{}'", path.display()),
            ));
        }
        SourceFormat::from_path(path)?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let target = self.unique_target(&name)?;
        fs::copy(path, &target).map_err(|e| {
            AppError::new(
                ErrorKind::Output,
                format!("Failed to store upload '{}': {e}", target.display()),
            )
        })?;

        info!(from = %path.display(), to = %target.display(), "file uploaded");
        self.active = Some(target.clone());
        Ok(target)
    }

    /// Save entered rows as a workbook in the upload directory and make it the
    /// active source.
    pub fn save_records(&mut self, rows: &[EntryRow]) -> Result<PathBuf, AppError> {
        if rows.is_empty() {
            return Err(AppError::new(ErrorKind::InsufficientData, "No rows to save."));
        }
        let target = self.unique_target("custom_data.xlsx")?;
        write_entry_rows(&target, rows)?;
        self.active = Some(target.clone());
        Ok(target)
    }

    /// Analyze the active source.
    ///
    /// Without `report_dir`, reports go to `<report root>/<timestamp>`.
    pub fn analyze(&self, report_dir: Option<&Path>, config: &AnalysisConfig) -> Result<AnalysisResult, AppError> {
        let source = self.active.as_deref().ok_or_else(|| {
            AppError::new(
                ErrorKind::SourceNotFound,
                "No active data file. Upload or create a data file first.",
            )
        })?;
        let report_dir = match report_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.next_report_dir(),
        };
        analyze(source, &report_dir, config)
    }

    fn unique_target(&mut self, name: &str) -> Result<PathBuf, AppError> {
        fs::create_dir_all(&self.upload_dir).map_err(|e| {
            AppError::new(
                ErrorKind::Output,
                format!("Failed to create upload directory '{}': {e}", self.upload_dir.display()),
            )
        })?;
        let stamp = Local::now().format("%Y%m%d%H%M%S").to_string();
        loop {
            self.seq += 1;
            let candidate = self.upload_dir.join(format!("{stamp}_{:03}_{name}", self.seq));
            if !candidate.exists() {
                return Ok(candidate);
            }
        }
    }
}

/// `DATAMIND_REPORT_ROOT` or `reports`; call after `.env` is loaded.
pub fn default_report_root() -> PathBuf {
    std::env::var(REPORT_ROOT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("reports"))
}

/// `<root>/<YYYYmmddHHMMSS>`.
pub fn timestamped_dir(root: &Path) -> PathBuf {
    root.join(Local::now().format("%Y%m%d%H%M%S").to_string())
}
