use chrono::NaiveDate;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PACE_DIR: &str = ".pace";
pub const CONFIG_FILE: &str = ".pace/projects.yaml";
pub const OUTPUT_DIR: &str = "output";

pub const PROGRESS_LOG_FILE: &str = "progress_log.yaml";
pub const REPORT_FILE: &str = "report.txt";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Output directory slug for a project: lowercase, spaces become underscores.
pub fn project_slug(project_name: &str) -> String {
    project_name.trim().to_lowercase().replace(' ', "_")
}

pub fn project_output_dir(root: &Path, project_name: &str) -> PathBuf {
    root.join(OUTPUT_DIR).join(project_slug(project_name))
}

pub fn progress_log_path(root: &Path, project_name: &str) -> PathBuf {
    project_output_dir(root, project_name).join(PROGRESS_LOG_FILE)
}

pub fn report_path(root: &Path, project_name: &str) -> PathBuf {
    project_output_dir(root, project_name).join(REPORT_FILE)
}

pub fn dashboard_file_name(date: NaiveDate) -> String {
    format!("dashboard_{}.svg", date.format("%Y-%m-%d"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
