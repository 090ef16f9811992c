use crate::calendar::{parse_date, parse_dates, CalendarConstraint, DateSet};
use crate::error::{PaceError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: String) -> Self {
        Self {
            level: WarnLevel::Warning,
            message,
        }
    }

    fn error(message: String) -> Self {
        Self {
            level: WarnLevel::Error,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// StatusVocabulary
// ---------------------------------------------------------------------------

/// Status names and how each one counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusVocabulary {
    /// Excluded from every count.
    #[serde(default = "default_dropped")]
    pub dropped: BTreeSet<String>,
    /// Work not yet done; eligible for allocation.
    #[serde(default = "default_remaining")]
    pub remaining: BTreeSet<String>,
    /// Counts toward completion.
    #[serde(default = "default_done")]
    pub done: BTreeSet<String>,
    #[serde(default = "default_in_progress")]
    pub in_progress: BTreeSet<String>,
    /// Synonym collapsing applied before status counting, e.g. Backlog → To Do.
    #[serde(default = "default_normalization")]
    pub normalization: BTreeMap<String, String>,
    /// Column order for status breakdowns.
    #[serde(default = "default_display_order")]
    pub display_order: Vec<String>,
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_dropped() -> BTreeSet<String> {
    names(&["Dropped", "Cancelled", "Won't Do"])
}

fn default_remaining() -> BTreeSet<String> {
    names(&["To Do", "Backlog", "In Progress"])
}

fn default_done() -> BTreeSet<String> {
    names(&["Done", "Code Review"])
}

fn default_in_progress() -> BTreeSet<String> {
    names(&["In Progress"])
}

fn default_normalization() -> BTreeMap<String, String> {
    let mut m = BTreeMap::new();
    m.insert("Backlog".to_string(), "To Do".to_string());
    m
}

fn default_display_order() -> Vec<String> {
    [
        "To Do",
        "In Progress",
        "Code Review",
        "Acceptance",
        "Ready for production",
        "Done",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        Self {
            dropped: default_dropped(),
            remaining: default_remaining(),
            done: default_done(),
            in_progress: default_in_progress(),
            normalization: default_normalization(),
            display_order: default_display_order(),
        }
    }
}

impl StatusVocabulary {
    /// Canonical name for counting; unmapped statuses keep their literal name.
    pub fn normalize<'a>(&'a self, status: &'a str) -> &'a str {
        self.normalization
            .get(status)
            .map(|s| s.as_str())
            .unwrap_or(status)
    }

    pub fn is_dropped(&self, status: &str) -> bool {
        self.dropped.contains(status)
    }

    pub fn is_done(&self, status: &str) -> bool {
        self.done.contains(status)
    }

    pub fn is_remaining(&self, status: &str) -> bool {
        self.remaining.contains(status)
    }

    pub fn is_in_progress(&self, status: &str) -> bool {
        self.in_progress.contains(status)
    }

    /// Statuses listed in more than one of dropped / remaining / done.
    fn overlaps(&self) -> Vec<(String, &'static str, &'static str)> {
        let pairs: [(&BTreeSet<String>, &'static str, &BTreeSet<String>, &'static str); 3] = [
            (&self.dropped, "dropped", &self.done, "done"),
            (&self.dropped, "dropped", &self.remaining, "remaining"),
            (&self.done, "done", &self.remaining, "remaining"),
        ];
        let mut out = Vec::new();
        for (a, a_name, b, b_name) in pairs {
            for status in a.intersection(b) {
                out.push((status.clone(), a_name, b_name));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Developer / ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeveloperConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leave: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub epic_key: String,
    pub start_date: String,
    pub deadline: String,
    #[serde(default)]
    pub bank_holidays: Vec<String>,
    #[serde(default)]
    pub developers: Vec<DeveloperConfig>,
    /// Overrides the top-level vocabulary for this project only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statuses: Option<StatusVocabulary>,
}

// ---------------------------------------------------------------------------
// Resolved project
// ---------------------------------------------------------------------------

/// A team member and the dates they are away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Developer {
    pub name: String,
    pub leave: DateSet,
}

impl Developer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            leave: DateSet::new(),
        }
    }

    pub fn with_leave(mut self, leave: DateSet) -> Self {
        self.leave = leave;
        self
    }
}

/// A project with every date parsed and its vocabulary chosen.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub epic_key: String,
    pub calendar: CalendarConstraint,
    pub developers: Vec<Developer>,
    pub statuses: StatusVocabulary,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub statuses: StatusVocabulary,
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            statuses: StatusVocabulary::default(),
            projects: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(PaceError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        tracing::debug!(path = %path.display(), projects = cfg.projects.len(), "loaded config");
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Find a project by name or epic key (case-insensitive).
    pub fn find(&self, name_or_key: &str) -> Result<&ProjectConfig> {
        self.projects
            .iter()
            .find(|p| {
                p.name.eq_ignore_ascii_case(name_or_key)
                    || p.epic_key.eq_ignore_ascii_case(name_or_key)
            })
            .ok_or_else(|| PaceError::ProjectNotFound(name_or_key.to_string()))
    }

    /// Parse every date of `project` and pick its status vocabulary.
    pub fn resolve(&self, project: &ProjectConfig) -> Result<Project> {
        let calendar = CalendarConstraint::parse(
            &project.start_date,
            &project.deadline,
            &project.bank_holidays,
        )?;
        let developers = project
            .developers
            .iter()
            .map(|d| -> Result<Developer> {
                Ok(Developer::new(d.name.clone()).with_leave(parse_dates(&d.leave)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Project {
            name: project.name.clone(),
            epic_key: project.epic_key.clone(),
            calendar,
            developers,
            statuses: project
                .statuses
                .clone()
                .unwrap_or_else(|| self.statuses.clone()),
        })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.projects.is_empty() {
            warnings.push(ConfigWarning::warning("no projects configured".to_string()));
        }

        for (status, a, b) in self.statuses.overlaps() {
            warnings.push(ConfigWarning::warning(format!(
                "status '{status}' is listed as both {a} and {b}"
            )));
        }

        let mut seen_slugs = HashSet::new();
        for project in &self.projects {
            let slug = paths::project_slug(&project.name);
            if !seen_slugs.insert(slug.clone()) {
                warnings.push(ConfigWarning::error(format!(
                    "project '{}' shares output directory '{slug}' with another project",
                    project.name
                )));
            }
            validate_project(project, &mut warnings);
        }

        warnings
    }
}

fn validate_project(project: &ProjectConfig, warnings: &mut Vec<ConfigWarning>) {
    let name = &project.name;

    if project.epic_key.trim().is_empty() {
        warnings.push(ConfigWarning::error(format!(
            "project '{name}' has an empty epic_key"
        )));
    }

    let start = check_date(name, "start_date", &project.start_date, warnings);
    let deadline = check_date(name, "deadline", &project.deadline, warnings);
    if let (Some(start), Some(deadline)) = (start, deadline) {
        if deadline < start {
            warnings.push(ConfigWarning::error(format!(
                "project '{name}' has deadline {deadline} before start_date {start}"
            )));
        }
    }

    for holiday in &project.bank_holidays {
        check_date(name, "bank_holidays", holiday, warnings);
    }

    if project.developers.is_empty() {
        warnings.push(ConfigWarning::warning(format!(
            "project '{name}' has no developers; remaining tickets cannot be allocated"
        )));
    }

    let mut seen_devs = HashSet::new();
    for dev in &project.developers {
        if !seen_devs.insert(dev.name.as_str()) {
            warnings.push(ConfigWarning::warning(format!(
                "project '{name}' lists developer '{}' more than once",
                dev.name
            )));
        }
        for day in &dev.leave {
            let Some(date) = check_date(name, "leave", day, warnings) else {
                continue;
            };
            if let (Some(start), Some(deadline)) = (start, deadline) {
                if date < start || date > deadline {
                    warnings.push(ConfigWarning::warning(format!(
                        "project '{name}': leave {date} for '{}' is outside the project window",
                        dev.name
                    )));
                }
            }
        }
    }

    if let Some(statuses) = &project.statuses {
        for (status, a, b) in statuses.overlaps() {
            warnings.push(ConfigWarning::warning(format!(
                "project '{name}': status '{status}' is listed as both {a} and {b}"
            )));
        }
    }
}

fn check_date(
    project: &str,
    field: &str,
    value: &str,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<chrono::NaiveDate> {
    match parse_date(value) {
        Ok(d) => Some(d),
        Err(_) => {
            warnings.push(ConfigWarning::error(format!(
                "project '{project}': invalid {field} '{value}' (expected YYYY-MM-DD)"
            )));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
projects:
  - name: Open Banking Auth
    epic_key: OBAU-31149
    start_date: "2025-08-04"
    deadline: "2025-09-01"
    bank_holidays: ["2025-08-25"]
    developers:
      - name: OLENA
      - name: CHARLOTTE
        leave: ["2025-08-14", "2025-08-15"]
"#;

    fn sample() -> Config {
        serde_yaml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn sample_config_parses_with_defaults() {
        let cfg = sample();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.projects.len(), 1);
        assert_eq!(cfg.statuses, StatusVocabulary::default());
        let p = &cfg.projects[0];
        assert_eq!(p.developers.len(), 2);
        assert!(p.developers[0].leave.is_empty());
        assert_eq!(p.developers[1].leave.len(), 2);
        assert!(p.statuses.is_none());
    }

    #[test]
    fn default_vocabulary_matches_tracker_workflow() {
        let v = StatusVocabulary::default();
        assert!(v.is_dropped("Won't Do"));
        assert!(v.is_done("Code Review"));
        assert!(v.is_remaining("Backlog"));
        assert!(v.is_in_progress("In Progress"));
        assert_eq!(v.normalize("Backlog"), "To Do");
        assert_eq!(v.normalize("Acceptance"), "Acceptance");
    }

    #[test]
    fn partial_vocabulary_keeps_other_defaults() {
        let yaml = "statuses:\n  done: [Done, Acceptance]\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.statuses.is_done("Acceptance"));
        assert!(!cfg.statuses.is_done("Code Review"));
        assert!(cfg.statuses.is_dropped("Cancelled"));
    }

    #[test]
    fn resolve_parses_calendar_and_leave() {
        let cfg = sample();
        let project = cfg.resolve(&cfg.projects[0]).unwrap();
        assert_eq!(project.calendar.project_days().len(), 20);
        assert_eq!(project.developers[1].name, "CHARLOTTE");
        assert_eq!(project.developers[1].leave.len(), 2);
    }

    #[test]
    fn resolve_prefers_project_vocabulary() {
        let mut cfg = sample();
        let mut custom = StatusVocabulary::default();
        custom.done.insert("Acceptance".to_string());
        cfg.projects[0].statuses = Some(custom);
        let project = cfg.resolve(&cfg.projects[0]).unwrap();
        assert!(project.statuses.is_done("Acceptance"));
    }

    #[test]
    fn resolve_rejects_malformed_leave() {
        let mut cfg = sample();
        cfg.projects[0].developers[0].leave = vec!["14/08/2025".to_string()];
        let err = cfg.resolve(&cfg.projects[0]).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, PaceError::InvalidDate { .. }));
    }

    #[test]
    fn find_by_name_or_key() {
        let cfg = sample();
        assert_eq!(cfg.find("open banking auth").unwrap().epic_key, "OBAU-31149");
        assert_eq!(cfg.find("obau-31149").unwrap().name, "Open Banking Auth");
        assert!(matches!(
            cfg.find("nope"),
            Err(PaceError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn load_missing_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(PaceError::NotInitialized)
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        sample().save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.projects[0].name, "Open Banking Auth");
        assert_eq!(loaded.projects[0].bank_holidays, vec!["2025-08-25"]);
    }

    #[test]
    fn validate_sample_has_no_warnings() {
        assert!(sample().validate().is_empty());
    }

    #[test]
    fn validate_empty_config_warns() {
        let warnings = Config::default().validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("no projects configured")));
    }

    #[test]
    fn validate_bad_date_is_error() {
        let mut cfg = sample();
        cfg.projects[0].deadline = "2025-09-31".to_string();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| {
            w.level == WarnLevel::Error && w.message.contains("invalid deadline '2025-09-31'")
        }));
    }

    #[test]
    fn validate_deadline_before_start() {
        let mut cfg = sample();
        cfg.projects[0].deadline = "2025-07-01".to_string();
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("before start_date")));
    }

    #[test]
    fn validate_no_developers_warns() {
        let mut cfg = sample();
        cfg.projects[0].developers.clear();
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("no developers")));
    }

    #[test]
    fn validate_duplicate_developer_and_leave_outside_window() {
        let mut cfg = sample();
        cfg.projects[0].developers.push(DeveloperConfig {
            name: "OLENA".to_string(),
            leave: vec!["2025-10-01".to_string()],
        });
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("more than once")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("outside the project window")));
    }

    #[test]
    fn validate_shared_output_dir_is_error() {
        let mut cfg = sample();
        let mut dup = cfg.projects[0].clone();
        dup.name = "open banking auth".to_string();
        cfg.projects.push(dup);
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("output directory")));
    }

    #[test]
    fn validate_overlapping_statuses_warns() {
        let mut cfg = sample();
        cfg.statuses.done.insert("Dropped".to_string());
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.message.contains("'Dropped' is listed as both dropped and done")));
    }
}
