use crate::classifier::StatusCounts;
use crate::config::StatusVocabulary;
use crate::error::Result;
use crate::paths;
use crate::velocity::MetricsSnapshot;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DROPPED_COLUMN: &str = "Dropped";

/// Column names a status count may not take.
pub const RESERVED_COLUMNS: &[&str] = &[
    "Date",
    "Total Tickets",
    "Tickets Completed",
    "Tickets Remaining",
    "Days Elapsed",
    "Days Remaining",
    "Current Velocity",
    "Required Velocity",
    "Projected Tickets Done",
    "On Track",
    DROPPED_COLUMN,
];

/// Column for a status count. Statuses named like a reserved column get a
/// ` (status)` suffix.
pub fn status_column_name(status: &str) -> String {
    if RESERVED_COLUMNS.contains(&status) {
        format!("{status} (status)")
    } else {
        status.to_string()
    }
}

// ---------------------------------------------------------------------------
// StatusColumns
// ---------------------------------------------------------------------------

/// Per-status counts that serialize as ordered `name: count` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusColumns(pub Vec<(String, usize)>);

impl StatusColumns {
    /// Add `count` under `name`, merging with an existing column.
    fn add(&mut self, name: String, count: usize) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, c)) => *c += count,
            None => self.0.push((name, count)),
        }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, c)| *c)
    }
}

impl Serialize for StatusColumns {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StatusColumns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ColumnsVisitor;

        impl<'de> Visitor<'de> for ColumnsVisitor {
            type Value = StatusColumns;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of status name to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut columns = Vec::new();
                while let Some((name, count)) = access.next_entry::<String, usize>()? {
                    columns.push((name, count));
                }
                Ok(StatusColumns(columns))
            }
        }

        deserializer.deserialize_map(ColumnsVisitor)
    }
}

// ---------------------------------------------------------------------------
// SnapshotRow
// ---------------------------------------------------------------------------

/// One flat progress-log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Total Tickets")]
    pub total_tickets: usize,
    #[serde(rename = "Tickets Completed")]
    pub tickets_completed: usize,
    #[serde(rename = "Tickets Remaining")]
    pub tickets_remaining: usize,
    #[serde(flatten)]
    pub statuses: StatusColumns,
    #[serde(rename = "Days Elapsed")]
    pub days_elapsed: usize,
    #[serde(rename = "Days Remaining")]
    pub days_remaining: usize,
    #[serde(rename = "Current Velocity")]
    pub current_velocity: f64,
    #[serde(rename = "Required Velocity")]
    pub required_velocity: f64,
    #[serde(rename = "Projected Tickets Done")]
    pub projected_tickets_done: f64,
    #[serde(rename = "On Track")]
    pub on_track: String,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl SnapshotRow {
    /// Build a row. Status columns are every display-order status (0 when
    /// absent), then any other observed status, then the dropped count.
    /// Each column name appears once.
    pub fn from_metrics(
        metrics: &MetricsSnapshot,
        counts: &StatusCounts,
        vocab: &StatusVocabulary,
        dropped: usize,
    ) -> Self {
        let mut columns = StatusColumns::default();
        for status in &vocab.display_order {
            columns.add(status_column_name(status), counts.get(status));
        }
        for (name, count) in counts.iter() {
            if !vocab.display_order.iter().any(|s| s == name) {
                columns.add(status_column_name(name), count);
            }
        }
        columns.add(DROPPED_COLUMN.to_string(), dropped);

        Self {
            date: metrics.date.format("%Y-%m-%d").to_string(),
            total_tickets: metrics.total_tickets,
            tickets_completed: metrics.done,
            tickets_remaining: metrics.remaining_tickets,
            statuses: columns,
            days_elapsed: metrics.elapsed_days,
            days_remaining: metrics.remaining_days,
            current_velocity: round_to(metrics.actual_velocity, 2),
            required_velocity: round_to(metrics.required_velocity, 2),
            projected_tickets_done: round_to(metrics.projected_done, 1),
            on_track: if metrics.on_track { "Yes" } else { "No" }.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressLog
// ---------------------------------------------------------------------------

/// Append-only YAML log of snapshot rows for one project.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_project(root: &Path, project_name: &str) -> Self {
        Self::new(paths::progress_log_path(root, project_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rows, oldest first. A missing log has no rows.
    pub fn load(&self) -> Result<Vec<SnapshotRow>> {
        match crate::io::read_if_exists(&self.path)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_yaml::from_str(&data)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Append `row` and rewrite the log. Returns the updated rows.
    pub fn append(&self, row: SnapshotRow) -> Result<Vec<SnapshotRow>> {
        let mut rows = self.load()?;
        if rows.is_empty() {
            tracing::info!(path = %self.path.display(), "starting new progress log");
        }
        rows.push(row);
        let data = serde_yaml::to_string(&rows)?;
        crate::io::atomic_write(&self.path, data.as_bytes())?;
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date;
    use crate::classifier::Classifier;
    use crate::issue::Issue;
    use tempfile::TempDir;

    fn metrics() -> MetricsSnapshot {
        MetricsSnapshot {
            date: parse_date("2025-08-18").unwrap(),
            total_tickets: 10,
            done: 4,
            in_progress: 2,
            remaining_tickets: 6,
            elapsed_days: 11,
            remaining_days: 10,
            total_days: 21,
            actual_velocity: 4.0 / 11.0,
            required_velocity: 10.0 / 21.0,
            projected_done: 4.0 / 11.0 * 21.0,
            on_track: false,
        }
    }

    fn counts(vocab: &StatusVocabulary) -> StatusCounts {
        let issues: Vec<Issue> = ["Backlog", "To Do", "In Progress", "Done", "Blocked"]
            .iter()
            .map(|s| Issue::new("K", "s", *s))
            .collect();
        Classifier::new(vocab).status_counts(&issues)
    }

    fn row() -> SnapshotRow {
        let vocab = StatusVocabulary::default();
        SnapshotRow::from_metrics(&metrics(), &counts(&vocab), &vocab, 3)
    }

    #[test]
    fn row_rounds_and_flags() {
        let r = row();
        assert_eq!(r.date, "2025-08-18");
        assert_eq!(r.tickets_remaining, 6);
        assert_eq!(r.current_velocity, 0.36);
        assert_eq!(r.required_velocity, 0.48);
        assert_eq!(r.projected_tickets_done, 7.6);
        assert_eq!(r.on_track, "No");
    }

    #[test]
    fn row_status_columns_are_ordered() {
        let r = row();
        let names: Vec<_> = r.statuses.0.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "To Do",
                "In Progress",
                "Code Review",
                "Acceptance",
                "Ready for production",
                "Done",
                "Blocked",
                "Dropped",
            ]
        );
        assert_eq!(r.statuses.get("To Do"), Some(2));
        assert_eq!(r.statuses.get("Code Review"), Some(0));
        assert_eq!(r.statuses.get("Dropped"), Some(3));
    }

    #[test]
    fn row_yaml_keeps_column_order() {
        let yaml = serde_yaml::to_string(&row()).unwrap();
        let pos = |key: &str| yaml.find(key).unwrap_or_else(|| panic!("missing {key}"));
        assert!(pos("Date:") < pos("Total Tickets:"));
        assert!(pos("Tickets Remaining:") < pos("To Do:"));
        assert!(pos("To Do:") < pos("Dropped:"));
        assert!(pos("Dropped:") < pos("Days Elapsed:"));
        assert!(pos("Projected Tickets Done:") < pos("On Track:"));
    }

    #[test]
    fn row_yaml_roundtrip_preserves_statuses() {
        let original = row();
        let yaml = serde_yaml::to_string(&original).unwrap();
        let parsed: SnapshotRow = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn append_bootstraps_missing_log() {
        let dir = TempDir::new().unwrap();
        let log = ProgressLog::for_project(dir.path(), "Open Banking");
        assert!(log.load().unwrap().is_empty());
        let rows = log.append(row()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(dir
            .path()
            .join("output/open_banking/progress_log.yaml")
            .exists());
    }

    #[test]
    fn append_keeps_previous_rows() {
        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("log.yaml"));
        let first = row();
        let mut second = row();
        second.date = "2025-08-19".to_string();
        log.append(first.clone()).unwrap();
        log.append(second.clone()).unwrap();
        let rows = log.load().unwrap();
        assert_eq!(rows, vec![first, second]);
    }

    #[test]
    fn empty_file_loads_as_no_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.yaml");
        std::fs::write(&path, "").unwrap();
        assert!(ProgressLog::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.yaml");
        std::fs::write(&path, "not: [a, list").unwrap();
        assert!(ProgressLog::new(&path).append(row()).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not: [a, list");
    }

    fn row_for(statuses: &[&str], vocab: &StatusVocabulary, dropped: usize) -> SnapshotRow {
        let issues: Vec<Issue> = statuses.iter().map(|s| Issue::new("K", "s", *s)).collect();
        let counts = Classifier::new(vocab).status_counts(&issues);
        SnapshotRow::from_metrics(&metrics(), &counts, vocab, dropped)
    }

    #[test]
    fn status_named_like_a_fixed_column_is_renamed() {
        let vocab = StatusVocabulary::default();
        let r = row_for(&["Date", "On Track", "Done"], &vocab, 0);
        assert_eq!(r.statuses.get("Date"), None);
        assert_eq!(r.statuses.get("Date (status)"), Some(1));
        assert_eq!(r.statuses.get("On Track (status)"), Some(1));
        assert_eq!(r.date, "2025-08-18");

        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("log.yaml"));
        log.append(r.clone()).unwrap();
        log.append(r.clone()).unwrap();
        assert_eq!(log.load().unwrap(), vec![r.clone(), r]);
    }

    #[test]
    fn literal_dropped_status_gets_its_own_column() {
        let mut vocab = StatusVocabulary::default();
        vocab.dropped = ["Cancelled".to_string()].into_iter().collect();
        let r = row_for(&["Dropped", "Cancelled", "Done"], &vocab, 1);
        let dropped_columns = r.statuses.0.iter().filter(|(n, _)| n == "Dropped").count();
        assert_eq!(dropped_columns, 1);
        assert_eq!(r.statuses.get("Dropped"), Some(1));
        assert_eq!(r.statuses.get("Dropped (status)"), Some(1));

        let yaml = serde_yaml::to_string(&vec![r.clone()]).unwrap();
        assert_eq!(yaml.matches("\n  Dropped:").count(), 1);

        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("log.yaml"));
        log.append(r.clone()).unwrap();
        log.append(r.clone()).unwrap();
        assert_eq!(log.load().unwrap().len(), 2);
    }
}
