//! One project's full delivery report, assembled from the calendar,
//! classifier, planner and projector.

use crate::allocation::{plan_allocation, AllocationPlan};
use crate::classifier::{Classifier, StatusCounts};
use crate::config::Project;
use crate::cycle::{summarize, time_in_progress, CycleSummary, TimeInProgress};
use crate::dashboard::DashboardInput;
use crate::error::Result;
use crate::issue::Issue;
use crate::snapshot::SnapshotRow;
use crate::velocity::{progress_curves, project_velocity, MetricsSnapshot, ProgressCurves};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub project: String,
    pub epic_key: String,
    pub start_date: NaiveDate,
    pub deadline: NaiveDate,
    pub developers: Vec<String>,
    pub metrics: MetricsSnapshot,
    /// Non-dropped counts in display order.
    pub status_counts: StatusCounts,
    pub dropped: usize,
    pub allocation: AllocationPlan,
    pub curves: ProgressCurves,
    pub time_in_progress: Vec<TimeInProgress>,
    pub cycle: CycleSummary,
    pub row: SnapshotRow,
}

impl ProjectReport {
    /// Run every computation for `project` as of `today`.
    ///
    /// Fails as a whole; nothing is returned for a project whose allocation
    /// or history cannot be computed.
    pub fn build(project: &Project, issues: &[Issue], today: NaiveDate) -> Result<Self> {
        let vocab = &project.statuses;
        let classifier = Classifier::new(vocab);
        let calendar = &project.calendar;

        let metrics = project_velocity(issues, &classifier, calendar, today);
        let status_counts = classifier.status_counts(issues).ordered(vocab);
        let dropped = classifier.count_dropped(issues);

        let remaining = classifier.remaining(issues);
        let window = calendar.remaining_days(today);
        let allocation = plan_allocation(&remaining, &project.developers, &window)?;

        let curves = progress_curves(calendar, today, metrics.total_tickets, metrics.done);
        let time_in_progress = time_in_progress(issues, vocab, &calendar.holidays, today)?;
        let cycle = summarize(&time_in_progress);
        let row = SnapshotRow::from_metrics(&metrics, &status_counts, vocab, dropped);

        tracing::debug!(
            project = %project.name,
            issues = issues.len(),
            on_track = metrics.on_track,
            "built report"
        );

        Ok(Self {
            project: project.name.clone(),
            epic_key: project.epic_key.clone(),
            start_date: calendar.start,
            deadline: calendar.deadline,
            developers: project.developers.iter().map(|d| d.name.clone()).collect(),
            metrics,
            status_counts,
            dropped,
            allocation,
            curves,
            time_in_progress,
            cycle,
            row,
        })
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }

    pub fn dashboard_input(&self) -> DashboardInput {
        DashboardInput {
            epic_key: self.epic_key.clone(),
            project_name: self.project.clone(),
            status_counts: self.status_counts.clone(),
            labels: self.curves.labels(),
            required: self.curves.required.clone(),
            actual: self.curves.actual.clone(),
        }
    }

    fn fmt_allocation(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Allocation plan")?;
        let a = match &self.allocation {
            AllocationPlan::NoRemainingWork => return writeln!(f, "  No remaining tickets."),
            AllocationPlan::Planned(a) => a,
        };
        writeln!(f, "  Remaining tickets: {}", a.remaining_tickets)?;
        writeln!(f, "  Developers: {}", self.developers.join(", "))?;
        writeln!(f, "  Total available dev-days: {}", a.total_dev_days)?;
        writeln!(f, "  Average time per ticket: {:.2} days", a.days_per_ticket)?;
        for t in &a.assignments {
            writeln!(
                f,
                "  - {}: \"{}\" -> {:.2} days ({})",
                t.key, t.summary, t.days, t.developer
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Developer workload")?;
        for d in &a.developers {
            writeln!(
                f,
                "  - {}: {:.2} days for {} tickets -> {} days available",
                d.name,
                d.workload_days,
                d.ticket_count(),
                d.availability
            )?;
        }
        Ok(())
    }

    fn fmt_progress(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.metrics;
        writeln!(f, "Progress report")?;
        writeln!(f, "  Project start: {}", self.start_date)?;
        writeln!(f, "  Deadline: {}", self.deadline)?;
        writeln!(f, "  Today: {}", m.date)?;
        writeln!(f, "  Tickets done: {} / {}", m.done, m.total_tickets)?;
        writeln!(f, "  In progress: {}", m.in_progress)?;
        writeln!(f, "  Elapsed working days: {}", m.elapsed_days)?;
        writeln!(f, "  Remaining working days: {}", m.remaining_days)?;
        writeln!(f, "  Total working days: {}", m.total_days)?;
        writeln!(
            f,
            "  Velocity: {:.2} (actual), {:.2} (required)",
            m.actual_velocity, m.required_velocity
        )?;
        if m.on_track {
            writeln!(
                f,
                "  On track: projected to finish ~{:.1} tickets.",
                m.projected_done
            )
        } else {
            writeln!(
                f,
                "  Behind schedule: projected to finish only ~{:.1} tickets.",
                m.projected_done
            )
        }
    }

    fn fmt_cycle(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Time in progress")?;
        if self.time_in_progress.is_empty() {
            return writeln!(f, "  No tickets have started.");
        }
        for t in &self.time_in_progress {
            match t.finished {
                Some(done) => writeln!(
                    f,
                    "  - {}: {} working days (finished {})",
                    t.key, t.working_days, done
                )?,
                None => writeln!(
                    f,
                    "  - {}: {} working days (in progress since {})",
                    t.key, t.working_days, t.started
                )?,
            }
        }
        if let Some(mean) = self.cycle.mean_working_days {
            writeln!(f, "  Mean for finished tickets: {mean:.1} working days")?;
        }
        Ok(())
    }
}

impl fmt::Display for ProjectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ({}) ==", self.project, self.epic_key)?;
        writeln!(f)?;
        self.fmt_allocation(f)?;
        writeln!(f)?;
        self.fmt_progress(f)?;
        writeln!(f)?;
        self.fmt_cycle(f)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
