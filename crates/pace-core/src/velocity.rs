use crate::calendar::CalendarConstraint;
use crate::classifier::Classifier;
use crate::issue::Issue;
use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// MetricsSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time delivery metrics for one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub date: NaiveDate,
    /// Non-dropped tickets.
    pub total_tickets: usize,
    /// Done-equivalent tickets.
    pub done: usize,
    pub in_progress: usize,
    pub remaining_tickets: usize,
    pub elapsed_days: usize,
    pub remaining_days: usize,
    pub total_days: usize,
    /// Tickets completed per elapsed working day.
    pub actual_velocity: f64,
    /// Tickets per working day needed to finish on time.
    pub required_velocity: f64,
    pub projected_done: f64,
    pub on_track: bool,
}

/// `numerator / denominator`, or 0 when there is nothing to divide by.
fn rate(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn project_velocity(
    issues: &[Issue],
    classifier: &Classifier<'_>,
    calendar: &CalendarConstraint,
    today: NaiveDate,
) -> MetricsSnapshot {
    let elapsed = calendar.elapsed_days(today).len();
    let remaining = calendar.remaining_days(today).len();
    let total = elapsed + remaining;

    let total_tickets = classifier.count_total(issues);
    let done = classifier.count_done(issues);

    let actual_velocity = rate(done, elapsed);
    let required_velocity = rate(total_tickets, total);
    let projected_done = actual_velocity * total as f64;

    MetricsSnapshot {
        date: today,
        total_tickets,
        done,
        in_progress: classifier.count_in_progress(issues),
        remaining_tickets: total_tickets.saturating_sub(done),
        elapsed_days: elapsed,
        remaining_days: remaining,
        total_days: total,
        actual_velocity,
        required_velocity,
        projected_done,
        on_track: projected_done >= total_tickets as f64,
    }
}

// ---------------------------------------------------------------------------
// ProgressCurves
// ---------------------------------------------------------------------------

/// Cumulative required and projected-actual ticket counts over every project
/// working day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressCurves {
    pub days: Vec<NaiveDate>,
    pub required: Vec<f64>,
    pub actual: Vec<f64>,
}

impl ProgressCurves {
    /// Axis labels such as `Aug 04`.
    pub fn labels(&self) -> Vec<String> {
        self.days
            .iter()
            .map(|d| d.format("%b %d").to_string())
            .collect()
    }
}

pub fn progress_curves(
    calendar: &CalendarConstraint,
    today: NaiveDate,
    total_tickets: usize,
    done: usize,
) -> ProgressCurves {
    let days = calendar.project_days();
    let n = days.len();
    let total = total_tickets as f64;

    // A single working day has no interval to interpolate over.
    let required = match n {
        0 => Vec::new(),
        1 => vec![total],
        _ => (0..n)
            .map(|i| i as f64 / (n - 1) as f64 * total)
            .collect(),
    };

    let velocity = rate(done, calendar.elapsed_days(today).len());
    let actual = (0..n)
        .map(|i| (i as f64 * velocity).min(total))
        .collect();

    ProgressCurves {
        days,
        required,
        actual,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
