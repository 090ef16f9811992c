//! Time each ticket has spent in progress, measured in working days from the
//! first move into an in-progress status to the first later move into a done
//! status.

use crate::calendar::{working_days_between, DateSet};
use crate::config::StatusVocabulary;
use crate::error::Result;
use crate::issue::Issue;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeInProgress {
    pub key: String,
    pub summary: String,
    pub started: NaiveDate,
    /// `None` while the ticket is still open.
    pub finished: Option<NaiveDate>,
    pub working_days: usize,
}

impl TimeInProgress {
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSummary {
    pub started: usize,
    pub finished: usize,
    pub mean_working_days: Option<f64>,
}

pub fn time_in_progress(
    issues: &[Issue],
    vocab: &StatusVocabulary,
    holidays: &DateSet,
    today: NaiveDate,
) -> Result<Vec<TimeInProgress>> {
    let mut out = Vec::new();
    for issue in issues {
        let Some(start_idx) = issue
            .history
            .iter()
            .position(|c| vocab.is_in_progress(&c.to))
        else {
            continue;
        };
        let started = issue.history[start_idx].date();
        let finished = issue.history[start_idx + 1..]
            .iter()
            .find(|c| vocab.is_done(&c.to))
            .map(|c| c.date());
        let until = finished.unwrap_or(today);
        let working_days = working_days_between(started, until, holidays)?.len();
        out.push(TimeInProgress {
            key: issue.key.clone(),
            summary: issue.summary.clone(),
            started,
            finished,
            working_days,
        });
    }
    Ok(out)
}

pub fn summarize(entries: &[TimeInProgress]) -> CycleSummary {
    let done: Vec<usize> = entries
        .iter()
        .filter(|e| e.is_finished())
        .map(|e| e.working_days)
        .collect();
    let mean_working_days = if done.is_empty() {
        None
    } else {
        Some(done.iter().sum::<usize>() as f64 / done.len() as f64)
    };
    CycleSummary {
        started: entries.len(),
        finished: done.len(),
        mean_working_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{parse_date, parse_dates};
    use crate::issue::StatusChange;
    use chrono::DateTime;

    fn change(at: &str, from: &str, to: &str) -> StatusChange {
        StatusChange {
            at: DateTime::parse_from_rfc3339(at).unwrap(),
            from: Some(from.to_string()),
            to: to.to_string(),
        }
    }

    fn today() -> NaiveDate {
        parse_date("2025-08-22").unwrap()
    }

    #[test]
    fn finished_ticket_counts_working_days_between_transitions() {
        let issue = Issue::new("OBAU-1", "Login", "Done").with_history(vec![
            change("2025-08-07T09:00:00+01:00", "To Do", "In Progress"),
            change("2025-08-12T16:00:00+01:00", "In Progress", "Code Review"),
            change("2025-08-13T10:00:00+01:00", "Code Review", "Done"),
        ]);
        let vocab = StatusVocabulary::default();
        let got = time_in_progress(&[issue], &vocab, &DateSet::new(), today()).unwrap();
        assert_eq!(got.len(), 1);
        // Code Review is done-equivalent: Thu 7 → Tue 12 is 4 working days.
        assert_eq!(got[0].finished, Some(parse_date("2025-08-12").unwrap()));
        assert_eq!(got[0].working_days, 4);
    }

    #[test]
    fn open_ticket_runs_until_today() {
        let issue = Issue::new("OBAU-2", "Logout", "In Progress").with_history(vec![change(
            "2025-08-18T09:00:00+01:00",
            "To Do",
            "In Progress",
        )]);
        let vocab = StatusVocabulary::default();
        let holidays = parse_dates(["2025-08-20"]).unwrap();
        let got = time_in_progress(&[issue], &vocab, &holidays, today()).unwrap();
        assert_eq!(got[0].finished, None);
        assert_eq!(got[0].working_days, 4);
    }

    #[test]
    fn never_started_is_omitted() {
        let issues = vec![
            Issue::new("OBAU-3", "Untouched", "To Do"),
            Issue::new("OBAU-4", "Closed directly", "Done").with_history(vec![change(
                "2025-08-05T09:00:00Z",
                "To Do",
                "Done",
            )]),
        ];
        let vocab = StatusVocabulary::default();
        let got = time_in_progress(&issues, &vocab, &DateSet::new(), today()).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn done_before_start_is_ignored() {
        let issue = Issue::new("OBAU-5", "Reopened", "In Progress").with_history(vec![
            change("2025-08-04T09:00:00Z", "To Do", "Done"),
            change("2025-08-19T09:00:00Z", "Done", "In Progress"),
        ]);
        let vocab = StatusVocabulary::default();
        let got = time_in_progress(&[issue], &vocab, &DateSet::new(), today()).unwrap();
        assert_eq!(got[0].started, parse_date("2025-08-19").unwrap());
        assert!(!got[0].is_finished());
    }

    #[test]
    fn summary_averages_finished_only() {
        let d = parse_date("2025-08-04").unwrap();
        let entry = |days, finished: bool| TimeInProgress {
            key: "K".into(),
            summary: "s".into(),
            started: d,
            finished: finished.then_some(d),
            working_days: days,
        };
        let s = summarize(&[entry(2, true), entry(4, true), entry(30, false)]);
        assert_eq!(s.started, 3);
        assert_eq!(s.finished, 2);
        assert_eq!(s.mean_working_days, Some(3.0));
        assert_eq!(summarize(&[]).mean_working_days, None);
    }
}
