use crate::config::Developer;
use crate::error::{PaceError, Result};
use crate::issue::Issue;
use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketAssignment {
    pub key: String,
    pub summary: String,
    pub developer: String,
    pub days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperLoad {
    pub name: String,
    /// Working days in the window minus leave.
    pub availability: usize,
    pub tickets: Vec<String>,
    /// `tickets.len() * days_per_ticket`.
    pub workload_days: f64,
}

impl DeveloperLoad {
    pub fn ticket_count(&self) -> usize {
        self.tickets.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub working_days: usize,
    pub remaining_tickets: usize,
    pub total_dev_days: usize,
    pub days_per_ticket: f64,
    pub assignments: Vec<TicketAssignment>,
    pub developers: Vec<DeveloperLoad>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AllocationPlan {
    /// Nothing left to allocate.
    NoRemainingWork,
    Planned(Allocation),
}

impl AllocationPlan {
    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            AllocationPlan::NoRemainingWork => None,
            AllocationPlan::Planned(a) => Some(a),
        }
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Working days in `working_days` that `dev` is not on leave.
pub fn availability(dev: &Developer, working_days: &[NaiveDate]) -> usize {
    let on_leave = working_days
        .iter()
        .filter(|d| dev.leave.contains(*d))
        .count();
    working_days.len() - on_leave
}

/// Spread `remaining` across `developers` round-robin by position.
///
/// Issue `i` goes to `developers[i % developers.len()]` regardless of how many
/// days each developer has available.
pub fn plan_allocation(
    remaining: &[&Issue],
    developers: &[Developer],
    working_days: &[NaiveDate],
) -> Result<AllocationPlan> {
    if remaining.is_empty() {
        return Ok(AllocationPlan::NoRemainingWork);
    }
    if developers.is_empty() {
        return Err(PaceError::NoDevelopers {
            tickets: remaining.len(),
        });
    }

    let mut loads: Vec<DeveloperLoad> = developers
        .iter()
        .map(|dev| DeveloperLoad {
            name: dev.name.clone(),
            availability: availability(dev, working_days),
            tickets: Vec::new(),
            workload_days: 0.0,
        })
        .collect();

    let total_dev_days: usize = loads.iter().map(|l| l.availability).sum();
    let days_per_ticket = total_dev_days as f64 / remaining.len() as f64;

    let mut assignments = Vec::with_capacity(remaining.len());
    for (i, issue) in remaining.iter().enumerate() {
        let load = &mut loads[i % developers.len()];
        load.tickets.push(issue.key.clone());
        assignments.push(TicketAssignment {
            key: issue.key.clone(),
            summary: issue.summary.clone(),
            developer: load.name.clone(),
            days: days_per_ticket,
        });
    }
    for load in &mut loads {
        load.workload_days = load.tickets.len() as f64 * days_per_ticket;
    }

    tracing::debug!(
        tickets = remaining.len(),
        developers = developers.len(),
        total_dev_days,
        "planned allocation"
    );

    Ok(AllocationPlan::Planned(Allocation {
        working_days: working_days.len(),
        remaining_tickets: remaining.len(),
        total_dev_days,
        days_per_ticket,
        assignments,
        developers: loads,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{parse_dates, working_days_between, DateSet};

    fn tickets(n: usize) -> Vec<Issue> {
        (0..n)
            .map(|i| Issue::new(format!("OBAU-{i}"), format!("ticket {i}"), "To Do"))
            .collect()
    }

    fn team() -> Vec<Developer> {
        vec![
            Developer::new("OLENA"),
            Developer::new("CHARLOTTE")
                .with_leave(parse_dates(["2025-08-14", "2025-08-15"]).unwrap()),
        ]
    }

    fn ten_day_window() -> Vec<NaiveDate> {
        working_days_between("2025-08-11", "2025-08-22", &DateSet::new()).unwrap()
    }

    #[test]
    fn leave_reduces_availability() {
        let plan = {
            let list = tickets(6);
            let refs: Vec<&Issue> = list.iter().collect();
            plan_allocation(&refs, &team(), &ten_day_window()).unwrap()
        };
        let a = plan.allocation().unwrap();
        assert_eq!(a.working_days, 10);
        assert_eq!(a.developers[0].availability, 10);
        assert_eq!(a.developers[1].availability, 8);
        assert_eq!(a.total_dev_days, 18);
        assert!((a.days_per_ticket - 3.0).abs() < f64::EPSILON);
        assert_eq!(a.developers[0].ticket_count(), 3);
        assert!((a.developers[1].workload_days - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_remaining_is_terminal_state() {
        let plan = plan_allocation(&[], &[], &ten_day_window()).unwrap();
        assert_eq!(plan, AllocationPlan::NoRemainingWork);
        assert!(plan.allocation().is_none());
    }

    #[test]
    fn no_developers_with_work_is_error() {
        let list = tickets(2);
        let refs: Vec<&Issue> = list.iter().collect();
        let err = plan_allocation(&refs, &[], &ten_day_window()).unwrap_err();
        assert!(matches!(err, PaceError::NoDevelopers { tickets: 2 }));
        assert!(err.is_configuration());
    }

    #[test]
    fn round_robin_ignores_availability() {
        let devs = vec![
            Developer::new("A"),
            Developer::new("B").with_leave(ten_day_window().into_iter().collect()),
            Developer::new("C"),
        ];
        let list = tickets(7);
        let refs: Vec<&Issue> = list.iter().collect();
        let plan = plan_allocation(&refs, &devs, &ten_day_window()).unwrap();
        let a = plan.allocation().unwrap();
        assert_eq!(a.developers[1].availability, 0);
        for (i, assignment) in a.assignments.iter().enumerate() {
            assert_eq!(assignment.key, format!("OBAU-{i}"));
            assert_eq!(assignment.developer, devs[i % 3].name);
        }
        assert_eq!(a.developers[0].tickets, vec!["OBAU-0", "OBAU-3", "OBAU-6"]);
        assert_eq!(a.developers[1].tickets, vec!["OBAU-1", "OBAU-4"]);
    }

    #[test]
    fn leave_outside_window_is_ignored() {
        let dev = Developer::new("X").with_leave(parse_dates(["2025-12-25"]).unwrap());
        assert_eq!(availability(&dev, &ten_day_window()), 10);
    }

    #[test]
    fn empty_window_gives_zero_days_per_ticket() {
        let list = tickets(3);
        let refs: Vec<&Issue> = list.iter().collect();
        let plan = plan_allocation(&refs, &team(), &[]).unwrap();
        let a = plan.allocation().unwrap();
        assert_eq!(a.total_dev_days, 0);
        assert_eq!(a.days_per_ticket, 0.0);
    }
}
