use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Args;
use pace_core::config::Config;
use pace_core::snapshot::ProgressLog;
use std::path::Path;

#[derive(Args)]
pub struct HistoryArgs {
    /// Project name or epic key
    #[arg(long)]
    pub project: String,
}

pub fn run(root: &Path, args: HistoryArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let project = config.find(&args.project)?;
    let log = ProgressLog::for_project(root, &project.name);
    let rows = log
        .load()
        .with_context(|| format!("failed to read {}", log.path().display()))?;

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No progress recorded for {}.", project.name);
        return Ok(());
    }

    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.date.clone(),
                r.total_tickets.to_string(),
                r.tickets_completed.to_string(),
                r.tickets_remaining.to_string(),
                r.days_elapsed.to_string(),
                r.days_remaining.to_string(),
                format!("{:.2}", r.current_velocity),
                format!("{:.2}", r.required_velocity),
                format!("{:.1}", r.projected_tickets_done),
                r.on_track.clone(),
            ]
        })
        .collect();
    print_table(
        &[
            "DATE",
            "TOTAL",
            "DONE",
            "REMAINING",
            "ELAPSED",
            "DAYS LEFT",
            "VELOCITY",
            "REQUIRED",
            "PROJECTED",
            "ON TRACK",
        ],
        table,
    );
    Ok(())
}
