use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use pace_core::calendar::{parse_dates, working_days_between, DateSet};
use pace_core::config::Config;
use std::path::Path;

#[derive(Args)]
pub struct CalendarArgs {
    /// First day (YYYY-MM-DD); defaults to the project start date
    #[arg(long)]
    pub from: Option<String>,

    /// Last day (YYYY-MM-DD); defaults to the project deadline
    #[arg(long)]
    pub to: Option<String>,

    /// Use this project's dates and bank holidays
    #[arg(long)]
    pub project: Option<String>,

    /// Extra holiday to exclude (repeatable)
    #[arg(long = "holiday", value_name = "YYYY-MM-DD")]
    pub holidays: Vec<String>,
}

pub fn run(root: &Path, args: CalendarArgs, json: bool) -> anyhow::Result<()> {
    let mut holidays: DateSet = parse_dates(&args.holidays)?;
    let (mut from, mut to) = (args.from, args.to);

    if let Some(name) = &args.project {
        let config = Config::load(root).context("failed to load config")?;
        let project = config.find(name)?;
        holidays.extend(parse_dates(&project.bank_holidays)?);
        from.get_or_insert_with(|| project.start_date.clone());
        to.get_or_insert_with(|| project.deadline.clone());
    }

    let (Some(from), Some(to)) = (from, to) else {
        anyhow::bail!("--from and --to are required without --project");
    };
    let days = working_days_between(&from, &to, &holidays)?;

    if json {
        let value = serde_json::json!({
            "from": from,
            "to": to,
            "working_days": days.len(),
            "days": days,
        });
        return print_json(&value);
    }

    for d in &days {
        println!("{}  {}", d.format("%Y-%m-%d"), d.format("%a"));
    }
    println!("{} working days", days.len());
    Ok(())
}
