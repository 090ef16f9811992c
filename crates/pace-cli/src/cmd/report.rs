use crate::notify::SlackNotifier;
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use chrono::{Local, NaiveDate};
use jira_client::{JiraClient, JiraCredentials};
use pace_core::calendar::parse_date;
use pace_core::config::{Config, ProjectConfig};
use pace_core::dashboard::write_dashboard;
use pace_core::issue::Issue;
use pace_core::notify::MessagePayload;
use pace_core::paths;
use pace_core::PaceError;
use pace_core::report::ProjectReport;
use pace_core::snapshot::ProgressLog;
use serde::Serialize;
use std::path::{Path, PathBuf};

const SEPARATOR: &str =
    "----------------------------------------------------------------------------";

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ReportArgs {
    /// Only this project (name or epic key); default is every project
    #[arg(long)]
    pub project: Option<String>,

    /// Read `<DIR>/<EPIC_KEY>.json` saved search responses instead of Jira
    #[arg(long, value_name = "DIR")]
    pub issues_dir: Option<PathBuf>,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<String>,

    /// Don't append to the progress log
    #[arg(long)]
    pub no_log: bool,

    /// Don't write the dashboard SVG
    #[arg(long)]
    pub no_dashboard: bool,

    /// Post the combined report to the Slack webhook
    #[arg(long)]
    pub notify: bool,

    /// Send the combined report as a Slack direct message
    #[arg(long)]
    pub dm: bool,

    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub slack_webhook_url: Option<String>,

    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub slack_bot_token: Option<String>,

    #[arg(long, env = "SLACK_USER_ID")]
    pub slack_user_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Issue source
// ---------------------------------------------------------------------------

enum IssueSource {
    Saved(PathBuf),
    Jira(JiraClient),
}

impl IssueSource {
    fn from_args(issues_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        match issues_dir {
            Some(dir) => Ok(Self::Saved(dir)),
            None => {
                let creds = JiraCredentials::from_env().context("jira is not configured")?;
                Ok(Self::Jira(JiraClient::new(creds)?))
            }
        }
    }

    fn issues(&self, epic_key: &str) -> anyhow::Result<Vec<Issue>> {
        match self {
            Self::Saved(dir) => {
                let path = dir.join(format!("{epic_key}.json"));
                let data = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                jira_client::parse_search_response(&data)
                    .with_context(|| format!("failed to parse {}", path.display()))
            }
            Self::Jira(client) => client
                .issues_in_epic(epic_key)
                .with_context(|| format!("failed to fetch issues for {epic_key}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-project run
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ProjectOutcome {
    report: ProjectReport,
    report_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress_log: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dashboard: Option<PathBuf>,
}

#[derive(Serialize)]
struct ProjectFailure {
    project: String,
    /// Caused by the project's configuration rather than I/O.
    configuration: bool,
    error: String,
}

fn run_project(
    root: &Path,
    config: &Config,
    project: &ProjectConfig,
    source: &IssueSource,
    today: NaiveDate,
    args: &ReportArgs,
) -> anyhow::Result<ProjectOutcome> {
    let project = config.resolve(project)?;
    tracing::info!(project = %project.name, epic = %project.epic_key, "fetching issues");
    let issues = source.issues(&project.epic_key)?;
    let report = ProjectReport::build(&project, &issues, today)?;

    let out_dir = paths::project_output_dir(root, &project.name);
    let dashboard = if args.no_dashboard {
        None
    } else {
        Some(write_dashboard(&out_dir, today, &report.dashboard_input())?)
    };
    let report_file = paths::report_path(root, &project.name);
    pace_core::io::atomic_write(&report_file, report.render_text().as_bytes())?;

    // Last, so a failed run leaves no row behind.
    let progress_log = if args.no_log {
        None
    } else {
        let log = ProgressLog::for_project(root, &project.name);
        log.append(report.row.clone())
            .with_context(|| format!("failed to update {}", log.path().display()))?;
        Some(log.path().to_path_buf())
    };

    Ok(ProjectOutcome {
        report,
        report_file,
        progress_log,
        dashboard,
    })
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

fn deliver(args: &ReportArgs, text: &str) -> anyhow::Result<()> {
    let payload = MessagePayload::new(text, Local::now().naive_local());
    let notifier = SlackNotifier::new();
    if args.notify {
        let url = args
            .slack_webhook_url
            .as_deref()
            .context("--notify needs SLACK_WEBHOOK_URL")?;
        notifier.post_webhook(url, &payload)?;
    }
    if args.dm {
        let token = args
            .slack_bot_token
            .as_deref()
            .context("--dm needs SLACK_BOT_TOKEN")?;
        let user = args
            .slack_user_id
            .as_deref()
            .context("--dm needs SLACK_USER_ID")?;
        notifier.send_direct_message(token, user, &payload)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, args: ReportArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let today = match &args.today {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };

    let selected: Vec<&ProjectConfig> = match &args.project {
        Some(name) => vec![config.find(name)?],
        None => config.projects.iter().collect(),
    };
    if selected.is_empty() {
        anyhow::bail!("no projects configured in {}", paths::CONFIG_FILE);
    }

    let source = IssueSource::from_args(args.issues_dir.clone())?;

    let mut outcomes = Vec::new();
    let mut failures = Vec::new();
    for project in selected {
        match run_project(root, &config, project, &source, today, &args) {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                let configuration = e
                    .downcast_ref::<PaceError>()
                    .is_some_and(PaceError::is_configuration);
                tracing::error!(project = %project.name, configuration, "report failed: {e:#}");
                failures.push(ProjectFailure {
                    project: project.name.clone(),
                    configuration,
                    error: format!("{e:#}"),
                });
            }
        }
    }

    let combined: Vec<String> = outcomes.iter().map(|o| o.report.render_text()).collect();
    let combined = combined.join(&format!("\n{SEPARATOR}\n\n"));

    if json {
        print_json(&serde_json::json!({
            "today": today,
            "reports": outcomes,
            "failures": failures,
        }))?;
    } else {
        for outcome in &outcomes {
            print!("{}", outcome.report.render_text());
            println!();
            println!("Report written to {}", outcome.report_file.display());
            if let Some(path) = &outcome.progress_log {
                println!("Progress log updated: {}", path.display());
            }
            if let Some(path) = &outcome.dashboard {
                println!("Dashboard written to {}", path.display());
            }
            println!("{SEPARATOR}");
        }
        for f in &failures {
            println!("[error] {}: {}", f.project, f.error);
        }
    }

    if (args.notify || args.dm) && !combined.is_empty() {
        deliver(&args, &combined)?;
    }

    if !failures.is_empty() {
        anyhow::bail!(
            "{} of {} projects failed",
            failures.len(),
            failures.len() + outcomes.len()
        );
    }
    Ok(())
}
