//! tenweek CLI - log actions, set goals, see progress.

mod config;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tenweek_core::{
    Action, ActionId, Actionability, Contribution, Goal, GoalId, GoalKind, Priority, Term, Value,
    ValueKind,
};
use tenweek_progress::{
    confirm_match, create_manual_match, unassigned_goals, validate_goal_term_assignment,
    BasicProgressTracker, GoalProgress, ProgressSummary, ProgressTracker, TrackerOptions,
};
use tenweek_storage::{JsonStorage, Storage};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "tenweek")]
#[command(about = "Track actions against goals, terms and values", long_about = None)]
struct Cli {
    /// Config file (defaults to ./tenweek.toml when present)
    #[arg(long, global = true, env = "TENWEEK_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory, overriding the config file
    #[arg(long, global = true, env = "TENWEEK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default tenweek.toml
    Init {
        /// Where to write it
        #[arg(default_value = config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
    /// Log and list actions
    Action {
        #[command(subcommand)]
        command: ActionCommand,
    },
    /// Define and inspect goals
    Goal {
        #[command(subcommand)]
        command: GoalCommand,
    },
    /// Define planning terms
    Term {
        #[command(subcommand)]
        command: TermCommand,
    },
    /// Record personal values
    Value {
        #[command(subcommand)]
        command: ValueCommand,
    },
    /// Link an action to a goal by hand
    Link {
        /// Action ID
        action: String,
        /// Goal ID
        goal: String,
        /// Amount to credit (defaults to the action's measurement)
        #[arg(long)]
        amount: Option<f64>,
    },
    /// Show progress for every goal, or for one term
    Progress {
        /// Count actions outside goal windows too
        #[arg(long)]
        ignore_period: bool,
        /// Only goals committed to this term number
        #[arg(long)]
        term: Option<u32>,
    },
    /// Review inferred matches
    Suggest {
        /// Confidence threshold for confident matches (0 to 1)
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<f32>,
        /// Save confident matches as confirmed links
        #[arg(long)]
        confirm: bool,
    },
    /// One-line rollup
    Summary,
}

#[derive(Subcommand)]
enum ActionCommand {
    /// Log an action
    Add {
        /// What was done
        title: String,
        /// Measurement as unit=amount, repeatable
        #[arg(short, long = "measure", value_parser = parse_measurement)]
        measurements: Vec<(String, f64)>,
        /// When it happened (RFC 3339 or YYYY-MM-DD), default now
        #[arg(long, value_parser = parse_time)]
        at: Option<DateTime<Utc>>,
        /// Duration in minutes
        #[arg(long)]
        minutes: Option<f64>,
        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List actions
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Goal,
    Smart,
    Milestone,
    Obligation,
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Define a goal
    Add {
        /// Goal title
        title: String,
        /// Numeric target
        #[arg(long, requires = "unit")]
        target: Option<f64>,
        /// Measurement unit
        #[arg(long)]
        unit: Option<String>,
        /// First day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
        /// Kind of goal
        #[arg(long, value_enum, default_value = "goal")]
        kind: KindArg,
        /// Why the goal matters (SMART goals)
        #[arg(long)]
        relevance: Option<String>,
        /// Actionability hints as JSON: {"units": [...], "keywords": [...]}
        #[arg(long)]
        actionable: Option<String>,
        /// Milestone target date or obligation deadline
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Who an obligation is owed to
        #[arg(long)]
        requested_by: Option<String>,
    },
    /// List goals
    List,
    /// Show one goal with its progress
    Show {
        /// Goal ID
        id: String,
        /// Count actions outside the goal window too
        #[arg(long)]
        ignore_period: bool,
    },
}

#[derive(Subcommand)]
enum TermCommand {
    /// Define a term
    Add {
        /// Term number
        number: u32,
        /// First day (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        start: NaiveDate,
        /// Last day, default 70 days after start
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
        /// Focus area
        #[arg(long)]
        theme: Option<String>,
        /// Goal IDs committed to the term, repeatable
        #[arg(long = "goal")]
        goals: Vec<String>,
    },
    /// List terms
    List,
}

#[derive(Subcommand)]
enum ValueCommand {
    /// Record a value
    Add {
        /// Name
        name: String,
        /// What it means
        description: String,
        /// Priority 1 (highest) to 100
        #[arg(long, default_value = "50")]
        priority: u8,
        /// Life domain
        #[arg(long, default_value = "General")]
        domain: String,
        /// Mark as a major value, with optional guidance
        #[arg(long)]
        major: bool,
        /// How this value shows up in actions and goals
        #[arg(long, requires = "major")]
        guidance: Option<String>,
    },
    /// List values
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { path } = &cli.command {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        Config::default().save(path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    init_logging(&config.logging.level);
    debug!(data_dir = %config.storage.data_dir.display(), "starting");

    let mut storage = JsonStorage::new(&config.storage.data_dir).await?;
    let mut options = TrackerOptions {
        require_period_match: config.matching.require_period_match,
        confidence_threshold: config.matching.confidence_threshold,
        ..Default::default()
    };

    match cli.command {
        Commands::Init { .. } => unreachable!("handled before loading config"),
        Commands::Action { command } => match command {
            ActionCommand::Add { title, measurements, at, minutes, notes } => {
                let mut action = Action::new(title);
                action.measurements = measurements.into_iter().collect();
                action.notes = notes;
                action.duration_minutes = minutes;
                if let Some(at) = at {
                    action.log_time = at;
                }
                action.validate()?;
                storage.save_action(&action).await?;
                info!(id = %action.id, "action saved");
                println!("Logged action: {} - {}", action.id, action.title);
            }
            ActionCommand::List => {
                let actions = storage.list_actions().await?;
                println!("Actions ({})", actions.len());
                for action in actions {
                    println!(
                        "  {} | {} | {}{}",
                        action.id,
                        action.occurred_at().format("%Y-%m-%d"),
                        action.title,
                        format_measurements(&action),
                    );
                }
            }
        },
        Commands::Goal { command } => match command {
            GoalCommand::Add {
                title,
                target,
                unit,
                start,
                end,
                kind,
                relevance,
                actionable,
                date,
                requested_by,
            } => {
                let mut goal = Goal::new(title).with_window(start, end);
                goal.measurement_unit = unit;
                goal.measurement_target = target;
                if let Some(json) = actionable {
                    goal.actionability = Some(Actionability::from_json(&json)?);
                }
                goal.kind = build_kind(kind, relevance, date, requested_by)?;
                goal.validate()?;
                storage.save_goal(&goal).await?;
                info!(id = %goal.id, kind = goal.kind.as_str(), "goal saved");
                println!("Added goal: {} - {}", goal.id, goal.title);
            }
            GoalCommand::List => {
                let goals = storage.list_goals().await?;
                println!("Goals ({})", goals.len());
                for goal in goals {
                    println!(
                        "  {} | {:<10} | {} | {}",
                        goal.id,
                        goal.kind.as_str(),
                        format_target(goal.measurement_target, goal.measurement_unit.as_deref()),
                        goal.title,
                    );
                }
            }
            GoalCommand::Show { id, ignore_period } => {
                let goal_id: GoalId = id.parse().map_err(|_| anyhow!("Invalid goal ID"))?;
                let Some(goal) = storage.load_goal(goal_id).await? else {
                    println!("Goal not found");
                    return Ok(());
                };
                options.require_period_match &= !ignore_period;
                let tracker = BasicProgressTracker::new(storage);
                let progress = tracker
                    .goal_progress(goal_id, &options)
                    .await?
                    .context("goal disappeared while computing progress")?;

                println!("Goal: {}", goal.id);
                println!("  Title: {}", goal.title);
                println!("  Kind: {}", goal.kind.as_str());
                println!(
                    "  Target: {}",
                    format_target(goal.measurement_target, goal.measurement_unit.as_deref())
                );
                println!("  Window: {} .. {}", format_date(goal.start_date), format_date(goal.end_date));
                if let Some(hints) = &goal.actionability {
                    println!("  Units: {}", hints.units.join(", "));
                    println!("  Keywords: {}", hints.keywords.join(", "));
                }
                println!("  Progress: {}", format_progress(&progress));
            }
        },
        Commands::Term { command } => match command {
            TermCommand::Add { number, start, end, theme, goals } => {
                let mut term = Term::new(number, start, end)?;
                term.theme = theme;
                for id in goals {
                    let goal_id: GoalId = id
                        .parse()
                        .map_err(|_| anyhow!("Invalid goal ID: {id}"))?;
                    let goal = storage
                        .load_goal(goal_id)
                        .await?
                        .with_context(|| format!("Goal not found: {goal_id}"))?;
                    if let Some(warning) = validate_goal_term_assignment(&goal, &term)
                        .with_context(|| format!("Cannot commit '{}'", goal.title))?
                    {
                        warn!(goal = %goal_id, "{warning}");
                        println!("Warning for '{}': {warning}", goal.title);
                    }
                    term.goal_ids.push(goal_id);
                }
                storage.save_term(&term).await?;
                println!(
                    "Added term {}: {} .. {} ({} goals)",
                    term.number,
                    term.start_date,
                    term.end_date,
                    term.goal_ids.len()
                );
            }
            TermCommand::List => {
                let today = Utc::now().date_naive();
                let terms = storage.list_terms().await?;
                for term in &terms {
                    println!(
                        "Term {} | {:<8} | {} .. {} | {} days left | {} goals | {}",
                        term.number,
                        term.status(today).as_str(),
                        term.start_date,
                        term.end_date,
                        term.days_remaining(today),
                        term.goal_ids.len(),
                        term.theme.as_deref().unwrap_or("-"),
                    );
                }
                let goals = storage.list_goals().await?;
                let unassigned = unassigned_goals(&goals, &terms);
                if !unassigned.is_empty() {
                    println!("Not in any term ({})", unassigned.len());
                    for goal in unassigned {
                        println!("  {} | {}", goal.id, goal.title);
                    }
                }
            }
        },
        Commands::Value { command } => match command {
            ValueCommand::Add { name, description, priority, domain, major, guidance } => {
                let mut value = Value::new(name, description);
                value.priority = Priority::new(priority)?;
                value.life_domain = domain;
                if major {
                    value.kind = ValueKind::Major { alignment_guidance: guidance };
                }
                storage.save_value(&value).await?;
                println!("Added value: {} - {}", value.id, value.name);
            }
            ValueCommand::List => {
                for value in storage.list_values().await? {
                    println!(
                        "  {:>3} | {:<13} | {} | {}",
                        value.priority.level(),
                        value.kind.as_str(),
                        value.life_domain,
                        value.name,
                    );
                }
            }
        },
        Commands::Link { action, goal, amount } => {
            let action_id: ActionId = action.parse().map_err(|_| anyhow!("Invalid action ID"))?;
            let goal_id: GoalId = goal.parse().map_err(|_| anyhow!("Invalid goal ID"))?;
            let action = storage
                .load_action(action_id)
                .await?
                .with_context(|| format!("Action not found: {action_id}"))?;
            let goal = storage
                .load_goal(goal_id)
                .await?
                .with_context(|| format!("Goal not found: {goal_id}"))?;

            let m = create_manual_match(&action, &goal, amount);
            storage.save_contribution(&Contribution::from_match(&m)).await?;
            println!(
                "Linked '{}' -> '{}' ({})",
                action.title,
                goal.title,
                format_target(Some(m.amount), m.unit.as_deref())
            );
        }
        Commands::Progress { ignore_period, term } => {
            options.require_period_match &= !ignore_period;
            let tracker = BasicProgressTracker::new(storage);
            match term {
                Some(number) => {
                    let Some(tp) = tracker.term_progress(number, &options).await? else {
                        println!("Term {number} not found");
                        return Ok(());
                    };
                    println!(
                        "Term {} [{}] day {} ({:.0}% elapsed, {} days left)",
                        tp.number,
                        tp.status.as_str(),
                        tp.days_elapsed,
                        tp.elapsed_fraction * 100.0,
                        tp.days_remaining,
                    );
                    print_progress(&tp.goals, &tp.summary);
                }
                None => {
                    let snapshot = tracker.snapshot(&options).await?;
                    print_progress(&snapshot.goals, &snapshot.summary);
                }
            }
        }
        Commands::Suggest { threshold, confirm } => {
            if let Some(t) = threshold {
                options.confidence_threshold = t;
            }
            let tracker = BasicProgressTracker::new(JsonStorage::new(storage.root()).await?);
            let session = tracker.suggest(&options).await?;
            let titles = titles_by_id(&storage).await?;

            println!(
                "Analyzed {} actions against {} goals",
                session.actions_analyzed, session.goals_analyzed
            );
            println!("Confident ({})", session.confident.len());
            for m in &session.confident {
                println!("  {}", describe_match(m, &titles));
            }
            println!("Needs review ({})", session.ambiguous.len());
            for m in &session.ambiguous {
                println!("  {}", describe_match(m, &titles));
            }
            println!("Unmatched actions ({})", session.unmatched_actions.len());
            for a in &session.unmatched_actions {
                println!("  {} | {}", a.id, a.title);
            }

            if confirm {
                for m in &session.confident {
                    let confirmed = confirm_match(m);
                    storage.save_contribution(&Contribution::from_match(&confirmed)).await?;
                }
                info!(count = session.confident.len(), "confirmed matches");
                println!("Confirmed {} matches", session.confident.len());
            }
        }
        Commands::Summary => {
            let tracker = BasicProgressTracker::new(storage);
            let s = tracker.snapshot(&options).await?.summary;
            println!(
                "{} goals: {} complete, {} in progress, {:.1}% average, {} actions matched",
                s.total_goals,
                s.complete_goals,
                s.in_progress_goals,
                s.avg_completion_percent,
                s.total_actions_matched,
            );
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_kind(
    kind: KindArg,
    relevance: Option<String>,
    date: Option<NaiveDate>,
    requested_by: Option<String>,
) -> Result<GoalKind> {
    Ok(match kind {
        KindArg::Goal => GoalKind::Goal,
        KindArg::Smart => GoalKind::SmartGoal {
            relevance: relevance.unwrap_or_default(),
        },
        KindArg::Milestone => GoalKind::Milestone {
            target_date: date.context("milestones need --date")?,
        },
        KindArg::Obligation => GoalKind::Obligation {
            deadline: date.context("obligations need --date")?,
            requested_by,
        },
    })
}

async fn titles_by_id(
    storage: &JsonStorage,
) -> Result<std::collections::HashMap<String, String>> {
    let mut titles = std::collections::HashMap::new();
    for a in storage.list_actions().await? {
        titles.insert(a.id.to_string(), a.title);
    }
    for g in storage.list_goals().await? {
        titles.insert(g.id.to_string(), g.title);
    }
    Ok(titles)
}

fn describe_match(
    m: &tenweek_core::Match,
    titles: &std::collections::HashMap<String, String>,
) -> String {
    let name = |id: String| titles.get(&id).cloned().unwrap_or(id);
    format!(
        "{} -> {} | {} | {:.2}",
        name(m.action_id.to_string()),
        name(m.goal_id.to_string()),
        format_target(Some(m.amount), m.unit.as_deref()),
        m.confidence,
    )
}

fn print_progress(goals: &[GoalProgress], summary: &ProgressSummary) {
    for p in goals {
        println!("  {} | {}", p.title, format_progress(p));
    }
    println!(
        "{} of {} goals complete",
        summary.complete_goals, summary.total_goals
    );
}

fn format_progress(p: &GoalProgress) -> String {
    let unit = p.unit.as_deref().unwrap_or("units");
    match (p.percent(), p.target) {
        (Some(percent), Some(target)) => format!(
            "{:.1}/{:.1} {} ({:.1}%, {:.1} left) [{}]",
            p.total_progress,
            target,
            unit,
            percent,
            p.remaining().unwrap_or(0.0),
            p.status().as_str(),
        ),
        _ => format!("{} actions [{}]", p.matching_actions_count, p.status().as_str()),
    }
}

fn format_target(amount: Option<f64>, unit: Option<&str>) -> String {
    match (amount, unit) {
        (Some(a), Some(u)) => format!("{a} {u}"),
        (Some(a), None) => format!("{a}"),
        (None, Some(u)) => u.to_string(),
        (None, None) => "-".to_string(),
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "open".to_string(), |d| d.to_string())
}

fn format_measurements(action: &Action) -> String {
    if action.measurements.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = action
        .measurements
        .iter()
        .map(|(unit, amount)| format!("{amount} {unit}"))
        .collect();
    format!(" ({})", parts.join(", "))
}

fn parse_measurement(s: &str) -> Result<(String, f64), String> {
    let (unit, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected unit=amount, got '{s}'"))?;
    let unit = unit.trim();
    if unit.is_empty() {
        return Err("measurement unit is empty".to_string());
    }
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| format!("invalid amount in '{s}'"))?;
    Ok((unit.to_string(), amount))
}

fn parse_threshold(s: &str) -> Result<f32, String> {
    let t: f32 = s.parse().map_err(|_| format!("invalid threshold '{s}'"))?;
    config::validate_threshold(t).map_err(|e| e.to_string())?;
    Ok(t)
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    let date = parse_date(s)?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| format!("invalid date '{s}'"))?;
    Ok(Utc.from_utc_datetime(&midnight))
}
