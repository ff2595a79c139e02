use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use weekplan_core::{ExternalBooking, ScheduleResult, SchedulePlanner};
use weekplan_ingest::{load_paths, ParsedInputs};

mod busy;
mod calendar;
mod config;
#[cfg(feature = "gcal")]
mod google_calendar;
mod render;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "weekplan",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("WEEKPLAN_BUILD_SHA"), ")"),
    about = "Fit markdown projects and routines into your weekly availability"
)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace). WEEKPLAN_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ~/.weekplan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct PlanArgs {
    /// Project/routine markdown files or directories of them
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// First day of the horizon (default: today in the configured timezone)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Horizon length in weeks (default: schedule_weeks from config)
    #[arg(long)]
    weeks: Option<u32>,

    /// JSON file of busy intervals to keep free
    #[arg(long)]
    busy: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse markdown inputs and print them as JSON
    Parse {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Build a schedule and print the agenda
    Schedule {
        #[command(flatten)]
        plan: PlanArgs,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Also write the events as an ICS file
        #[arg(long)]
        ics: Option<PathBuf>,
    },

    /// Find how many weeks it takes to schedule every task
    Estimate {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(long)]
        start: Option<NaiveDate>,

        /// Search ceiling (default: max_estimate_weeks from config)
        #[arg(long)]
        max_weeks: Option<u32>,

        #[arg(long)]
        busy: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.weekplan/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Hand the schedule to Google Calendar
    Calendar {
        #[command(subcommand)]
        command: CalendarCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

#[derive(Subcommand, Debug)]
enum CalendarCommand {
    /// Import the schedule through gcalcli
    Push {
        #[command(flatten)]
        plan: PlanArgs,

        /// gcalcli calendar name (default: gcalcli's own default)
        #[arg(long)]
        calendar: Option<String>,
    },

    /// Store OAuth client credentials and authorize
    #[cfg(feature = "gcal")]
    Connect,

    /// Show whether Google credentials and tokens are stored
    #[cfg(feature = "gcal")]
    Status,

    /// Forget cached Google tokens
    #[cfg(feature = "gcal")]
    Disconnect,

    /// Insert the schedule into calendar_id through the Calendar API
    #[cfg(feature = "gcal")]
    Sync {
        #[command(flatten)]
        plan: PlanArgs,

        /// Subtract events already on calendar_id before planning
        #[arg(long)]
        respect_busy: bool,
    },

    /// Print calendar_id's busy time for a horizon as busy-file JSON
    #[cfg(feature = "gcal")]
    Busy {
        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        weeks: Option<u32>,
    },
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("WEEKPLAN_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config_override = cli.config.as_deref();

    match cli.command {
        Command::Parse { paths } => {
            let inputs = load_paths(&paths)?;
            println!("{}", serde_json::to_string_pretty(&inputs)?);
        }

        Command::Schedule { plan, json, ics } => {
            let cfg = config::load_config(config_override)?;
            let result = run_plan(&cfg, &plan, Vec::new())?;

            if let Some(path) = ics {
                let events = calendar::schedule_to_events(&result, cfg.tz()?);
                fs::write(&path, calendar::events_to_ics(&events))
                    .with_context(|| format!("write {}", path.display()))?;
                info!(events = events.len(), path = %path.display(), "wrote ICS");
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render::agenda(&result));
            }
        }

        Command::Estimate {
            paths,
            start,
            max_weeks,
            busy,
            json,
        } => {
            let cfg = config::load_config(config_override)?;
            let max_weeks = max_weeks.unwrap_or(cfg.max_estimate_weeks);
            let start = start_or_today(&cfg, start)?;
            let planner = planner_for(&cfg, &paths, busy.as_deref(), Vec::new())?;

            let est = planner.estimate(start, max_weeks)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&est)?);
            } else {
                let fits = est.required_weeks < max_weeks
                    || planner.plan(start, max_weeks)?.summary.unscheduled_tasks == 0;
                print!("{}", render::estimate(&est, fits));
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(config_override)?,
            ConfigCommand::Show => {
                let cfg = config::load_config(config_override)?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
            ConfigCommand::Path => println!("{}", config::config_path(config_override)?.display()),
        },

        Command::Calendar { command } => calendar_command(command, config_override).await?,
    }

    Ok(())
}

async fn calendar_command(command: CalendarCommand, config_override: Option<&Path>) -> Result<()> {
    let cfg = config::load_config(config_override)?;
    match command {
        CalendarCommand::Push { plan, calendar: calendar_name } => {
            let result = run_plan(&cfg, &plan, Vec::new())?;
            let events = calendar::schedule_to_events(&result, cfg.tz()?);
            let ics = calendar::events_to_ics(&events);
            calendar::push_ics_via_gcalcli(&ics, calendar_name.as_deref())?;
            println!("Pushed {} events via gcalcli", events.len());
        }

        #[cfg(feature = "gcal")]
        CalendarCommand::Connect => google_calendar::connect_interactive().await?,

        #[cfg(feature = "gcal")]
        CalendarCommand::Status => {
            let status = google_calendar::auth_status()?;
            if status.is_connected() {
                println!("Connected (calendar: {})", cfg.calendar_id);
            } else if status.client_saved {
                println!("Client saved but not authorized. Run: weekplan calendar connect");
            } else {
                println!("Not connected. Run: weekplan calendar connect");
            }
        }

        #[cfg(feature = "gcal")]
        CalendarCommand::Disconnect => {
            if google_calendar::disconnect()? {
                println!("Disconnected; cached tokens removed.");
            } else {
                println!("No cached tokens to remove.");
            }
        }

        #[cfg(feature = "gcal")]
        CalendarCommand::Sync { plan, respect_busy } => {
            let tz = cfg.tz()?;
            let mut extra = Vec::new();
            if respect_busy {
                let start = start_or_today(&cfg, plan.start)?;
                let weeks = plan.weeks.unwrap_or(cfg.schedule_weeks);
                let (from, to) =
                    google_calendar::horizon_utc(start, weeks, tz).context("horizon start falls in a DST gap")?;
                extra = google_calendar::list_busy(&cfg.calendar_id, from, to, tz).await?;
            }
            let result = run_plan(&cfg, &plan, extra)?;
            let events = calendar::schedule_to_events(&result, tz);
            let outcome = google_calendar::push_events(&cfg.calendar_id, &events, tz).await?;
            println!("Created {} events ({} failed)", outcome.created, outcome.failed);
        }

        #[cfg(feature = "gcal")]
        CalendarCommand::Busy { start, weeks } => {
            let tz = cfg.tz()?;
            let start = start_or_today(&cfg, start)?;
            let weeks = weeks.unwrap_or(cfg.schedule_weeks);
            let (from, to) =
                google_calendar::horizon_utc(start, weeks, tz).context("horizon start falls in a DST gap")?;
            let bookings = google_calendar::list_busy(&cfg.calendar_id, from, to, tz).await?;
            println!("{}", serde_json::to_string_pretty(&bookings)?);
        }
    }
    Ok(())
}

fn start_or_today(cfg: &Config, start: Option<NaiveDate>) -> Result<NaiveDate> {
    match start {
        Some(d) => Ok(d),
        None => Ok(Utc::now().with_timezone(&cfg.tz()?).date_naive()),
    }
}

/// Load inputs, apply config roles, and collect bookings from `--busy` plus `extra`.
fn planner_for(
    cfg: &Config,
    paths: &[PathBuf],
    busy: Option<&Path>,
    extra: Vec<ExternalBooking>,
) -> Result<SchedulePlanner> {
    let ParsedInputs { mut projects, routines } = load_paths(paths)?;
    cfg.assign_roles(&mut projects);

    let mut bookings = extra;
    if let Some(path) = busy {
        bookings.extend(busy::load_busy(path, cfg.tz()?)?);
    }
    debug!(projects = projects.len(), routines = routines.len(), bookings = bookings.len(), "planner inputs");

    Ok(SchedulePlanner::new(projects, routines, cfg.weekly_availability()?).with_bookings(bookings))
}

fn run_plan(cfg: &Config, args: &PlanArgs, extra: Vec<ExternalBooking>) -> Result<ScheduleResult> {
    let start = start_or_today(cfg, args.start)?;
    let weeks = args.weeks.unwrap_or(cfg.schedule_weeks);
    let planner = planner_for(cfg, &args.paths, args.busy.as_deref(), extra)?;
    Ok(planner.plan(start, weeks)?)
}
