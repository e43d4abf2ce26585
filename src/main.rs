use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveTime, Weekday};
use clap::{Parser as _, Subcommand};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use field_planner::layout::GridGeometry;
use field_planner::model::{Project, Resource};
use field_planner::parser::{ParseError, Parser};
use field_planner::planner::{recurring_spec, Planner};
use field_planner::processing::{self, AgendaError};
use field_planner::recurrence::WeekdaySet;
use field_planner::settings::SettingsError;
use field_planner::store::{MemoryStore, PlanningFilter, StaticDirectory};
use field_planner::time;
use field_planner::view::{MonthView, WeekView};
use field_planner::{PlannerError, PlanningItem, Settings};

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "field-planner", about = "Plan field work on a week or month calendar")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Expand a recurring plan and print the generated items
    Expand {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        /// Comma separated, e.g. `mon,wed`
        #[arg(long, value_delimiter = ',')]
        weekdays: Vec<Weekday>,
        #[arg(long, value_parser = parse_clock)]
        start: NaiveTime,
        #[arg(long, value_parser = parse_clock)]
        end: NaiveTime,
        #[arg(long)]
        resource: String,
        #[arg(long)]
        project: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// Print the week containing `--date`
    Week {
        agenda: PathBuf,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Use the narrow row height
        #[arg(long)]
        compact: bool,
    },
    /// Print the month containing `--date`
    Month {
        agenda: PathBuf,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("{path}: {source}")]
    Parse { path: PathBuf, source: ParseError },
    #[error(transparent)]
    Agenda(#[from] AgendaError),
    #[error(transparent)]
    Planner(#[from] PlannerError),
}

fn parse_clock(text: &str) -> Result<NaiveTime, String> {
    time::parse_clock(text).ok_or_else(|| format!("expected HH:MM, got `{text}`"))
}

fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = run(cli) {
        eprintln!("🛑 {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Command::Expand {
            from,
            to,
            weekdays,
            start,
            end,
            resource,
            project,
            location,
        } => {
            let directory = StaticDirectory {
                resources: vec![Resource::new(resource.as_str(), resource.as_str())],
                projects: vec![Project::new(project.as_str(), project.as_str(), "")],
            };
            let mut planner =
                Planner::new(MemoryStore::new(), settings, &directory, &directory);

            let mut spec = recurring_spec(
                from,
                to,
                start,
                end,
                weekdays.into_iter().collect::<WeekdaySet>(),
                resource,
                project,
            );
            spec.location = location;

            planner.open_recurring(from);
            let plan = planner.submit_recurring(spec)?;
            for item in &plan.items {
                print_item(item);
            }
            println!("{}", plan.summary());
        }
        Command::Week {
            agenda,
            date,
            compact,
        } => {
            let planner = load_agenda(&agenda, settings)?;
            let geometry = GridGeometry {
                hour_height: if compact {
                    GridGeometry::compact().hour_height
                } else {
                    planner.settings().grid.hour_height
                },
                ..planner.settings().grid.clone()
            };

            let view = WeekView::new(
                date.unwrap_or_else(today),
                planner.settings().calendar.first_weekday,
                geometry,
            );
            let events = planner.calendar_events();
            let grid = view.render(&events);

            for column in &grid.columns {
                println!("{} {}", column.key, column.date.format("%a"));
                for placed in &column.events {
                    println!(
                        "  {}-{} {:<32} top={:.0} height={:.0}",
                        time::format_clock(placed.event.start_time),
                        time::format_clock(placed.event.end_time),
                        placed.event.title,
                        placed.placement.top,
                        placed.placement.height,
                    );
                }
            }

            let last = view.days().last().copied().unwrap_or(grid.week_start);
            let totals =
                processing::booked_minutes(planner.schedule().items(), grid.week_start, last);
            for (resource, minutes) in totals {
                println!("{resource}: {}h{:02}m", minutes / 60, minutes % 60);
            }
        }
        Command::Month { agenda, date } => {
            let planner = load_agenda(&agenda, settings)?;
            let view = MonthView::new(date.unwrap_or_else(today), &planner.settings().calendar);
            let events = planner.calendar_events();

            println!("{}", view.title());
            for week in view.weeks(&events) {
                for day in week.iter().filter(|day| day.in_month) {
                    if day.events.is_empty() {
                        continue;
                    }
                    println!("{}", time::date_key(day.date));
                    for event in &day.events {
                        println!("  {} {}", time::format_clock(event.start_time), event.title);
                    }
                    if day.overflow > 0 {
                        println!("  +{} more", day.overflow);
                    }
                }
            }
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_item(item: &PlanningItem) {
    println!(
        "{} {}-{} {} {} {}",
        time::date_key(item.date),
        time::format_clock(item.start_time),
        time::format_clock(item.end_time),
        item.assigned_resource_id,
        item.project_id,
        item.location.as_deref().unwrap_or(""),
    );
}

/// Seeds an in-memory planner from an agenda file. Front-matter settings
/// replace the ones given by `--config`.
fn load_agenda(path: &Path, settings: Settings) -> Result<Planner<MemoryStore>, CliError> {
    let source = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file = Parser::new(&source)
        .parse_file()
        .map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let items = processing::agenda_to_items(&file)?;
    info!(path = %path.display(), items = items.len(), "agenda loaded");

    let resources: BTreeSet<_> = items.iter().map(|i| i.assigned_resource_id.clone()).collect();
    let projects: BTreeSet<_> = items.iter().map(|i| i.project_id.clone()).collect();
    let directory = StaticDirectory {
        resources: resources
            .into_iter()
            .map(|id| Resource::new(id.clone(), id.to_string()))
            .collect(),
        projects: projects
            .into_iter()
            .map(|id| Project::new(id.clone(), id.to_string(), ""))
            .collect(),
    };
    debug!(
        resources = directory.resources.len(),
        projects = directory.projects.len(),
        "directory built from agenda"
    );

    let settings = file.settings.unwrap_or(settings);
    let mut planner = Planner::new(
        MemoryStore::with_items(items),
        settings,
        &directory,
        &directory,
    );
    planner.refresh(&PlanningFilter::new())?;
    Ok(planner)
}
