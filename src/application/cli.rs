use crate::application::{
    PickerOutcome, PickerState, PtoApp, RangePicker, TextRenderer, Theme,
};
use crate::domain::{
    Anchor, DATE_FORMAT, DeletePolicy, EmployeeId, NewEmployee, PtoKey, PtoRequest,
    WeekdayIndexing, grid, parse_day,
};
use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::tty::IsTty;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ptokeeper")]
#[command(about = "Keep track of employees and their paid time off")]
#[command(version)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage employees
    Employee {
        #[command(subcommand)]
        command: EmployeeCommand,
    },
    /// Book, cancel and review PTO
    Pto {
        #[command(subcommand)]
        command: PtoCommand,
    },
    /// Print a month calendar
    Calendar {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<Anchor>,
        /// Place a Sunday 1st under Monday without leading blanks
        #[arg(long)]
        legacy_weekdays: bool,
    },
    /// Write a collection as CSV
    Export {
        #[arg(value_enum)]
        collection: Collection,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Read a collection from CSV
    Import {
        #[arg(value_enum)]
        collection: Collection,
        file: PathBuf,
    },
    /// Delete all employees and PTO
    Wipe {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum EmployeeCommand {
    /// Add an employee
    Add {
        first_name: String,
        last_name: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        born: String,
        /// Job description
        #[arg(long)]
        job: String,
    },
    /// List employees
    List {
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an employee
    Edit {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        born: Option<String>,
        #[arg(long)]
        job: Option<String>,
    },
    /// Delete an employee
    Remove {
        id: i64,
        #[command(flatten)]
        policy: PolicyOverride,
    },
}

#[derive(Args)]
#[group(multiple = false)]
pub struct PolicyOverride {
    /// Also delete the employee's PTO
    #[arg(long)]
    cascade: bool,
    /// Keep the employee's PTO
    #[arg(long)]
    keep_pto: bool,
}

impl PolicyOverride {
    fn resolve(&self, default: DeletePolicy) -> DeletePolicy {
        match (self.cascade, self.keep_pto) {
            (true, _) => DeletePolicy::Cascade,
            (_, true) => DeletePolicy::Orphan,
            _ => default,
        }
    }
}

#[derive(Subcommand)]
pub enum PtoCommand {
    /// Book PTO; opens the date picker when a date is missing
    Add {
        employee: i64,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
    /// Cancel PTO by key
    Remove { key: i64 },
    /// PTO of one employee
    List {
        employee: i64,
        #[arg(long)]
        json: bool,
    },
    /// Everyone's past, current and upcoming PTO
    Board {
        /// Classify relative to this date instead of today
        #[arg(long)]
        today: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Collection {
    Employees,
    Pto,
}

impl Cli {
    pub fn run() -> anyhow::Result<()> {
        let cli = Self::parse();
        init_logging(cli.verbose)?;

        let app = PtoApp::new()?;
        cli.command.execute(&app)
    }
}

impl Commands {
    pub fn execute(self, app: &PtoApp) -> anyhow::Result<()> {
        let renderer = TextRenderer::new(
            Theme::by_name(&app.config().theme),
            IsTty::is_tty(&std::io::stdout()),
        );

        match self {
            Commands::Employee { command } => command.execute(app, &renderer),
            Commands::Pto { command } => command.execute(app, &renderer),
            Commands::Calendar {
                month,
                legacy_weekdays,
            } => {
                let anchor = month.unwrap_or_else(|| Anchor::of(app.today()));
                let weekdays = if legacy_weekdays {
                    WeekdayIndexing::Legacy
                } else {
                    app.weekdays()
                };
                print!("{}", renderer.render_month(&grid(anchor, app.today(), weekdays)));
                Ok(())
            }
            Commands::Export { collection, out } => {
                let csv = match collection {
                    Collection::Employees => app.roster.export_employees()?,
                    Collection::Pto => app.roster.export_pto()?,
                };
                match out {
                    Some(path) => std::fs::write(&path, csv)
                        .with_context(|| format!("writing {}", path.display()))?,
                    None => print!("{csv}"),
                }
                Ok(())
            }
            Commands::Import { collection, file } => {
                let csv = std::fs::read_to_string(&file)
                    .with_context(|| format!("reading {}", file.display()))?;
                let summary = match collection {
                    Collection::Employees => app.roster.import_employees(&csv)?,
                    Collection::Pto => app.roster.import_pto(&csv)?,
                };
                println!(
                    "Imported {} row(s), skipped {}.",
                    summary.imported, summary.skipped
                );
                Ok(())
            }
            Commands::Wipe { yes } => {
                if !yes {
                    bail!("refusing to delete all data without --yes");
                }
                app.roster.wipe()?;
                println!("All data deleted.");
                Ok(())
            }
        }
    }
}

impl EmployeeCommand {
    fn execute(self, app: &PtoApp, renderer: &TextRenderer) -> anyhow::Result<()> {
        let roster = &app.roster;
        match self {
            EmployeeCommand::Add {
                first_name,
                last_name,
                born,
                job,
            } => {
                let employee = roster.hire(NewEmployee {
                    first_name,
                    last_name,
                    date_of_birth: parse_day(&born)?,
                    job_description: job,
                })?;
                println!("Added employee {} ({}).", employee.id, employee.full_name());
            }
            EmployeeCommand::List { json } => {
                let employees = roster.employees()?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&employees)?);
                } else {
                    print!("{}", renderer.render_employees(&employees));
                }
            }
            EmployeeCommand::Edit {
                id,
                first_name,
                last_name,
                born,
                job,
            } => {
                let id = employee_id(id)?;
                let mut employee = roster
                    .employee(id)?
                    .ok_or_else(|| anyhow!("No employee with id {id}"))?;

                if let Some(first_name) = first_name {
                    employee.first_name = first_name.trim().to_string();
                }
                if let Some(last_name) = last_name {
                    employee.last_name = last_name.trim().to_string();
                }
                if let Some(born) = born {
                    employee.date_of_birth = parse_day(&born)?;
                }
                if let Some(job) = job {
                    employee.job_description = job.trim().to_string();
                }

                roster.update_employee(&employee)?;
                println!("Updated employee {id}.");
            }
            EmployeeCommand::Remove { id, policy } => {
                let id = employee_id(id)?;
                let policy = policy.resolve(app.delete_policy());
                let dismissal = roster.dismiss_with(id, policy)?;
                match policy {
                    DeletePolicy::Cascade => println!(
                        "Deleted employee {id} and {} PTO record(s).",
                        dismissal.removed_pto
                    ),
                    DeletePolicy::Orphan => println!(
                        "Deleted employee {id}; kept {} PTO record(s).",
                        dismissal.orphaned_pto
                    ),
                }
            }
        }
        Ok(())
    }
}

impl PtoCommand {
    fn execute(self, app: &PtoApp, renderer: &TextRenderer) -> anyhow::Result<()> {
        let roster = &app.roster;
        match self {
            PtoCommand::Add {
                employee,
                start,
                end,
            } => {
                let employee_id = employee_id(employee)?;
                let mut request = PtoRequest {
                    employee_id: Some(employee_id),
                    start,
                    end,
                };

                if (request.start.is_none() || request.end.is_none())
                    && IsTty::is_tty(&std::io::stdout())
                {
                    let preset = |raw: &Option<String>| raw.as_deref().map(parse_day).transpose();
                    let state = PickerState::with_dates(
                        app.today(),
                        preset(&request.start)?,
                        preset(&request.end)?,
                    );
                    let outcome = RangePicker::new(
                        state,
                        app.weekdays(),
                        Theme::by_name(&app.config().theme),
                    )?
                    .run()?;
                    match outcome {
                        PickerOutcome::Picked { start, end } => {
                            request.start = Some(start.format(DATE_FORMAT).to_string());
                            request.end = Some(end.format(DATE_FORMAT).to_string());
                        }
                        PickerOutcome::Cancelled => {
                            println!("Cancelled.");
                            return Ok(());
                        }
                    }
                }

                let interval = roster.request_pto(&request)?;
                println!(
                    "Booked {} for employee {}: {}.",
                    interval.key,
                    interval.employee_id,
                    interval.label()
                );
            }
            PtoCommand::Remove { key } => {
                roster.cancel_pto(PtoKey(key))?;
                println!("Removed PTO {}.", PtoKey(key));
            }
            PtoCommand::List { employee, json } => {
                let mut intervals = roster.pto_for(employee_id(employee)?)?;
                intervals.sort_by_key(|interval| interval.start());
                if json {
                    println!("{}", serde_json::to_string_pretty(&intervals)?);
                } else if intervals.is_empty() {
                    println!("No PTO.");
                } else {
                    for interval in intervals {
                        println!("{:<5} {}", interval.key.to_string(), interval.label());
                    }
                }
            }
            PtoCommand::Board { today, json } => {
                let today = match today {
                    Some(raw) => parse_day(&raw)?,
                    None => app.today(),
                };
                let board = roster.board(today)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&board)?);
                } else {
                    print!("{}", renderer.render_board(&board));
                }
            }
        }
        Ok(())
    }
}

fn employee_id(raw: i64) -> anyhow::Result<EmployeeId> {
    Ok(EmployeeId::new(raw)?)
}

/// Routes `log` records and tracing events to stderr.
pub fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(IsTty::is_tty(&std::io::stderr()))
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_pto_add_without_dates() {
        let cli =
            Cli::try_parse_from(["ptokeeper", "pto", "add", "3", "--start", "2024-01-02"])
                .unwrap();
        match cli.command {
            Commands::Pto {
                command: PtoCommand::Add { employee, start, end },
            } => {
                assert_eq!(employee, 3);
                assert_eq!(start.as_deref(), Some("2024-01-02"));
                assert_eq!(end, None);
            }
            _ => panic!("expected pto add"),
        }
    }

    #[test]
    fn removal_flags_are_exclusive() {
        assert!(
            Cli::try_parse_from(["ptokeeper", "employee", "remove", "1", "--cascade", "--keep-pto"])
                .is_err()
        );

        let cli =
            Cli::try_parse_from(["ptokeeper", "-vv", "employee", "remove", "1", "--keep-pto"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Employee {
                command: EmployeeCommand::Remove { policy, .. },
            } => assert_eq!(policy.resolve(DeletePolicy::Cascade), DeletePolicy::Orphan),
            _ => panic!("expected employee remove"),
        }
    }

    #[test]
    fn calendar_month_must_be_year_month() {
        let cli = Cli::try_parse_from(["ptokeeper", "calendar", "--month", "2024-09"]).unwrap();
        match cli.command {
            Commands::Calendar { month, .. } => assert_eq!(month, Anchor::new(2024, 9)),
            _ => panic!("expected calendar"),
        }
        assert!(Cli::try_parse_from(["ptokeeper", "calendar", "--month", "2024-13"]).is_err());
    }
}
