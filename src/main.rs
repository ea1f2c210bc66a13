use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wellbeing_dashboard::client::ApiClient;
use wellbeing_dashboard::config::{CliOverrides, Config, FileSessionStore, SessionStore};
use wellbeing_dashboard::departments::{DepartmentIndex, DepartmentsPayload};
use wellbeing_dashboard::filter::ALL_UNIVERSITIES;
use wellbeing_dashboard::models::{self, Bucket};
use wellbeing_dashboard::{aggregate, report, AcademicYear, Dashboard, Dimension, Status};

#[derive(Parser)]
#[command(name = "wellbeing-dashboard")]
#[command(about = "Student mental health survey dashboard", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Base URL of the survey data service
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Read survey records from a CSV export instead of the service
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    /// Read survey records from a saved dashboard JSON response
    #[arg(long, global = true, conflicts_with = "csv")]
    json: Option<PathBuf>,
    /// Department listing JSON used with local record files
    #[arg(long, global = true)]
    departments_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct Selection {
    /// Academic year, e.g. 2023-2024 (defaults to the current one)
    #[arg(long)]
    year: Option<String>,
    /// University code, or All
    #[arg(long)]
    university: Option<String>,
    /// Department to restrict courses to (repeatable)
    #[arg(long = "department")]
    departments: Vec<String>,
    /// Filter as dimension=value (repeatable; repeated dimensions combine)
    #[arg(long = "filter")]
    filters: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List academic years available in the data
    Years,
    /// Print outcome counts per dimension
    Summary {
        #[command(flatten)]
        selection: Selection,
        /// Dimension to aggregate (repeatable; all when omitted)
        #[arg(long = "dimension")]
        dimensions: Vec<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List filter options with live counts
    Options {
        #[command(flatten)]
        selection: Selection,
        #[arg(long)]
        dimension: String,
    },
    /// Count responses per department
    Departments {
        #[command(flatten)]
        selection: Selection,
    },
    /// Share of flagged respondents per home country
    Countries {
        #[command(flatten)]
        selection: Selection,
    },
    /// Course list registered for a university
    Courses {
        #[arg(long)]
        university: String,
    },
    /// Word frequencies for a multi-answer question
    Words {
        #[command(flatten)]
        selection: Selection,
        #[arg(long, default_value = "timetable_reasons")]
        dimension: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        selection: Selection,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show or update the stored session
    Session {
        #[arg(long)]
        university: Option<String>,
        #[arg(long)]
        consent: Option<bool>,
    },
}

#[derive(Serialize)]
struct DimensionSummary<'a> {
    dimension: Dimension,
    buckets: &'a [Bucket],
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let overrides = CliOverrides {
        config_file: cli.config.clone(),
        api_base_url: cli.api_url.clone(),
    };
    let config = Config::resolve(&overrides, |key| std::env::var(key).ok())
        .context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = FileSessionStore::new(config.session_path());
    let mut session = store.load().context("failed to read session")?;

    let client = ApiClient::new(&config.api_base_url, config.request_timeout())
        .context("failed to build HTTP client")?;

    let selection = match &cli.command {
        Commands::Session {
            university,
            consent,
        } => {
            if let Some(value) = university {
                check_university(&config, value)?;
                session.university = value.clone();
            }
            if let Some(value) = consent {
                session.consent = *value;
            }
            if university.is_some() || consent.is_some() {
                store.save(&session).context("failed to save session")?;
                println!("Session saved to {}.", store.path().display());
            }
            println!(
                "University: {} (switching {})",
                session.university,
                if session.can_switch_university() {
                    "allowed"
                } else {
                    "locked"
                }
            );
            println!("Consent: {}", session.consent);
            return Ok(());
        }
        Commands::Courses { university } => {
            let courses = client
                .fetch_courses(university)
                .await
                .with_context(|| format!("failed to fetch courses for {university}"))?;
            if courses.is_empty() {
                println!("No courses registered for {university}.");
            }
            for course in courses {
                println!("- {course}");
            }
            return Ok(());
        }
        Commands::Years => Selection::default(),
        Commands::Summary { selection, .. }
        | Commands::Options { selection, .. }
        | Commands::Departments { selection }
        | Commands::Countries { selection }
        | Commands::Words { selection, .. }
        | Commands::Report { selection, .. } => selection.clone(),
    };

    let university = selection
        .university
        .clone()
        .unwrap_or_else(|| session.university.clone());
    if !session.permits(&university) {
        bail!(
            "this session is pinned to {}; cannot view {}",
            session.university,
            university
        );
    }
    check_university(&config, &university)?;

    let mut dashboard = Dashboard::new(Local::now().date_naive(), university.clone());
    let records = match (&cli.csv, &cli.json) {
        (Some(path), _) => models::load_csv(path).map_err(|e| e.to_string()),
        (_, Some(path)) => models::load_json(path).map_err(|e| e.to_string()),
        _ => client
            .fetch_dashboard(ALL_UNIVERSITIES)
            .await
            .map_err(|e| e.to_string()),
    };
    dashboard.load(records);
    if let Status::Error(message) = dashboard.status() {
        bail!("failed to load survey data: {message}");
    }

    let payload = load_departments(&cli, &client, &university).await;
    dashboard.set_department_index(DepartmentIndex::build(&university, &payload));

    apply_selection(&mut dashboard, &selection)?;

    match cli.command {
        Commands::Years => {
            let current = dashboard.scope().year;
            for year in dashboard.academic_years() {
                let marker = if year == current { " (current)" } else { "" };
                println!("{year}{marker}");
            }
        }
        Commands::Summary {
            dimensions, format, ..
        } => {
            let json = format == Format::Json;
            let dimensions = parse_dimensions(&dimensions)?;
            if !json {
                print_status_header(&dashboard);
                if dashboard.status() == Status::Empty {
                    return Ok(());
                }
            }

            if json {
                let mut summaries = Vec::new();
                for dimension in &dimensions {
                    let buckets = dashboard.aggregate(*dimension).to_vec();
                    summaries.push((*dimension, buckets));
                }
                let output: Vec<DimensionSummary<'_>> = summaries
                    .iter()
                    .map(|(dimension, buckets)| DimensionSummary {
                        dimension: *dimension,
                        buckets,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for dimension in dimensions {
                    println!();
                    println!("{}:", dimension.label());
                    let buckets = dashboard.aggregate(dimension);
                    if buckets.is_empty() {
                        println!("  no answers");
                    }
                    for bucket in buckets {
                        println!(
                            "  {}: {} not flagged / {} flagged",
                            bucket.value, bucket.count_0, bucket.count_1
                        );
                    }
                }
            }
        }
        Commands::Options { dimension, .. } => {
            let dimension: Dimension = dimension.parse()?;
            let options = dashboard.enumerate(dimension);
            if options.is_empty() {
                println!("No options for {} in this scope.", dimension.label());
            }
            for option in options {
                let marker = if dashboard
                    .filters()
                    .selected(dimension)
                    .contains(&option.value)
                {
                    "*"
                } else {
                    " "
                };
                println!("{marker} ({}) {}", option.count, option.value);
            }
        }
        Commands::Departments { .. } => {
            if university == ALL_UNIVERSITIES {
                println!("Department counts need a specific university.");
                return Ok(());
            }
            if dashboard.department_index().is_empty() {
                println!("No department list for {university}; courses count as Unknown.");
            }
            let counts = dashboard.department_counts();
            if counts.is_empty() {
                println!("No responses for {university}.");
            }
            for (department, count) in counts {
                println!("- {department}: {count}");
            }
        }
        Commands::Countries { .. } => {
            let stats = aggregate::country_breakdown(&dashboard.filtered_records());
            if stats.is_empty() {
                println!("No responses match this selection.");
            }
            for stat in stats {
                let dominant = if stat.dominant_flagged {
                    "mostly flagged"
                } else {
                    "mostly not flagged"
                };
                println!(
                    "- {}: {} responses, {:.1}% flagged, {:.1}% not flagged ({dominant})",
                    stat.country, stat.total, stat.flagged_percentage, stat.not_flagged_percentage
                );
            }
        }
        Commands::Words {
            dimension, limit, ..
        } => {
            let dimension: Dimension = dimension.parse()?;
            let filtered = dashboard.filtered_records();
            let words = match limit {
                Some(limit) => aggregate::word_frequencies(&filtered, dimension, Some(limit)),
                None => aggregate::word_cloud(&filtered, dimension),
            };
            if words.is_empty() {
                println!("No answers recorded.");
            }
            for word in words {
                println!("{:>5}  {}", word.frequency, word.text);
            }
        }
        Commands::Report { out, .. } => {
            let filtered = dashboard.filtered_records();
            let report = report::build_report(dashboard.scope(), dashboard.filters(), &filtered);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(records = filtered.len(), "Report generated");
            println!("Report written to {}.", out.display());
        }
        // answered before any records are loaded
        Commands::Session { .. } | Commands::Courses { .. } => {}
    }

    Ok(())
}

fn check_university(config: &Config, university: &str) -> anyhow::Result<()> {
    if university != ALL_UNIVERSITIES && !config.universities.iter().any(|u| u == university) {
        bail!(
            "unknown university {university}; configured: {}",
            config.universities.join(", ")
        );
    }
    Ok(())
}

async fn load_departments(cli: &Cli, client: &ApiClient, university: &str) -> DepartmentsPayload {
    if university == ALL_UNIVERSITIES {
        return DepartmentsPayload::default();
    }

    let result = match &cli.departments_file {
        Some(path) => read_departments(path),
        None if cli.csv.is_some() || cli.json.is_some() => Ok(DepartmentsPayload::default()),
        None => client
            .fetch_departments(university)
            .await
            .map_err(anyhow::Error::from),
    };

    result.unwrap_or_else(|e| {
        warn!(university, error = %e, "Department list unavailable; courses map to Unknown");
        DepartmentsPayload::default()
    })
}

fn read_departments(path: &Path) -> anyhow::Result<DepartmentsPayload> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

fn apply_selection(dashboard: &mut Dashboard, selection: &Selection) -> anyhow::Result<()> {
    if let Some(year) = &selection.year {
        let year: AcademicYear = year.parse().map_err(|e: String| anyhow!(e))?;
        dashboard.on_year_change(year);
    }

    if !selection.departments.is_empty() {
        dashboard.on_department_change(selection.departments.iter().cloned());
    }

    let mut filters = dashboard.filters().clone();
    for expression in &selection.filters {
        filters.apply_expression(expression)?;
    }
    for (dimension, values) in filters.iter() {
        dashboard.on_filter_change(dimension, values.iter().cloned());
    }

    Ok(())
}

fn parse_dimensions(keys: &[String]) -> anyhow::Result<Vec<Dimension>> {
    if keys.is_empty() {
        return Ok(Dimension::ALL.to_vec());
    }
    keys.iter()
        .map(|key| key.parse::<Dimension>().map_err(anyhow::Error::from))
        .collect()
}

fn print_status_header(dashboard: &Dashboard) {
    let scope = dashboard.scope();
    let totals = dashboard.outcome_totals();
    println!(
        "Mental Health Dashboard - {} ({})",
        scope.year, scope.university
    );
    match dashboard.status() {
        Status::Empty => println!("No data for year {}.", scope.year),
        _ => println!(
            "{} responses: {} not flagged, {} flagged",
            totals.records, totals.not_flagged, totals.flagged
        ),
    }
}
