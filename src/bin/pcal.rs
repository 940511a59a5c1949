extern crate photocal as lib;

use chrono::{Datelike, Local, NaiveDate};
use flexi_logger::{FileSpec, Logger};
use lib::build::{self, BuildPlan, JsonRenderer, Snapshot, REPORT_FILE};
use lib::calendar::{month_from_number, MonthKey, YearMonth};
use lib::client::DisplayState;
use lib::config::Config;
use lib::error::{Error, ErrorKind};
use lib::fragment::Fragment;
use lib::l10n::Language;
use lib::photos::{CoverageStatus, PhotoTable};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pcal",
    author = "reedts <j.reedts@gmail.com>",
    about = "Photo calendar - builds calendar pages from a photo table."
)]
pub struct Args {
    #[structopt(
        name = "CONFIG",
        short = "c",
        long = "config",
        help = "path to config file",
        parse(from_os_str)
    )]
    pub configfile: Option<PathBuf>,

    #[structopt(long = "log-file", help = "path to log file", parse(from_os_str))]
    pub log_file: Option<PathBuf>,

    #[structopt(subcommand)]
    pub cmd: Cmd,
}

#[derive(Debug, StructOpt)]
pub enum Cmd {
    #[structopt(about = "build calendar pages for every month and language")]
    Build {
        #[structopt(long, help = "calendar year, defaults to the current one")]
        year: Option<i32>,

        #[structopt(long, use_delimiter = true, help = "months to build (1-12), defaults to all")]
        months: Vec<u32>,

        #[structopt(long, use_delimiter = true, help = "languages, defaults to the configured ones")]
        languages: Vec<Language>,

        #[structopt(long, help = "build the year-independent calendar")]
        perpetual: bool,
    },

    #[structopt(about = "report photo and location coverage per month")]
    Check {
        #[structopt(long)]
        year: i32,

        #[structopt(long, use_delimiter = true)]
        months: Vec<u32>,
    },

    #[structopt(about = "resolve a link fragment into a date")]
    Resolve {
        fragment: String,

        #[structopt(long, help = "reference date (YYYY-MM-DD), defaults to today")]
        today: Option<NaiveDate>,

        #[structopt(long, help = "language shown before the fragment is applied")]
        language: Option<Language>,
    },

    #[structopt(about = "print the link for a month")]
    Link {
        #[structopt(long)]
        year: Option<i32>,

        #[structopt(long)]
        month: u32,

        #[structopt(long)]
        language: Option<Language>,

        #[structopt(long)]
        perpetual: bool,
    },

    #[structopt(about = "print date to observation id for every photo as JSON")]
    Observations,
}

fn months_or_all(months: Vec<u32>) -> Vec<u32> {
    if months.is_empty() {
        (1..=12).collect()
    } else {
        months
    }
}

fn build(
    config: &Config,
    year: Option<i32>,
    months: Vec<u32>,
    languages: Vec<Language>,
    perpetual: bool,
) -> Result<bool, Error> {
    let months = months_or_all(months);
    let languages = if languages.is_empty() {
        config.calendar.languages.clone()
    } else {
        languages
    };

    let plan = if perpetual {
        BuildPlan::perpetual(&months, &languages)?
    } else {
        let year = year.unwrap_or_else(|| Local::now().year());
        BuildPlan::year_bound(year, &months, &languages, config.calendar.week_start)?
    };

    let snapshot = Snapshot::load(config)?;
    let mut renderer = JsonRenderer::new(&config.paths.output_dir);
    let report = build::run(&plan, &snapshot.assembler(config), &mut renderer);

    let report_path = config.paths.output_dir.join(REPORT_FILE);
    report.write(&report_path)?;

    println!(
        "{} pages written, {} failed, report in '{}'",
        report.succeeded.len(),
        report.failed.len(),
        report_path.display()
    );
    for failure in &report.failed {
        println!("  {} ({}): {}", failure.month_key, failure.language, failure.reason);
    }

    Ok(report.is_success())
}

fn check(config: &Config, year: i32, months: Vec<u32>) -> Result<bool, Error> {
    let snapshot = Snapshot::load(config)?;
    let mut complete = true;

    for month in months_or_all(months) {
        let coverage = snapshot.photos.coverage(YearMonth::new(year, month_from_number(month)?));
        let key = MonthKey::year_bound(year, month);

        let locations = config
            .calendar
            .languages
            .iter()
            .map(|&language| match snapshot.locations.resolve(&key, language) {
                Ok(_) => format!("{}:ok", language),
                Err(err) => {
                    complete = false;
                    log::warn!("{}", err);
                    format!("{}:missing", language)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        let status = match coverage.status {
            CoverageStatus::Complete => "complete",
            CoverageStatus::Short => "short",
            CoverageStatus::Missing => "missing",
        };
        println!(
            "{}  {:>2}/{:<2}  {:<8}  {}",
            coverage.month_key,
            coverage.found,
            coverage.expected,
            status,
            locations
        );
        complete &= coverage.found >= coverage.expected;
    }

    Ok(complete)
}

fn resolve(
    config: &Config,
    fragment: &str,
    today: Option<NaiveDate>,
    language: Option<Language>,
) -> Result<bool, Error> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let language = language
        .or_else(|| config.calendar.languages.first().copied())
        .unwrap_or_default();

    let before = DisplayState::new(today, language);
    let state = before.on_fragment(today, fragment);
    if state == before {
        log::info!("'{}' left the displayed date unchanged", fragment);
    }

    println!("{}", serde_json::to_string_pretty(&state)?);
    println!("{}", state.title());

    match PhotoTable::from_file(&config.paths.photo_table) {
        Ok(table) => {
            if let Some(notice) = state.notice(&table) {
                println!("{}", notice);
            }
        }
        Err(err) => log::warn!("Skipping photo lookup: {}", err),
    }

    Ok(true)
}

fn link(
    config: &Config,
    year: Option<i32>,
    month: u32,
    language: Option<Language>,
    perpetual: bool,
) -> Result<bool, Error> {
    let month = month_from_number(month)?;
    let request_year = if perpetual { None } else { year };

    let fragment = match request_year {
        Some(year) => Fragment::month(YearMonth::new(year, month)),
        None if perpetual => Fragment::perpetual(month),
        None => {
            return Err(Error::new(
                ErrorKind::InvalidRequest,
                "Either --year or --perpetual is required",
            ))
        }
    };
    let fragment = match language {
        Some(language) => fragment.with_language(language),
        None => fragment,
    };

    match &config.calendar.base_url {
        Some(url) => println!("{}", fragment.link(url)),
        None => println!("#{}", fragment),
    }

    Ok(true)
}

fn observations(config: &Config) -> Result<bool, Error> {
    let table = PhotoTable::from_file(&config.paths.photo_table)?;
    println!("{}", table.observations().to_json()?);
    Ok(true)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_args();

    const DEFAULT_LOG_LEVEL: &'static str = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let mut logger = Logger::try_with_env_or_str(DEFAULT_LOG_LEVEL)?;

    if let Some(log_file) = args.log_file {
        logger = logger
            .log_to_file(FileSpec::try_from(log_file)?)
            .print_message();
    }

    logger.start()?;

    std::panic::set_hook(Box::new(|info| {
        println!("pcal ran into a fatal error!");
        println!("Consider filing an issue with a log file and the backtrace below.");

        println!("{}", info);
        println!("{:?}", backtrace::Backtrace::new());
    }));

    let config = lib::config::load_suitable_config(args.configfile.as_deref())?;

    let ok = match args.cmd {
        Cmd::Build {
            year,
            months,
            languages,
            perpetual,
        } => build(&config, year, months, languages, perpetual)?,
        Cmd::Check { year, months } => check(&config, year, months)?,
        Cmd::Resolve {
            fragment,
            today,
            language,
        } => resolve(&config, &fragment, today, language)?,
        Cmd::Link {
            year,
            month,
            language,
            perpetual,
        } => link(&config, year, month, language, perpetual)?,
        Cmd::Observations => observations(&config)?,
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

