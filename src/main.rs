use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::fmt::Display;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use condition_forecast::config::{self, secrets::Secrets, Config};
use condition_forecast::fetch::{self, NoDataError, Providers};
use condition_forecast::history::{self, HistoryStore, JsonFileStore};
use condition_forecast::output;
use condition_forecast::scoring::{self, ScoringConfig};
use condition_forecast::timeline::HourGrid;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Score the 72-hour window around now and record it (default if no subcommand)
    Forecast,
    /// Summarise recorded daily scores
    History {
        /// Number of days to look back
        #[arg(short, long, default_value_t = 7)]
        days: i64,
    },
    /// Run the pipeline on built-in sample data, without network or disk
    Demo,
}

#[derive(Parser, Debug)]
#[command(name = "condition-forecast")]
#[command(about = "Hourly condition forecast from weather, air quality and your calendar", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/condition-forecast/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Everything a command needs once the config has been checked.
struct Settings {
    config: Config,
    scoring: ScoringConfig,
    retention: chrono::Duration,
    request_timeout: Duration,
    history_path: PathBuf,
    json: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Reject structural scoring errors; weight sums off 1.0 are only logged.
fn check_scoring(scoring: &ScoringConfig) -> Result<(), i32> {
    if let Err(errors) = scoring::validate_scoring(scoring) {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(EXIT_CONFIG);
    }
    for warning in scoring::weight_sum_warnings(scoring) {
        log::warn!("{}", warning);
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings, i32> {
    let config_path = cli.config.clone().map(PathBuf::from);
    let config = config::load_config(config_path).map_err(|e| {
        eprintln!("Config error: {:#}", e);
        EXIT_CONFIG
    })?;

    let scoring = config.scoring();
    check_scoring(&scoring)?;

    let config_error = |e: anyhow::Error| {
        eprintln!("Config error: {:#}", e);
        EXIT_CONFIG
    };
    let retention = config.retention().map_err(config_error)?;
    let request_timeout = config.request_timeout().map_err(config_error)?;

    let history_path = match &config.history_path {
        Some(path) => path.clone(),
        None => history::get_history_path().map_err(config_error)?,
    };
    log::debug!("History file: {}", history_path.display());

    Ok(Settings {
        config,
        scoring,
        retention,
        request_timeout,
        history_path,
        json: cli.json,
    })
}

async fn run_forecast<Tz: TimeZone>(settings: &Settings, now: DateTime<Tz>) -> i32
where
    Tz::Offset: Display,
{
    let tz = now.timezone();
    let secrets = Secrets::from_env();
    let Some(weather_key) = secrets.weather_key.as_deref() else {
        eprintln!(
            "No weather API key. Set {} to your OpenWeather API key.",
            config::secrets::ENV_OWM_KEY
        );
        return EXIT_CONFIG;
    };

    let client = match condition_forecast::http::create_client(settings.request_timeout) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {}", e);
            return EXIT_NETWORK;
        }
    };

    let providers = Providers {
        weather_key,
        aqi_token: secrets.aqi_token.as_deref(),
        calendar_token: secrets.calendar_token.as_deref(),
        location: settings.config.location,
        aqi_default: settings.config.aqi_default,
    };
    let grid = HourGrid::starting_yesterday(&now);
    let inputs = fetch::fetch_inputs(&client, &providers, &tz, grid.start(), grid.end()).await;

    let mut store = JsonFileStore::new(&settings.history_path, settings.retention);
    let report = match fetch::run_forecast(&mut store, &inputs, &settings.scoring, &now) {
        Ok(report) => report,
        Err(e) if e.downcast_ref::<NoDataError>().is_some() => {
            eprintln!("{}. Check your network connection and API key.", e);
            return EXIT_NETWORK;
        }
        Err(e) => {
            eprintln!("Forecast failed: {:#}", e);
            return EXIT_FAILURE;
        }
    };

    print_report(&report, &tz, settings.json)
}

fn print_report<Tz: TimeZone>(report: &fetch::ForecastReport, tz: &Tz, json: bool) -> i32
where
    Tz::Offset: Display,
{
    if json {
        match output::format_json(report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                return EXIT_FAILURE;
            }
        }
    } else {
        println!("{}", output::format_report(report, tz, output::should_use_colors()));
    }
    EXIT_SUCCESS
}

fn run_history<Tz: TimeZone>(settings: &Settings, now: DateTime<Tz>, days: i64) -> i32 {
    let store = JsonFileStore::new(&settings.history_path, settings.retention);
    let recorded = match store.load() {
        Ok(history) => history.entries.into_values().collect::<Vec<_>>(),
        Err(e) => {
            eprintln!("Failed to read history: {:#}", e);
            return EXIT_FAILURE;
        }
    };

    let Some(stats) = history::compute_stats(&recorded, &now.timezone(), now.with_timezone(&Utc), days)
    else {
        println!("No recorded history in the last {} days.", days);
        return EXIT_SUCCESS;
    };

    if settings.json {
        match output::format_json(&stats) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize history: {}", e);
                return EXIT_FAILURE;
            }
        }
    } else {
        println!(
            "{}",
            output::format_history_stats(&stats, days, output::should_use_colors())
        );
    }
    EXIT_SUCCESS
}

fn run_demo(cli: &Cli) -> i32 {
    // The demo only reads a config when one is named explicitly
    let scoring = match &cli.config {
        Some(path) => match config::load_config(Some(PathBuf::from(path))) {
            Ok(config) => config.scoring(),
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                return EXIT_CONFIG;
            }
        },
        None => ScoringConfig::default(),
    };
    if let Err(code) = check_scoring(&scoring) {
        return code;
    }

    let now = Local::now();
    match condition_forecast::demo::run_demo(&now, &scoring) {
        Ok((report, _store)) => print_report(&report, &Local, cli.json),
        Err(e) => {
            eprintln!("Demo failed: {:#}", e);
            EXIT_FAILURE
        }
    }
}

/// Forecast, or the history summary when `history_days` is set.
async fn run_command<Tz: TimeZone>(
    settings: &Settings,
    now: DateTime<Tz>,
    history_days: Option<i64>,
) -> i32
where
    Tz::Offset: Display,
{
    match history_days {
        Some(days) => run_history(settings, now, days),
        None => run_forecast(settings, now).await,
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let command = cli.command.clone().unwrap_or(Commands::Forecast);
    let start_time = Instant::now();

    let history_days = match command {
        Commands::Demo => std::process::exit(run_demo(&cli)),
        Commands::History { days } => Some(days),
        Commands::Forecast => None,
    };

    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(code) => std::process::exit(code),
    };

    let code = match settings.config.utc_offset() {
        Ok(Some(offset)) => {
            run_command(&settings, Utc::now().with_timezone(&offset), history_days).await
        }
        Ok(None) => run_command(&settings, Local::now(), history_days).await,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            EXIT_CONFIG
        }
    };

    log::info!("Finished in {:?}", start_time.elapsed());
    std::process::exit(code);
}
