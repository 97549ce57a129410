use chrono::Utc;
use clap::Parser;
use lib::{
    AnalysisConfig, ConsoleLogger, CurrentReading, DashboardError, FetchOutcome, Season,
    WeatherClient, analyze, fetch::OPENWEATHERMAP_URL, load_table, profile_table,
    render_season_profile, render_time_series, validate_selection, write_json, write_profiles_csv,
    write_profiles_parquet,
};
use log::{debug, error, info};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

static LOGGER: ConsoleLogger = ConsoleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Historical dataset (CSV with city,timestamp,season,temperature; or .parquet)
    #[arg(short, long)]
    input_file: PathBuf,

    /// City to analyse. If not specified, lists the cities in the dataset and exits.
    #[arg(short, long)]
    city: Option<String>,

    /// OpenWeatherMap API key
    #[arg(short = 'k', long, env = "OPENWEATHERMAP_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Season whose history the current reading is compared against
    #[arg(long, default_value = "spring")]
    season: Season,

    /// Year (timestamp substring) used for day counts and the time-series chart
    #[arg(long, default_value = "2019")]
    year: String,

    /// Use this current temperature instead of calling the weather service
    #[arg(long, allow_hyphen_values = true)]
    current_temp: Option<f64>,

    /// Weather service endpoint
    #[arg(long, default_value = OPENWEATHERMAP_URL)]
    base_url: String,

    /// Language parameter sent to the weather service
    #[arg(long, default_value = "ru")]
    lang: String,

    /// Units parameter sent to the weather service
    #[arg(long, default_value = "metric")]
    units: String,

    /// HTTP timeout in seconds (client default when not specified)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Output base name (will create dir containing .json, .csv, .parquet and .svg files)
    #[arg(short, long, default_value = "output")]
    output: String,

    /// Print the first N rows of the dataset (10 when no value is given)
    #[arg(long, num_args = 0..=1, default_missing_value = "10")]
    show_data: Option<usize>,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn main() -> Result<(), DashboardError> {
    let total_start = Instant::now();
    if log::set_logger(&LOGGER).is_err() {
        eprintln!("logger already initialised");
    }

    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    println!("Seasonal temperature anomaly dashboard");
    debug!("Input file: {}", args.input_file.display());

    let load_start = Instant::now();
    let table = load_table(&args.input_file)?;
    let cities = table.cities();
    info!(
        "Loaded {} records for {} cities in {:.2?}",
        table.len(),
        cities.len(),
        load_start.elapsed()
    );

    if let Some(rows) = args.show_data {
        println!("Dataset: {} rows", table.len());
        for line in table.preview(rows) {
            println!("{}", line);
        }
        println!();
    }

    let Some(city) = args.city.clone() else {
        println!("Cities in dataset:");
        for city in &cities {
            println!("  - {} ({})", city, seasons_label(&table.seasons_for(city)));
        }
        return Ok(());
    };
    println!("Selected city: {}", city);

    let config = AnalysisConfig {
        season: args.season,
        year: args.year.clone(),
        lang: args.lang.clone(),
        units: args.units.clone(),
    };
    debug!(
        "Analysis configuration | Season={} Year={} Lang={} Units={}",
        config.season, config.year, config.lang, config.units
    );

    // Check the (city, season) pair before spending a network call on it
    if let Err(e) = validate_selection(&table, &city, &config) {
        error!(
            "{} | seasons available for {}: {}",
            e,
            city,
            seasons_label(&table.seasons_for(&city))
        );
        return Err(e);
    }

    let reading = match args.current_temp {
        Some(temperature) => {
            info!("Using supplied current temperature, weather service not called");
            CurrentReading {
                city: city.clone(),
                temperature,
                observed_at: Utc::now(),
            }
        }
        None => {
            let client = WeatherClient::with_base_url(
                &config,
                &args.base_url,
                args.timeout_secs.map(Duration::from_secs),
            )?;
            let fetch_start = Instant::now();
            let outcome = client.fetch_current_temperature(&city, &args.api_key)?;
            debug!("Weather service call took {:.2?}", fetch_start.elapsed());
            match outcome {
                FetchOutcome::Success(reading) => reading,
                FetchOutcome::Failure(failure) => {
                    error!("Weather service returned {}: {}", failure.status, failure.message);
                    println!("{}", failure.payload);
                    return Ok(());
                }
            }
        }
    };

    let report = analyze(&table, reading, &config)?;
    println!();
    for line in report.narrative() {
        println!("{}", line);
    }

    // Create output directory
    let output_dir = PathBuf::from(format!("./output/{}", args.output));
    fs::create_dir_all(&output_dir)?;
    let output_name = args
        .output
        .split(['/', '\\'])
        .next_back()
        .unwrap_or(&args.output);
    let json_path = output_dir.join(format!("{}.json", output_name));
    let csv_path = output_dir.join(format!("{}_profiles.csv", output_name));
    let parquet_path = output_dir.join(format!("{}_profiles.parquet", output_name));
    let series_path = output_dir.join(format!("{}_timeseries.svg", output_name));
    let profile_path = output_dir.join(format!("{}_profile.svg", output_name));

    let io_start = Instant::now();
    write_json(&report, &json_path)?;

    let profiles = profile_table(&table);
    write_profiles_csv(&profiles, &csv_path)?;
    write_profiles_parquet(&profiles, &parquet_path)?;

    render_time_series(&report.time_series, &series_path)?;
    render_season_profile(&city, &report.profile, &profile_path)?;
    debug!("Output files took {:.2?}", io_start.elapsed());

    println!("\nWrote files to directory: {}", output_dir.display());
    for path in [&json_path, &csv_path, &parquet_path, &series_path, &profile_path] {
        debug!("  - {}", path.display());
    }

    println!("Total runtime: {:.2?}", total_start.elapsed());
    Ok(())
}

fn seasons_label(seasons: &[Season]) -> String {
    if seasons.is_empty() {
        return "none".to_string();
    }
    seasons.iter().map(Season::as_str).collect::<Vec<_>>().join(", ")
}
