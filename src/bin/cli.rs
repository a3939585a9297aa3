//! Tire Strategy CLI - command-line front end for tire recommendations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use tire_strategy::{
    Category, Predictor, PredictorConfig, RecommendError, TireCompound, Weather,
};

/// Race length shown in the situation summary
const RACE_LAPS: u32 = 70;

#[derive(Parser)]
#[command(name = "tire-strategy")]
#[command(author, version, about = "Tire strategy recommendation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,

    /// Path to the strategy dataset CSV (overrides TIRE_DATA_PATH,
    /// default data/tire_strategy_data.csv relative to the working directory)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Training seed (overrides TIRE_MODEL_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend the next tire compound
    Recommend {
        /// Current lap
        #[arg(short, long, default_value = "25")]
        lap: u32,

        /// Track temperature in °C
        #[arg(short, long, default_value = "35")]
        temp: f64,

        /// Weather condition (Dry, Light Rain, Moderate Rain, Heavy Rain)
        #[arg(short, long, default_value = "Dry")]
        weather: String,

        /// Current tire compound (Soft, Medium, Hard, Intermediate, Wet, Full Wet)
        #[arg(long, default_value = "Medium")]
        tire: String,

        /// Laps completed on the current set
        #[arg(short, long, default_value = "10")]
        stint: u32,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show whether the model loaded and its shape
    Status {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut config = PredictorConfig::from_env();
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let quiet = matches!(
        cli.command,
        Some(Commands::Recommend { json: true, .. }) | Some(Commands::Status { json: true })
    );
    if !quiet {
        println!(
            "{}",
            format!("Tire Strategy CLI v{}", env!("CARGO_PKG_VERSION"))
                .cyan()
                .bold()
        );
        println!();
    }

    let predictor = load_predictor(&config, quiet);

    if cli.interactive {
        run_interactive(&predictor, &config)?;
    } else if let Some(command) = cli.command {
        match command {
            Commands::Recommend {
                lap,
                temp,
                weather,
                tire,
                stint,
                json,
            } => {
                let ok = recommend(&predictor, lap, temp, &weather, &tire, stint, json)?;
                if !ok {
                    std::process::exit(1);
                }
            }
            Commands::Status { json } => {
                show_status(&predictor, &config, json)?;
            }
        }
    } else {
        println!("Use --help for usage information or --interactive for interactive mode.");
    }

    Ok(())
}

/// Train at startup behind a spinner
fn load_predictor(config: &PredictorConfig, quiet: bool) -> Predictor {
    if quiet {
        return Predictor::startup(config);
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Training tire model from {:?}...", config.data_path));

    let predictor = Predictor::startup(config);
    pb.finish_and_clear();

    if let Some(reason) = predictor.startup_error() {
        println!(
            "{} {}",
            "Failed to load the tire strategy model:".red().bold(),
            reason
        );
        println!(
            "{}",
            format!(
                "Check that '{}' exists and has the columns lap, track_temp, weather, current_tire, stint_laps, next_tire.",
                config.data_path.display()
            )
            .dimmed()
        );
        println!();
    }

    predictor
}

fn show_situation(lap: u32, temp: f64, weather: &str, tire: &str, stint: u32) {
    println!("{}", "Current Race Situation:".yellow().bold());
    println!("{}", "-".repeat(40));
    println!("{:<16} {}/{}", "Lap", lap, RACE_LAPS);
    println!("{:<16} {}°C", "Track Temp", temp);
    println!("{:<16} {} laps", "Stint Length", stint);
    println!("{:<16} {}", "Weather", weather);
    println!("{:<16} {}", "Current Tire", tire);
    println!();
}

/// Returns false when no recommendation could be made
fn recommend(
    predictor: &Predictor,
    lap: u32,
    temp: f64,
    weather: &str,
    tire: &str,
    stint: u32,
    as_json: bool,
) -> Result<bool> {
    let result = predictor.recommend(lap, temp, weather, tire, stint);

    if as_json {
        let body = match &result {
            Ok(next) => json!({
                "recommendation": next,
                "description": next.description(),
            }),
            Err(e) => json!({
                "error": error_kind(e),
                "message": e.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(result.is_ok());
    }

    show_situation(lap, temp, weather, tire, stint);

    match result {
        Ok(next) => {
            print_recommendation(next);
            Ok(true)
        }
        Err(e) => {
            println!("{} {}", "Error:".red().bold(), e);
            Ok(false)
        }
    }
}

fn error_kind(err: &RecommendError) -> &'static str {
    match err {
        RecommendError::InvalidInput { .. } => "invalid_input",
        RecommendError::ModelUnavailable { .. } => "model_unavailable",
    }
}

fn print_recommendation(next: TireCompound) {
    println!(
        "{} {}",
        "Recommended Tire:".green().bold(),
        next.to_string().green().bold()
    );
    println!("  {}", next.description());
}

fn show_status(predictor: &Predictor, config: &PredictorConfig, as_json: bool) -> Result<()> {
    if as_json {
        let body = json!({
            "ready": predictor.is_ready(),
            "data_path": config.data_path,
            "error": predictor.startup_error(),
            "model": predictor.summary(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match predictor.summary() {
        Some(summary) => {
            println!("{} {}", "Model Status:".bold(), "Loaded and ready".green());
            println!("{:<16} {}", "Dataset", config.data_path.display());
            println!("{:<16} {}", "Records", summary.records);
            println!("{:<16} {}", "Tree depth", summary.depth);
            println!("{:<16} {}", "Leaves", summary.leaves);
            println!("{:<16} {}", "Seed", summary.seed);
        }
        None => {
            println!("{} {}", "Model Status:".bold(), "Failed to load".red());
            if let Some(reason) = predictor.startup_error() {
                println!("{:<16} {}", "Reason", reason);
            }
        }
    }

    Ok(())
}

fn run_interactive(predictor: &Predictor, config: &PredictorConfig) -> Result<()> {
    println!("{}", "Interactive mode".green().bold());
    println!();

    let theme = ColorfulTheme::default();
    let weathers = Weather::labels();
    let tires = TireCompound::labels();

    loop {
        let options = vec!["Get tire recommendation", "Model status", "Quit"];

        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => {
                let lap: u32 = Input::with_theme(&theme)
                    .with_prompt(format!("Current lap (1-{})", RACE_LAPS))
                    .default(25)
                    .validate_with(|v: &u32| -> Result<(), String> {
                        if (1..=RACE_LAPS).contains(v) {
                            Ok(())
                        } else {
                            Err(format!("Lap must be between 1 and {}", RACE_LAPS))
                        }
                    })
                    .interact_text()?;

                let temp: f64 = Input::with_theme(&theme)
                    .with_prompt("Track temperature °C (10-60)")
                    .default(35.0)
                    .validate_with(|v: &f64| -> Result<(), &'static str> {
                        if (10.0..=60.0).contains(v) {
                            Ok(())
                        } else {
                            Err("Temperature must be between 10 and 60")
                        }
                    })
                    .interact_text()?;

                let weather = Select::with_theme(&theme)
                    .with_prompt("Weather condition")
                    .items(&weathers)
                    .default(0)
                    .interact()?;

                let tire = Select::with_theme(&theme)
                    .with_prompt("Current tire compound")
                    .items(&tires)
                    .default(1)
                    .interact()?;

                let stint: u32 = Input::with_theme(&theme)
                    .with_prompt("Current stint length (0-50)")
                    .default(10)
                    .validate_with(|v: &u32| -> Result<(), &'static str> {
                        if *v <= 50 {
                            Ok(())
                        } else {
                            Err("Stint length must be between 0 and 50")
                        }
                    })
                    .interact_text()?;

                println!();
                recommend(
                    predictor,
                    lap,
                    temp,
                    weathers[weather],
                    tires[tire],
                    stint,
                    false,
                )?;
                println!();
            }
            1 => {
                println!();
                show_status(predictor, config, false)?;
                println!();
            }
            2 => {
                println!("Goodbye!");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}
