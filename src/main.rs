mod chart;
mod config;
mod ephemeris;
mod reading;
mod render;
mod web;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::chart::{derive_chart_params, julian_day_for, ChartParams, ChartRecord};
use crate::config::Config;
use crate::ephemeris::AyanamsaSource;
use crate::reading::{GeminiClient, History, ReadingGenerator};
use crate::render::{ChartImage, ChartRenderer};

#[derive(Parser)]
#[command(name = "vedic-chart")]
#[command(about = "Vedic chart images and readings from an ephemeris export")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an ephemeris export and summarise it
    Validate { chart: PathBuf },
    /// Print the chart renderer parameters as JSON
    Params { chart: PathBuf },
    /// Fetch the chart image and save it as PNG
    Image {
        chart: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Ask for a reading, or a follow-up question
    Read {
        chart: PathBuf,
        #[arg(short, long)]
        question: Option<String>,
        /// Conversation file, read before and rewritten after the call
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Run the HTTP API
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Validate { chart } => validate(&chart),
        Commands::Params { chart } => params(&config, &chart),
        Commands::Image { chart, output } => image(&config, &chart, output).await,
        Commands::Read {
            chart,
            question,
            history,
        } => {
            let client = match GeminiClient::from_config(&config.llm) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            let generator = ReadingGenerator::new(Arc::new(client));
            read(&generator, &chart, question.as_deref(), history.as_deref()).await
        }
        Commands::Serve => serve(config).await,
    }
}

fn load_chart(path: &Path) -> Option<ChartRecord> {
    match ChartRecord::from_file(path) {
        Ok(chart) => Some(chart),
        Err(e) => {
            eprintln!("Error reading chart {}: {}", path.display(), e);
            None
        }
    }
}

fn derive(chart: &ChartRecord, ephemeris: &dyn AyanamsaSource) -> Option<ChartParams> {
    match derive_chart_params(&chart.snapshot, &chart.birth, ephemeris) {
        Ok(params) => Some(params),
        Err(e) => {
            eprintln!("Unable to produce chart parameters: {}", e);
            None
        }
    }
}

fn validate(path: &Path) -> ExitCode {
    let Some(chart) = load_chart(path) else {
        return ExitCode::FAILURE;
    };

    println!(
        "Chart for {} born {} {} (UTC{:+})",
        chart.name,
        chart.birth.date_string(),
        chart.birth.time_string(),
        chart.birth.utc_offset
    );
    match julian_day_for(&chart.birth) {
        Ok(jd) => println!("  Julian Day (UT): {:.5}", jd),
        Err(e) => println!("  Julian Day (UT): unavailable ({})", e),
    }
    for (planet, position) in &chart.snapshot.planets {
        println!(
            "  {:<8} {:>9.4}°{}",
            planet.to_string(),
            position.longitude,
            if position.retrograde { " R" } else { "" }
        );
    }
    let missing = chart.snapshot.missing_planets();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|p| p.to_string()).collect();
        println!("  not in export: {}", names.join(", "));
    }
    println!("  {} house cusps", chart.snapshot.houses.len());
    ExitCode::SUCCESS
}

fn params(config: &Config, path: &Path) -> ExitCode {
    let ephemeris = ephemeris::from_config(&config.ephemeris);
    let Some(params) = load_chart(path)
        .as_ref()
        .and_then(|chart| derive(chart, ephemeris.as_ref()))
    else {
        return ExitCode::FAILURE;
    };

    match serde_json::to_string_pretty(&params) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing parameters: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn image(config: &Config, path: &Path, output: Option<PathBuf>) -> ExitCode {
    let Some(chart) = load_chart(path) else {
        return ExitCode::FAILURE;
    };
    let ephemeris = ephemeris::from_config(&config.ephemeris);
    let Some(params) = derive(&chart, ephemeris.as_ref()) else {
        return ExitCode::FAILURE;
    };

    let renderer = match ChartRenderer::new(&config.renderer) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(image) = renderer.fetch_or_none(&params).await else {
        eprintln!("No chart image available");
        return ExitCode::FAILURE;
    };

    let output =
        output.unwrap_or_else(|| PathBuf::from(ChartImage::download_file_name(&chart.name)));
    let written = image
        .to_png()
        .map_err(|e| e.to_string())
        .and_then(|png| std::fs::write(&output, png).map_err(|e| e.to_string()));
    match written {
        Ok(()) => {
            println!("Chart saved to {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error saving chart: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn read(
    generator: &ReadingGenerator,
    path: &Path,
    question: Option<&str>,
    history_path: Option<&Path>,
) -> ExitCode {
    let Some(chart) = load_chart(path) else {
        return ExitCode::FAILURE;
    };

    let history = match history_path.map(History::load).transpose() {
        Ok(h) => h.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error reading history: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if !history.is_empty() {
        log::info!("Continuing conversation of {} turns", history.len());
    }

    let reply = match generator.ask(&chart, question, &history).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Reading failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("{}", reply.answer);

    if let Some(path) = history_path {
        if let Err(e) = reply.history.save(path) {
            eprintln!("Error saving history: {}", e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

async fn serve(config: Config) -> ExitCode {
    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
