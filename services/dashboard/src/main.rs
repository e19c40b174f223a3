//! BAYSENSE dashboard command-line front end.
//!
//! Runs one full dashboard refresh against the backend:
//! - Available dates, parameter and true-color tiles for the filters
//! - Lease areas and, with a token, fish cages
//! - Bay-wide parameter series and the weather forecast
//!
//! The resulting layer stack and legend are logged; the full state can be
//! printed as JSON and the chart series exported as CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use baysense_common::Parameter;
use chrono::Local;
use clap::Parser;
use dashboard::{DashboardConfig, DashboardController, ImageMode, PanelEvent};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "baysense-dashboard")]
#[command(about = "Headless BAYSENSE water-quality dashboard")]
struct Args {
    /// YAML configuration file (defaults apply when omitted)
    #[arg(short, long, env = "BAYSENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, env = "BAYSENSE_API_URL")]
    api_url: Option<String>,

    /// Authorization header value for the cage endpoints
    #[arg(long, env = "BAYSENSE_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Override the configured parameter (chlorophyll, turbidity, tss)
    #[arg(long)]
    parameter: Option<Parameter>,

    /// Use the latest single scene instead of the composite
    #[arg(long)]
    single: bool,

    /// Skip the weather forecast
    #[arg(long)]
    no_weather: bool,

    /// Write the chart series as CSV to this path
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the final dashboard state as JSON on stdout
    #[arg(long)]
    snapshot: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format: json or pretty
    #[arg(long, default_value = "json")]
    log_format: String,
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if args.log_format.eq_ignore_ascii_case("pretty") {
        builder.pretty().init();
    } else {
        builder.json().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads the environment.
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args);

    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    config.apply_overrides(args.api_url.clone(), args.auth_token.clone());
    if let Some(parameter) = args.parameter {
        config.analysis.parameter = parameter;
    }
    if args.no_weather {
        config.weather.enabled = false;
    }
    config.validate().context("Invalid configuration")?;

    info!(
        base_url = %config.api.base_url,
        parameter = %config.analysis.parameter,
        cloud_cover = config.analysis.cloud_cover,
        "Starting BAYSENSE dashboard"
    );

    let today = Local::now().date_naive();
    let mut controller =
        DashboardController::new(&config, today).context("Failed to initialise dashboard")?;

    controller.run_analysis().await?;
    if args.single {
        controller.edit(PanelEvent::ModeChanged(ImageMode::Single))?;
        controller.run_analysis().await?;
    }

    controller.load_features().await;
    if config.api.auth_token.is_some() {
        controller.load_cages().await;
    } else {
        info!("No auth token configured, skipping cages");
    }
    if config.weather.enabled {
        controller.load_weather().await;
    }

    report(&controller);

    if let Some(path) = &args.export {
        match controller.export_csv() {
            Some(export) => {
                tokio::fs::write(path, &export.content)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!(path = %path.display(), file_name = %export.file_name, "Exported chart series");
            }
            None => warn!("No chart data available to export"),
        }
    }

    if args.snapshot {
        let json = serde_json::to_string_pretty(&controller.snapshot())
            .context("Failed to serialize dashboard state")?;
        println!("{}", json);
    }

    Ok(())
}

fn report(controller: &DashboardController) {
    let map = controller.map();
    for layer in map.layer_stack() {
        info!(
            layer = %layer.id,
            kind = layer.kind_name(),
            z = layer.z_index,
            visible = layer.visible,
            source = layer.source.as_deref().unwrap_or("-"),
            "Layer"
        );
    }

    let legend = map.legend();
    info!(
        heading = %legend.heading(),
        caption = %legend.caption().map(|c| c.text()).unwrap_or_default(),
        ticks = %legend.spec().ticks.join(" | "),
        "Legend"
    );

    if let Some(stats) = controller.chart().stats() {
        let (min, max, mean) = stats.formatted();
        info!(count = stats.count, min = %min, max = %max, mean = %mean, "Chart series");
    }
    if let Some(error) = controller.chart().error() {
        warn!(error = error, "Chart unavailable");
    }
    if let Some(weather) = controller.weather() {
        info!(
            location = weather.location.as_deref().unwrap_or("unknown"),
            max_temperature = ?weather.max_temperature,
            max_gust = ?weather.max_gust,
            total_rainfall = ?weather.total_rainfall,
            "Weather"
        );
    }
    if let Some(error) = map.error_banner() {
        warn!(error = error, "Map error");
    }
}
