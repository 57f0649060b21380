use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use matrix::{
    estimate_job_count, group_for_batching, job_id, validate_parameter_range, MatrixAxes,
    MatrixAxis, MatrixGenerator,
};
use settings::{GenerationSettings, StudioConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

mod session;

#[derive(Parser)]
#[command(name = "dreamlayer-cli")]
#[command(about = "DreamLayer CLI - Headless generation matrix and settings history tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Studio config file (defaults to the per-user data dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand parameter axes into matrix jobs
    Matrix {
        /// Base settings JSON file
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Start from a named preset (default, sd15, sdxl, fast)
        #[arg(long, conflicts_with = "base")]
        preset: Option<String>,

        /// Axis as name=input, e.g. steps=10-30 or sampler=euler,dpmpp_2m.
        /// Ranges may span up to max_matrix_jobs values
        #[arg(short, long = "axis")]
        axes: Vec<String>,

        /// Group jobs into batches sharing model, resolution, VAE and LoRAs
        #[arg(long)]
        group: bool,

        /// Write jobs to a JSON file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check one axis input against its bounds
    Validate {
        /// Axis name (seed, sampler, steps, cfg_scale, width, height, batch_size, batch_count)
        axis: String,

        /// Input as typed, e.g. 10-30 or 5,7.5
        input: String,
    },

    /// Print the content id of a settings file
    JobId {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,
    },

    /// Replay an edit script against a settings history
    Session {
        /// Script file (set/type/wait/undo/redo/clear lines)
        #[arg(short, long)]
        script: PathBuf,

        /// Base settings JSON file
        #[arg(short, long)]
        base: Option<PathBuf>,
    },

    /// Print a settings preset as JSON
    Preset {
        /// Preset name (default, sd15, sdxl, fast)
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(StudioConfig::default_path);
    let config = StudioConfig::load_or_default(&config_path)
        .with_context(|| format!("load studio config {}", config_path.display()))?;

    match cli.command {
        Commands::Matrix {
            base,
            preset,
            axes,
            group,
            output,
        } => matrix_command(&config, base, preset, axes, group, output).await,
        Commands::Validate { axis, input } => validate_command(&config, axis, input).await,
        Commands::JobId { settings } => job_id_command(settings).await,
        Commands::Session { script, base } => session_command(&config, script, base).await,
        Commands::Preset { name } => preset_command(name).await,
    }
}

async fn load_settings(path: &Path) -> Result<GenerationSettings> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read settings {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse settings {}", path.display()))
}

async fn base_settings(
    base: Option<PathBuf>,
    preset: Option<String>,
) -> Result<GenerationSettings> {
    match (base, preset) {
        (Some(path), _) => load_settings(&path).await,
        (None, Some(name)) => {
            GenerationSettings::preset(&name).ok_or_else(|| anyhow!("unknown preset '{name}'"))
        }
        (None, None) => Ok(GenerationSettings::default()),
    }
}

fn parse_axes(generator: &MatrixGenerator, specs: &[String]) -> Result<MatrixAxes> {
    let mut axes = MatrixAxes::new();
    for spec in specs {
        let (name, input) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("axis must be name=input, got '{spec}'"))?;
        let axis: MatrixAxis = name.parse()?;
        let range = generator.parse_input(input);
        let verdict = validate_parameter_range(axis, &range);
        if !verdict.valid {
            bail!(verdict.error.unwrap_or_else(|| format!("invalid {axis} input")));
        }
        if axes.insert(axis, range).is_some() {
            warn!("axis {} given twice, keeping the last one", axis);
        }
    }
    Ok(axes)
}

async fn matrix_command(
    config: &StudioConfig,
    base: Option<PathBuf>,
    preset: Option<String>,
    axis_specs: Vec<String>,
    group: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let base = base_settings(base, preset).await?;
    let generator = MatrixGenerator::from_config(config);
    let axes = parse_axes(&generator, &axis_specs)?;

    info!(
        "Expanding {} axes into {} jobs",
        axes.len(),
        estimate_job_count(&axes)
    );

    let jobs = generator.generate(&axes, &base)?;

    let data = if group {
        let groups = group_for_batching(jobs);
        info!("Grouped into {} batches", groups.len());
        serde_json::to_string_pretty(&groups)?
    } else {
        serde_json::to_string_pretty(&jobs)?
    };

    if let Some(output_path) = output {
        tokio::fs::write(&output_path, data)
            .await
            .with_context(|| format!("write jobs to {}", output_path.display()))?;
        info!("Jobs written to: {:?}", output_path);
    } else {
        println!("{}", data);
    }

    Ok(())
}

async fn validate_command(config: &StudioConfig, axis: String, input: String) -> Result<()> {
    let axis: MatrixAxis = axis.parse()?;
    let range = MatrixGenerator::from_config(config).parse_input(&input);
    let verdict = validate_parameter_range(axis, &range);

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "axis": axis,
            "range": range,
            "validation": verdict,
        }))?
    );

    if verdict.valid {
        Ok(())
    } else {
        Err(anyhow!(verdict
            .error
            .unwrap_or_else(|| "invalid input".to_string())))
    }
}

async fn job_id_command(path: PathBuf) -> Result<()> {
    let settings = load_settings(&path).await?;
    println!("{}", job_id(&settings));
    Ok(())
}

async fn session_command(
    config: &StudioConfig,
    script_path: PathBuf,
    base: Option<PathBuf>,
) -> Result<()> {
    let base = base_settings(base, None).await?;
    let script = tokio::fs::read_to_string(&script_path)
        .await
        .with_context(|| format!("read script {}", script_path.display()))?;

    let mut session = session::Session::new(
        base,
        config.history_capacity,
        Duration::from_millis(config.debounce_ms),
    );
    session.run_script(&script)?;

    let summary = session.finish();
    if summary["discarded_pending"] == true {
        warn!("Script ended inside a debounce window; last edit discarded");
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn preset_command(name: String) -> Result<()> {
    let preset =
        GenerationSettings::preset(&name).ok_or_else(|| anyhow!("unknown preset '{name}'"))?;
    println!("{}", serde_json::to_string_pretty(&preset)?);
    Ok(())
}
