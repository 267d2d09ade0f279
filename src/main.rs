use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::info;
use tokio::io::AsyncReadExt;

mod aggregate;
mod bridge;
mod config;
mod errors;
mod loader;
mod models;
mod normalize;
mod render;
mod report;
mod scale;
mod scene;
mod state;
mod surface;
mod variant;

use config::VizConfig;
use loader::DataSource;
use state::{AppState, LoadStatus};
use variant::Variant;

#[derive(Parser)]
#[command(name = "screen-scenes")]
#[command(about = "Guided chart scenes about screen time, wellbeing and emissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Dataset schema and presentation to use
    #[arg(long, value_enum, default_value_t = Variant::DigitalDiet)]
    variant: Variant,
    /// CSV path or http(s) URL
    #[arg(long)]
    data: String,
    /// JSON file overriding surface size and margins
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk every scene in order and write one SVG per scene
    Render {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, default_value = "scenes")]
        out_dir: PathBuf,
    },
    /// Replay a script of UI events and write the resulting surface
    Play {
        #[command(flatten)]
        source: SourceArgs,
        /// Script file, or `-` for stdin
        #[arg(long)]
        script: String,
        #[arg(long, default_value = "scene.svg")]
        out: PathBuf,
        /// Also write one SVG per surface change into this directory
        #[arg(long)]
        frames: Option<PathBuf>,
    },
    /// Report kept and dropped rows and the binned aggregates
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    colog::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { source, out_dir } => {
            let mut state = open_session(&source).await?;
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("could not create {}", out_dir.display()))?;

            loop {
                let path = out_dir.join(format!("scene-{}.svg", state.scene()));
                write_svg(&path, &state)?;
                if state.status() != LoadStatus::Ready || !state.advance_scene()? {
                    break;
                }
            }
            println!(
                "Wrote {} scene(s) to {} from {} records ({} dropped).",
                state.scene(),
                out_dir.display(),
                state.dataset().len(),
                state.dropped()
            );
        }
        Commands::Play {
            source,
            script,
            out,
            frames,
        } => {
            let mut state = open_session(&source).await?;
            let script = read_script(&script).await?;

            let mut snapshots = vec![state.surface().to_svg()];
            let rejected = bridge::run_script(&mut state, &script, |s| {
                snapshots.push(s.surface().to_svg())
            });

            if let Some(dir) = frames {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("could not create {}", dir.display()))?;
                for (index, svg) in snapshots.iter().enumerate() {
                    let path = dir.join(format!("frame-{index:03}.svg"));
                    std::fs::write(&path, svg)
                        .with_context(|| format!("could not write {}", path.display()))?;
                }
            }
            write_svg(&out, &state)?;

            let controls = state.controls();
            println!(
                "Scene {}/{} written to {} ({} surface changes, {} rejected events).",
                state.scene(),
                state.max_scene(),
                out.display(),
                snapshots.len() - 1,
                rejected.len()
            );
            if controls.metric_picker_visible {
                if let Some(metric) = state.selection().metric {
                    println!("Metric: {metric}");
                }
            }
            if controls.explore_visible {
                println!("Country: {}", state.selection().country);
                if let Some(slider) = controls.year_slider {
                    println!("Years: {}–{} (showing up to {})", slider.min, slider.max, slider.value);
                }
            }
        }
        Commands::Summary { source, out, json } => {
            let data = DataSource::parse(&source.data);
            let rows = loader::load(&data, source.variant)
                .await
                .with_context(|| format!("failed to load {data}"))?;
            let normalized = normalize::normalize(source.variant, &rows);
            let summary = report::summarize(source.variant, &data.to_string(), &normalized);

            let text = if json {
                serde_json::to_string_pretty(&summary)?
            } else {
                report::build_report(&summary, &normalized.records)
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    println!("Summary written to {}.", path.display());
                }
                None => print!("{text}"),
            }
        }
    }

    Ok(())
}

/// Builds the session and runs the single load; a failed load still yields a session.
async fn open_session(args: &SourceArgs) -> anyhow::Result<AppState> {
    let config = match &args.config {
        Some(path) => VizConfig::from_file(path)?,
        None => VizConfig::default(),
    };
    let source = DataSource::parse(&args.data);
    let mut state = AppState::new(args.variant, config);

    match loader::load(&source, args.variant).await {
        Ok(rows) => {
            info!("Fetched {} rows from {source}", rows.len());
            state.load_complete(normalize::normalize(args.variant, &rows));
        }
        Err(err) => state.load_failed(&err),
    }
    Ok(state)
}

async fn read_script(script: &str) -> anyhow::Result<String> {
    if script == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("could not read script from stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(script)
            .await
            .with_context(|| format!("could not read script {script}"))
    }
}

fn write_svg(path: &Path, state: &AppState) -> anyhow::Result<()> {
    std::fs::write(path, state.surface().to_svg())
        .with_context(|| format!("could not write {}", path.display()))
}
