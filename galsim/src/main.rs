use galsim::{bench_executors, run_viewer};
use galsim::{Engine, Scenario, ScenarioConfig};

use anyhow::{Context, Result};
use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Real-time gravitational N-body galaxy simulator")]
struct Args {
    /// Scenario file, looked up under `scenarios/` unless it is an existing path
    #[arg(short, default_value = "default.yaml")]
    file_name: String,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Frames to simulate in headless mode
    #[arg(long, default_value_t = 500)]
    frames: u64,

    /// Headless progress log interval, in frames
    #[arg(long, default_value_t = 50)]
    log_every: u64,

    /// Time the round executors and exit
    #[arg(long)]
    bench: bool,
}

fn scenario_path(file_name: &str) -> PathBuf {
    let direct = PathBuf::from(file_name);
    if direct.is_file() {
        return direct;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

// load here to keep main clean
fn load_scenario(file_name: &str) -> Result<Scenario> {
    let path = scenario_path(file_name);
    let cfg = ScenarioConfig::from_path(&path)
        .with_context(|| format!("loading scenario {}", path.display()))?;
    Ok(Scenario::build_scenario(cfg)?)
}

fn run_headless(mut engine: Engine, frames: u64, log_every: u64) -> Result<()> {
    let (mut pruned, mut merges) = (0, 0);

    for _ in 0..frames {
        let report = engine.step()?;
        pruned += report.pruned;
        merges += report.merges;

        if log_every > 0 && report.frame % log_every == 0 {
            let d = engine.diagnostics();
            log::info!(
                "frame {}: {} stars, mass {:.3}, momentum ({:.4}, {:.4}), com ({:.2}, {:.2})",
                report.frame,
                d.count,
                d.total_mass,
                d.momentum.x,
                d.momentum.y,
                d.center_of_mass.x,
                d.center_of_mass.y
            );
        }
    }

    log::info!(
        "finished {} frames: {} stars left, {merges} merges, {pruned} pruned",
        engine.frame(),
        engine.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The viewer installs bevy's log subscriber; everything else logs here
    if args.headless || args.bench {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let scenario = load_scenario(&args.file_name)?;

    if args.bench {
        bench_executors(scenario.workers)?;
        return Ok(());
    }

    let view = scenario.view.clone();
    let engine = scenario.into_engine().context("starting simulation engine")?;

    if args.headless {
        run_headless(engine, args.frames, args.log_every)
    } else {
        run_viewer(engine, view);
        Ok(())
    }
}
