use pdsim::{load_init, save_animation, DEFAULT_TIME_STEP};
use pdsim::{bench_collision, bench_derivative, bench_solver_curve};

use anyhow::{Context, Result};
use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario snapshot to simulate
    #[arg(short, default_value = "scenarios/bouncing_pair.json")]
    file_name: PathBuf,

    /// Fixed per-frame step size
    #[arg(long, default_value_t = DEFAULT_TIME_STEP)]
    dt: f64,

    /// Write the run as an animation trace into this directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Run the throughput probes instead of a simulation
    #[arg(long)]
    bench: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.bench {
        bench_derivative();
        bench_collision();
        bench_solver_curve();
        return Ok(());
    }

    let mut system = load_init(&args.file_name)
        .with_context(|| format!("loading scenario {}", args.file_name.display()))?;
    log::info!(
        "loaded scenario: {} particles, frames {}..{}",
        system.particle_count(),
        system.frame_start,
        system.frame_end
    );

    let frames = system.run_frames(args.dt);
    log::info!("run complete: {} frames", frames.len());

    if let Some(dir) = &args.out {
        save_animation(dir, &system, &frames)
            .with_context(|| format!("saving animation trace to {}", dir.display()))?;
    } else if let Some(last) = frames.last() {
        // No trace requested: print where everything ended up
        for (i, location) in last.iter().enumerate() {
            println!("{i}: [{:.6}, {:.6}, {:.6}]", location.x, location.y, location.z);
        }
    }

    Ok(())
}
