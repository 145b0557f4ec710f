//! RIDGELINE — Certify Before You Step
//!
//! Safe exploration of unknown terrain under a hard incline limit,
//! with a certified return path at every step.
//!
//! This is the CLI binary entry point.

use anyhow::Context;
use clap::{Parser, ValueEnum};

use ridgeline::belief::GpConfig;
use ridgeline::config;
use ridgeline::explore::{ExploreConfig, Explorer};
use ridgeline::oracle;
use ridgeline::sweep::{run_sweep, SweepConfig};
use ridgeline::terrain::{synthetic, Terrain};

/// Synthetic terrain families.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum TerrainKind {
    /// Perfectly flat at altitude zero.
    Flat,
    /// Seeded sum of Gaussian bumps.
    Hills,
    /// Flat terrain with the bottom third dropped off a cliff.
    Cliff,
}

/// RIDGELINE exploration CLI.
#[derive(Parser, Debug)]
#[command(
    name = "ridgeline",
    about = "RIDGELINE — safe terrain exploration with certified return paths",
    version
)]
struct Cli {
    /// Terrain family to explore.
    #[arg(long, value_enum, default_value_t = TerrainKind::Hills)]
    terrain: TerrainKind,

    /// Grid rows.
    #[arg(long, default_value_t = 20)]
    rows: usize,

    /// Grid columns.
    #[arg(long, default_value_t = 20)]
    cols: usize,

    /// Sampling budget.
    #[arg(short = 'n', long, default_value_t = config::DEFAULT_BUDGET)]
    budget: usize,

    /// Warm-up samples drawn from the seed region.
    #[arg(long, default_value_t = 4)]
    warm_up: usize,

    /// Confidence multiplier β.
    #[arg(long, default_value_t = config::DEFAULT_BETA)]
    beta: f64,

    /// Maximum traversable incline, in degrees.
    #[arg(long, default_value_t = config::DEFAULT_SAFETY_ANGLE_DEG)]
    angle: f64,

    /// Lipschitz constant of the slope field.
    #[arg(long, default_value_t = config::DEFAULT_LIPSCHITZ)]
    lipschitz: f64,

    /// Start node (row-major index); defaults to the grid centre.
    #[arg(long)]
    start: Option<usize>,

    /// Known-safe radius around the start, in cells.
    #[arg(long, default_value_t = config::DEFAULT_SEED_RADIUS)]
    seed_radius: usize,

    /// GP length scale, in cells.
    #[arg(long, default_value_t = config::DEFAULT_LENGTH_SCALE)]
    length_scale: f64,

    /// Observation noise standard deviation.
    #[arg(long, default_value_t = config::DEFAULT_NOISE_STD)]
    noise: f64,

    /// Physical distance between adjacent cells, in metres.
    #[arg(long, default_value_t = config::DEFAULT_STEP)]
    step: f64,

    /// RNG seed for terrain bumps and observation noise.
    #[arg(long, default_value_t = 42)]
    rng_seed: u64,

    /// Run the full length-scale × noise calibration sweep instead of a
    /// single exploration.
    #[arg(long, default_value_t = false)]
    sweep: bool,

    /// Emit the final report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn build_terrain(cli: &Cli) -> anyhow::Result<Terrain> {
    let terrain = match cli.terrain {
        TerrainKind::Flat => synthetic::flat(cli.rows, cli.cols, 0.0)?,
        TerrainKind::Hills => synthetic::hills(
            cli.rows,
            cli.cols,
            (cli.rows * cli.cols) / 25 + 1,
            1.0,
            (cli.rows.min(cli.cols) as f64 / 4.0).max(1.0),
            cli.rng_seed,
        )?,
        TerrainKind::Cliff => synthetic::cliff(cli.rows, cli.cols, (2 * cli.rows) / 3, 100.0)?,
    };
    Ok(terrain)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    tracing::info!("RIDGELINE v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Grid: {}x{}, terrain: {:?}, budget: {}",
        cli.rows,
        cli.cols,
        cli.terrain,
        cli.budget,
    );

    let start = cli
        .start
        .unwrap_or_else(|| (cli.rows / 2) * cli.cols + cli.cols / 2);
    let explore = ExploreConfig {
        rows: cli.rows,
        cols: cli.cols,
        step_row: cli.step,
        step_col: cli.step,
        safety_angle_deg: cli.angle,
        beta: cli.beta,
        lipschitz: cli.lipschitz,
        start,
        seed_radius: cli.seed_radius,
    };
    let terrain = build_terrain(&cli)?;

    if cli.sweep {
        let sweep = SweepConfig {
            length_scales: config::SWEEP_LENGTH_SCALES.to_vec(),
            noise_levels: config::SWEEP_NOISE_LEVELS.to_vec(),
            signal_variance: config::DEFAULT_SIGNAL_VARIANCE,
            budget: cli.budget,
            warm_up: cli.warm_up,
        };
        let reports = run_sweep(&explore, &terrain, &sweep, cli.rng_seed)
            .context("calibration sweep failed")?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            for r in &reports {
                tracing::info!(
                    "l={:<5} noise={:<5} iters={:<3} certified={:<4} missed={:<4} excess={} {}",
                    r.length_scale,
                    r.noise_std,
                    r.iterations,
                    r.score.certified,
                    r.score.missed,
                    r.score.excess,
                    if r.stalled { "(stalled)" } else { "" },
                );
            }
        }
        return Ok(());
    }

    let gp = GpConfig {
        length_scale: cli.length_scale,
        signal_variance: config::DEFAULT_SIGNAL_VARIANCE,
        noise_std: cli.noise,
    };
    let mut explorer = Explorer::new(explore.clone(), gp, terrain.clone(), cli.rng_seed)
        .context("failed to build explorer")?;
    explorer.warm_up(cli.warm_up)?;
    let trace = explorer.run(cli.budget)?;

    let sets = explorer
        .sets()
        .context("no exploration round completed")?;
    let truth = oracle::true_certified_set(
        explorer.graph(),
        &terrain,
        explore.slope_bound(),
        explorer.seed_nodes(),
    );
    let score = oracle::score(sets, &truth);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "iterations": trace.iterations,
                "stalled": trace.stalled,
                "score": score,
            }))?
        );
    } else {
        tracing::info!(
            "Finished after {} iterations{}",
            trace.iterations.len(),
            if trace.stalled { " (stalled)" } else { "" },
        );
        tracing::info!(
            "Certified {} transitions over {} nodes",
            sets.certified_count(),
            sets.certified_node_count(),
        );
        tracing::info!(
            "Oracle: missed {} safe transitions, {} unsafe certified",
            score.missed,
            score.excess,
        );
    }
    Ok(())
}
