//! Slatelab CLI — batch simulation, single lineup builds and the strategy catalogue.
//!
//! Commands:
//! - `run`: execute a batch from a TOML config (or defaults) and write the JSON report
//! - `build`: build one lineup for a synthetic slate and print it
//! - `strategies`: list the preset strategies

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use slatelab_core::builder::{BuildOutcome, ExactSolver, LineupBuilder};
use slatelab_core::domain::{ContestFormat, LineupSummary, RosterSpec};
use slatelab_core::slate::{SlateGenerator, SlateSize};
use slatelab_core::strategy::Strategy;
use slatelab_runner::{run_batch, BatchConfig, BatchProgress, BatchReport, RankingMetric};

#[derive(Parser)]
#[command(
    name = "slatelab",
    about = "Slatelab CLI — DFS lineup strategy simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch simulation and write the aggregate report.
    Run {
        /// Path to a TOML batch config. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where to write the JSON report.
        #[arg(long, default_value = "results/slatelab-report.json")]
        output: PathBuf,

        /// Also write a Markdown leaderboard here.
        #[arg(long)]
        markdown: Option<PathBuf>,

        /// Override the worker thread count (0 = all cores).
        #[arg(long)]
        threads: Option<usize>,

        /// Override the master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Ranking metric: mean_roi, median_roi, win_rate, p10_roi, cash_rate.
        #[arg(long, default_value = "mean_roi")]
        rank_by: RankingMetric,

        /// Rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Build one lineup for a synthetic slate.
    Build {
        /// Preset strategy name.
        #[arg(long, default_value = "projection_monster")]
        strategy: String,

        /// classic or showdown.
        #[arg(long, default_value = "classic")]
        format: ContestFormat,

        /// small, medium or large.
        #[arg(long, default_value = "medium")]
        size: SlateSize,

        #[arg(long, default_value_t = 0)]
        slate_id: u64,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Wall-clock budget for the exact solver.
        #[arg(long, default_value_t = 250)]
        time_limit_ms: u64,

        /// Print the lineup as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the preset strategies.
    Strategies {
        /// Print full definitions as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            markdown,
            threads,
            seed,
            rank_by,
            top,
        } => run_batch_cmd(config, output, markdown, threads, seed, rank_by, top),
        Commands::Build {
            strategy,
            format,
            size,
            slate_id,
            seed,
            time_limit_ms,
            json,
        } => run_build(&strategy, format, size, slate_id, seed, time_limit_ms, json),
        Commands::Strategies { json } => run_strategies(json),
    }
}

/// Log to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_batch_cmd(
    config_path: Option<PathBuf>,
    output: PathBuf,
    markdown: Option<PathBuf>,
    threads: Option<usize>,
    seed: Option<u64>,
    rank_by: RankingMetric,
    top: usize,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => BatchConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BatchConfig::default(),
    };
    if let Some(t) = threads {
        config.threads = t;
    }
    if let Some(s) = seed {
        config.master_seed = s;
    }

    let progress = |p: &BatchProgress| {
        info!(
            finished = p.finished,
            total = p.total,
            config = %p.key,
            state = %p.state,
            samples = p.successes,
            attempts = p.attempts,
            "configuration done"
        );
    };
    let report = run_batch(&config, Some(&progress)).context("batch run failed")?;

    print_leaderboard(&report, rank_by, top);

    report.write_json(&output)?;
    println!("Report saved to: {}", output.display());

    if let Some(md_path) = markdown {
        std::fs::write(&md_path, report.to_markdown(rank_by, top))
            .with_context(|| format!("failed to write {}", md_path.display()))?;
        println!("Markdown saved to: {}", md_path.display());
    }
    Ok(())
}

fn print_leaderboard(report: &BatchReport, metric: RankingMetric, top: usize) {
    println!();
    println!(
        "{} configurations in {:.1}s (seed {})",
        report.entries.len(),
        report.elapsed_secs,
        report.master_seed
    );
    for (state, n) in report.state_counts() {
        println!("  {state:<26} {n}");
    }
    println!();
    println!("Top {top} by {metric}:");
    println!(
        "  {:<4} {:<48} {:>9} {:>9} {:>9} {:>7} {:>8}",
        "#", "configuration", "mean ROI", "med ROI", "p10 ROI", "win %", "samples"
    );
    for (i, e) in report.ranked(metric).into_iter().take(top).enumerate() {
        let s = &e.summary;
        println!(
            "  {:<4} {:<48} {:>8.1}% {:>8.1}% {:>8.1}% {:>6.1}% {:>4}/{:<3}",
            i + 1,
            e.key.label(),
            s.roi.mean,
            s.roi.p50,
            s.roi.p10,
            s.win_rate * 100.0,
            s.successes,
            s.attempts
        );
    }
    println!();
}

fn run_build(
    strategy_name: &str,
    format: ContestFormat,
    size: SlateSize,
    slate_id: u64,
    seed: u64,
    time_limit_ms: u64,
    json: bool,
) -> Result<()> {
    let Some(strategy) = Strategy::preset(strategy_name) else {
        bail!(
            "unknown strategy '{strategy_name}'. Valid: {}",
            Strategy::PRESET_NAMES.join(", ")
        );
    };
    let slate = SlateGenerator::new(seed)
        .generate(slate_id, format, size)
        .context("failed to generate slate")?;
    let spec = RosterSpec::for_format(format);
    let builder = LineupBuilder::new(ExactSolver {
        time_limit: Duration::from_millis(time_limit_ms),
        ..ExactSolver::default()
    });

    match builder.build(&slate.pool, &spec, &strategy) {
        BuildOutcome::Built(lineup) => {
            let summary = lineup.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} slate #{slate_id} ({} games, {} players), strategy {}",
                    format,
                    slate.games.len(),
                    slate.pool.len(),
                    strategy.name
                );
                print_lineup(&summary);
            }
            Ok(())
        }
        BuildOutcome::Infeasible(reason) => bail!("no lineup: {reason}"),
    }
}

fn print_lineup(summary: &LineupSummary) {
    println!(
        "  {:<6} {:<24} {:<5} {:<8} {:>7} {:>7}",
        "slot", "player", "team", "pos", "salary", "proj"
    );
    for row in &summary.players {
        println!(
            "  {:<6} {:<24} {:<5} {:<8} {:>7} {:>7.2}",
            row.slot, row.name, row.team, row.positions, row.salary, row.projection
        );
    }
    println!(
        "  salary ${}  projection {:.2}  avg own {:.1}%  max stack {}",
        summary.total_salary, summary.total_projection, summary.average_ownership, summary.max_stack
    );
}

fn run_strategies(json: bool) -> Result<()> {
    let presets = Strategy::presets();
    if json {
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(());
    }
    for s in &presets {
        let mut notes = Vec::new();
        if let Some(req) = s.overlay.stack() {
            let kind = if req.consecutive { " consecutive" } else { "" };
            notes.push(format!("{}-stack{kind}", req.size));
        }
        if let Some(floor) = s.overlay.ownership_floor {
            notes.push(format!("own >= {floor}%"));
        }
        if let Some(ceil) = s.overlay.ownership_ceiling {
            notes.push(format!("own <= {ceil}%"));
        }
        if let Some(total) = s.overlay.min_game_total {
            notes.push(format!("game total >= {total}"));
        }
        println!(
            "  {:<24} {:<12} {}",
            s.name,
            s.metric.label(),
            notes.join(", ")
        );
    }
    Ok(())
}
