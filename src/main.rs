use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use opening_explorer::config::Config;
use opening_explorer::explore::{LogProgress, NoProgress, NodeReport};
use opening_explorer::output::write_variations_file;
use opening_explorer::{ExploreParams, Explorer, ProcessEngine, Progress};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about = "Enumerate opening variations with a UCI engine", long_about = None)]
struct Args {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Engine executable (overrides engine-path)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Output file (overrides output-path)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Engine search depth per node (overrides engine-depth)
    #[arg(long)]
    depth: Option<u32>,

    /// Plies to expand past the initial moves (overrides variation-depth)
    #[arg(long)]
    variation_depth: Option<u32>,

    /// Log every line the engine prints
    #[arg(long)]
    print_all: bool,

    /// Show exploration progress
    #[arg(long)]
    progress: bool,
}

/// Spinner on stderr showing how far the exploration has come.
struct SpinnerProgress {
    bar: ProgressBar,
    nodes: u64,
}

impl SpinnerProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}").context("spinner template")?);
        bar.enable_steady_tick(Duration::from_millis(120));
        Ok(Self { bar, nodes: 0 })
    }
}

impl Progress for SpinnerProgress {
    fn node(&mut self, report: &NodeReport<'_>) {
        self.nodes += 1;
        self.bar.set_message(format!("nodes {} | variations {} | {}", self.nodes, report.collected, report.line));
    }

    fn milestone(&mut self, collected: usize) {
        self.bar.println(format!("variations calculated: {collected}"));
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(p) = args.engine { cfg.engine_path = p.display().to_string(); }
    if let Some(p) = args.output { cfg.output_path = p.display().to_string(); }
    if let Some(d) = args.depth { cfg.variation_config.engine_depth = d; }
    if let Some(d) = args.variation_depth { cfg.variation_config.variation_depth = d; }
    cfg.engine_settings.print_all |= args.print_all;
    cfg.engine_settings.print_progress |= args.progress;
    cfg.validate()?;

    let initial = cfg.initial_moves();
    let engine_path = cfg.engine_path();
    let mut engine = ProcessEngine::start(&engine_path, cfg.engine_settings())
        .with_context(|| format!("starting engine {}", engine_path.display()))?;

    eprintln!("Initial Starting Position:");
    engine.print_position(&initial, |l| eprintln!("{l}"))?;

    let v = &cfg.variation_config;
    info!("exploring `{}` (variation depth {}, engine depth {}, white: {})", initial, v.variation_depth, v.engine_depth, v.is_white);
    let mut spinner = None;
    let mut quiet = NoProgress;
    let mut logged = LogProgress;
    let progress: &mut dyn Progress = if !cfg.engine_settings.print_progress {
        &mut quiet
    } else if cfg.engine_settings.print_all {
        // engine echo would tear the spinner apart
        &mut logged
    } else {
        spinner.insert(SpinnerProgress::new()?)
    };

    let start = Instant::now();
    let params = ExploreParams { variation_depth: v.variation_depth, search_depth: v.engine_depth, is_white: v.is_white, progress };
    let result = Explorer::new(&mut engine).explore_with_stats(&initial, params);
    if let Some(s) = &spinner { s.bar.finish_and_clear(); }
    let (variations, stats) = result.context("exploration failed")?;
    info!(
        "{} variations in {:.1}s (nodes {}, transpositions {}, pruned {})",
        variations.len(), start.elapsed().as_secs_f32(), stats.nodes, stats.transpositions, stats.pruned
    );
    engine.quit()?;

    let out = cfg.output_path();
    write_variations_file(&out, &variations).with_context(|| format!("writing {}", out.display()))?;
    info!("wrote {}", out.display());
    Ok(())
}
