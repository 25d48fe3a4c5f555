/// Entry point: load config, pick a trace, let the agent play it.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::AgentConfig;
use error::Result;
use sim::replay::{builtin_trace, load_trace, ReplayEnvironment};
use sim::runner::{write_results, Expert, RunSummary};
use ui::viewer::Viewer;

#[derive(Parser, Debug)]
#[command(name = "reflexrunner", version, about = "Reactive tile-grid agent for side-scrolling platformers")]
struct Cli {
    /// Config file (default: config.toml next to the binary or in the CWD)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Trace to replay instead of the built-in demo
    #[arg(long, value_name = "PATH")]
    trace: Option<PathBuf>,

    /// Run without the terminal viewer
    #[arg(long)]
    headless: bool,

    /// Directory for results.json
    #[arg(long, value_name = "DIR")]
    results: Option<PathBuf>,

    /// Stop after this many ticks (0 = whole trace)
    #[arg(long, value_name = "N")]
    max_ticks: Option<u64>,

    /// Ticks advanced after each press
    #[arg(long, value_name = "N")]
    act_freq: Option<u32>,
}

impl Cli {
    fn apply(&self, config: &mut AgentConfig) {
        if let Some(trace) = &self.trace {
            config.trace = Some(trace.clone());
        }
        if self.headless {
            config.headless = true;
        }
        if let Some(dir) = &self.results {
            config.results_dir = dir.clone();
        }
        if let Some(n) = self.max_ticks {
            config.max_ticks = n;
        }
        if let Some(n) = self.act_freq {
            config.act_freq = n;
        }
    }
}

fn init_tracing(headless: bool) {
    // The viewer owns the screen, so only warnings by default while it runs.
    let fallback = if headless { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.headless);

    let mut config = match &cli.config {
        Some(path) => AgentConfig::load_from(path),
        None => AgentConfig::load(),
    };
    cli.apply(&mut config);

    match run(&config) {
        Ok(summary) => {
            println!();
            println!("Reflex Runner finished: {}", summary.final_state.source);
            println!(
                "Steps: {}  Ticks: {}  Presses: {}",
                summary.stats.steps, summary.stats.ticks, summary.stats.presses
            );
            for (rule, count) in &summary.stats.rules {
                println!("  {rule:<14} {count}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AgentConfig) -> Result<RunSummary> {
    let trace = match &config.trace {
        Some(path) => load_trace(path)?,
        None => builtin_trace()?,
    };
    info!(trace = trace.name(), frames = trace.frame_count(), "trace loaded");

    let mut env = ReplayEnvironment::new(trace, config.replay());
    if !config.headless {
        let mut viewer = Viewer::new();
        viewer.init()?;
        env.attach_viewer(viewer);
    }

    let mut expert = Expert::new(env, config.scheduler());
    let result = expert.play();

    if let Some(mut viewer) = expert.env_mut().detach_viewer() {
        if let Err(e) = viewer.cleanup() {
            error!(error = %e, "terminal cleanup failed");
        }
    }

    let summary = result?;
    let path = write_results(&config.results_dir, &summary)?;
    println!("Results written to {}", path.display());
    Ok(summary)
}
