use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use circuit_router::{maze, Coordinator, RouterConfig};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

/// Routes every request in a maze file and prints the committed paths.
///
/// This is a convenience entry point for manual testing and
/// benchmarking against the library; it does not reimplement the
/// long-lived supervisory shell (pipe protocol, child-process
/// spawning) that a production deployment of this router would sit
/// behind.
#[derive(Debug, StructOpt)]
struct Opt {
    /// Maze description file (`d`/`w`/`p` grammar).
    file: PathBuf,

    /// Worker thread count. Defaults to the host's hardware thread
    /// count; pass 1 to route sequentially.
    #[structopt(short = "t", long)]
    threads: Option<usize>,

    #[structopt(short, long, default_value = "1")]
    x_cost: u32,
    #[structopt(short, long, default_value = "1")]
    y_cost: u32,
    #[structopt(short, long, default_value = "2")]
    z_cost: u32,
    #[structopt(short, long, default_value = "1")]
    bend_cost: u32,

    /// Optional TOML file overriding the cost model and thread count.
    #[structopt(short, long)]
    config: Option<PathBuf>,
}

fn load_config(opt: &Opt) -> Result<RouterConfig> {
    let mut config = RouterConfig {
        x_cost: opt.x_cost,
        y_cost: opt.y_cost,
        z_cost: opt.z_cost,
        bend_cost: opt.bend_cost,
        ..RouterConfig::with_host_threads()
    };
    if let Some(threads) = opt.threads {
        config.threads = threads;
    }
    if let Some(path) = &opt.config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        config = toml::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opt = Opt::from_args();
    let config = load_config(&opt)?;

    let maze = maze::load_file(&opt.file)
        .with_context(|| format!("failed to load maze {}", opt.file.display()))?;

    let coordinator = Coordinator::new(maze.grid, maze.queue, config);
    let (grid, paths) = coordinator.run();

    println!("committed {} path(s)", paths.len());
    for path in &paths {
        let coords: Vec<String> = path
            .cells()
            .iter()
            .map(|&idx| {
                let (x, y, z) = grid.indices_of(idx);
                format!("({x},{y},{z})")
            })
            .collect();
        println!("{}", coords.join(" -> "));
    }

    Ok(())
}
