//! FSD Edit CLI - inspect, normalise and export diagram files

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use log::{debug, error, info, LevelFilter};

use fsdedit::{dot, layered, load_config, persist, Diagram, DiagramResult};

/// Command-line arguments for the diagram tool
#[derive(Parser, Debug)]
#[command(name = "fsdedit-cli", author, version, about, long_about = None)]
struct Args {
    /// Path to the input diagram file (JSON)
    #[arg(help = "Path to the input .fsd file")]
    input: PathBuf,

    /// Write a Graphviz DOT export here
    #[arg(short, long)]
    dot: Option<PathBuf>,

    /// Re-save the diagram in canonical form here
    #[arg(short, long)]
    normalize: Option<PathBuf>,

    /// Print the preview layout (rank and position of each state)
    #[arg(short, long)]
    layout: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!("Parsed arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("❌ {}: {}", args.input.display(), e);
        process::exit(1);
    }
}

fn run(args: &Args) -> DiagramResult<()> {
    let diagram = persist::load_file(&args.input)?;
    print_summary(&diagram);

    if args.layout {
        let config = load_config(args.config.as_ref())?;
        let preview = layered(&diagram, &config.layout);
        println!();
        println!("  Layout ({:?}, {:.0}x{:.0}):", config.layout.direction, preview.size.x, preview.size.y);
        for node in &preview.nodes {
            let c = node.rect.center();
            println!("    rank {:>2}  {:<16} ({:.1}, {:.1})", node.rank, node.id, c.x, c.y);
        }
    }

    if let Some(path) = &args.dot {
        dot::export_file(&diagram, path)?;
        println!("✅ DOT written to {}", path.display());
    }
    if let Some(path) = &args.normalize {
        persist::save_file(&diagram, path)?;
        println!("✅ Diagram written to {}", path.display());
    }

    info!("Completed successfully");
    Ok(())
}

fn print_summary(diagram: &Diagram) {
    let id_of = |key| diagram.state(key).map(|s| s.id()).unwrap_or("?");

    println!("  States: {}", diagram.state_count());
    for (_, state) in diagram.states() {
        let p = state.position();
        let kind = if state.is_pseudo() { " (initial pseudo-state)" } else { "" };
        println!("    - {} at ({:.1}, {:.1}){}", state.id(), p.x, p.y, kind);
    }

    println!("  Transitions: {}", diagram.transition_count());
    for (_, t) in diagram.transitions() {
        let mut line = format!("    {} --> {}", id_of(t.source()), id_of(t.destination()));
        if !t.label().is_empty() {
            line.push_str(&format!(" : {}", t.label()));
        }
        if t.is_self_loop() {
            line.push_str(&format!(" [{:?}]", t.location()));
        }
        println!("{}", line);
    }

    match diagram.initial_state() {
        Some(initial) => println!("  Initial State: {}", id_of(initial)),
        None => println!("  Initial State: <none>"),
    }
}
