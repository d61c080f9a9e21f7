use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use formation_swarm::{swarm, CameraParams, SwarmError, SwarmParams};
use std::io;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Particle swarm morphing between a grid, a sphere and a heart
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Number of physics frames to run in headless mode
  #[arg(short, long, default_value_t = 1800)]
  frames: u64,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

fn headless(frames: u64) -> Result<(), SwarmError> {
  let stop = Arc::new(AtomicBool::new(false));
  let handler_stop = Arc::clone(&stop);
  ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed))?;

  let report = swarm::run_headless(&SwarmParams::default(), frames, &stop)?;
  log::info!(
    "ran {} frames, {} transitions, ending on formation {} (mean error {:.4})",
    report.frames,
    report.transitions,
    report.active_formation,
    report.mean_error
  );
  Ok(())
}

fn main() -> ExitCode {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return ExitCode::SUCCESS;
  }

  env_logger::init();
  let result = if args.headless {
    headless(args.frames)
  } else {
    formation_swarm::state::run(SwarmParams::default(), CameraParams::default())
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!("{e}");
      ExitCode::FAILURE
    }
  }
}
