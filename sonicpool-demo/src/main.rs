mod scenarios;

use anyhow::Result;
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// Short sounds flooding a row of loops
    Crowd,
    /// A loud source passing a full pool
    Flyby,
}

#[derive(Parser)]
#[command(name = "sonicpool-demo")]
#[command(about = "Headless voice allocation scenarios on a virtual device")]
struct Args {
    /// Number of device channels
    #[arg(short, long, default_value_t = 16)]
    channels: usize,

    /// Number of update frames to simulate
    #[arg(short, long, default_value_t = 120)]
    frames: u32,

    /// Scenario to run; runs all of them when omitted
    #[arg(short, long, value_enum)]
    scenario: Option<Scenario>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    match args.scenario {
        Some(Scenario::Crowd) => scenarios::crowd(args.channels, args.frames),
        Some(Scenario::Flyby) => scenarios::flyby(args.channels, args.frames),
        None => {
            log::info!("=== Running Crowd Scenario ===");
            scenarios::crowd(args.channels, args.frames)?;

            log::info!("\n=== Running Flyby Scenario ===");
            scenarios::flyby(args.channels, args.frames)
        }
    }
}
