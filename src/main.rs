mod game;
mod segments;
mod snake;
mod state;
mod term;

use std::{fs::File, time::{SystemTime, UNIX_EPOCH}};

use anyhow::{Context, Result};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use simplelog::{Config, LevelFilter, WriteLogger};

// stdout belongs to the game screen, so logs go to a file
const LOG_FILE: &str = "snake.log";

fn main() -> Result<()> {
    let log_file = File::create(LOG_FILE).with_context(|| format!("failed to create {}", LOG_FILE))?;
    WriteLogger::init(LevelFilter::Info, Config::default(), log_file)
        .context("failed to initialise logging")?;

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    info!("starting, rng seed {}", seed);

    let mut game = game::SnakeGame::new(StdRng::seed_from_u64(seed));
    let score = game.run()?;

    println!("Game Over! Final Score: {}", score);
    Ok(())
}
