mod config;
mod error;
mod fruit;
mod game;
mod grid;
mod score;
mod session;
mod snake;
mod term;

use std::{fs::File, path::{Path, PathBuf}, sync::Mutex};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::GameConfig;
use crate::fruit::{FruitCatalog, FruitSpawner, SpawnPolicy};
use crate::game::FixedRateTicker;
use crate::score::FileScoreStore;
use crate::session::Session;
use crate::term::TermPresenter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SpawnArg {
    /// Any cell, fruit may hide under the snake
    Anywhere,
    /// Only cells the snake does not cover
    AvoidSnake,
}

impl From<SpawnArg> for SpawnPolicy {
    fn from(arg: SpawnArg) -> Self {
        match arg {
            SpawnArg::Anywhere => SpawnPolicy::Anywhere,
            SpawnArg::AvoidSnake => SpawnPolicy::AvoidSnake,
        }
    }
}

#[derive(Parser)]
#[command(name = "fruit-snake")]
#[command(about = "Eat fruit, grow, and beat the high score")]
struct Args {
    /// Board width in pixels
    #[arg(long, default_value_t = config::SCREEN_WIDTH)]
    width: u32,

    /// Board height in pixels
    #[arg(long, default_value_t = config::SCREEN_HEIGHT)]
    height: u32,

    /// Pixels per grid cell
    #[arg(long, default_value_t = config::CELL_SIZE)]
    cell_size: u32,

    /// Simulation ticks per second
    #[arg(long, default_value_t = config::FPS)]
    fps: u32,

    /// File holding the high score
    #[arg(long, default_value = config::HIGH_SCORE_FILE)]
    high_score_file: PathBuf,

    /// File listing fruit names, one per line
    #[arg(long, default_value = config::FRUIT_FILE)]
    fruit_file: PathBuf,

    /// Where new fruit may appear
    #[arg(long, value_enum, default_value_t = SpawnArg::Anywhere)]
    spawn: SpawnArg,

    /// Seed for fruit placement, random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Do not ring the terminal bell
    #[arg(long)]
    mute: bool,

    /// Log output, the terminal itself is busy drawing the game
    #[arg(long, default_value = "snake.log")]
    log_file: PathBuf,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            screen_width: self.width,
            screen_height: self.height,
            cell_size: self.cell_size,
            fps: self.fps,
            high_score_file: self.high_score_file.clone(),
            fruit_file: self.fruit_file.clone(),
            spawn_policy: self.spawn.into(),
            seed: self.seed,
            mute: self.mute,
        }
    }
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let config = args.game_config();
    config.validate().context("invalid settings")?;
    let bounds = config.bounds();
    info!(?bounds, fps = config.fps, seed = ?config.seed, "starting");

    let catalog = FruitCatalog::load(&config.fruit_file).context("cannot load fruit catalog")?;
    let store = FileScoreStore::new(&config.high_score_file);
    info!(path = %store.path().display(), fruits = catalog.len(), "storage ready");
    let spawner = FruitSpawner::new(bounds, config.spawn_policy, config.seed);
    let mut session = Session::new(bounds, store, catalog, spawner).context("cannot load high score")?;

    let mut presenter = TermPresenter::open(bounds, config.mute)?;
    let mut ticker = FixedRateTicker::new(config.tick_period());
    let result = game::run(&mut session, &mut presenter, &mut ticker);
    // Hand the terminal back before any error gets printed
    drop(presenter);

    result.map(|_| ())
}
