use std::{path::PathBuf, time::Duration};

use crate::error::ConfigError;
use crate::fruit::SpawnPolicy;
use crate::grid::GridBounds;

pub const SCREEN_WIDTH: u32 = 640;
pub const SCREEN_HEIGHT: u32 = 480;
pub const CELL_SIZE: u32 = 20;
pub const FPS: u32 = 10;
pub const HIGH_SCORE_FILE: &str = "highscore.txt";
pub const FRUIT_FILE: &str = "fruits.txt";

// The start snake reaches x = 5, y = 5
const MIN_GRID_CELLS: i32 = 6;

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub cell_size: u32,
    pub fps: u32,
    pub high_score_file: PathBuf,
    pub fruit_file: PathBuf,
    pub spawn_policy: SpawnPolicy,
    pub seed: Option<u64>,
    pub mute: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            cell_size: CELL_SIZE,
            fps: FPS,
            high_score_file: PathBuf::from(HIGH_SCORE_FILE),
            fruit_file: PathBuf::from(FRUIT_FILE),
            spawn_policy: SpawnPolicy::default(),
            seed: None,
            mute: false,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("width", self.screen_width),
            ("height", self.screen_height),
            ("cell size", self.cell_size),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { name });
            }
        }

        for (name, value) in [("width", self.screen_width), ("height", self.screen_height)] {
            if value % self.cell_size != 0 {
                return Err(ConfigError::NotAligned { name, value, cell_size: self.cell_size });
            }
        }

        let bounds = self.bounds();
        if bounds.width < MIN_GRID_CELLS || bounds.height < MIN_GRID_CELLS {
            return Err(ConfigError::GridTooSmall {
                width: bounds.width,
                height: bounds.height,
                min: MIN_GRID_CELLS,
            });
        }

        if !(1..=120).contains(&self.fps) {
            return Err(ConfigError::TickRate(self.fps));
        }
        Ok(())
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::from_pixels(self.screen_width, self.screen_height, self.cell_size)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}
