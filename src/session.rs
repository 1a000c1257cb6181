use std::{collections::HashSet, mem};

use tracing::{debug, info};

use crate::error::StorageError;
use crate::fruit::{Fruit, FruitCatalog, FruitSpawner};
use crate::grid::{Cell, Direction, GridBounds};
use crate::score::ScoreStore;
use crate::snake::Snake;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Title,
    Running,
    Paused,
    GameOver,
    Terminated,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Input {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    TogglePause,
    Restart,
    Quit,
    AnyKey,
}

impl Input {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Input::MoveUp => Some(Direction::Up),
            Input::MoveDown => Some(Direction::Down),
            Input::MoveLeft => Some(Direction::Left),
            Input::MoveRight => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Side effects for the presentation layer, e.g. sounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    Eat,
    GameOver,
}

/// Everything a frame needs, detached from the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub state: SessionState,
    pub bounds: GridBounds,
    /// Head first, empty on the title screen.
    pub body: Vec<Cell>,
    pub fruit: Option<Cell>,
    pub fruit_name: Option<String>,
    pub score: u32,
    pub high_score: u32,
}

/// State of one snake life, from start to collision.
#[derive(Clone, Debug)]
pub struct Round {
    pub(crate) snake: Snake,
    pub(crate) fruit: Fruit,
    pub(crate) score: u32,
    // Last movement request since the previous tick
    pub(crate) dir_change: Option<Direction>,
}

enum Phase {
    Title,
    Running(Round),
    Paused(Round),
    GameOver(Round),
    Terminated,
}

enum Transition {
    Start,
    Pause,
    Resume,
    Steer(Direction),
    Quit,
    Ignore,
}

pub struct Session<S: ScoreStore> {
    phase: Phase,
    bounds: GridBounds,
    store: S,
    catalog: FruitCatalog,
    spawner: FruitSpawner,
    high_score: u32,
}

impl<S: ScoreStore> Session<S> {
    /// Opens a session on the title screen. Fails if the high score cannot be read.
    pub fn new(
        bounds: GridBounds,
        mut store: S,
        catalog: FruitCatalog,
        spawner: FruitSpawner,
    ) -> Result<Self, StorageError> {
        let high_score = store.load()?;
        info!(high_score, "session ready");
        Ok(Session { phase: Phase::Title, bounds, store, catalog, spawner, high_score })
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Title => SessionState::Title,
            Phase::Running(_) => SessionState::Running,
            Phase::Paused(_) => SessionState::Paused,
            Phase::GameOver(_) => SessionState::GameOver,
            Phase::Terminated => SessionState::Terminated,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated)
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    fn round(&self) -> Option<&Round> {
        match &self.phase {
            Phase::Running(round) | Phase::Paused(round) | Phase::GameOver(round) => Some(round),
            Phase::Title | Phase::Terminated => None,
        }
    }

    pub fn score(&self) -> u32 {
        self.round().map_or(0, |round| round.score)
    }

    #[cfg(test)]
    pub fn snake(&self) -> Option<&Snake> {
        self.round().map(|round| &round.snake)
    }

    #[cfg(test)]
    pub fn fruit(&self) -> Option<Fruit> {
        self.round().map(|round| round.fruit)
    }

    pub fn snapshot(&self) -> Snapshot {
        let round = self.round();
        Snapshot {
            state: self.state(),
            bounds: self.bounds,
            body: round.map(|r| r.snake.body().iter().copied().collect()).unwrap_or_default(),
            fruit: round.map(|r| r.fruit.cell),
            fruit_name: round.map(|r| self.catalog.name(r.fruit.kind).to_string()),
            score: self.score(),
            high_score: self.high_score,
        }
    }

    /// Applies one input event according to the current state.
    pub fn handle_input(&mut self, input: Input) -> Result<(), StorageError> {
        let transition = match (&self.phase, input) {
            (Phase::Terminated, _) => Transition::Ignore,
            (_, Input::Quit) => Transition::Quit,

            (Phase::Title, _) => Transition::Start,

            (Phase::Running(_), Input::TogglePause) => Transition::Pause,
            (Phase::Running(_), Input::Restart) => Transition::Start,
            (Phase::Running(_), other) => match other.direction() {
                Some(dir) => Transition::Steer(dir),
                None => Transition::Ignore,
            },

            (Phase::Paused(_), Input::TogglePause) => Transition::Resume,
            (Phase::Paused(_), Input::Restart) => Transition::Start,
            (Phase::Paused(_), _) => Transition::Ignore,

            (Phase::GameOver(_), Input::Restart) => Transition::Start,
            (Phase::GameOver(_), _) => Transition::Ignore,
        };

        match transition {
            Transition::Start => self.start_round()?,
            Transition::Pause => {
                self.phase = match self.take_phase() {
                    Phase::Running(mut round) => {
                        round.dir_change = None;
                        Phase::Paused(round)
                    }
                    other => other,
                };
                debug!("paused");
            }
            Transition::Resume => {
                self.phase = match self.take_phase() {
                    Phase::Paused(round) => Phase::Running(round),
                    other => other,
                };
                debug!("resumed");
            }
            Transition::Steer(dir) => {
                if let Phase::Running(round) = &mut self.phase {
                    round.dir_change = Some(dir);
                }
            }
            Transition::Quit => {
                info!(state = ?self.state(), "quitting");
                self.phase = Phase::Terminated;
            }
            Transition::Ignore => {}
        }
        Ok(())
    }

    /// Advances the simulation by one step. Does nothing outside `Running`.
    pub fn tick(&mut self) -> Result<Vec<Signal>, StorageError> {
        let round = match &mut self.phase {
            Phase::Running(round) => round,
            _ => return Ok(vec![]),
        };
        let mut signals = Vec::new();

        if let Some(dir) = round.dir_change.take() {
            debug!(from = ?round.snake.direction(), to = ?dir, "turn requested");
            round.snake.change_direction(dir);
        }
        round.snake.move_step();

        if round.snake.head() == round.fruit.cell {
            round.snake.grow();
            let occupied: HashSet<Cell> = round.snake.body().iter().copied().collect();
            round.fruit = self.spawner.spawn(&occupied, &self.catalog);
            round.score += 1;
            debug!(score = round.score, fruit = ?round.fruit.cell, "ate fruit");
            signals.push(Signal::Eat);
        }

        if round.snake.wall_collision(self.bounds) || round.snake.self_collision() {
            let score = round.score;
            debug!(head = ?round.snake.head(), length = round.snake.len(), "collision");
            signals.push(Signal::GameOver);
            // A failed save is fatal, this tick's signals are dropped with it
            self.end_round(score)?;
        }
        Ok(signals)
    }

    fn start_round(&mut self) -> Result<(), StorageError> {
        self.high_score = self.store.load()?;
        let snake = Snake::new();
        let occupied: HashSet<Cell> = snake.body().iter().copied().collect();
        let fruit = self.spawner.spawn(&occupied, &self.catalog);
        info!(high_score = self.high_score, policy = ?self.spawner.policy(), "round started");
        self.phase = Phase::Running(Round { snake, fruit, score: 0, dir_change: None });
        Ok(())
    }

    fn end_round(&mut self, score: u32) -> Result<(), StorageError> {
        self.phase = match self.take_phase() {
            Phase::Running(round) => Phase::GameOver(round),
            other => other,
        };
        info!(score, high_score = self.high_score, "game over");

        if score > self.high_score {
            self.store.save(score)?;
            self.high_score = score;
            info!(score, "new high score saved");
        }
        Ok(())
    }

    fn take_phase(&mut self) -> Phase {
        mem::replace(&mut self.phase, Phase::Terminated)
    }

    #[cfg(test)]
    pub(crate) fn round_mut(&mut self) -> Option<&mut Round> {
        match &mut self.phase {
            Phase::Running(round) | Phase::Paused(round) | Phase::GameOver(round) => Some(round),
            Phase::Title | Phase::Terminated => None,
        }
    }
}
