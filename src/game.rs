use std::{thread::sleep, time::{Duration, Instant}};

use tracing::{debug, info};

use crate::score::ScoreStore;
use crate::session::{Input, Session, Signal, Snapshot};

/// The outside world the game talks to: keyboard, screen and speaker.
pub trait Presenter {
    /// Drains every input event received since the last call.
    fn poll_inputs(&mut self) -> anyhow::Result<Vec<Input>>;

    fn render(&mut self, snapshot: &Snapshot) -> anyhow::Result<()>;

    fn play(&mut self, signal: Signal) -> anyhow::Result<()>;
}

/// Source of the fixed-rate tick.
pub trait Ticker {
    /// Blocks until the next tick is due.
    fn wait(&mut self);
}

pub struct FixedRateTicker {
    period: Duration,
    next: Instant,
}

impl FixedRateTicker {
    pub fn new(period: Duration) -> Self {
        FixedRateTicker { period, next: Instant::now() + period }
    }
}

impl Ticker for FixedRateTicker {
    fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            sleep(self.next - now);
            self.next += self.period;
        } else {
            // Running late, missed ticks are dropped
            self.next = now + self.period;
        }
    }
}

/// Runs the session until it is terminated.
///
/// Each tick is split in three phases: inputs are fed to the session, the
/// simulation advances once, then the settled state is rendered.
pub fn run<S, P, T>(session: &mut Session<S>, presenter: &mut P, ticker: &mut T) -> anyhow::Result<u64>
where
    S: ScoreStore,
    P: Presenter,
    T: Ticker,
{
    let mut ticks = 0;
    presenter.render(&session.snapshot())?;

    while !session.is_terminated() {
        ticker.wait();
        ticks += 1;

        for input in presenter.poll_inputs()? {
            debug!(?input, state = ?session.state(), "input");
            session.handle_input(input)?;
            if session.is_terminated() {
                break;
            }
        }
        if session.is_terminated() {
            break;
        }

        for signal in session.tick()? {
            presenter.play(signal)?;
        }
        presenter.render(&session.snapshot())?;
    }

    info!(ticks, high_score = session.high_score(), "game loop finished");
    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::fruit::{FruitCatalog, FruitSpawner, SpawnPolicy};
    use crate::grid::GridBounds;
    use crate::score::MemoryScoreStore;
    use crate::session::SessionState;

    /// Feeds one batch of inputs per tick and records what it was asked to show.
    #[derive(Default)]
    struct ScriptedPresenter {
        script: VecDeque<Vec<Input>>,
        frames: Vec<Snapshot>,
        sounds: Vec<Signal>,
    }

    impl ScriptedPresenter {
        fn new(script: Vec<Vec<Input>>) -> Self {
            ScriptedPresenter { script: script.into(), ..Default::default() }
        }
    }

    impl Presenter for ScriptedPresenter {
        fn poll_inputs(&mut self) -> anyhow::Result<Vec<Input>> {
            // Quit once the script runs out so a broken test cannot hang
            Ok(self.script.pop_front().unwrap_or_else(|| vec![Input::Quit]))
        }

        fn render(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
            self.frames.push(snapshot.clone());
            Ok(())
        }

        fn play(&mut self, signal: Signal) -> anyhow::Result<()> {
            self.sounds.push(signal);
            Ok(())
        }
    }

    struct NoWait;

    impl Ticker for NoWait {
        fn wait(&mut self) {}
    }

    fn session() -> Session<MemoryScoreStore> {
        let bounds = GridBounds::new(32, 24);
        let spawner = FruitSpawner::new(bounds, SpawnPolicy::AvoidSnake, Some(9));
        Session::new(bounds, MemoryScoreStore::default(), FruitCatalog::default(), spawner).unwrap()
    }

    #[test]
    fn quit_stops_the_loop_without_another_frame() {
        let mut session = session();
        let mut presenter = ScriptedPresenter::new(vec![vec![Input::AnyKey], vec![], vec![Input::Quit]]);
        let ticks = run(&mut session, &mut presenter, &mut NoWait).unwrap();

        assert_eq!(ticks, 3);
        assert!(session.is_terminated());
        // Initial title frame plus one per completed tick
        assert_eq!(presenter.frames.len(), 3);
        assert_eq!(presenter.frames[0].state, SessionState::Title);
        assert_eq!(presenter.frames[2].state, SessionState::Running);
    }

    #[test]
    fn running_into_the_wall_reaches_game_over() {
        let mut session = session();
        // The start head is at x = 5 heading right on a 32 wide grid
        let mut script = vec![vec![Input::AnyKey]];
        script.extend((0..30).map(|_| vec![]));
        let mut presenter = ScriptedPresenter::new(script);
        run(&mut session, &mut presenter, &mut NoWait).unwrap();

        assert!(presenter.sounds.contains(&Signal::GameOver));
        let last = presenter.frames.last().unwrap();
        assert_eq!(last.state, SessionState::GameOver);
        assert_eq!(last.body[0].x, 32);
    }

    #[test]
    fn paused_ticks_render_the_same_frame() {
        let mut session = session();
        let mut presenter = ScriptedPresenter::new(vec![
            vec![Input::AnyKey],
            vec![Input::TogglePause],
            vec![Input::MoveDown],
            vec![],
        ]);
        run(&mut session, &mut presenter, &mut NoWait).unwrap();

        let paused: Vec<&Snapshot> =
            presenter.frames.iter().filter(|f| f.state == SessionState::Paused).collect();
        assert_eq!(paused.len(), 3);
        assert!(paused.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn fixed_rate_ticker_does_not_catch_up() {
        let mut ticker = FixedRateTicker::new(Duration::from_millis(1));
        sleep(Duration::from_millis(20));
        let start = Instant::now();
        ticker.wait();
        ticker.wait();
        // One re-anchor then a single period, not a burst of missed ticks
        assert!(start.elapsed() >= Duration::from_millis(1));
    }
}
