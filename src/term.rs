use std::{io::{Stdout, Write, stdout}, time::Duration};

use anyhow::bail;
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, poll, read};
use tracing::warn;

use crate::game::Presenter;
use crate::grid::{Cell, GridBounds};
use crate::session::{Input, SessionState, Signal, Snapshot};

type TermInt = u16;
type Coords = (TermInt, TermInt);

const SNAKE_HEAD: [char; 2] = ['▓', '▓'];
const SNAKE_BODY: [char; 2] = ['█', '█'];
const DEAD_SNAKE: [char; 2] = ['X', 'X'];
const FRUIT: [char; 2] = ['(', ')'];
const BELL: char = '\u{7}';

// Every grid cell is two columns wide so it looks square
const CELL_COLUMNS: TermInt = 2;
const HUD_ROWS: TermInt = 2;

/// Draws snapshots on the terminal and turns key presses into game inputs.
pub struct TermPresenter {
    width: TermInt,
    height: TermInt,
    bounds: GridBounds,
    mute: bool,
    stdout: Stdout,
    // What the terminal currently shows
    screen: Vec<char>,
    // The frame being composed
    frame: Vec<char>,
}

impl TermPresenter {
    /// Takes over the terminal. It is handed back when the presenter is dropped.
    pub fn open(bounds: GridBounds, mute: bool) -> anyhow::Result<Self> {
        let (width, height) = terminal::size()?;
        let (need_w, need_h) = required_size(bounds);
        if width < need_w || height < need_h {
            bail!("terminal is {}x{}, the board needs at least {}x{}", width, height, need_w, need_h);
        }

        let size = width as usize * height as usize;
        let mut term = TermPresenter {
            width,
            height,
            bounds,
            mute,
            stdout: stdout(),
            screen: vec![' '; size],
            frame: vec![' '; size],
        };
        term.setup()?;
        Ok(term)
    }

    fn setup(&mut self) -> crossterm::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking, terminal::Clear(ClearType::All))
    }

    fn restore(&mut self) -> crossterm::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
    }

    fn origin(&self) -> Coords {
        let (need_w, need_h) = required_size(self.bounds);
        ((self.width - need_w) / 2, (self.height - need_h) / 2)
    }

    fn put(&mut self, pos: Coords, ch: char) {
        if pos.0 < self.width && pos.1 < self.height {
            self.frame[self.width as usize * pos.1 as usize + pos.0 as usize] = ch;
        }
    }

    fn put_str(&mut self, pos: Coords, text: &str) {
        for (i, ch) in text.chars().enumerate() {
            self.put((pos.0 + i as TermInt, pos.1), ch);
        }
    }

    fn put_cell(&mut self, cell: Cell, glyph: [char; 2]) {
        if !self.bounds.contains(cell) {
            return;
        }
        let (ox, oy) = self.origin();
        let x = ox + 1 + cell.x as TermInt * CELL_COLUMNS;
        let y = oy + 1 + cell.y as TermInt;
        self.put((x, y), glyph[0]);
        self.put((x + 1, y), glyph[1]);
    }

    fn draw_borders(&mut self) {
        let (ox, oy) = self.origin();
        let (need_w, need_h) = required_size(self.bounds);
        let end_x = ox + need_w - 1;
        let end_y = oy + need_h - HUD_ROWS - 1;

        for x in ox..=end_x {
            let ch = if x == ox || x == end_x {'+'} else {'-'};
            self.put((x, oy), ch);
            self.put((x, end_y), ch);
        }

        for y in oy + 1..end_y {
            self.put((ox, y), '|');
            self.put((end_x, y), '|');
        }
    }

    fn draw_message(&mut self, lines: &[&str]) {
        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let (ox, oy) = self.origin();
        let (need_w, need_h) = required_size(self.bounds);
        let center = (ox + need_w / 2, oy + (need_h - HUD_ROWS) / 2);
        let top_left = (center.0.saturating_sub(msg_width / 2), center.1.saturating_sub(msg_height / 2));

        for y_diff in 0..msg_height {
            for x_diff in 0..msg_width {
                self.put((top_left.0 + x_diff, top_left.1 + y_diff), ' ');
            }
        }

        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            self.put_str((top_left.0, top_left.1 + i as TermInt + 1), &padded_line);
        }
    }

    fn compose(&mut self, snapshot: &Snapshot) {
        self.frame.iter_mut().for_each(|ch| *ch = ' ');
        self.draw_borders();

        if let Some(fruit) = snapshot.fruit {
            self.put_cell(fruit, FRUIT);
        }

        let dead = snapshot.state == SessionState::GameOver;
        // Tail first so the head wins on a shared cell
        for (i, cell) in snapshot.body.iter().enumerate().rev() {
            let glyph = match (dead, i) {
                (true, _) => DEAD_SNAKE,
                (false, 0) => SNAKE_HEAD,
                (false, _) => SNAKE_BODY,
            };
            self.put_cell(*cell, glyph);
        }

        let (ox, oy) = self.origin();
        let hud_y = oy + self.bounds.height as TermInt + 2;
        let fruit_name = snapshot.fruit_name.as_deref().unwrap_or("-");
        self.put_str((ox, hud_y), &format!("Score: {}   Fruit: {}", snapshot.score, fruit_name));
        self.put_str((ox, hud_y + 1), &format!("High Score: {}", snapshot.high_score));

        match snapshot.state {
            SessionState::Title => self.draw_message(&[
                "FRUIT FRENZY SNAKE",
                "",
                "Arrow keys or WASD to move",
                "Esc or P to pause, R to restart",
                "Q or CTRL+C to quit",
                "",
                "Press any key to begin",
            ]),
            SessionState::Paused => self.draw_message(&["PAUSED", "Esc to resume"]),
            SessionState::GameOver => self.draw_message(&[
                "Game Over!",
                &format!("Score: {}", snapshot.score),
                "Press R to Restart or Q to Quit",
            ]),
            SessionState::Running | SessionState::Terminated => {}
        }
    }

    fn flush_changes(&mut self) -> crossterm::Result<()> {
        for (i, (shown, wanted)) in self.screen.iter_mut().zip(self.frame.iter()).enumerate() {
            if *shown != *wanted {
                let x = (i % self.width as usize) as TermInt;
                let y = (i / self.width as usize) as TermInt;
                queue!(self.stdout, cursor::MoveTo(x, y), style::Print(*wanted))?;
                *shown = *wanted;
            }
        }
        self.stdout.flush()?;
        Ok(())
    }
}

impl Presenter for TermPresenter {
    fn poll_inputs(&mut self) -> anyhow::Result<Vec<Input>> {
        let mut inputs = vec![];

        while poll(Duration::from_millis(0))? {
            if let Event::Key(ev) = read()? {
                inputs.push(map_key(&ev));
            }
        }

        Ok(inputs)
    }

    fn render(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        self.compose(snapshot);
        self.flush_changes()?;
        Ok(())
    }

    // The terminal only has one sound, the bell
    fn play(&mut self, _signal: Signal) -> anyhow::Result<()> {
        if self.mute {
            return Ok(());
        }
        queue!(self.stdout, style::Print(BELL))?;
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for TermPresenter {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("failed to restore the terminal: {}", e);
        }
    }
}

/// Columns and rows needed for the bordered board plus the score lines.
fn required_size(bounds: GridBounds) -> Coords {
    let w = bounds.width as TermInt * CELL_COLUMNS + 2;
    let h = bounds.height as TermInt + 2 + HUD_ROWS;
    (w, h)
}

fn map_key(ev: &KeyEvent) -> Input {
    match ev {
        KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL } => Input::Quit,
        KeyEvent { code, modifiers: _ } => match code {
            KeyCode::Char('w') | KeyCode::Up => Input::MoveUp,
            KeyCode::Char('a') | KeyCode::Left => Input::MoveLeft,
            KeyCode::Char('s') | KeyCode::Down => Input::MoveDown,
            KeyCode::Char('d') | KeyCode::Right => Input::MoveRight,
            KeyCode::Esc | KeyCode::Char('p') => Input::TogglePause,
            KeyCode::Char('r') => Input::Restart,
            KeyCode::Char('q') => Input::Quit,
            _ => Input::AnyKey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent { code, modifiers: KeyModifiers::NONE }
    }

    #[test]
    fn keys_map_to_inputs() {
        assert_eq!(map_key(&key(KeyCode::Up)), Input::MoveUp);
        assert_eq!(map_key(&key(KeyCode::Char('a'))), Input::MoveLeft);
        assert_eq!(map_key(&key(KeyCode::Char('s'))), Input::MoveDown);
        assert_eq!(map_key(&key(KeyCode::Right)), Input::MoveRight);
        assert_eq!(map_key(&key(KeyCode::Esc)), Input::TogglePause);
        assert_eq!(map_key(&key(KeyCode::Char('r'))), Input::Restart);
        assert_eq!(map_key(&key(KeyCode::Char('q'))), Input::Quit);
        assert_eq!(map_key(&key(KeyCode::Enter)), Input::AnyKey);
        assert_eq!(map_key(&key(KeyCode::Char('c'))), Input::AnyKey);

        let ctrl_c = KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL };
        assert_eq!(map_key(&ctrl_c), Input::Quit);
    }

    #[test]
    fn classic_board_needs_66_by_28() {
        assert_eq!(required_size(GridBounds::new(32, 24)), (66, 28));
    }
}
