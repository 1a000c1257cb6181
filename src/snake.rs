use std::collections::VecDeque;

use crate::grid::{Cell, Direction::{*, self}, GridBounds};

pub const START_BODY: [Cell; 3] = [Cell::new(5, 5), Cell::new(4, 5), Cell::new(3, 5)];
pub const START_DIRECTION: Direction = Right;

#[derive(Clone, Debug)]
pub struct Snake {
    // Head first
    body: VecDeque<Cell>,
    direction: Direction,
}

impl Snake {
    pub fn new() -> Self {
        Snake::from_body(START_BODY.iter().copied(), START_DIRECTION)
    }

    /// Builds a snake from head-first segments. Panics on an empty body.
    pub fn from_body(body: impl IntoIterator<Item = Cell>, direction: Direction) -> Self {
        let body: VecDeque<Cell> = body.into_iter().collect();
        assert!(!body.is_empty(), "a snake needs at least one segment");
        Snake { body, direction }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Advances one cell: the new head is prepended and the tail dropped.
    pub fn move_step(&mut self) {
        let new_head = self.head().step(self.direction);
        self.body.push_front(new_head);
        self.body.pop_back();
    }

    /// Duplicates the tail so the next `move_step` leaves the snake one longer.
    pub fn grow(&mut self) {
        let tail = self.body[self.body.len() - 1];
        self.body.push_back(tail);
    }

    /// Ignores an exact reversal, any other direction takes effect on the next move.
    pub fn change_direction(&mut self, new_direction: Direction) {
        if !new_direction.is_opposite(self.direction) {
            self.direction = new_direction;
        }
    }

    pub fn self_collision(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|c| *c == head)
    }

    pub fn wall_collision(&self, bounds: GridBounds) -> bool {
        !bounds.contains(self.head())
    }
}

impl Default for Snake {
    fn default() -> Self {
        Snake::new()
    }
}
