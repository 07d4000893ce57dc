//! Board state and the per-tick rules, kept free of any terminal handling.

use anyhow::{ensure, Result};
use log::{debug, warn};
use rand::{seq::SliceRandom, Rng};

use crate::segments::SegmentList;
use crate::snake::{turn, Direction, Position};

pub const SCORE_PER_FRUIT: u32 = 10;
pub const MIN_BOARD_SIZE: i32 = 5;
const MAX_PLACEMENT_ATTEMPTS: usize = 256;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Turn(Direction),
    Quit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Crash {
    Wall,
    SelfCollision,
}

/// What a single call to [`GameState::advance`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// No direction chosen yet, or the game is already over.
    Idle,
    Moved,
    AteFruit,
    AteBadFruit,
    Crashed(Crash),
    /// A fruit was eaten but there is no free cell left for the next one.
    BoardFull,
}

pub struct GameState {
    width: i32,
    height: i32,
    snake: SegmentList,
    fruit: Position,
    bad_fruit: Option<Position>,
    score: u32,
    direction: Option<Direction>,
    game_over: bool,
}

impl GameState {
    pub fn new<R: Rng>(width: i32, height: i32, rng: &mut R) -> Result<Self> {
        ensure!(
            width >= MIN_BOARD_SIZE && height >= MIN_BOARD_SIZE,
            "board of {}x{} is too small, need at least {}x{}",
            width, height, MIN_BOARD_SIZE, MIN_BOARD_SIZE
        );

        let mut snake = SegmentList::new();
        snake.insert_at_head(Position::new(width / 2, height / 2));

        // A 5x5 board leaves 8 free interior cells around the head
        let fruit = place_item(width, height, |pos| snake.contains(pos), rng)
            .ok_or_else(|| anyhow::anyhow!("no free cell for the first fruit"))?;

        Ok(GameState {
            width,
            height,
            snake,
            fruit,
            bad_fruit: None,
            score: 0,
            direction: None,
            game_over: false,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn snake(&self) -> &SegmentList {
        &self.snake
    }

    pub fn fruit(&self) -> Position {
        self.fruit
    }

    pub fn bad_fruit(&self) -> Option<Position> {
        self.bad_fruit
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_over(&self) -> bool {
        self.game_over
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// True when `pos` lies on the body behind the head, as it is before the
    /// move is applied.
    pub fn hits_body(&self, pos: Position) -> bool {
        self.snake.iter().skip(1).any(|seg| seg == pos)
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Turn(dir) => self.direction = turn(self.direction, dir),
            Action::Quit => self.game_over = true,
        }
    }

    pub fn advance<R: Rng>(&mut self, rng: &mut R) -> Step {
        if self.game_over {
            return Step::Idle;
        }

        let (dir, head) = match (self.direction, self.snake.head()) {
            (Some(dir), Some(head)) => (dir, head.position()),
            _ => return Step::Idle,
        };
        let next = head.step(dir);

        if !self.in_bounds(next) {
            self.game_over = true;
            return Step::Crashed(Crash::Wall);
        }

        if self.hits_body(next) {
            self.game_over = true;
            return Step::Crashed(Crash::SelfCollision);
        }

        let mut grow = false;
        let mut step = Step::Moved;

        if next == self.fruit {
            self.score += SCORE_PER_FRUIT;
            if !self.respawn_items(next, rng) {
                self.game_over = true;
                return Step::BoardFull;
            }
            grow = true;
            step = Step::AteFruit;
        } else if Some(next) == self.bad_fruit {
            let len = self.snake.count_nodes();
            if len > 1 {
                self.snake.remove_node_at(rng.gen_range(1..len));
            }
            if !self.respawn_items(next, rng) {
                self.game_over = true;
                return Step::BoardFull;
            }
            step = Step::AteBadFruit;
        }

        self.snake.update_positions(next, grow);
        step
    }

    /// Places a new fruit and a new bad fruit, keeping both off the snake and
    /// off `next_head`. Returns false if the fruit had nowhere to go.
    fn respawn_items<R: Rng>(&mut self, next_head: Position, rng: &mut R) -> bool {
        let snake = &self.snake;

        let bad = self.bad_fruit;
        let fruit = place_item(self.width, self.height, |pos| {
            pos == next_head || snake.contains(pos) || Some(pos) == bad
        }, rng);
        let fruit = match fruit {
            Some(fruit) => fruit,
            None => return false,
        };
        self.fruit = fruit;

        self.bad_fruit = place_item(self.width, self.height, |pos| {
            pos == next_head || pos == fruit || snake.contains(pos)
        }, rng);
        if self.bad_fruit.is_none() {
            warn!("no free cell left for the bad fruit");
        }

        true
    }
}

#[cfg(test)]
impl GameState {
    /// Replaces the body; `segments` is given head first.
    pub fn set_body(&mut self, segments: &[Position]) {
        self.snake = SegmentList::new();
        for pos in segments.iter().rev() {
            self.snake.insert_at_head(*pos);
        }
    }

    pub fn set_items(&mut self, fruit: Position, bad_fruit: Option<Position>) {
        self.fruit = fruit;
        self.bad_fruit = bad_fruit;
    }
}

/// Picks a random interior cell (inside the border row/column of the board)
/// for which `occupied` is false.
///
/// Samples at random first; once `MAX_PLACEMENT_ATTEMPTS` samples have all
/// landed on occupied cells it falls back to choosing among every free cell,
/// so a crowded board still terminates. Returns `None` if nothing is free.
pub fn place_item<R, F>(width: i32, height: i32, occupied: F, rng: &mut R) -> Option<Position>
where
    R: Rng,
    F: Fn(Position) -> bool,
{
    if width < 3 || height < 3 {
        return None;
    }

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let pos = Position::new(rng.gen_range(1..width - 1), rng.gen_range(1..height - 1));
        if !occupied(pos) {
            return Some(pos);
        }
    }

    let free: Vec<Position> = (1..height - 1)
        .flat_map(|y| (1..width - 1).map(move |x| Position::new(x, y)))
        .filter(|pos| !occupied(*pos))
        .collect();
    debug!("placement fell back to scanning, {} free cells", free.len());

    free.choose(rng).copied()
}
