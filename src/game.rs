use std::{thread::sleep, time::Duration};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{info, warn};
use rand::Rng;

use crate::snake::{Direction::*, Position};
use crate::state::{Action, GameState, Step};
use crate::term::TermManager;

const TICK_INTERVAL_MS: u64 = 100;
const BOARD_MARGIN: u16 = 5;

const BORDER_CHAR: char = '#';
const HEAD_CHAR: char = 'O';
const BODY_CHAR: char = 'o';
const FRUIT_CHAR: char = '+';
const BAD_FRUIT_CHAR: char = 'x';

pub struct SnakeGame<R: Rng> {
    term: TermManager,
    rng: R,
}

impl<R: Rng> SnakeGame<R> {
    pub fn new(rng: R) -> Self {
        SnakeGame { term: TermManager::new(), rng }
    }

    /// Plays one game to the end and returns the final score. The terminal is
    /// restored whether or not the game ran into an error.
    pub fn run(&mut self) -> Result<u32> {
        guarded(
            self,
            |game| game.term.setup().context("failed to prepare the terminal"),
            |game| game.play(),
            |game| game.term.restore().context("failed to restore the terminal"),
        )
    }

    fn play(&mut self) -> Result<u32> {
        let (cols, rows) = self.term.get_terminal_size().context("failed to read terminal size")?;
        let width = cols.saturating_sub(BOARD_MARGIN) as i32;
        let height = rows.saturating_sub(BOARD_MARGIN) as i32;

        let mut state = GameState::new(width, height, &mut self.rng)
            .context("terminal window is too small to play in")?;
        info!("board is {}x{}, first fruit at {}", width, height, state.fruit());

        while !state.is_over() {
            self.draw(&state)?;

            if let Some(key) = self.term.read_key_nonblocking().context("failed to read input")? {
                if let Some(action) = key_action(&key) {
                    if action == Action::Quit {
                        info!("player quit");
                    }
                    state.apply(action);
                }
            }

            let step = state.advance(&mut self.rng);
            log_step(&state, step);

            sleep(Duration::from_millis(TICK_INTERVAL_MS));
        }

        let mut body = Vec::new();
        state.snake().print_nodes(&mut body)?;
        info!("final body, head first:\n{}", String::from_utf8_lossy(&body));
        Ok(state.score())
    }

    fn draw(&mut self, state: &GameState) -> Result<()> {
        let lines = render_board(state);
        for (row, line) in lines.iter().enumerate() {
            self.term.print_str_at(0, row as u16, line)?;
        }

        let score_row = (state.height() + 3) as u16;
        self.term.print_str_at(0, score_row, &format!("Score: {}", state.score()))?;
        self.term.flush().context("failed to draw the board")
    }
}

/// Runs `body` between `setup` and `restore`. Once `setup` has been tried,
/// `restore` runs on every path, including a half-finished setup. The first
/// error wins; a restore error after an earlier failure is only logged.
fn guarded<S, T>(
    target: &mut S,
    setup: impl FnOnce(&mut S) -> Result<()>,
    body: impl FnOnce(&mut S) -> Result<T>,
    restore: impl FnOnce(&mut S) -> Result<()>,
) -> Result<T> {
    let outcome = setup(&mut *target).and_then(|_| body(&mut *target));
    let restored = restore(target);

    match (outcome, restored) {
        (Ok(value), restored) => restored.map(|_| value),
        (Err(err), Err(restore_err)) => {
            warn!("{:#}", restore_err);
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
    }
}

/// Renders the bordered board as text rows. Board cell (x, y) ends up at
/// column x + 1 of row y + 1.
fn render_board(state: &GameState) -> Vec<String> {
    let (w, h) = (state.width() as usize, state.height() as usize);
    let mut grid = vec![vec![' '; w + 2]; h + 2];

    for x in 0..w + 2 {
        grid[0][x] = BORDER_CHAR;
        grid[h + 1][x] = BORDER_CHAR;
    }
    for row in grid.iter_mut() {
        row[0] = BORDER_CHAR;
        row[w + 1] = BORDER_CHAR;
    }

    // Later writes win: head over body over fruit over bad fruit
    let mut put = |pos: Position, ch: char| {
        if state.in_bounds(pos) {
            grid[pos.y as usize + 1][pos.x as usize + 1] = ch;
        }
    };
    if let Some(bad) = state.bad_fruit() {
        put(bad, BAD_FRUIT_CHAR);
    }
    put(state.fruit(), FRUIT_CHAR);
    for pos in state.snake().iter().skip(1) {
        put(pos, BODY_CHAR);
    }
    if let Some(head) = state.snake().head() {
        put(head.position(), HEAD_CHAR);
    }

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}

fn key_action(ev: &KeyEvent) -> Option<Action> {
    if is_ctrl_c(ev) {
        return Some(Action::Quit);
    }

    match ev.code {
        KeyCode::Char('a') | KeyCode::Left => Some(Action::Turn(Left)),
        KeyCode::Char('d') | KeyCode::Right => Some(Action::Turn(Right)),
        KeyCode::Char('w') | KeyCode::Up => Some(Action::Turn(Up)),
        KeyCode::Char('s') | KeyCode::Down => Some(Action::Turn(Down)),
        KeyCode::Char('x') => Some(Action::Quit),
        _ => None,
    }
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL)
}

fn log_step(state: &GameState, step: Step) {
    match step {
        Step::AteFruit => info!("fruit eaten, score {}", state.score()),
        Step::AteBadFruit => info!("bad fruit eaten, {} segments left", state.snake().count_nodes()),
        Step::Crashed(crash) => info!("crashed into {:?} with score {}", crash, state.score()),
        Step::BoardFull => info!("no room left for fruit, score {}", state.score()),
        Step::Idle | Step::Moved => {}
    }
}
