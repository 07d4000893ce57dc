use std::{io::{self, Stdout, Write, stdout}, time::Duration};

use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyEvent, KeyEventKind, read, poll};

pub struct TermManager {
    stdout: Stdout,
}

impl TermManager {
    pub fn new() -> Self {
        TermManager { stdout: stdout() }
    }

    pub fn setup(&mut self) -> io::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)?;
        self.clear()
    }

    pub fn restore(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
    }

    pub fn get_terminal_size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Returns the next pending key press, or `None` straight away if there
    /// is none. Other events (resize, key release) are discarded.
    pub fn read_key_nonblocking(&self) -> io::Result<Option<KeyEvent>> {
        while poll(Duration::ZERO)? {
            if let Event::Key(ev) = read()? {
                if ev.kind == KeyEventKind::Press {
                    return Ok(Some(ev));
                }
            }
        }

        Ok(None)
    }

    pub fn print_str_at(&mut self, col: u16, row: u16, text: &str) -> io::Result<()> {
        queue!(
            self.stdout,
            cursor::MoveTo(col, row),
            terminal::Clear(ClearType::UntilNewLine),
            style::Print(text)
        )
    }

    pub fn clear(&mut self) -> io::Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}
